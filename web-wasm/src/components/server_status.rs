//! サーバー状態の表示
//!
//! 起動時にヘルスチェックを行い、詳細を開いたときだけカタログとメトリクスを取得する。

use crate::api::vto;
use leptos::prelude::*;
use leptos::task::spawn_local;
use vto_common::{GarmentDescriptor, HealthStatus, ServiceConfig};

#[derive(Clone)]
struct Details {
    clothes: Result<Vec<GarmentDescriptor>, String>,
    metrics: Result<String, String>,
}

#[component]
pub fn ServerStatus() -> impl IntoView {
    let config = use_context::<ServiceConfig>().unwrap_or_else(vto::service_config);
    let (health, set_health) = signal(None::<HealthStatus>);
    let (details, set_details) = signal(None::<Details>);
    let (show_details, set_show_details) = signal(false);

    let refresh_health = {
        let config = config.clone();
        move || {
            let config = config.clone();
            spawn_local(async move {
                let status = vto::check_server_health(&config).await;
                let _ = set_health.try_set(Some(status));
            });
        }
    };
    refresh_health();

    let toggle_details = {
        let config = config.clone();
        move |_| {
            let opening = !show_details.get_untracked();
            set_show_details.set(opening);
            if !opening || details.with_untracked(Option::is_some) {
                return;
            }
            let config = config.clone();
            spawn_local(async move {
                let clothes = vto::get_available_clothes(&config)
                    .await
                    .map_err(|e| e.to_string());
                let metrics = vto::get_server_metrics(&config)
                    .await
                    .map(|m| serde_json::to_string_pretty(&m).unwrap_or_else(|_| m.to_string()))
                    .map_err(|e| e.to_string());
                let _ = set_details.try_set(Some(Details { clothes, metrics }));
            });
        }
    };

    let badge = move || match health.get() {
        None => view! { <span class="badge badge-pending">"Verificando servidor..."</span> }.into_any(),
        Some(h) if h.is_healthy => view! {
            <span class="badge badge-ok">
                {format!(
                    "Servidor activo · {} prendas · detector {}",
                    h.clothe_count,
                    if h.detector_ready { "listo" } else { "no listo" }
                )}
            </span>
        }
        .into_any(),
        Some(h) => view! {
            <span class="badge badge-error">
                {h.error.unwrap_or_else(|| "Servidor no disponible".to_string())}
            </span>
        }
        .into_any(),
    };

    view! {
        <section class="server-status">
            {badge}
            <button class="btn btn-link" on:click=move |_| refresh_health()>"↻"</button>
            <button class="btn btn-link" on:click=toggle_details>
                {move || if show_details.get() { "Ocultar detalles" } else { "Detalles" }}
            </button>
            <Show when=move || show_details.get()>
                {move || match details.get() {
                    None => view! { <p class="text-muted">"Cargando..."</p> }.into_any(),
                    Some(d) => view! {
                        <div class="server-details">
                            <h3>"Catálogo del servidor"</h3>
                            {match d.clothes {
                                Ok(clothes) => view! {
                                    <ul class="clothes-list">
                                        {clothes.into_iter().map(|c| view! {
                                            <li>
                                                {c.id.map(|id| format!("#{} ", id)).unwrap_or_default()}
                                                {c.name}
                                                {c.category.map(|cat| format!(" ({})", cat))}
                                            </li>
                                        }).collect_view()}
                                    </ul>
                                }.into_any(),
                                Err(message) => view! { <p class="error">{message}</p> }.into_any(),
                            }}
                            <h3>"Métricas"</h3>
                            {match d.metrics {
                                Ok(json) => view! { <pre class="metrics">{json}</pre> }.into_any(),
                                Err(message) => view! { <p class="error">{message}</p> }.into_any(),
                            }}
                        </div>
                    }
                    .into_any(),
                }}
            </Show>
        </section>
    }
}
