//! 処理結果の表示

use crate::api::vto::{self, DOWNLOAD_NAME};
use leptos::prelude::*;
use leptos::task::spawn_local;
use vto_common::AppState;

#[component]
pub fn ResultPanel<F>(
    state: Signal<AppState>,
    validation: Signal<Option<String>>,
    on_reset: F,
) -> impl IntoView
where
    F: Fn(()) + 'static + Clone + Send + Sync,
{
    let (download_error, set_download_error) = signal(None::<String>);

    let download = move |url: String| {
        set_download_error.set(None);
        spawn_local(async move {
            if let Err(e) = vto::download_result(&url, DOWNLOAD_NAME).await {
                let _ = set_download_error.try_set(Some(e.to_string()));
            }
        });
    };

    let body = move || match state.get() {
        AppState::Idle => view! {
            <div class="result-empty">
                <p>"El resultado aparecerá aquí después del procesamiento"</p>
            </div>
        }
        .into_any(),
        AppState::Processing => view! {
            <div class="result-loading">
                <div class="spinner large"></div>
                <p>"Procesando tus fotos..."</p>
                <p class="text-muted">"Esto puede tardar unos segundos"</p>
            </div>
        }
        .into_any(),
        AppState::Failed(message) => view! {
            <div class="alert alert-error">
                <p>"❌ "{message}</p>
            </div>
        }
        .into_any(),
        AppState::Succeeded(result) => {
            let on_reset = on_reset.clone();
            let url = result.image_url.clone();
            view! {
                <div class="result-success">
                    <div class="alert alert-success">
                        <p>"✅ "{result.message.clone()}</p>
                    </div>
                    <img class="result-image" src=result.image_url.clone() alt="Resultado procesado" />
                    <div class="actions">
                        <button class="btn btn-primary" on:click=move |_| download(url.clone())>
                            "Descargar"
                        </button>
                        <button class="btn btn-secondary" on:click=move |_| on_reset(())>
                            "Nueva foto"
                        </button>
                    </div>
                </div>
            }
            .into_any()
        }
    };

    view! {
        <section class="panel result">
            <h2>"Resultado"</h2>
            {move || validation.get().map(|message| view! {
                <div class="alert alert-warning"><p>{message}</p></div>
            })}
            {body}
            {move || download_error.get().map(|message| view! {
                <p class="error">{message}</p>
            })}
        </section>
    }
}
