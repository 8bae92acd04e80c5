//! 衣服テンプレートのギャラリー

use leptos::prelude::*;
use vto_common::{templates, TemplateGarment};

#[component]
pub fn TemplateGallery<F>(selected: Signal<Option<TemplateGarment>>, on_select: F) -> impl IntoView
where
    F: Fn(TemplateGarment) + 'static + Clone + Send + Sync,
{
    let cards = templates()
        .into_iter()
        .map(|template| {
            let id = template.id;
            let is_selected = move || selected.with(|t| t.as_ref().map(|t| t.id) == Some(id));
            let on_click = {
                let on_select = on_select.clone();
                let template = template.clone();
                move |_| on_select(template.clone())
            };

            view! {
                <div class="template-card" class:selected=is_selected on:click=on_click>
                    <img src=template.asset_url.clone() alt=template.display_name.clone() />
                    <Show when=is_selected>
                        <div class="template-check">"✓"</div>
                    </Show>
                </div>
            }
        })
        .collect_view();

    view! {
        <section class="panel templates">
            <h2>"Selecciona una plantilla"</h2>
            <div class="template-grid">{cards}</div>
            {move || selected.get().map(|t| view! {
                <p class="selection-note">"✓ Plantilla seleccionada: "{t.display_name}</p>
            })}
        </section>
    }
}
