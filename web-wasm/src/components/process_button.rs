use leptos::prelude::*;

#[component]
pub fn ProcessButton<F>(
    can_process: Signal<bool>,
    is_processing: Signal<bool>,
    on_process: F,
) -> impl IntoView
where
    F: Fn(()) + 'static + Clone + Send + Sync,
{
    view! {
        <div class="process-row">
            <button
                class="btn btn-primary btn-large"
                disabled=move || !can_process.get() || is_processing.get()
                on:click=move |_| on_process(())
            >
                {move || {
                    if is_processing.get() {
                        view! { <span class="spinner"></span>" Procesando..." }.into_any()
                    } else {
                        view! { "Procesar Fotos" }.into_any()
                    }
                }}
            </button>
        </div>
    }
}
