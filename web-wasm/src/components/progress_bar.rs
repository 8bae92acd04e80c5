//! プログレスバーコンポーネント

use leptos::prelude::*;

/// 送信進捗（100%到達後はサーバー処理待ち）
#[component]
pub fn ProgressBar(progress: ReadSignal<Option<u8>>) -> impl IntoView {
    let percent = move || progress.get().unwrap_or(0);

    view! {
        <div class="progress-container">
            <div class="progress-bar">
                <div
                    class="progress-fill"
                    style=move || format!("width: {}%", percent())
                />
            </div>
            <p class="progress-text">
                {move || {
                    if percent() >= 100 {
                        "Procesando en el servidor...".to_string()
                    } else {
                        format!("Subida: {}%", percent())
                    }
                }}
            </p>
        </div>
    }
}
