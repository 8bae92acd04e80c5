//! ヘッダーコンポーネント

use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <h1>"🎨 Virtual Try-On OOTDiffusion"</h1>
            <p class="text-muted">"Sube tu foto, elige una prenda y pruébatela"</p>
        </header>
    }
}
