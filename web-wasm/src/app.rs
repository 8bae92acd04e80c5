//! メインアプリケーションコンポーネント

use crate::api::vto;
use crate::components::{
    header::Header,
    photo_uploader::PhotoUploader,
    process_button::ProcessButton,
    progress_bar::ProgressBar,
    result_panel::ResultPanel,
    server_status::ServerStatus,
    template_gallery::TemplateGallery,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use vto_common::{Controller, SelectedPhoto, TemplateGarment, UploadProgress};

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let config = vto::service_config();
    log::info!("service: {}", config.base_url);
    provide_context(config.clone());

    // アプリケーション状態
    let controller = RwSignal::new(Controller::new());
    let (upload_progress, set_upload_progress) = signal(None::<u8>);

    let selected_photo = Signal::derive(move || {
        controller.with(|c| c.photo().map(|p| (p.preview.clone(), p.filename.clone())))
    });
    let selected_template = Signal::derive(move || controller.with(|c| c.template().cloned()));
    let can_process = Signal::derive(move || controller.with(Controller::can_process));
    let is_processing = Signal::derive(move || controller.with(Controller::is_processing));
    let state = Signal::derive(move || controller.with(|c| c.state().clone()));
    let validation = Signal::derive(move || controller.with(|c| c.validation().map(str::to_string)));

    let on_photo_selected = move |photo: SelectedPhoto| {
        controller.update(|c| c.select_photo(photo));
    };

    let on_template_selected = move |template: TemplateGarment| {
        controller.update(|c| c.select_template(template));
    };

    // 送信ハンドラ（処理中の再送信と未選択は Controller が拒否する）
    let on_process = move |_: ()| {
        let Some(Ok(request)) = controller.try_update(Controller::begin_processing) else {
            return;
        };
        set_upload_progress.set(Some(0));

        let config = config.clone();
        spawn_local(async move {
            let on_progress: Rc<dyn Fn(UploadProgress)> = Rc::new(move |p: UploadProgress| {
                let _ = set_upload_progress.try_set(Some(p.percent()));
            });
            let outcome =
                vto::process_photos(&config, &request.photo, &request.template, on_progress).await;

            if let Ok(result) = &outcome {
                if let Err(e) = vto::preload_image(&result.image_url).await {
                    log::warn!("{}", e);
                }
            }

            let _ = set_upload_progress.try_set(None);
            controller.try_update(|c| c.finish(outcome));
        });
    };

    let on_reset = move |_: ()| {
        controller.update(Controller::reset);
        set_upload_progress.set(None);
    };

    view! {
        <div class="container">
            <Header />
            <ServerStatus />

            <div class="selection-row">
                <PhotoUploader selected=selected_photo on_photo_selected=on_photo_selected />
                <TemplateGallery selected=selected_template on_select=on_template_selected />
            </div>

            <ProcessButton
                can_process=can_process
                is_processing=is_processing
                on_process=on_process
            />

            <Show when=move || upload_progress.get().is_some()>
                <ProgressBar progress=upload_progress />
            </Show>

            <ResultPanel state=state validation=validation on_reset=on_reset />
        </div>
    }
}
