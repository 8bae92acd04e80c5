//! 写真の選択（ファイル・ドラッグ&ドロップ・カメラ撮影）
//!
//! カメラの状態は `CameraSession` が持ち、描画用には `CameraView` の写しを使う。
//! 非同期処理は世代番号を持ち回り、閉じたセッションには作用しない。

use crate::api::media::{self, BrowserStream};
use futures::channel::oneshot;
use gloo::timers::future::TimeoutFuture;
use leptos::html::{Canvas, Input, Video};
use leptos::prelude::*;
use leptos::task::spawn_local;
use vto_common::camera::{MSG_CAMERA_INIT_FAILED, TICK_MS};
use vto_common::{CameraSession, CameraView, CountdownStep, Error, MediaTracks, Result, SelectedPhoto};
use web_sys::{DragEvent, File};

#[component]
pub fn PhotoUploader<F>(
    /// 選択中の写真の（プレビュー, ファイル名）
    selected: Signal<Option<(String, String)>>,
    on_photo_selected: F,
) -> impl IntoView
where
    F: Fn(SelectedPhoto) + 'static + Clone + Send + Sync,
{
    let video_ref = NodeRef::<Video>::new();
    let canvas_ref = NodeRef::<Canvas>::new();
    let input_ref = NodeRef::<Input>::new();
    let session = StoredValue::new_local(CameraSession::<BrowserStream>::new());
    // プレビュー待ちを打ち切る送信側（破棄でも打ち切り）
    let preview_cancel = StoredValue::new_local(None::<oneshot::Sender<()>>);
    let (camera, set_camera) = signal(CameraView::default());
    let (is_dragover, set_is_dragover) = signal(false);

    let refresh = move || {
        if let Some(view) = session.try_with_value(CameraSession::view) {
            let _ = set_camera.try_set(view);
        }
    };

    // 画面を離れたらカメラを止める
    on_cleanup(move || {
        session.try_update_value(CameraSession::close);
    });

    let handle_file = {
        let on_photo_selected = on_photo_selected.clone();
        move |file: File| {
            let on_photo_selected = on_photo_selected.clone();
            spawn_local(async move {
                let read = media::read_photo_file(file).await;
                let chosen = session
                    .try_update_value(|s| settle_file_selection(s, read))
                    .flatten();
                refresh();
                if let Some(photo) = chosen {
                    on_photo_selected(photo);
                }
            });
        }
    };

    let on_file_change = {
        let handle_file = handle_file.clone();
        move |_: web_sys::Event| {
            let Some(input) = input_ref.get_untracked() else {
                return;
            };
            if let Some(file) = input.files().and_then(|files| files.get(0)) {
                handle_file(file);
            }
            // 同じファイルを選び直せるように
            input.set_value("");
        }
    };

    let on_drop = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(false);
        if let Some(file) = ev
            .data_transfer()
            .and_then(|dt| dt.files())
            .and_then(|files| files.get(0))
        {
            handle_file(file);
        }
    };

    let open_file_dialog = move |_| {
        if let Some(input) = input_ref.get_untracked() {
            input.click();
        }
    };

    let start_camera = move |_| {
        session.update_value(CameraSession::clear_error);
        refresh();
        spawn_local(async move {
            let stream = match media::request_camera().await {
                Ok(stream) => stream,
                Err(e) => {
                    session.try_update_value(|s| s.fail(e.to_string()));
                    refresh();
                    return;
                }
            };

            let Some(epoch) = session.try_update_value(|s| s.open(BrowserStream::new(stream.clone()))) else {
                // 取得中に破棄された
                BrowserStream::new(stream).stop_all();
                return;
            };
            refresh();

            let Some(video) = video_ref.get_untracked() else {
                return;
            };
            let (cancel_tx, cancel_rx) = oneshot::channel();
            preview_cancel.try_update_value(|pending| *pending = Some(cancel_tx));
            let started = media::start_preview(&video, &stream, cancel_rx).await;
            session.try_update_value(|s| match started {
                Ok(()) => {
                    s.mark_ready(epoch);
                }
                Err(e) if s.is_open() && s.epoch() == epoch => {
                    s.close();
                    s.fail(e.to_string());
                }
                Err(_) => {}
            });
            refresh();
        });
    };

    let cancel_camera = move |_| {
        preview_cancel.update_value(|pending| {
            if let Some(tx) = pending.take() {
                let _ = tx.send(());
            }
        });
        session.update_value(CameraSession::cancel);
        if let Some(video) = video_ref.get_untracked() {
            media::detach(&video);
        }
        refresh();
    };

    let take_photo = {
        let on_photo_selected = on_photo_selected.clone();
        move |_| {
            let Some(epoch) = session.try_update_value(CameraSession::start_countdown).flatten() else {
                return;
            };
            refresh();

            let on_photo_selected = on_photo_selected.clone();
            spawn_local(async move {
                loop {
                    TimeoutFuture::new(TICK_MS).await;
                    let Some(step) = session.try_update_value(|s| s.tick(epoch)) else {
                        return;
                    };
                    refresh();
                    match step {
                        CountdownStep::Show(_) => continue,
                        CountdownStep::Capture => break,
                        CountdownStep::Idle => return,
                    }
                }

                let grabbed = match (video_ref.get_untracked(), canvas_ref.get_untracked()) {
                    (Some(video), Some(canvas)) => {
                        let frame = media::grab_frame(&video, &canvas);
                        media::detach(&video);
                        frame
                    }
                    _ => Err(Error::CameraUnavailable(MSG_CAMERA_INIT_FAILED.to_string())),
                };
                session.try_update_value(|s| {
                    s.finish_capture();
                    if let Err(e) = &grabbed {
                        s.fail(e.to_string());
                    }
                });
                refresh();

                if let Ok(photo) = grabbed {
                    on_photo_selected(photo);
                }
            });
        }
    };

    let is_open = move || camera.with(|c| c.open);
    let is_busy = move || camera.with(|c| c.countdown.is_some() || c.capturing);

    view! {
        <section class="panel uploader">
            <h2>"Sube tu foto"</h2>

            <input
                node_ref=input_ref
                type="file"
                accept="image/*"
                class="hidden"
                on:change=on_file_change
            />
            <canvas node_ref=canvas_ref class="hidden"></canvas>

            <div class="camera" class:hidden=move || !is_open()>
                <div class="camera-frame">
                    <video node_ref=video_ref class="camera-video"></video>
                    <Show when=move || camera.with(|c| c.open && !c.ready)>
                        <div class="overlay loading">
                            <div class="spinner"></div>
                            <p>"Iniciando cámara..."</p>
                        </div>
                    </Show>
                    <Show when=move || matches!(camera.with(|c| c.countdown), Some(n) if n > 0)>
                        <div class="overlay countdown">
                            <div class="countdown-number">
                                {move || camera.with(|c| c.countdown.unwrap_or(0))}
                            </div>
                            <p>"¡Prepárate!"</p>
                        </div>
                    </Show>
                    <Show when=move || camera.with(|c| c.countdown == Some(0) || c.capturing)>
                        <div class="overlay captured">
                            <p>"¡Foto tomada!"</p>
                        </div>
                    </Show>
                    <button class="btn-close" on:click=cancel_camera>"✕"</button>
                </div>
                <div class="actions">
                    <button
                        class="btn btn-primary"
                        disabled=move || !camera.with(CameraView::can_capture)
                        on:click=take_photo
                    >
                        {move || if is_busy() { "Tomando foto..." } else { "📸 Tomar Foto" }}
                    </button>
                    <button class="btn btn-secondary" on:click=cancel_camera>"Cancelar"</button>
                </div>
            </div>

            {move || {
                if is_open() {
                    return None;
                }
                Some(match selected.get() {
                    Some((preview, filename)) => view! {
                        <div class="photo-preview">
                            <img src=preview alt=filename.clone() />
                            <p class="text-muted">{filename}</p>
                            <div class="actions">
                                <button class="btn btn-secondary" on:click=open_file_dialog>
                                    "Cambiar foto"
                                </button>
                                <button class="btn btn-secondary" on:click=start_camera>
                                    "📷 Usar cámara"
                                </button>
                            </div>
                        </div>
                    }
                    .into_any(),
                    None => view! {
                        <div
                            class="upload-area"
                            class:dragover=move || is_dragover.get()
                            on:dragover=move |ev: DragEvent| {
                                ev.prevent_default();
                                set_is_dragover.set(true);
                            }
                            on:dragleave=move |_: DragEvent| set_is_dragover.set(false)
                            on:drop=on_drop.clone()
                        >
                            <div class="upload-icon">"📷"</div>
                            <p>"Arrastra tu foto aquí o elige una opción"</p>
                            <div class="actions">
                                <button class="btn btn-primary" on:click=open_file_dialog>
                                    "Subir foto"
                                </button>
                                <button class="btn btn-secondary" on:click=start_camera>
                                    "📷 Usar cámara"
                                </button>
                            </div>
                        </div>
                    }
                    .into_any(),
                })
            }}

            {move || camera.with(|c| c.error.clone()).map(|message| view! {
                <p class="error">{message}</p>
            })}
        </section>
    }
}

/// ファイル読み込みの結果をセッションに反映する
///
/// 成功すればカメラのエラー表示を消して写真を返し、失敗すればアップローダー内に表示する。
fn settle_file_selection(
    session: &mut CameraSession<BrowserStream>,
    read: Result<SelectedPhoto>,
) -> Option<SelectedPhoto> {
    match read {
        Ok(photo) => {
            session.clear_error();
            Some(photo)
        }
        Err(e) => {
            session.fail(e.to_string());
            None
        }
    }
}
