//! カメラとファイルからの写真取得

use futures::channel::oneshot;
use futures::future::{self, Either};
use js_sys::{Object, Reflect, Uint8Array};
use std::cell::RefCell;
use std::rc::Rc;
use vto_common::camera::{FACING_MODE, IDEAL_HEIGHT, IDEAL_WIDTH, MSG_CAMERA_DENIED, MSG_CAMERA_INIT_FAILED};
use vto_common::{Error, MediaTracks, Result, SelectedPhoto};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, File, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

/// HTMLMediaElement.HAVE_METADATA
const HAVE_METADATA: u16 = 1;

/// getUserMedia で得たストリーム
pub struct BrowserStream {
    stream: MediaStream,
}

impl BrowserStream {
    pub fn new(stream: MediaStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }
}

impl MediaTracks for BrowserStream {
    fn stop_all(&mut self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

fn camera_denied(e: JsValue) -> Error {
    log::error!("getUserMedia failed: {:?}", e);
    Error::CameraUnavailable(MSG_CAMERA_DENIED.to_string())
}

fn camera_init_failed(e: JsValue) -> Error {
    log::error!("camera preview failed: {:?}", e);
    Error::CameraUnavailable(MSG_CAMERA_INIT_FAILED.to_string())
}

fn ideal(value: u32) -> JsValue {
    let constraint = Object::new();
    let _ = Reflect::set(&constraint, &"ideal".into(), &value.into());
    constraint.into()
}

/// 前面カメラ 640x480 を要求する
pub async fn request_camera() -> Result<MediaStream> {
    let devices = web_sys::window()
        .ok_or_else(|| camera_denied(JsValue::from_str("no window")))?
        .navigator()
        .media_devices()
        .map_err(camera_denied)?;

    let video = Object::new();
    let _ = Reflect::set(&video, &"width".into(), &ideal(IDEAL_WIDTH));
    let _ = Reflect::set(&video, &"height".into(), &ideal(IDEAL_HEIGHT));
    let _ = Reflect::set(&video, &"facingMode".into(), &FACING_MODE.into());
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);
    constraints.set_audio(&JsValue::FALSE);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(camera_denied)?;
    JsFuture::from(promise)
        .await
        .map_err(camera_denied)?
        .dyn_into::<MediaStream>()
        .map_err(camera_denied)
}

/// メタデータ到着を待ってから再生を始める
///
/// `cancelled` が送信または破棄されると待機をやめて `CameraUnavailable` を返す。
pub async fn start_preview(
    video: &HtmlVideoElement,
    stream: &MediaStream,
    cancelled: oneshot::Receiver<()>,
) -> Result<()> {
    video.set_muted(true);
    video.set_autoplay(true);
    let _ = video.set_attribute("playsinline", "");
    video.set_src_object(Some(stream));

    if video.ready_state() < HAVE_METADATA {
        let (tx, rx) = oneshot::channel::<()>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let on_metadata = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(());
            }
        });
        video.set_onloadedmetadata(Some(on_metadata.as_ref().unchecked_ref()));
        let arrived = matches!(future::select(rx, cancelled).await, Either::Left((Ok(()), _)));
        video.set_onloadedmetadata(None);
        if !arrived {
            log::info!("camera preview abandoned before metadata");
            return Err(Error::CameraUnavailable(MSG_CAMERA_INIT_FAILED.to_string()));
        }
    }

    let playing = video.play().map_err(camera_init_failed)?;
    JsFuture::from(playing).await.map_err(camera_init_failed)?;
    Ok(())
}

pub fn detach(video: &HtmlVideoElement) {
    video.set_src_object(None);
}

/// 現在のフレームをJPEGの写真にする
pub fn grab_frame(video: &HtmlVideoElement, canvas: &HtmlCanvasElement) -> Result<SelectedPhoto> {
    let (width, height) = (video.video_width(), video.video_height());
    if width == 0 || height == 0 {
        return Err(Error::Photo("frame not available".to_string()));
    }
    canvas.set_width(width);
    canvas.set_height(height);

    let context = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| Error::Photo("canvas 2d context not available".to_string()))?;
    context
        .draw_image_with_html_video_element(video, 0.0, 0.0)
        .map_err(|e| Error::Photo(format!("{:?}", e)))?;
    let frame = context
        .get_image_data(0.0, 0.0, width as f64, height as f64)
        .map_err(|e| Error::Photo(format!("{:?}", e)))?;

    SelectedPhoto::from_frame(&frame.data().0, width, height, js_sys::Date::now() as u64)
}

/// ファイル選択の写真を読み込む
pub async fn read_photo_file(file: File) -> Result<SelectedPhoto> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| Error::Photo(format!("{:?}", e)))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    log::info!("selected {} ({} bytes)", file.name(), bytes.len());
    Ok(SelectedPhoto::from_file(file.name(), Some(file.type_().as_str()), bytes))
}
