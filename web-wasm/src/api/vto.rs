//! 仮想試着サービスのブラウザ版クライアント

use super::transport::{self, XhrRequest};
use js_sys::{Array, Uint8Array};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use vto_common::config::{CLOTHES_PATH, HEALTH_PATH, METRICS_PATH, VTO_PATH};
use vto_common::{
    classify_process_response, create_no_cache_url, parse_catalog, parse_health, parse_metrics,
    strip_query, Error, FreshnessSuffix, GarmentDescriptor, GarmentRef, HealthStatus,
    ProcessingResult, Result, SelectedPhoto, ServiceConfig, UploadProgress,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, FormData, HtmlAnchorElement, HtmlImageElement, Url};

/// ダウンロード時のファイル名
pub const DOWNLOAD_NAME: &str = "vto_result.png";

/// ビルド時の `VTO_API_BASE_URL`、無ければ既定値
pub fn service_config() -> ServiceConfig {
    match option_env!("VTO_API_BASE_URL") {
        Some(url) if !url.trim().is_empty() => ServiceConfig::with_base_url(url.trim()),
        _ => ServiceConfig::default(),
    }
}

pub fn fresh_suffix() -> FreshnessSuffix {
    FreshnessSuffix::new(js_sys::Date::now() as u64, js_sys::Math::random())
}

/// XHR のタイムアウトは u32 ミリ秒
pub fn clamp_timeout(ms: u64) -> u32 {
    ms.min(u32::MAX as u64) as u32
}

fn photo_blob(photo: &SelectedPhoto) -> Result<Blob> {
    let bytes = Uint8Array::from(photo.bytes.as_slice());
    let parts = Array::new();
    parts.push(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(&photo.mime_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| Error::Photo(format!("{:?}", e)))
}

/// 写真と衣服を送信し、合成結果を受け取る
pub async fn process_photos<G>(
    config: &ServiceConfig,
    photo: &SelectedPhoto,
    garment: &G,
    on_progress: Rc<dyn Fn(UploadProgress)>,
) -> Result<ProcessingResult>
where
    G: GarmentRef + ?Sized,
{
    let clothe_id = garment.clothe_id()?;
    log::info!("sending {} + clothe_id={}", photo.filename, clothe_id);

    let form = FormData::new().map_err(|e| Error::Photo(format!("{:?}", e)))?;
    form.append_with_blob_and_filename("person_image", &photo_blob(photo)?, &photo.filename)
        .map_err(|e| Error::Photo(format!("{:?}", e)))?;
    form.append_with_str("clothe_id", &clothe_id.to_string())
        .map_err(|e| Error::Photo(format!("{:?}", e)))?;

    let url = config.endpoint(VTO_PATH);
    let xhr = transport::send(XhrRequest {
        method: "POST",
        url: &url,
        timeout_ms: clamp_timeout(config.process_timeout_ms),
        form: Some(&form),
        headers: &[],
        blob_response: false,
        on_upload_progress: Some(on_progress),
    })
    .await?;

    let (status, body) = transport::read_text(&xhr)?;
    classify_process_response(status, &body, &config.base_url, &fresh_suffix())
}

async fn get_text(url: &str, timeout_ms: u32) -> Result<(u16, String)> {
    let xhr = transport::send(XhrRequest {
        timeout_ms,
        ..XhrRequest::get(url)
    })
    .await?;
    transport::read_text(&xhr)
}

pub async fn get_available_clothes(config: &ServiceConfig) -> Result<Vec<GarmentDescriptor>> {
    let (status, body) = get_text(&config.endpoint(CLOTHES_PATH), 0)
        .await
        .map_err(|_| Error::CatalogUnavailable)?;
    parse_catalog(status, &body)
}

/// サーバー状態（失敗しない）
pub async fn check_server_health(config: &ServiceConfig) -> HealthStatus {
    match get_text(&config.endpoint(HEALTH_PATH), clamp_timeout(config.check_timeout_ms)).await {
        Ok((status, body)) => parse_health(status, &body),
        Err(_) => HealthStatus::unavailable(),
    }
}

pub async fn get_server_metrics(config: &ServiceConfig) -> Result<Value> {
    let (status, body) = get_text(&config.endpoint(METRICS_PATH), clamp_timeout(config.check_timeout_ms))
        .await
        .map_err(|_| Error::MetricsUnavailable)?;
    parse_metrics(status, &body)
}

fn download_failed(e: JsValue) -> Error {
    log::error!("download failed: {:?}", e);
    Error::DownloadFailed
}

/// 結果画像をファイルとして保存させる
///
/// キャッシュ回避クエリを外した正規URLから取得し、
/// 一時的なオブジェクトURL経由でダウンロードを開始する。
pub async fn download_result(url: &str, filename: &str) -> Result<()> {
    let clean_url = strip_query(url);
    let xhr = transport::send(XhrRequest {
        headers: &[
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        blob_response: true,
        ..XhrRequest::get(clean_url)
    })
    .await
    .map_err(|_| Error::DownloadFailed)?;

    let status = xhr.status().map_err(download_failed)?;
    if !(200..300).contains(&status) {
        log::error!("download failed: HTTP {}", status);
        return Err(Error::DownloadFailed);
    }
    let blob: Blob = xhr
        .response()
        .map_err(download_failed)?
        .dyn_into()
        .map_err(download_failed)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(Error::DownloadFailed)?;
    let body = document.body().ok_or(Error::DownloadFailed)?;
    let object_url = Url::create_object_url_with_blob(&blob).map_err(download_failed)?;

    let link: HtmlAnchorElement = document
        .create_element("a")
        .map_err(download_failed)?
        .dyn_into()
        .map_err(|_| Error::DownloadFailed)?;
    link.set_href(&object_url);
    link.set_download(filename);
    let clicked = body.append_child(&link).map(|_| {
        link.click();
        let _ = body.remove_child(&link);
    });
    let _ = Url::revoke_object_url(&object_url);
    clicked.map_err(download_failed)?;

    log::info!("downloaded {} ({} bytes)", filename, blob.size());
    Ok(())
}

/// 画像を先読みし、表示前に読み込めることを確認する
pub async fn preload_image(url: &str) -> Result<HtmlImageElement> {
    let img = HtmlImageElement::new().map_err(|_| Error::PreloadFailed)?;
    img.set_cross_origin(Some("anonymous"));

    let (tx, rx) = futures::channel::oneshot::channel::<bool>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let settle = |loaded: bool| {
        let tx = tx.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(loaded);
            }
        })
    };
    let on_load = settle(true);
    let on_error = settle(false);
    img.set_onload(Some(on_load.as_ref().unchecked_ref()));
    img.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    img.set_src(&create_no_cache_url(url, &fresh_suffix()));

    let loaded = rx.await.unwrap_or(false);
    img.set_onload(None);
    img.set_onerror(None);

    if loaded {
        log::info!("preloaded {}x{} image", img.natural_width(), img.natural_height());
        Ok(img)
    } else {
        log::error!("preload failed: {}", url);
        Err(Error::PreloadFailed)
    }
}

