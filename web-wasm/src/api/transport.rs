//! XMLHttpRequest によるHTTP送受信
//!
//! fetch では送信進捗が取れないため XHR を使う。
//! 応答の判定は呼び出し側が `vto_common::classify` で行う。

use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;
use vto_common::{Error, Result, UploadProgress};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, FormData, ProgressEvent, XmlHttpRequest, XmlHttpRequestResponseType};

#[derive(Clone, Copy, Debug)]
enum Outcome {
    Loaded,
    Failed,
    TimedOut,
}

/// 1回分のリクエスト
pub struct XhrRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    /// 0 は無制限
    pub timeout_ms: u32,
    pub form: Option<&'a FormData>,
    pub headers: &'a [(&'a str, &'a str)],
    pub blob_response: bool,
    pub on_upload_progress: Option<Rc<dyn Fn(UploadProgress)>>,
}

impl<'a> XhrRequest<'a> {
    pub fn get(url: &'a str) -> Self {
        Self {
            method: "GET",
            url,
            timeout_ms: 0,
            form: None,
            headers: &[],
            blob_response: false,
            on_upload_progress: None,
        }
    }
}

fn js_unreachable(e: JsValue) -> Error {
    log::error!("xhr setup failed: {:?}", e);
    Error::Unreachable
}

/// 送信して完了を待つ
///
/// 応答が届けばステータスに関係なく `Ok`。
/// 届かなければ `TimedOut` か `Unreachable`。
pub async fn send(request: XhrRequest<'_>) -> Result<XmlHttpRequest> {
    let xhr = XmlHttpRequest::new().map_err(js_unreachable)?;
    xhr.open_with_async(request.method, request.url, true)
        .map_err(js_unreachable)?;
    xhr.set_timeout(request.timeout_ms);
    if request.blob_response {
        xhr.set_response_type(XmlHttpRequestResponseType::Blob);
    }
    for (name, value) in request.headers {
        xhr.set_request_header(name, value).map_err(js_unreachable)?;
    }

    let (tx, rx) = oneshot::channel::<Outcome>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let settle = |outcome: Outcome| {
        let tx = tx.clone();
        Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(outcome);
            }
        })
    };
    let on_load = settle(Outcome::Loaded);
    let on_error = settle(Outcome::Failed);
    let on_abort = settle(Outcome::Failed);
    let on_timeout = settle(Outcome::TimedOut);
    xhr.set_onload(Some(on_load.as_ref().unchecked_ref()));
    xhr.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    xhr.set_onabort(Some(on_abort.as_ref().unchecked_ref()));
    xhr.set_ontimeout(Some(on_timeout.as_ref().unchecked_ref()));

    let on_progress = request.on_upload_progress.map(|callback| {
        Closure::<dyn FnMut(ProgressEvent)>::new(move |ev: ProgressEvent| {
            if ev.length_computable() {
                callback(UploadProgress::new(ev.loaded() as u64, ev.total() as u64));
            }
        })
    });
    if let Some(handler) = &on_progress {
        let upload = xhr.upload().map_err(js_unreachable)?;
        upload.set_onprogress(Some(handler.as_ref().unchecked_ref()));
    }

    match request.form {
        Some(form) => xhr.send_with_opt_form_data(Some(form)),
        None => xhr.send(),
    }
    .map_err(js_unreachable)?;

    let outcome = rx.await.unwrap_or(Outcome::Failed);

    // クロージャ解放前にハンドラを外す
    xhr.set_onload(None);
    xhr.set_onerror(None);
    xhr.set_onabort(None);
    xhr.set_ontimeout(None);
    if on_progress.is_some() {
        if let Ok(upload) = xhr.upload() {
            upload.set_onprogress(None);
        }
    }

    match outcome {
        Outcome::Loaded => Ok(xhr),
        Outcome::Failed => {
            log::error!("{} {} failed: network error", request.method, request.url);
            Err(Error::Unreachable)
        }
        Outcome::TimedOut => {
            log::error!("{} {} timed out", request.method, request.url);
            Err(Error::TimedOut)
        }
    }
}

/// ステータスとテキスト本文
pub fn read_text(xhr: &XmlHttpRequest) -> Result<(u16, String)> {
    let status = xhr.status().map_err(js_unreachable)?;
    let body = xhr
        .response_text()
        .map_err(js_unreachable)?
        .unwrap_or_default();
    Ok((status, body))
}
