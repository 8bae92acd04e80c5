//! テスト用のHTTPスタブ（axum）
//!
//! 127.0.0.1:0 で待ち受け、メソッドとパスごとに固定の応答を返す。
//! 受け取ったリクエストは本文とmultipartのフィールドごとに記録する。

#![allow(dead_code)]

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            content_type: "application/json",
            delay: Duration::ZERO,
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>, content_type: &'static str) -> Self {
        Self {
            status,
            body,
            content_type,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// multipartの1フィールド
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// クエリを含むパス
    pub target: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub fields: Vec<FormField>,
}

impl Recorded {
    pub fn body_contains(&self, needle: &str) -> bool {
        let needle = needle.as_bytes();
        self.body.windows(needle.len()).any(|w| w == needle)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|f| String::from_utf8_lossy(&f.data).to_string())
    }
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

type Handler = Arc<dyn Fn(&str, &str) -> StubResponse + Send + Sync>;

#[derive(Clone)]
struct Stub {
    handler: Handler,
    log: Log,
}

/// スタブを起動し、ベースURLと記録を返す
pub async fn spawn_stub<F>(handler: F) -> (String, Log)
where
    F: Fn(&str, &str) -> StubResponse + Send + Sync + 'static,
{
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        handler: Arc::new(handler),
        log: log.clone(),
    };
    let app = Router::new().fallback(record_and_reply).with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), log)
}

/// 接続を拒否されるアドレス（一度バインドしてすぐ閉じる）
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

async fn record_and_reply(State(stub): State<Stub>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let method = parts.method.to_string();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let fields = form_fields(&parts.headers, body.clone()).await;

    stub.log.lock().unwrap().push(Recorded {
        method: method.clone(),
        target: target.clone(),
        headers: parts.headers,
        body,
        fields,
    });

    let reply = (stub.handler)(&method, &target);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}

async fn form_fields(headers: &HeaderMap, body: Bytes) -> Vec<FormField> {
    let is_multipart = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !is_multipart {
        return Vec::new();
    }

    let mut request = Request::new(Body::from(body));
    *request.headers_mut() = headers.clone();
    let Ok(mut multipart) = Multipart::from_request(request, &()).await else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let Ok(data) = field.bytes().await else {
            break;
        };
        fields.push(FormField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    fields
}
