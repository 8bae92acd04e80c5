//! サーバー応答の分類
//!
//! トランスポート（ブラウザのXHR / ネイティブのreqwest）は (ステータス, 本文) だけを渡し、
//! 成功・失敗の判定とメッセージ生成はここで一元的に行う。
//! 到達不能とタイムアウトは応答が無いため、各トランスポートが直接生成する。

use crate::error::{Error, Result, MSG_PROCESSING_FAILED, MSG_UNKNOWN_PROCESSING};
use crate::nocache::{join_base, FreshnessSuffix};
use crate::types::{id_from_value, GarmentDescriptor, HealthStatus, ProcessingResult, ResultMetadata};
use serde::Deserialize;
use serde_json::Value;

/// `/vto` の応答（成功・失敗共通）
#[derive(Deserialize, Default)]
#[serde(default)]
struct VtoResponse {
    success: bool,
    image_url: Option<String>,
    processing_time: Option<f64>,
    clothe_id: Option<Value>,
    clothe_name: Option<String>,
    category: Option<String>,
    model_type: Option<String>,
    metrics: Option<Value>,
    error: Option<String>,
    detail: Option<Value>,
}

impl VtoResponse {
    /// `detail` → `error` の順でサーバーのメッセージを取り出す
    fn server_message(&self) -> Option<String> {
        let detail = self.detail.as_ref().and_then(|d| match d {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        detail
            .or_else(|| self.error.clone())
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    clothes: Vec<Value>,
}

/// `status` 以外は型が揺れても受け付ける
#[derive(Deserialize, Default)]
#[serde(default)]
struct HealthResponse {
    status: Option<Value>,
    detector_ready: Option<Value>,
    clothe_count: Option<Value>,
    performance: Option<Value>,
}

fn flag_from_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn count_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        other => id_from_value(other).unwrap_or(0),
    }
}

#[derive(Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    metrics: Option<Value>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// 成功メッセージ（処理時間は小数2桁）
pub fn success_message(processing_time: f64) -> String {
    format!("Imagen procesada exitosamente en {:.2}s", processing_time)
}

/// `/vto` の応答を結果またはエラーに変換する
///
/// # Arguments
/// * `status` - HTTPステータス
/// * `body` - 応答本文
/// * `base_url` - サービスのベースURL（`image_url` はパスで返る）
/// * `suffix` - 表示用URLに付けるキャッシュ回避サフィックス
pub fn classify_process_response(
    status: u16,
    body: &str,
    base_url: &str,
    suffix: &FreshnessSuffix,
) -> Result<ProcessingResult> {
    let payload = match serde_json::from_str::<VtoResponse>(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("vto response (status {}) is not valid JSON: {}", status, e);
            None
        }
    };

    if !is_success(status) {
        log::error!("vto request failed: status={} body={}", status, body);
        return Err(classify_failure(status, payload.as_ref()));
    }

    let Some(payload) = payload else {
        return Err(Error::ServerRejected(MSG_PROCESSING_FAILED.to_string()));
    };

    if !payload.success {
        let message = payload
            .server_message()
            .unwrap_or_else(|| MSG_UNKNOWN_PROCESSING.to_string());
        log::error!("vto reported failure: {}", message);
        return Err(Error::ServerRejected(message));
    }

    let (Some(image_path), Some(processing_time)) = (payload.image_url.as_deref(), payload.processing_time)
    else {
        log::error!("vto success response is missing image_url or processing_time");
        return Err(Error::ServerRejected(MSG_PROCESSING_FAILED.to_string()));
    };

    let original_url = join_base(base_url, image_path);
    let image_url = suffix.append_to(&original_url);
    log::info!("result image: {}", image_url);

    Ok(ProcessingResult {
        success: true,
        image_url,
        original_url,
        message: success_message(processing_time),
        metadata: ResultMetadata {
            clothe_id: payload.clothe_id.as_ref().and_then(id_from_value),
            clothe_name: payload.clothe_name,
            category: payload.category,
            model_type: payload.model_type,
            processing_time,
            timestamp: suffix.timestamp_ms,
            metrics: payload.metrics,
        },
    })
}

/// 2xx以外の応答を分類する（`detail` → `error` → 404 → 5xx → 汎用）
fn classify_failure(status: u16, payload: Option<&VtoResponse>) -> Error {
    if let Some(message) = payload.and_then(VtoResponse::server_message) {
        return Error::ServerRejected(message);
    }
    match status {
        404 => Error::NotFound,
        500..=599 => Error::ServerError,
        _ => Error::ServerRejected(MSG_PROCESSING_FAILED.to_string()),
    }
}

/// `/clothes` の応答を衣服一覧に変換する
pub fn parse_catalog(status: u16, body: &str) -> Result<Vec<GarmentDescriptor>> {
    if !is_success(status) {
        log::error!("clothes request failed: status={}", status);
        return Err(Error::CatalogUnavailable);
    }
    let response: CatalogResponse = serde_json::from_str(body).map_err(|e| {
        log::error!("clothes response is not valid JSON: {}", e);
        Error::CatalogUnavailable
    })?;
    if !response.success {
        log::error!("clothes response reported failure");
        return Err(Error::CatalogUnavailable);
    }
    let clothes: Vec<GarmentDescriptor> = response
        .clothes
        .into_iter()
        .filter_map(|entry| {
            GarmentDescriptor::try_from(entry)
                .map_err(|e| log::warn!("skipping clothes entry: {}", e))
                .ok()
        })
        .collect();
    log::info!("{} clothes available", response.total.unwrap_or(clothes.len()));
    Ok(clothes)
}

/// `/health` の応答を変換する（失敗しない）
pub fn parse_health(status: u16, body: &str) -> HealthStatus {
    if !is_success(status) {
        log::warn!("health check failed: status={}", status);
        return HealthStatus::unavailable();
    }
    match serde_json::from_str::<HealthResponse>(body) {
        Ok(response) => HealthStatus {
            is_healthy: response.status.as_ref().and_then(Value::as_str) == Some("healthy"),
            detector_ready: response.detector_ready.as_ref().is_some_and(flag_from_value),
            clothe_count: response.clothe_count.as_ref().map_or(0, count_from_value),
            performance: response.performance,
            error: None,
        },
        Err(e) => {
            log::warn!("health response is not valid JSON: {}", e);
            HealthStatus::unavailable()
        }
    }
}

/// `/metrics` の応答からメトリクスを取り出す
pub fn parse_metrics(status: u16, body: &str) -> Result<Value> {
    if !is_success(status) {
        log::error!("metrics request failed: status={}", status);
        return Err(Error::MetricsUnavailable);
    }
    let response: MetricsResponse = serde_json::from_str(body).map_err(|e| {
        log::error!("metrics response is not valid JSON: {}", e);
        Error::MetricsUnavailable
    })?;
    match (response.success, response.metrics) {
        (true, Some(metrics)) => Ok(metrics),
        _ => Err(Error::MetricsUnavailable),
    }
}
