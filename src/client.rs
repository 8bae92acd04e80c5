//! 仮想試着サービスのHTTPクライアント
//!
//! 応答の判定は `vto_common::classify` に任せ、ここでは通信と
//! トランスポート由来の失敗（到達不能・タイムアウト）の分類だけを行う。

use crate::error::{Result as StudioResult, StudioError};
use futures::stream;
use image::DynamicImage;
use reqwest::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vto_common::config::{CLOTHES_PATH, HEALTH_PATH, METRICS_PATH, VTO_PATH};
use vto_common::{
    classify_process_response, create_no_cache_url, parse_catalog, parse_health, parse_metrics,
    strip_query, Error, FreshnessSuffix, GarmentDescriptor, GarmentRef, HealthStatus,
    ProcessingResult, Result, SelectedPhoto, ServiceConfig, UploadProgress,
};

/// ストリーム送信の1チャンク
const UPLOAD_CHUNK: usize = 64 * 1024;

/// ダウンロード先がディレクトリでURLから名前が取れない場合
pub const DEFAULT_DOWNLOAD_NAME: &str = "vto_result.png";

/// 現在時刻と乱数からキャッシュ回避サフィックスを作る
pub fn fresh_suffix() -> FreshnessSuffix {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    FreshnessSuffix::new(now, rand::random::<f64>())
}

/// 応答を受け取れなかった失敗を分類する（原因はログのみ）
fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        log::error!("request timed out: {}", e);
        Error::TimedOut
    } else {
        log::error!("request failed: {}", e);
        Error::Unreachable
    }
}

pub struct VtoClient {
    http: Client,
    config: ServiceConfig,
}

impl VtoClient {
    pub fn new(config: ServiceConfig) -> StudioResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("vto-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StudioError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// 写真と衣服を送信し、合成結果を受け取る
    ///
    /// # Arguments
    /// * `photo` - 選択中の写真
    /// * `garment` - テンプレートまたはサーバーカタログの衣服
    /// * `on_progress` - 送信進捗のコールバック（戻り値の契約には含まれない）
    pub async fn process_photos<G, F>(
        &self,
        photo: &SelectedPhoto,
        garment: &G,
        on_progress: F,
    ) -> Result<ProcessingResult>
    where
        G: GarmentRef + ?Sized,
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        let clothe_id = garment.clothe_id()?;
        log::info!("sending {} + clothe_id={}", photo.filename, clothe_id);

        let total = photo.bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = photo.bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
        let mut loaded = 0u64;
        let body = Body::wrap_stream(stream::iter(chunks.into_iter().map(move |chunk| {
            loaded += chunk.len() as u64;
            on_progress(UploadProgress::new(loaded, total));
            Ok::<_, std::io::Error>(chunk)
        })));

        let part = Part::stream_with_length(body, total)
            .file_name(photo.filename.clone())
            .mime_str(&photo.mime_type)
            .map_err(|e| Error::Photo(e.to_string()))?;
        let form = Form::new()
            .part("person_image", part)
            .text("clothe_id", clothe_id.to_string());

        let response = self
            .http
            .post(self.config.endpoint(VTO_PATH))
            .multipart(form)
            .timeout(self.config.process_timeout())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        classify_process_response(status, &body, &self.config.base_url, &fresh_suffix())
    }

    async fn get_text(&self, path: &str, timeout: Option<Duration>) -> Result<(u16, String)> {
        let mut request = self.http.get(self.config.endpoint(path));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok((status, body))
    }

    /// サーバーの衣服カタログ
    pub async fn get_available_clothes(&self) -> Result<Vec<GarmentDescriptor>> {
        let (status, body) = self
            .get_text(CLOTHES_PATH, None)
            .await
            .map_err(|_| Error::CatalogUnavailable)?;
        parse_catalog(status, &body)
    }

    /// サーバー状態（失敗しない）
    pub async fn check_server_health(&self) -> HealthStatus {
        match self.get_text(HEALTH_PATH, Some(self.config.check_timeout())).await {
            Ok((status, body)) => parse_health(status, &body),
            Err(_) => HealthStatus::unavailable(),
        }
    }

    pub async fn get_server_metrics(&self) -> Result<Value> {
        let (status, body) = self
            .get_text(METRICS_PATH, Some(self.config.check_timeout()))
            .await
            .map_err(|_| Error::MetricsUnavailable)?;
        parse_metrics(status, &body)
    }

    /// 結果画像を保存する
    ///
    /// キャッシュ回避クエリを外した正規URLから取得する。
    /// `dest` がディレクトリならURL末尾のファイル名で保存する。
    pub async fn download_result(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let clean_url = strip_query(url);
        let target = if dest.is_dir() {
            let name = clean_url
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_DOWNLOAD_NAME);
            dest.join(name)
        } else {
            dest.to_path_buf()
        };

        let response = self
            .http
            .get(clean_url)
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                log::error!("download failed: {}", e);
                Error::DownloadFailed
            })?;

        let bytes = response.bytes().await.map_err(|e| {
            log::error!("download body failed: {}", e);
            Error::DownloadFailed
        })?;

        tokio::fs::write(&target, &bytes).await.map_err(|e| {
            log::error!("cannot write {}: {}", target.display(), e);
            Error::DownloadFailed
        })?;

        log::info!("downloaded {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    /// 結果画像を取得してデコードできることを確認する
    pub async fn preload_image(&self, url: &str) -> Result<DynamicImage> {
        let url = create_no_cache_url(url, &fresh_suffix());
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                log::error!("preload failed: {}", e);
                Error::PreloadFailed
            })?;
        let bytes = response.bytes().await.map_err(|_| Error::PreloadFailed)?;

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|_| Error::PreloadFailed)?
            .map_err(|e| {
                log::error!("preloaded image cannot be decoded: {}", e);
                Error::PreloadFailed
            })?;
        log::debug!("preloaded {}x{} image", decoded.width(), decoded.height());
        Ok(decoded)
    }
}
