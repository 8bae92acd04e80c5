//! Virtual Try-On Common Library
//!
//! Web(WASM)とネイティブクライアントで共有される型・状態遷移・ユーティリティ

pub mod types;
pub mod error;
pub mod catalog;
pub mod garment;
pub mod nocache;
pub mod classify;
pub mod controller;
pub mod camera;
pub mod capture;
pub mod progress;
pub mod config;

pub use types::{
    GarmentDescriptor, HealthStatus, ProcessingResult, ResultMetadata, SelectedPhoto,
    TemplateGarment,
};
pub use error::{Error, Result};
pub use catalog::{find_template, templates};
pub use garment::{resolve_clothe_id, GarmentRef};
pub use nocache::{create_no_cache_url, has_freshness_suffix, join_base, strip_query, FreshnessSuffix};
pub use classify::{classify_process_response, parse_catalog, parse_health, parse_metrics};
pub use controller::{AppState, Controller, ProcessRequest};
pub use camera::{CameraSession, CameraView, CountdownStep, MediaTracks, TrackGuard};
pub use progress::UploadProgress;
pub use config::ServiceConfig;
