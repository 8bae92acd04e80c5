//! ローカルファイルから送信用の写真を作る

use crate::error::{Result, StudioError};
use std::path::Path;
use vto_common::SelectedPhoto;

/// 画像ファイルを読み込む（形式・サイズは検証しない）
pub async fn load_photo(path: &Path) -> Result<SelectedPhoto> {
    if !path.is_file() {
        return Err(StudioError::FileNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "photo".to_string());

    log::debug!("loaded {} ({} bytes)", filename, bytes.len());
    Ok(SelectedPhoto::from_file(filename, None, bytes))
}
