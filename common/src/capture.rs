//! 写真の正規化
//!
//! ファイル選択・カメラ撮影のどちらからでも同じ `SelectedPhoto` を作る。

use crate::error::{Error, Result};
use crate::types::SelectedPhoto;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// 撮影フレームのJPEG品質（0.8相当）
pub const JPEG_QUALITY: u8 = 80;

/// 撮影写真のファイル名
pub fn capture_filename(epoch_ms: u64) -> String {
    format!("foto_{}.jpg", epoch_ms)
}

/// 表示用Data URI
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 拡張子からMIMEタイプを推定
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// RGBAフレームをJPEGにエンコードする
///
/// # Arguments
/// * `rgba` - キャンバスから取り出した画素（幅×高さ×4バイト）
/// * `quality` - 1〜100
pub fn encode_jpeg_frame(rgba: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::Photo("el video aún no tiene dimensiones".to_string()));
    }
    let frame = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
        Error::Photo(format!(
            "tamaño de frame inesperado: {} bytes para {}x{}",
            rgba.len(),
            width,
            height
        ))
    })?;

    // JPEGはアルファを持たない
    let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();
    let mut buffer = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)))
        .map_err(|e| Error::Photo(e.to_string()))?;
    Ok(buffer)
}

impl SelectedPhoto {
    /// ユーザーが選んだファイルから作る（形式・サイズは検証しない）
    ///
    /// # Arguments
    /// * `mime_type` - ブラウザが報告したタイプ。空なら拡張子から推定
    pub fn from_file(filename: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| guess_mime(&filename))
            .to_string();
        Self {
            preview: to_data_uri(&mime_type, &bytes),
            bytes,
            filename,
            mime_type,
        }
    }

    /// カメラのフレームから作る
    pub fn from_frame(rgba: &[u8], width: u32, height: u32, epoch_ms: u64) -> Result<Self> {
        let bytes = encode_jpeg_frame(rgba, width, height, JPEG_QUALITY)?;
        Ok(Self {
            preview: to_data_uri("image/jpeg", &bytes),
            bytes,
            filename: capture_filename(epoch_ms),
            mime_type: "image/jpeg".to_string(),
        })
    }
}
