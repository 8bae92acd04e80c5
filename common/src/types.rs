//! 試着処理で扱う型の定義
//!
//! Web(WASM)とネイティブクライアントで共有される型:
//! - SelectedPhoto: ユーザーが選んだ写真（ファイル or カメラ撮影）
//! - TemplateGarment: ギャラリーに並ぶ固定の衣服テンプレート
//! - GarmentDescriptor: サーバーの `/clothes` が返す衣服情報
//! - ProcessingResult: `/vto` 成功時の正規化済み結果
//! - HealthStatus: `/health` の正規化済み結果

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 選択中の写真
///
/// 選び直すたびに丸ごと置き換えられ、部分的に書き換えられることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPhoto {
    /// 送信するバイナリ本体
    pub bytes: Vec<u8>,
    /// 表示用のData URI
    pub preview: String,
    pub filename: String,
    pub mime_type: String,
}

impl SelectedPhoto {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// ギャラリーの衣服テンプレート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateGarment {
    pub id: u32,
    pub display_name: String,
    pub asset_url: String,
}

/// `/clothes` が返す衣服情報
///
/// サーバー側のスキーマは固定されていないため、既知のフィールド以外は `extra` に残す。
/// 読み込みは寛容で、IDは数値・文字列・`clothe_id` のいずれでもよい。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct GarmentDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const DESCRIPTOR_KEYS: [&str; 5] = ["id", "clothe_id", "name", "clothe_name", "category"];

/// 数値または数字の文字列をIDとして読む
pub(crate) fn id_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl TryFrom<Value> for GarmentDescriptor {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(format!("garment entry is not an object: {}", other)),
        };

        let id = ["id", "clothe_id"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(id_from_value));
        let name = ["name", "clothe_name"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();
        let category = fields
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string);

        for key in DESCRIPTOR_KEYS {
            fields.remove(key);
        }

        Ok(Self {
            id,
            name,
            category,
            extra: fields,
        })
    }
}

/// 処理結果のメタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub clothe_id: Option<u32>,
    pub clothe_name: Option<String>,
    pub category: Option<String>,
    pub model_type: Option<String>,
    /// サーバーが報告した処理時間（秒）
    pub processing_time: f64,
    /// キャッシュ回避サフィックスに使ったエポックミリ秒
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
}

/// `/vto` 成功時の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub success: bool,
    /// キャッシュ回避サフィックス付きの表示用URL
    pub image_url: String,
    /// サフィックスなしの正規URL
    pub original_url: String,
    pub message: String,
    pub metadata: ResultMetadata,
}

/// サーバー状態
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub detector_ready: bool,
    pub clothe_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// 到達不能・応答不正時の値
    pub fn unavailable() -> Self {
        Self {
            error: Some("Servidor no disponible".to_string()),
            ..Default::default()
        }
    }
}
