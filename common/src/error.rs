//! エラー型定義
//!
//! 画面に表示するメッセージはDisplay実装そのもの。
//! 通信失敗の生の原因はログにのみ出し、呼び出し側には分類済みの文言だけを返す。

use thiserror::Error;

/// 選択不足時のメッセージ
pub const MSG_SELECT_BOTH: &str = "Por favor selecciona tu foto y una plantilla";

/// サーバーが原因を返さなかった場合の汎用メッセージ
pub const MSG_PROCESSING_FAILED: &str = "Error al procesar las imágenes";

/// success=false だが error が無い場合
pub const MSG_UNKNOWN_PROCESSING: &str = "Error desconocido en el procesamiento";

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 写真とテンプレートの両方が選ばれていない
    #[error("{}", MSG_SELECT_BOTH)]
    Validation,

    /// 処理中に再度送信しようとした
    #[error("Ya hay una solicitud en curso")]
    RequestInFlight,

    /// カメラの権限拒否・デバイスエラー（アップローダー内で完結）
    #[error("{0}")]
    CameraUnavailable(String),

    /// サーバーが構造化されたエラーを返した
    #[error("{0}")]
    ServerRejected(String),

    #[error("Ropa no encontrada. Verifica el ID de la prenda.")]
    NotFound,

    #[error("Error interno del servidor. Intenta de nuevo más tarde.")]
    ServerError,

    #[error("No se pudo conectar con el servidor. Verifica que esté funcionando.")]
    Unreachable,

    #[error("La petición tardó demasiado. El servidor podría estar sobrecargado.")]
    TimedOut,

    #[error("No se pudo obtener la lista de ropas disponibles")]
    CatalogUnavailable,

    #[error("No se pudieron obtener las métricas del servidor")]
    MetricsUnavailable,

    #[error("No se pudo descargar la imagen")]
    DownloadFailed,

    #[error("No se pudo precargar la imagen")]
    PreloadFailed,

    /// IDがなく名前からも数字が取れない衣服参照
    #[error("No se pudo determinar el ID de la prenda: {0}")]
    UnresolvedGarment(String),

    /// フレームのエンコード失敗・不正なMIMEなど
    #[error("Foto inválida: {0}")]
    Photo(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
