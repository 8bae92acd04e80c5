//! アップロード進捗

/// 送信済みバイト数と総バイト数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// 四捨五入したパーセント（0〜100）
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.loaded as f64 * 100.0 / self.total as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }
}
