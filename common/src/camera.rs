//! カメラセッション
//!
//! 取得したストリームは `TrackGuard` が所有し、撮影完了・キャンセル・破棄の
//! どの経路でも必ずトラックを停止する。カウントダウンは 3 → 2 → 1 → 0 と表示し、
//! 0 の1秒後に一度だけ撮影する。

/// 取得を要求する解像度と向き
pub const IDEAL_WIDTH: u32 = 640;
pub const IDEAL_HEIGHT: u32 = 480;
pub const FACING_MODE: &str = "user";

/// カウントダウン開始値と1刻みの長さ
pub const COUNTDOWN_START: u8 = 3;
pub const TICK_MS: u32 = 1000;

pub const MSG_CAMERA_DENIED: &str = "No se pudo acceder a la cámara. Verifica los permisos.";
pub const MSG_CAMERA_INIT_FAILED: &str = "Error al inicializar la cámara";

/// 停止できるメディアトラックの集合
pub trait MediaTracks {
    fn stop_all(&mut self);
}

/// トラックの所有権を持ち、解放時に停止する
pub struct TrackGuard<T: MediaTracks> {
    tracks: Option<T>,
}

impl<T: MediaTracks> TrackGuard<T> {
    pub fn new(tracks: T) -> Self {
        Self { tracks: Some(tracks) }
    }

    pub fn tracks(&self) -> Option<&T> {
        self.tracks.as_ref()
    }

    /// 停止は一度だけ
    pub fn release(&mut self) {
        if let Some(mut tracks) = self.tracks.take() {
            tracks.stop_all();
        }
    }
}

impl<T: MediaTracks> Drop for TrackGuard<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// 画面表示用のスナップショット
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraView {
    pub open: bool,
    pub ready: bool,
    pub countdown: Option<u8>,
    pub capturing: bool,
    pub error: Option<String>,
}

impl CameraView {
    /// 撮影ボタンを押せるか
    pub fn can_capture(&self) -> bool {
        self.open && self.ready && self.countdown.is_none() && !self.capturing
    }
}

/// `tick` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// 表示する数字
    Show(u8),
    /// 今フレームを取得する
    Capture,
    /// 進行中のカウントダウンは無い
    Idle,
}

/// カメラの開閉・準備完了・カウントダウンの状態
pub struct CameraSession<T: MediaTracks> {
    guard: Option<TrackGuard<T>>,
    /// open のたびに進む。古い非同期処理の結果を無視するために使う
    epoch: u64,
    ready: bool,
    countdown: Option<u8>,
    capturing: bool,
    error: Option<String>,
}

impl<T: MediaTracks> Default for CameraSession<T> {
    fn default() -> Self {
        Self {
            guard: None,
            epoch: 0,
            ready: false,
            countdown: None,
            capturing: false,
            error: None,
        }
    }
}

impl<T: MediaTracks> CameraSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得したストリームでセッションを開く
    ///
    /// 既に開いていれば先に閉じる。戻り値はこのセッションの世代番号。
    pub fn open(&mut self, tracks: T) -> u64 {
        self.close();
        self.epoch += 1;
        self.guard = Some(TrackGuard::new(tracks));
        log::info!("camera session {} opened", self.epoch);
        self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    pub fn tracks(&self) -> Option<&T> {
        self.guard.as_ref().and_then(TrackGuard::tracks)
    }

    /// 映像のメタデータが届き再生が始まった
    pub fn mark_ready(&mut self, epoch: u64) -> bool {
        if !self.is_open() || epoch != self.epoch {
            return false;
        }
        self.ready = true;
        true
    }

    /// カメラのエラーを記録する（アップローダー内にのみ表示される）
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("camera error: {}", message);
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// カウントダウンを始める
    ///
    /// 準備前・カウントダウン中・撮影中は何もしない。開始した場合は世代番号を返す。
    pub fn start_countdown(&mut self) -> Option<u64> {
        if !self.view().can_capture() {
            return None;
        }
        self.countdown = Some(COUNTDOWN_START);
        Some(self.epoch)
    }

    /// 1秒ごとに呼ぶ
    pub fn tick(&mut self, epoch: u64) -> CountdownStep {
        if epoch != self.epoch || !self.is_open() {
            return CountdownStep::Idle;
        }
        match self.countdown {
            Some(0) => {
                self.countdown = None;
                self.capturing = true;
                CountdownStep::Capture
            }
            Some(n) => {
                self.countdown = Some(n - 1);
                CountdownStep::Show(n - 1)
            }
            None => CountdownStep::Idle,
        }
    }

    /// 撮影後にセッションを閉じる（取得の成否に関わらず）
    pub fn finish_capture(&mut self) {
        self.close();
    }

    /// 写真を出さずに閉じる
    pub fn cancel(&mut self) {
        log::info!("camera session {} cancelled", self.epoch);
        self.close();
    }

    /// トラックを停止し、状態をすべて消す
    pub fn close(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
        self.ready = false;
        self.countdown = None;
        self.capturing = false;
        self.error = None;
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            open: self.is_open(),
            ready: self.ready,
            countdown: self.countdown,
            capturing: self.capturing,
            error: self.error.clone(),
        }
    }
}
