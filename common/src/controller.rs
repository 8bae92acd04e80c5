//! 画面全体の状態遷移
//!
//! Idle → Processing → Succeeded | Failed。
//! 処理中フラグ・結果・エラーを別々に持たず、1つの列挙型で表す。

use crate::error::{Error, Result};
use crate::types::{ProcessingResult, SelectedPhoto, TemplateGarment};

/// 送信状態
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AppState {
    #[default]
    Idle,
    Processing,
    Succeeded(ProcessingResult),
    Failed(String),
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Idle => "idle",
            AppState::Processing => "processing",
            AppState::Succeeded(_) => "succeeded",
            AppState::Failed(_) => "failed",
        }
    }
}

/// 送信時点の選択内容
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub photo: SelectedPhoto,
    pub template: TemplateGarment,
}

/// 写真・テンプレートの選択と送信状態を持つ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controller {
    photo: Option<SelectedPhoto>,
    template: Option<TemplateGarment>,
    state: AppState,
    /// 選択不足で送信を止めたときのメッセージ
    validation: Option<String>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photo(&self) -> Option<&SelectedPhoto> {
        self.photo.as_ref()
    }

    pub fn template(&self) -> Option<&TemplateGarment> {
        self.template.as_ref()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, AppState::Processing)
    }

    /// 送信ボタンを有効にできるか
    pub fn can_process(&self) -> bool {
        self.photo.is_some() && self.template.is_some() && !self.is_processing()
    }

    /// 写真を置き換える（以前の写真は破棄）
    pub fn select_photo(&mut self, photo: SelectedPhoto) {
        log::debug!("photo selected: {} ({} bytes)", photo.filename, photo.size());
        self.photo = Some(photo);
        self.validation = None;
    }

    pub fn select_template(&mut self, template: TemplateGarment) {
        log::debug!("template selected: {} (id={})", template.display_name, template.id);
        self.template = Some(template);
        self.validation = None;
    }

    /// 送信を開始する
    ///
    /// 両方が揃っていなければ状態を変えずに `Error::Validation` を返す。
    /// 成功時は以前の結果・エラーを消して Processing に入り、送信内容のスナップショットを返す。
    pub fn begin_processing(&mut self) -> Result<ProcessRequest> {
        if self.is_processing() {
            return Err(Error::RequestInFlight);
        }
        let (Some(photo), Some(template)) = (self.photo.clone(), self.template.clone()) else {
            self.validation = Some(Error::Validation.to_string());
            return Err(Error::Validation);
        };
        self.validation = None;
        self.state = AppState::Processing;
        Ok(ProcessRequest { photo, template })
    }

    /// 送信結果を反映する
    ///
    /// Processing 以外（リセット済みなど）で届いた結果は捨てる。
    pub fn finish(&mut self, outcome: Result<ProcessingResult>) {
        if !self.is_processing() {
            log::warn!("discarding outcome received in state '{}'", self.state.as_str());
            return;
        }
        self.state = match outcome {
            Ok(result) => AppState::Succeeded(result),
            Err(e) => AppState::Failed(e.to_string()),
        };
    }

    /// すべての選択と結果を破棄して Idle に戻る
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
