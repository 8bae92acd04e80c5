//! ブラウザ側のI/O（サービス通信・カメラ・ファイル）

pub mod media;
pub mod transport;
pub mod vto;
