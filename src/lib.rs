//! vto-studio: 仮想試着サービスのネイティブクライアント

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod photo;
