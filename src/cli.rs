use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vto-studio")]
#[command(about = "仮想試着サービスクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// サービスのベースURL（環境変数 VTO_API_BASE_URL より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真と衣服テンプレートを送信して試着画像を生成
    Process {
        /// 自分の写真
        #[arg(short, long, required = true)]
        photo: PathBuf,

        /// ギャラリーのテンプレートID (1-6)
        #[arg(short, long, conflicts_with = "garment")]
        template: Option<u32>,

        /// サーバーカタログの衣服名（IDが無い場合は名前の数字を使う）
        #[arg(short, long)]
        garment: Option<String>,

        /// 成功時に結果画像を保存するパス
        #[arg(short, long)]
        download: Option<PathBuf>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// ギャラリーのテンプレート一覧
    Templates,

    /// サーバーの衣服カタログ
    Clothes,

    /// サーバー状態
    Health,

    /// サーバーのメトリクス
    Metrics,

    /// 結果画像をダウンロード（キャッシュ回避クエリは除去）
    Download {
        /// 画像URL
        #[arg(required = true)]
        url: String,

        /// 保存先（ファイルまたはディレクトリ）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定管理
    Config {
        /// 既定のベースURLを保存
        #[arg(long)]
        set_base_url: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
