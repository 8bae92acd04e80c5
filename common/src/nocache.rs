//! キャッシュ回避URL
//!
//! 同じパスで結果画像が上書きされるため、表示用URLには毎回
//! `t=<エポックミリ秒>&nocache=<9文字>` を付ける。ダウンロード時は外す。

const TOKEN_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 鮮度サフィックス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessSuffix {
    pub timestamp_ms: u64,
    pub token: String,
}

impl FreshnessSuffix {
    /// # Arguments
    /// * `timestamp_ms` - 現在時刻（エポックミリ秒）
    /// * `entropy` - `[0, 1)` の乱数（ブラウザは `Math.random`、ネイティブは `rand`）
    pub fn new(timestamp_ms: u64, entropy: f64) -> Self {
        Self {
            timestamp_ms,
            token: base36_token(entropy),
        }
    }

    pub fn query(&self) -> String {
        format!("t={}&nocache={}", self.timestamp_ms, self.token)
    }

    /// 既存のクエリの有無に関わらずサフィックスを付ける
    pub fn append_to(&self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", url, separator, self.query())
    }
}

/// 小数部を36進で9桁に展開する
fn base36_token(entropy: f64) -> String {
    let mut fraction = if entropy.is_finite() { entropy.fract().abs() } else { 0.0 };
    let mut token = String::with_capacity(TOKEN_LEN);
    for _ in 0..TOKEN_LEN {
        fraction *= 36.0;
        let digit = (fraction.floor() as usize).min(35);
        token.push(BASE36[digit] as char);
        fraction -= digit as f64;
    }
    token
}

/// サフィックスが無ければ付ける
pub fn create_no_cache_url(url: &str, suffix: &FreshnessSuffix) -> String {
    if has_freshness_suffix(url) {
        url.to_string()
    } else {
        suffix.append_to(url)
    }
}

/// URLが `t=` か `nocache=` のクエリを既に持っているか
pub fn has_freshness_suffix(url: &str) -> bool {
    url.split_once('?')
        .map(|(_, query)| {
            query
                .split('&')
                .any(|pair| pair.starts_with("t=") || pair.starts_with("nocache="))
        })
        .unwrap_or(false)
}

/// クエリ部を除いた正規URL
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// ベースURLとサーバーが返したパスを結合する
///
/// パスが既に絶対URLならそのまま返す。
pub fn join_base(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
