//! 接続先ASRエンドポイントに関する設定値
use serde::Deserialize;

/// 署名付きURI生成に必要なエンドポイント情報
///
/// `base_url` は `wss://` スキームを含む完全なプレフィックス、
/// `sign_path` はスキームを除いた署名対象のパス文字列。
/// どちらも末尾の `?` まで含める。
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub sign_path: String,
    pub engine_model_type: String,
    pub voice_format: u32,
    pub needvad: u32,
    /// 認証用シークレットID（空文字列可）
    #[serde(default)]
    pub secret_id: String,
    /// 署名鍵（空文字列可）
    #[serde(default)]
    pub secret_key: String,
    /// `expired` パラメータに加算する有効期間（秒）
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: i64,
}

fn default_expiry_secs() -> i64 {
    86_400
}
