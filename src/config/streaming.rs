//! ストリーミングセッションに関する設定値
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// チャンク送信間隔（ミリ秒）
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    /// 1チャンクあたりの音声長（ミリ秒）
    #[serde(default = "default_chunk_duration_ms")]
    pub chunk_duration_ms: u32,
    /// VAD無音判定パラメータ（ミリ秒）
    #[serde(default = "default_vad_silence_ms")]
    pub vad_silence_ms: u32,
    /// 認証応答の `code != 0` をエラーとして扱うか
    #[serde(default = "default_strict_handshake")]
    pub strict_handshake: bool,
    /// 認証応答の待機上限（ミリ秒）
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// 受信メッセージ間の待機上限（ミリ秒、未設定なら無制限）
    #[serde(default)]
    pub recv_idle_timeout_ms: Option<u64>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: default_send_interval_ms(),
            chunk_duration_ms: default_chunk_duration_ms(),
            vad_silence_ms: default_vad_silence_ms(),
            strict_handshake: default_strict_handshake(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            recv_idle_timeout_ms: None,
        }
    }
}

fn default_send_interval_ms() -> u64 {
    40
}

fn default_chunk_duration_ms() -> u32 {
    40
}

fn default_vad_silence_ms() -> u32 {
    240
}

fn default_strict_handshake() -> bool {
    true
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}
