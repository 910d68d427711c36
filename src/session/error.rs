//! セッション実行時のエラー定義
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection error: {0}")]
    Connection(#[from] tungstenite::Error),
    #[error("malformed inbound message")]
    Decode(#[source] serde_json::Error),
    #[error("handshake failed: {message}")]
    Handshake { message: String },
    #[error("handshake rejected with code {code}")]
    HandshakeRejected { code: i64 },
}
