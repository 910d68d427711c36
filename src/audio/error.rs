//! 音声入力のエラー定義
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error(
        "invalid audio format: chunk size computes to zero \
         (sample_rate={sample_rate}, channels={channels}, \
         sample_width_bytes={sample_width_bytes}, chunk_duration_ms={chunk_duration_ms})"
    )]
    InvalidFormat {
        sample_rate: u32,
        channels: u16,
        sample_width_bytes: u16,
        chunk_duration_ms: u32,
    },
    #[error("unsupported wav encoding: {detail}")]
    UnsupportedEncoding { detail: String },
    #[error("failed to read wav file: {path:?}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}
