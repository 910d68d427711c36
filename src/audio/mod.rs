//! 音声入力モジュール
//!
//! WAVファイルから生PCMバイト列を読み出し、送信間隔に合わせた
//! フレーム境界アラインのチャンク列へ分割します。分割以降は
//! バイト列を一切加工しません（リサンプル等は行わない）。
mod chunker;
mod error;
mod reader;

pub use chunker::{split_chunks, PcmFormat};
pub use error::AudioError;
pub use reader::WavChunkReader;
