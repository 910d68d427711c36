//! PCMバイト列のチャンク分割
use bytes::Bytes;

use super::error::AudioError;

/// 読み込んだPCMデータのフォーマット情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_width_bytes: u16,
}

impl PcmFormat {
    /// 指定ミリ秒ぶんのチャンクのバイト長を計算
    ///
    /// `floor(sample_rate * ms / 1000)` フレーム × チャネル数 × サンプル幅。
    pub fn chunk_byte_len(&self, chunk_duration_ms: u32) -> usize {
        let frames = (self.sample_rate as u64 * chunk_duration_ms as u64 / 1000) as usize;
        frames * self.channels as usize * self.sample_width_bytes as usize
    }
}

/// PCMバイト列を等長チャンクへ分割
///
/// 末尾チャンクのみ短くなることがある（パディングなし）。
/// 空入力は空の列を返す。チャンク長が0になるフォーマットはエラー。
pub fn split_chunks(
    pcm: &[u8],
    format: &PcmFormat,
    chunk_duration_ms: u32,
) -> Result<Vec<Bytes>, AudioError> {
    let chunk_size = format.chunk_byte_len(chunk_duration_ms);
    if chunk_size == 0 {
        return Err(AudioError::InvalidFormat {
            sample_rate: format.sample_rate,
            channels: format.channels,
            sample_width_bytes: format.sample_width_bytes,
            chunk_duration_ms,
        });
    }

    if pcm.is_empty() {
        return Ok(Vec::new());
    }

    Ok(pcm.chunks(chunk_size).map(Bytes::copy_from_slice).collect())
}
