//! WAVファイルの読み込みとチャンク化
use std::path::Path;

use bytes::Bytes;
use hound::{SampleFormat, WavReader};

use super::chunker::{split_chunks, PcmFormat};
use super::error::AudioError;

/// WAVファイルを読み込み、送信用チャンク列へ分割するリーダ
///
/// 対応フォーマットは16bit整数PCMのみ。サンプルはファイル順のまま
/// リトルエンディアンのバイト列に展開される。
#[derive(Debug, Clone, Copy)]
pub struct WavChunkReader {
    chunk_duration_ms: u32,
}

impl WavChunkReader {
    pub fn new(chunk_duration_ms: u32) -> Self {
        Self { chunk_duration_ms }
    }

    /// ファイル全体のPCMバイト列とフォーマット情報を取得
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<(Vec<u8>, PcmFormat), AudioError> {
        let path = path.as_ref();
        let reader = WavReader::open(path).map_err(|source| AudioError::Wav {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(AudioError::UnsupportedEncoding {
                detail: format!(
                    "expected 16bit int PCM, got {:?} {}bit",
                    spec.sample_format, spec.bits_per_sample
                ),
            });
        }

        let format = PcmFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            sample_width_bytes: (spec.bits_per_sample / 8) as u16,
        };

        let mut pcm = Vec::new();
        for sample in reader.into_samples::<i16>() {
            let sample = sample.map_err(|source| AudioError::Wav {
                path: path.to_path_buf(),
                source,
            })?;
            pcm.extend_from_slice(&sample.to_le_bytes());
        }

        Ok((pcm, format))
    }

    /// ファイルを読み込み、チャンク列へ分割
    pub fn read_chunks<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Bytes>, AudioError> {
        let (pcm, format) = self.read(path)?;
        split_chunks(&pcm, &format, self.chunk_duration_ms)
    }
}
