//! 入出力ディレクトリに関する設定値
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IoConfig {
    /// WAVファイルを読み込むディレクトリ
    pub input_dir: PathBuf,
    /// イベントトレースJSONの出力先ディレクトリ
    pub output_dir: PathBuf,
}
