//! セッションイベントと応答ペイロード
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// セッション内の単調タイムスタンプ（開始からの経過秒）を与える時計
///
/// 両タスクが同じ時計を共有するため、タスクをまたいだ時刻比較が可能。
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// 受信したASR応答のペイロード
///
/// 内容は不透明なJSON値として保持し、コアが解釈するのは
/// `final` と `code` のみ。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResponsePayload(Value);

impl ResponsePayload {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// 認識結果が確定したことを示す終端インジケータ
    pub fn is_final(&self) -> bool {
        self.0.get("final").and_then(Value::as_i64) == Some(1)
    }

    /// 認証応答の `code`（0が成功）
    pub fn code(&self) -> Option<i64> {
        self.0.get("code").and_then(Value::as_i64)
    }
}

/// トレースに記録されるセッションイベント
///
/// シリアライズ形式は出力レコードの契約そのもの
/// （`action_type` / `timestamp` / `iid` / `chunk_index` / `data`）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action_type", rename_all = "lowercase")]
pub enum Event {
    Begin {
        timestamp: f64,
        iid: String,
    },
    Sent {
        timestamp: f64,
        iid: String,
        chunk_index: usize,
    },
    Recv {
        timestamp: f64,
        iid: String,
        data: ResponsePayload,
    },
    End {
        timestamp: f64,
        iid: String,
    },
}

impl Event {
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Begin { timestamp, .. }
            | Event::Sent { timestamp, .. }
            | Event::Recv { timestamp, .. }
            | Event::End { timestamp, .. } => *timestamp,
        }
    }

    pub fn iid(&self) -> &str {
        match self {
            Event::Begin { iid, .. }
            | Event::Sent { iid, .. }
            | Event::Recv { iid, .. }
            | Event::End { iid, .. } => iid,
        }
    }
}
