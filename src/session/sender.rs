//! 一定間隔でチャンクを送出するペースドセンダ
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Sink, SinkExt};
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info};

use super::error::SessionError;
use super::event::{Event, SessionClock};
use super::trace::EventTrace;
use super::SharedSink;

/// ストリーム終端を示す制御メッセージ（バイナリフレームと区別してテキストで送る）
pub(crate) const END_CONTROL_MESSAGE: &str = r#"{"type": "end"}"#;

/// 録音済みチャンク列を実時間ペースで送出するセンダ
pub struct PacedSender {
    interval: Duration,
}

impl PacedSender {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// チャンク列を絶対オフセットスケジュールで送出
    ///
    /// i番目（0始まり）の送信予定時刻は `start + (i+1) * interval`。
    /// 予定より早く送ることはない。遅延時の追い上げは行わない
    /// （基準が絶対時刻のためドリフトは蓄積しない）。
    /// 最終チャンクの後に終端制御メッセージを1回だけ送る。
    pub async fn run<W>(
        &self,
        writer: &SharedSink<W>,
        chunks: &[Bytes],
        iid: &str,
        clock: SessionClock,
        trace: &EventTrace,
        finalized: &AtomicBool,
    ) -> Result<(), SessionError>
    where
        W: Sink<Message, Error = WsError> + Unpin,
    {
        trace.push(Event::Begin {
            timestamp: clock.now(),
            iid: iid.to_string(),
        });
        let start = Instant::now();

        for (index, chunk) in chunks.iter().enumerate() {
            let expected = start + self.interval * (index as u32 + 1);
            sleep_until(expected).await;

            let frame = Message::Binary(chunk.to_vec());
            if let Err(error) = writer.lock().await.send(frame).await {
                return self.write_failure(error, index + 1, iid, finalized);
            }
            trace.push(Event::Sent {
                timestamp: clock.now(),
                iid: iid.to_string(),
                chunk_index: index + 1,
            });
        }

        if let Err(error) = writer
            .lock()
            .await
            .send(Message::Text(END_CONTROL_MESSAGE.into()))
            .await
        {
            return self.write_failure(error, chunks.len(), iid, finalized);
        }
        debug!(iid = %iid, chunks = chunks.len(), "all chunks dispatched");
        Ok(())
    }

    /// 送信失敗の区分け
    ///
    /// コレクタが最終応答を観測して接続を閉じた後の失敗は、期待された
    /// 終端による正常なタスク終了。それ以外は致命的な接続エラー。
    fn write_failure(
        &self,
        error: WsError,
        at_chunk: usize,
        iid: &str,
        finalized: &AtomicBool,
    ) -> Result<(), SessionError> {
        if finalized.load(Ordering::Acquire) {
            info!(iid = %iid, at_chunk, "send loop stopped after final response");
            Ok(())
        } else {
            Err(SessionError::Connection(error))
        }
    }
}
