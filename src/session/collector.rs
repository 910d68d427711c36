//! 受信メッセージを収集するレスポンスコレクタ
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{info, warn};

use super::error::SessionError;
use super::event::{Event, ResponsePayload, SessionClock};
use super::trace::EventTrace;
use super::SharedSink;

/// コレクタの終了区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorOutcome {
    /// `final == 1` を観測して正常終了
    Finalized,
    /// 最終応答を観測しないまま接続が閉じた
    AbnormalClose,
}

/// 受信側タスク本体
pub struct ResponseCollector {
    idle_timeout: Option<Duration>,
}

impl ResponseCollector {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self { idle_timeout }
    }

    /// 受信ループ
    ///
    /// テキストフレームをJSONとして解釈し `recv` イベントを積む。
    /// 解釈不能なメッセージは致命的エラーとして伝播する。
    /// `final == 1` を観測したら終端フラグを立てて接続を自ら閉じ、
    /// 正常終了する。終端前に接続が閉じた場合は異常クローズとして
    /// 区別して返す（エラーにはしない）。
    pub async fn run<R, W>(
        &self,
        reader: &mut R,
        writer: &SharedSink<W>,
        iid: &str,
        clock: SessionClock,
        trace: &EventTrace,
        finalized: &AtomicBool,
    ) -> Result<CollectorOutcome, SessionError>
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
        W: Sink<Message, Error = WsError> + Unpin,
    {
        loop {
            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, reader.next()).await {
                    Ok(item) => item,
                    Err(_) => {
                        warn!(iid = %iid, "inbound wait exceeded idle timeout");
                        return Ok(CollectorOutcome::AbnormalClose);
                    }
                },
                None => reader.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    let payload =
                        ResponsePayload::parse(&text).map_err(SessionError::Decode)?;
                    trace.push(Event::Recv {
                        timestamp: clock.now(),
                        iid: iid.to_string(),
                        data: payload.clone(),
                    });
                    if payload.is_final() {
                        finalized.store(true, Ordering::Release);
                        // 期待された終端。接続はこちらから閉じる
                        let _ = writer.lock().await.close().await;
                        info!(iid = %iid, "connection closed normally");
                        return Ok(CollectorOutcome::Finalized);
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    warn!(iid = %iid, "connection closed before final response");
                    return Ok(CollectorOutcome::AbnormalClose);
                }
                Some(Ok(_)) => {
                    // バイナリ/Ping等は応答メッセージとして扱わない
                }
                Some(Err(error)) => {
                    warn!(iid = %iid, error = %error, "connection closed abnormally");
                    return Ok(CollectorOutcome::AbnormalClose);
                }
                None => {
                    warn!(iid = %iid, "connection closed abnormally");
                    return Ok(CollectorOutcome::AbnormalClose);
                }
            }
        }
    }
}
