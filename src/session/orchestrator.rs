//! セッションの開始から完了までを統括するオーケストレータ
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{info, warn};

use crate::auth::make_uid;
use crate::config::StreamingConfig;

use super::collector::{CollectorOutcome, ResponseCollector};
use super::error::SessionError;
use super::event::{Event, ResponsePayload, SessionClock};
use super::sender::PacedSender;
use super::trace::EventTrace;

/// 署名付き接続URIの供給元
///
/// 本番実装は `auth::SignedUriBuilder`。テストでは固定URIを返す
/// 実装に差し替える。
pub trait EndpointProvider: Send + Sync {
    fn signed_uri(&self, vad_silence_ms: u32) -> String;
}

/// セッション全体の結果区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 最終応答を観測して完了
    Finalized,
    /// 最終応答を観測しないまま接続が閉じた（部分トレースは有効）
    AbnormalClose,
}

/// 1セッションの実行結果。イベントトレースが主生成物
#[derive(Debug)]
pub struct SessionReport {
    pub iid: String,
    pub outcome: SessionOutcome,
    pub events: Vec<Event>,
}

impl SessionReport {
    /// イベント列を整形JSONとして書き出す
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(path, json)
    }
}

/// 1接続＝1セッションのライフサイクルを所有するオーケストレータ
pub struct SessionOrchestrator<E: EndpointProvider> {
    streaming: StreamingConfig,
    endpoint: E,
}

impl<E: EndpointProvider> SessionOrchestrator<E> {
    pub fn new(streaming: StreamingConfig, endpoint: E) -> Self {
        Self {
            streaming,
            endpoint,
        }
    }

    /// チャンク列を1セッションとして実行し、トレースを返す
    ///
    /// 接続確立 → 認証応答の読み取り → センダ/コレクタの並行実行
    /// → 合流 → `end` イベント追記 → クローズ、の順。どちらかの
    /// タスクが致命的エラーでも、もう一方の完了を待ってから返す。
    pub async fn run_session(
        &self,
        chunks: Vec<Bytes>,
        vad_silence_ms: u32,
    ) -> Result<SessionReport, SessionError> {
        let iid = make_uid();
        let uri = self.endpoint.signed_uri(vad_silence_ms);

        info!(iid = %iid, chunks = chunks.len(), "opening streaming session");
        let (mut ws, _response) = connect_async(uri.as_str()).await?;

        self.read_handshake(&mut ws, &iid).await?;

        let (sink, mut stream) = ws.split();
        let writer = Arc::new(Mutex::new(sink));
        let clock = SessionClock::start();
        let trace = EventTrace::new();
        let finalized = AtomicBool::new(false);

        let sender = PacedSender::new(Duration::from_millis(self.streaming.send_interval_ms));
        let collector = ResponseCollector::new(
            self.streaming.recv_idle_timeout_ms.map(Duration::from_millis),
        );

        let (send_result, recv_result) = tokio::join!(
            sender.run(&writer, &chunks, &iid, clock, &trace, &finalized),
            collector.run(&mut stream, &writer, &iid, clock, &trace, &finalized),
        );

        trace.push(Event::End {
            timestamp: clock.now(),
            iid: iid.clone(),
        });

        // コレクタが既に閉じていても冪等
        let _ = writer.lock().await.close().await;

        send_result?;
        let outcome = match recv_result? {
            CollectorOutcome::Finalized => SessionOutcome::Finalized,
            CollectorOutcome::AbnormalClose => SessionOutcome::AbnormalClose,
        };

        Ok(SessionReport {
            iid,
            outcome,
            events: trace.into_events(),
        })
    }

    /// 接続直後の認証応答を1件読む
    ///
    /// `code == 0` で成功。非ゼロは `strict_handshake` に応じて
    /// エラーまたは警告ログのみとする。
    async fn read_handshake<R>(&self, ws: &mut R, iid: &str) -> Result<(), SessionError>
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let limit = Duration::from_millis(self.streaming.handshake_timeout_ms);
        let first = timeout(limit, ws.next())
            .await
            .map_err(|_| SessionError::Handshake {
                message: "timed out waiting for authentication response".to_string(),
            })?;

        let text = match first {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(other)) => {
                return Err(SessionError::Handshake {
                    message: format!("unexpected authentication frame: {other:?}"),
                })
            }
            Some(Err(error)) => return Err(SessionError::Connection(error)),
            None => {
                return Err(SessionError::Handshake {
                    message: "connection closed before authentication response".to_string(),
                })
            }
        };

        let payload = ResponsePayload::parse(&text).map_err(SessionError::Decode)?;
        let code = payload.code().unwrap_or(-1);
        if code == 0 {
            info!(iid = %iid, "connection success");
            Ok(())
        } else if self.streaming.strict_handshake {
            Err(SessionError::HandshakeRejected { code })
        } else {
            warn!(iid = %iid, code, "authentication code non-zero, continuing");
            Ok(())
        }
    }
}
