//! ループバックWebSocket上でのセッション統合テスト
//!
//! 127.0.0.1:0 にモックのASRリモートを立て、認証応答・部分/最終
//! 応答・切断の各シナリオをスクリプトとして再生する。
use std::net::SocketAddr;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use asr_stream_client::config::StreamingConfig;
use asr_stream_client::session::{
    EndpointProvider, Event, SessionError, SessionOrchestrator, SessionOutcome,
};

/// テスト用の固定URI供給元
struct FixedEndpoint(String);

impl EndpointProvider for FixedEndpoint {
    fn signed_uri(&self, _vad_silence_ms: u32) -> String {
        self.0.clone()
    }
}

/// モックリモートの応答シナリオ
#[derive(Clone, Copy)]
enum RemoteScript {
    /// 認証応答 → 終端制御メッセージ受信後に final=1
    FinalAfterEnd { auth_code: i64 },
    /// 認証応答 → n個目のバイナリ受信直後に final=1
    FinalAfterChunks(usize),
    /// 認証応答 → 終端制御メッセージ受信後、finalを送らず切断
    DropAfterEnd,
    /// 認証応答を送ってすぐ切断
    CloseAfterAuth { auth_code: i64 },
    /// 終端制御メッセージ受信後にJSONでないテキストを送る
    MalformedResponse,
    /// 接続を受けた後、何も送らない
    Silent,
}

async fn spawn_remote(script: RemoteScript) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        if matches!(script, RemoteScript::Silent) {
            // ハンドシェイクタイムアウトを誘発するため保持したまま待つ
            while let Some(Ok(_)) = ws.next().await {}
            return;
        }

        let auth_code = match script {
            RemoteScript::FinalAfterEnd { auth_code } => auth_code,
            RemoteScript::CloseAfterAuth { auth_code } => auth_code,
            _ => 0,
        };
        ws.send(Message::Text(format!(r#"{{"code": {auth_code}}}"#).into()))
            .await
            .unwrap();

        if matches!(script, RemoteScript::CloseAfterAuth { .. }) {
            let _ = ws.close(None).await;
            return;
        }

        let mut binary_count = 0usize;
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Binary(_) => {
                    binary_count += 1;
                    if let RemoteScript::FinalAfterChunks(n) = script {
                        if binary_count == n {
                            ws.send(Message::Text(
                                r#"{"final": 1, "result": "early done"}"#.into(),
                            ))
                            .await
                            .unwrap();
                        }
                    }
                }
                Message::Text(text) if text.contains("\"end\"") => match script {
                    RemoteScript::FinalAfterEnd { .. } => {
                        ws.send(Message::Text(
                            r#"{"final": 0, "result": "partial"}"#.into(),
                        ))
                        .await
                        .unwrap();
                        ws.send(Message::Text(r#"{"final": 1, "result": "done"}"#.into()))
                            .await
                            .unwrap();
                    }
                    RemoteScript::DropAfterEnd => {
                        // クローズハンドシェイクなしの切断
                        return;
                    }
                    RemoteScript::MalformedResponse => {
                        ws.send(Message::Text("this is not json".into())).await.unwrap();
                    }
                    _ => {}
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    addr
}

fn orchestrator_for(
    addr: SocketAddr,
    config: StreamingConfig,
) -> SessionOrchestrator<FixedEndpoint> {
    SessionOrchestrator::new(config, FixedEndpoint(format!("ws://{addr}/asr")))
}

fn chunks(count: usize, size: usize) -> Vec<Bytes> {
    (0..count)
        .map(|i| Bytes::from(vec![i as u8; size]))
        .collect()
}

fn is_final_recv(event: &Event) -> bool {
    matches!(event, Event::Recv { data, .. } if data.is_final())
}

#[tokio::test]
async fn full_session_collects_ordered_trace() {
    let addr = spawn_remote(RemoteScript::FinalAfterEnd { auth_code: 0 }).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let report = orchestrator.run_session(chunks(3, 100), 240).await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Finalized);

    let events = &report.events;
    assert!(matches!(events.first(), Some(Event::Begin { .. })));
    assert!(matches!(events.last(), Some(Event::End { .. })));
    for event in events {
        assert_eq!(event.iid(), report.iid);
    }

    // センダ側の自順序: begin の後に sent 1..=3
    let sent_indices: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Sent { chunk_index, .. } => Some(*chunk_index),
            _ => None,
        })
        .collect();
    assert_eq!(sent_indices, vec![1, 2, 3]);

    // 早送りしないこと: sent#k は begin + k*interval より前に来ない
    let begin_ts = events[0].timestamp();
    let interval = 0.040;
    for event in events {
        if let Event::Sent {
            timestamp,
            chunk_index,
            ..
        } = event
        {
            assert!(
                *timestamp >= begin_ts + interval * (*chunk_index as f64),
                "chunk {chunk_index} sent early: {timestamp} < {}",
                begin_ts + interval * (*chunk_index as f64)
            );
        }
    }

    // final=1 の recv はちょうど1件で、recv の最後
    let recvs: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::Recv { .. }))
        .collect();
    assert!(!recvs.is_empty());
    assert_eq!(recvs.iter().filter(|e| is_final_recv(e)).count(), 1);
    assert!(is_final_recv(recvs.last().unwrap()));
}

#[tokio::test]
async fn early_final_does_not_fail_the_sender() {
    let addr = spawn_remote(RemoteScript::FinalAfterChunks(2)).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let report = orchestrator.run_session(chunks(3, 100), 240).await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Finalized);

    // 2個目の直後に final が来るため、3個目は送信済みか、
    // クローズ後のクリーンな打ち切りのどちらか
    let sent_count = report
        .events
        .iter()
        .filter(|e| matches!(e, Event::Sent { .. }))
        .count();
    assert!((2..=3).contains(&sent_count), "sent {sent_count} chunks");

    let finals = report.events.iter().filter(|e| is_final_recv(e)).count();
    assert_eq!(finals, 1);
    assert!(matches!(report.events.last(), Some(Event::End { .. })));
}

#[tokio::test]
async fn drop_without_final_is_abnormal_close() {
    let addr = spawn_remote(RemoteScript::DropAfterEnd).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let report = orchestrator.run_session(chunks(3, 100), 240).await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::AbnormalClose);

    // 部分トレースは返る
    assert!(!report.events.is_empty());
    assert!(matches!(report.events.first(), Some(Event::Begin { .. })));
    assert!(matches!(report.events.last(), Some(Event::End { .. })));
    assert_eq!(report.events.iter().filter(|e| is_final_recv(e)).count(), 0);
}

#[tokio::test]
async fn zero_chunks_yield_begin_and_end_only() {
    let addr = spawn_remote(RemoteScript::FinalAfterEnd { auth_code: 0 }).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let report = orchestrator.run_session(Vec::new(), 240).await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Finalized);

    assert!(matches!(report.events.first(), Some(Event::Begin { .. })));
    assert!(matches!(report.events.last(), Some(Event::End { .. })));
    let sent_count = report
        .events
        .iter()
        .filter(|e| matches!(e, Event::Sent { .. }))
        .count();
    assert_eq!(sent_count, 0);
}

#[tokio::test]
async fn strict_handshake_rejects_non_zero_code() {
    let addr = spawn_remote(RemoteScript::CloseAfterAuth { auth_code: 4003 }).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let err = orchestrator
        .run_session(chunks(1, 100), 240)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::HandshakeRejected { code: 4003 }
    ));
}

#[tokio::test]
async fn permissive_handshake_logs_and_continues() {
    let addr = spawn_remote(RemoteScript::FinalAfterEnd { auth_code: 4003 }).await;
    let config = StreamingConfig {
        strict_handshake: false,
        ..StreamingConfig::default()
    };
    let orchestrator = orchestrator_for(addr, config);

    let report = orchestrator.run_session(chunks(1, 100), 240).await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Finalized);
}

#[tokio::test]
async fn malformed_response_is_a_decode_error() {
    let addr = spawn_remote(RemoteScript::MalformedResponse).await;
    let orchestrator = orchestrator_for(addr, StreamingConfig::default());

    let err = orchestrator
        .run_session(chunks(1, 100), 240)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)));
}

#[tokio::test]
async fn silent_remote_times_out_on_handshake() {
    let addr = spawn_remote(RemoteScript::Silent).await;
    let config = StreamingConfig {
        handshake_timeout_ms: 200,
        ..StreamingConfig::default()
    };
    let orchestrator = orchestrator_for(addr, config);

    let err = orchestrator
        .run_session(chunks(1, 100), 240)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Handshake { .. }));
}
