//! リアルタイム擬似ストリーミングセッション
//!
//! 1つのWebSocket接続上でペースドセンダ（送信）とレスポンスコレクタ
//! （受信）を並行に走らせ、共有トレースへイベントを追記します。
//! オーケストレータが親として両タスクを合流させ、最終トレースを
//! 組み立てます。
mod collector;
mod error;
mod event;
mod orchestrator;
mod sender;
mod trace;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use collector::{CollectorOutcome, ResponseCollector};
pub use error::SessionError;
pub use event::{Event, ResponsePayload, SessionClock};
pub use orchestrator::{EndpointProvider, SessionOrchestrator, SessionOutcome, SessionReport};
pub use sender::PacedSender;
pub use trace::EventTrace;

/// 送信ハーフの共有ハンドル
///
/// センダの通常送信と、コレクタによる終端時のクローズの双方が
/// 書き込みに使うため、非同期Mutexで直列化する。
pub type SharedSink<W> = Arc<Mutex<W>>;
