//! 追記専用の共有イベントトレース
use std::sync::Arc;

use parking_lot::Mutex;

use super::event::Event;

/// 2つの並行タスクから追記される順序付きイベント列
///
/// 追記のみで、既存イベントの変更・削除は行わない。タスク内の
/// 追記順は保存されるが、タスク間の相対順序は保証しない。
#[derive(Debug, Clone, Default)]
pub struct EventTrace {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl EventTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.inner.lock().push(event);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 現時点の内容の複製
    pub fn snapshot(&self) -> Vec<Event> {
        self.inner.lock().clone()
    }

    /// トレースを閉じて全イベントを取り出す
    pub fn into_events(self) -> Vec<Event> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
