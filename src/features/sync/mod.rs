//! 画面間同期バス
//!
//! 経費の追加・削除をビュー側へ通知するためのプロセス内pub/subです。
//! 配信は同期的で、publishが戻った時点で全ハンドラーの実行が完了しています。
//! イベントの再送（リプレイ）は行わないため、購読前のイベントは届きません。

use crate::features::expenses::models::PersistedExpense;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// 同期イベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEventKind {
    /// 経費が新規作成された
    ExpenseAdded,
    /// 経費が削除された
    ExpenseDeleted,
}

/// 同期イベント
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub kind: SyncEventKind,
    /// 追加時は作成された経費。削除時は削除前のスナップショット。
    pub expense: Option<PersistedExpense>,
}

impl SyncEvent {
    /// 経費追加イベントを作成
    pub fn expense_added(expense: PersistedExpense) -> Self {
        Self {
            kind: SyncEventKind::ExpenseAdded,
            expense: Some(expense),
        }
    }

    /// 経費削除イベントを作成
    pub fn expense_deleted(expense: Option<PersistedExpense>) -> Self {
        Self {
            kind: SyncEventKind::ExpenseDeleted,
            expense,
        }
    }
}

type Handler = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

struct Subscriber {
    id: u64,
    kind: SyncEventKind,
    handler: Handler,
}

struct BusInner {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl BusInner {
    /// ロック取得。ハンドラーはバス外で実行するため、パニックで
    /// 毒化していても購読リスト自体は壊れていない。
    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 同期バス
///
/// クローンはすべて同じ購読リストを共有します。
#[derive(Clone)]
pub struct SyncBus {
    inner: Arc<BusInner>,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncBus {
    /// 新しい同期バスを作成
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// 指定した種類のイベントを購読する
    ///
    /// # 戻り値
    /// 購読ガード。ドロップすると購読が解除されます。
    pub fn subscribe<F>(&self, kind: SyncEventKind, handler: F) -> Subscription
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push(Subscriber {
            id,
            kind,
            handler: Arc::new(handler),
        });

        debug!("同期バス購読を登録: id={id}, kind={kind:?}");
        Subscription {
            bus: Arc::clone(&self.inner),
            id,
        }
    }

    /// イベントを配信する
    ///
    /// 配信前に購読リストのスナップショットを取るため、ハンドラー内から
    /// subscribe/publishを呼んでもデッドロックしません。配信中に追加された
    /// 購読へ今回のイベントは届きません。
    pub fn publish(&self, event: &SyncEvent) {
        let handlers: Vec<Handler> = self
            .inner
            .subscribers()
            .iter()
            .filter(|s| s.kind == event.kind)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        debug!(
            "同期イベントを配信: kind={:?}, handlers={}",
            event.kind,
            handlers.len()
        );

        for handler in handlers {
            handler(event);
        }
    }

    /// 現在の購読数（テスト・診断用）
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// 購読ガード
///
/// ドロップ時に購読を解除します。明示的に解除する場合は`cancel`を使います。
pub struct Subscription {
    bus: Arc<BusInner>,
    id: u64,
}

impl Subscription {
    /// 購読を明示的に解除する
    pub fn cancel(self) {
        // dropに委譲
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.subscribers().retain(|s| s.id != self.id);
        debug!("同期バス購読を解除: id={}", self.id);
    }
}
