// 同期バス連動のデータビュー
//
// 「イベントを受けたら自分のデータを取り直す」という各ビュー共通の動きを
// 一箇所に実装します。ビューごとの違いは読み取りクエリだけです。

use crate::features::expenses::errors::PersistenceError;
use crate::features::sync::{Subscription, SyncBus, SyncEventKind};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// ビューの読み取りクエリ
///
/// ビューごとに必要な形のデータを取得します。集計済みビュー（円グラフ・
/// 折れ線グラフ）と明細ビュー（テーブル）では必要な形が異なるため、
/// バスはデータを運ばず、各ビューが自分で読み直します。
pub trait ViewQuery {
    type Output: Send;

    /// 最新のデータを取得する
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Output, PersistenceError>> + Send;
}

/// 同期バス連動ビュー
///
/// 経費の追加・削除イベントで鮮度フラグを立て、次の`refresh_if_stale`で
/// 読み直します。ハンドラー内ではフラグ操作のみ行い、取得は呼び出し側の
/// 都合のよいタイミングに委ねます。
pub struct SyncedView<Q: ViewQuery> {
    query: Q,
    data: Mutex<Option<Q::Output>>,
    stale: Arc<AtomicBool>,
    // ドロップで購読解除
    _subscriptions: Vec<Subscription>,
}

impl<Q: ViewQuery> SyncedView<Q> {
    /// 新しいビューを作成し、経費の追加・削除イベントを購読する
    ///
    /// 作成直後は未取得のため、最初の`refresh_if_stale`で必ず読み込みます。
    pub fn new(query: Q, bus: &SyncBus) -> Self {
        let stale = Arc::new(AtomicBool::new(true));

        let subscriptions = [SyncEventKind::ExpenseAdded, SyncEventKind::ExpenseDeleted]
            .into_iter()
            .map(|kind| {
                let flag = Arc::clone(&stale);
                bus.subscribe(kind, move |event| {
                    debug!("ビューを再取得対象にします: kind={:?}", event.kind);
                    flag.store(true, Ordering::SeqCst);
                })
            })
            .collect();

        Self {
            query,
            data: Mutex::new(None),
            stale,
            _subscriptions: subscriptions,
        }
    }

    /// 再取得が必要かどうか
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// 鮮度フラグが立っている場合のみデータを読み直す
    ///
    /// 取得に失敗した場合はフラグを立て直し、次回の呼び出しで再試行します。
    /// 保持中の古いデータは失敗しても消しません。
    pub async fn refresh_if_stale(&self) -> Result<(), PersistenceError> {
        if !self.stale.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        match self.query.load().await {
            Ok(loaded) => {
                *self
                    .data
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(loaded);
                Ok(())
            }
            Err(error) => {
                self.stale.store(true, Ordering::SeqCst);
                Err(error)
            }
        }
    }

    /// 保持中のデータを取得（未取得の場合はNone）
    pub fn current(&self) -> Option<Q::Output>
    where
        Q::Output: Clone,
    {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
