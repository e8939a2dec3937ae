// キャプチャ状態機械
//
// レシート1枚（または手入力1件）が未検証の入力から保存済み経費になるまでの
// ライフサイクルを管理します。遷移はすべてこのサービスを経由します。

use crate::features::capture::errors::{CaptureError, ValidationError};
use crate::features::capture::models::{
    CaptureMode, CaptureSession, CaptureStatus, DraftField, ExpenseDraft,
};
use crate::features::categories;
use crate::features::expenses::api_client::ExpenseStore;
use crate::features::expenses::models::NewExpense;
use crate::features::extraction::api_client::ExtractionService;
use crate::features::extraction::models::{ExtractionOutcome, ReceiptUpload, DEFAULT_CURRENCY};
use crate::features::sync::{SyncBus, SyncEvent};
use crate::shared::dates;
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// 保存完了表示のデフォルト猶予時間
const DEFAULT_SAVED_DISPLAY: Duration = Duration::from_millis(1500);

/// キャプチャ状態機械
///
/// 抽出サービスと経費ストアを注入して使います。セッションはプロセス内に
/// ひとつだけで、すべての遷移はセッションのロック内で行われます。
/// ネットワーク待ちの間はロックを保持しません。
pub struct CaptureService<E, P> {
    extraction: E,
    store: P,
    bus: SyncBus,
    session: Mutex<CaptureSession>,
    saved_display: Duration,
}

impl<E, P> CaptureService<E, P>
where
    E: ExtractionService,
    P: ExpenseStore,
{
    /// 新しいキャプチャサービスを作成
    ///
    /// # 引数
    /// * `extraction` - レシート抽出サービス
    /// * `store` - 経費の永続化先
    /// * `bus` - 保存・削除を通知する同期バス
    pub fn new(extraction: E, store: P, bus: SyncBus) -> Self {
        Self {
            extraction,
            store,
            bus,
            session: Mutex::new(CaptureSession::new()),
            saved_display: DEFAULT_SAVED_DISPLAY,
        }
    }

    /// 保存完了表示の猶予時間を変更する
    pub fn with_saved_display(mut self, delay: Duration) -> Self {
        self.saved_display = delay;
        self
    }

    /// セッションロックを取得
    ///
    /// 遷移はロック内で完結し、パニックを挟まないため毒化は実質起きない。
    /// 万一毒化していてもセッション自体は整合しているので回収して続行する。
    fn session(&self) -> MutexGuard<'_, CaptureSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 現在の状態を取得
    pub fn status(&self) -> CaptureStatus {
        self.session().status
    }

    /// セッションのスナップショットを取得（表示用）
    pub fn snapshot(&self) -> CaptureSession {
        self.session().clone()
    }

    /// レシートファイルを送信して抽出を開始する
    ///
    /// Idle以外の状態では何もしません。抽出成功でReadyToReview、
    /// 手入力要求でManualDrafting（警告付き）、失敗でFailedへ遷移します。
    /// 許可リスト外のファイル形式はネットワーク送信なしで即Failedです。
    pub async fn submit_file(&self, upload: ReceiptUpload) -> Result<CaptureStatus, CaptureError> {
        let generation = {
            let mut session = self.session();
            if session.status != CaptureStatus::Idle {
                warn!(
                    "Idle以外の状態でのファイル送信を無視します: status={:?}",
                    session.status
                );
                return Ok(session.status);
            }

            if !upload.is_supported() {
                let error: CaptureError =
                    crate::features::extraction::errors::ExtractionError::unsupported_file_type(
                        &upload.mime_type,
                    )
                    .into();
                session.fail(error.clone(), CaptureStatus::Idle);
                return Err(error);
            }

            session.mode = CaptureMode::FileUpload;
            session.status = CaptureStatus::Extracting;
            session.last_error = None;
            session.warning = None;
            session.generation
        };

        let outcome = self.extraction.extract(&upload).await;

        let mut session = self.session();
        if session.generation != generation {
            info!("破棄されたセッションへの抽出結果を無視します");
            return Ok(session.status);
        }

        match outcome {
            Ok(ExtractionOutcome::Extracted(record)) => {
                session.draft = ExpenseDraft::from_record(&record);
                session.pending_record = Some(record);
                session.status = CaptureStatus::ReadyToReview;
                Ok(CaptureStatus::ReadyToReview)
            }
            Ok(ExtractionOutcome::ManualEntryRequired { prefill, note }) => {
                session.draft = ExpenseDraft::from_record(&prefill);
                session.pending_record = Some(prefill);
                session.mode = CaptureMode::Manual;
                session.status = CaptureStatus::ManualDrafting;
                session.warning = Some(note);
                Ok(CaptureStatus::ManualDrafting)
            }
            Err(error) => {
                let error: CaptureError = error.into();
                session.fail(error.clone(), CaptureStatus::Idle);
                Err(error)
            }
        }
    }

    /// 手入力モードを切り替える
    ///
    /// 手入力フォームを開く際は空のドラフト（日付は今日）で初期化し、
    /// 抽出結果があれば破棄します。ManualDraftingからの呼び出しは
    /// フォームを閉じてIdleへ戻します。通信中（Extracting/Saving）は無視します。
    pub fn toggle_manual(&self) -> CaptureStatus {
        let mut session = self.session();
        match session.status {
            CaptureStatus::Extracting | CaptureStatus::Saving => {
                warn!(
                    "通信中のモード切り替えを無視します: status={:?}",
                    session.status
                );
                session.status
            }
            CaptureStatus::ManualDrafting => {
                session.reset_to_idle();
                CaptureStatus::Idle
            }
            _ => {
                session.mode = CaptureMode::Manual;
                session.status = CaptureStatus::ManualDrafting;
                session.pending_record = None;
                session.draft = ExpenseDraft::empty_today();
                session.last_error = None;
                session.warning = None;
                CaptureStatus::ManualDrafting
            }
        }
    }

    /// ドラフトのフィールドを更新する
    ///
    /// 検証は行いません（保存時にまとめて行う）。入力途中の不完全な値も
    /// そのまま保持されます。
    pub fn edit_field(&self, field: DraftField, value: &str) {
        let mut session = self.session();
        match session.status {
            CaptureStatus::ReadyToReview | CaptureStatus::ManualDrafting => {
                session.draft.set(field, value);
            }
            status => {
                warn!("編集できない状態でのフィールド更新を無視します: status={status:?}");
            }
        }
    }

    /// ドラフトを検証して保存する
    ///
    /// 検証は店舗名→金額→カテゴリの順で行い、最初の失敗で打ち切ります。
    /// 検証エラーでは状態を変えず、編集による修正を待ちます。
    /// 保存中の再呼び出しは何もしません（POSTは高々1回）。
    /// 保存成功時はpublishが戻ってからOkを返します。
    pub async fn save(&self) -> Result<CaptureStatus, CaptureError> {
        let (expense, generation, resume) = {
            let mut session = self.session();
            if session.status == CaptureStatus::Saving {
                warn!("保存中の二重保存要求を無視します");
                return Ok(CaptureStatus::Saving);
            }
            if !matches!(
                session.status,
                CaptureStatus::ReadyToReview | CaptureStatus::ManualDrafting
            ) {
                warn!(
                    "保存できない状態での保存要求を無視します: status={:?}",
                    session.status
                );
                return Ok(session.status);
            }

            let expense = match build_expense(&session) {
                Ok(expense) => expense,
                Err(validation) => {
                    let error = CaptureError::validation(validation);
                    session.last_error = Some(error.clone());
                    return Err(error);
                }
            };

            let resume = session.status;
            session.status = CaptureStatus::Saving;
            session.last_error = None;
            (expense, session.generation, resume)
        };

        let result = self.store.create(&expense).await;

        let persisted = {
            let mut session = self.session();
            if session.generation != generation {
                info!("破棄されたセッションへの保存結果を無視します");
                return Ok(session.status);
            }

            match result {
                Ok(persisted) => {
                    session.status = CaptureStatus::Saved;
                    persisted
                }
                Err(error) => {
                    let error: CaptureError = error.into();
                    session.fail(error.clone(), resume);
                    return Err(error);
                }
            }
        };

        // 配信はロック解放後。ハンドラーが状態を読み返しても固まらない
        self.bus.publish(&SyncEvent::expense_added(persisted));
        Ok(CaptureStatus::Saved)
    }

    /// 失敗した操作をやり直せる状態へ戻す
    ///
    /// 保存失敗なら元の確認状態（ReadyToReview / ManualDrafting）へ、
    /// 抽出失敗ならIdleへ戻ります。抽出の再実行は行いません。
    pub fn retry(&self) -> CaptureStatus {
        let mut session = self.session();
        if session.status != CaptureStatus::Failed {
            warn!(
                "Failed以外の状態でのretryを無視します: status={:?}",
                session.status
            );
            return session.status;
        }

        session.status = session.resume_status;
        session.last_error = None;
        session.status
    }

    /// キャプチャを破棄して待機状態へ戻る
    ///
    /// 確認なしで即座に破棄します。進行中のネットワーク処理は中断されず、
    /// 遅れて届いた結果は世代番号の不一致により捨てられます。
    pub fn abandon(&self) -> CaptureStatus {
        let mut session = self.session();
        session.reset_to_idle();
        CaptureStatus::Idle
    }

    /// 保存完了表示の猶予後にIdleへ戻す
    ///
    /// Saved以外の状態では何もしません。待機中にabandonや新規キャプチャが
    /// あった場合もリセットしません。
    pub async fn reset_after_saved(&self) {
        let generation = {
            let session = self.session();
            if session.status != CaptureStatus::Saved {
                return;
            }
            session.generation
        };

        tokio::time::sleep(self.saved_display).await;

        let mut session = self.session();
        if session.generation == generation && session.status == CaptureStatus::Saved {
            session.reset_to_idle();
        }
    }
}

/// ドラフトを検証して保存用DTOを組み立てる
///
/// # 検証順序
/// 1. 店舗名（トリム後に非空）
/// 2. 金額（数値かつ0より大きい）
/// 3. カテゴリ（固定セットのいずれか）
///
/// 日付はユーザー入力→抽出結果→今日の優先順位で選び、必ず正規化を通します。
fn build_expense(session: &CaptureSession) -> Result<NewExpense, ValidationError> {
    let vendor = session.draft.vendor.trim();
    if vendor.is_empty() {
        return Err(ValidationError::MissingVendor);
    }

    let amount = session
        .draft
        .amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or(ValidationError::InvalidAmount)?;

    let category = session.draft.category.trim();
    if !categories::is_known(category) {
        return Err(ValidationError::MissingCategory);
    }

    let raw_date = if session.draft.date.trim().is_empty() {
        session
            .pending_record
            .as_ref()
            .map(|record| record.date.as_ymd_string())
    } else {
        Some(session.draft.date.clone())
    };
    let date = dates::normalize(raw_date.as_deref());

    let currency = if session.draft.currency.trim().is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        session.draft.currency.trim().to_string()
    };

    Ok(NewExpense {
        vendor: vendor.to_string(),
        amount,
        currency,
        category: category.to_string(),
        date: date.as_ymd_string(),
        items: session.draft.items.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expenses::errors::PersistenceError;
    use crate::features::expenses::models::PersistedExpense;
    use crate::features::extraction::errors::ExtractionError;
    use crate::features::extraction::models::ExtractedRecord;
    use crate::features::sync::SyncEventKind;
    use crate::shared::dates::DateProvenance;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// スクリプト化した抽出サービスのフェイク
    struct FakeExtraction {
        responses: Mutex<VecDeque<Result<ExtractionOutcome, ExtractionError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeExtraction {
        fn with_response(response: Result<ExtractionOutcome, ExtractionError>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([response])),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn unused() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    impl ExtractionService for FakeExtraction {
        async fn extract(
            &self,
            _upload: &ReceiptUpload,
        ) -> Result<ExtractionOutcome, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses.lock().unwrap().pop_front().unwrap()
        }
    }

    /// 作成リクエストを記録する経費ストアのフェイク
    struct FakeStore {
        created: Mutex<Vec<NewExpense>>,
        failures: Mutex<VecDeque<PersistenceError>>,
        delay: Option<Duration>,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::new()),
                delay: None,
            }
        }

        fn failing_once(error: PersistenceError) -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::from([error])),
                delay: None,
            }
        }

        fn post_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    impl ExpenseStore for FakeStore {
        async fn create(&self, expense: &NewExpense) -> Result<PersistedExpense, PersistenceError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(error) = self.failures.lock().unwrap().pop_front() {
                return Err(error);
            }

            let mut created = self.created.lock().unwrap();
            created.push(expense.clone());
            Ok(PersistedExpense {
                id: created.len() as i64,
                vendor: expense.vendor.clone(),
                amount: expense.amount,
                currency: expense.currency.clone(),
                category: expense.category.clone(),
                date: expense.date.clone(),
                items: expense.items.clone(),
            })
        }
    }

    fn cafe_record() -> ExtractedRecord {
        ExtractedRecord {
            vendor: "Cafe X".to_string(),
            amount: 250.0,
            currency: "INR".to_string(),
            category: "Food & Dining".to_string(),
            date: dates::normalize(Some("2024-01-15")),
            items: vec![],
            raw_text: None,
        }
    }

    fn jpeg_upload() -> ReceiptUpload {
        ReceiptUpload {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
            filename: "receipt.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_save_happy_path() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        let service = Arc::new(CaptureService::new(extraction, FakeStore::new(), SyncBus::new()));

        let added = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&added);
        let _sub = service.bus.subscribe(SyncEventKind::ExpenseAdded, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let status = service.submit_file(jpeg_upload()).await.unwrap();
        assert_eq!(status, CaptureStatus::ReadyToReview);

        let session = service.snapshot();
        let record = session.pending_record.unwrap();
        assert_eq!(record.date.provenance, DateProvenance::FromReceipt);
        assert_eq!(session.draft.vendor, "Cafe X");

        let status = service.save().await.unwrap();
        assert_eq!(status, CaptureStatus::Saved);

        // POSTは1回、通知も1回、日付は抽出結果のまま
        assert_eq!(service.store.post_count(), 1);
        assert_eq!(added.load(Ordering::SeqCst), 1);
        let created = service.store.created.lock().unwrap();
        assert_eq!(created[0].date, "2024-01-15");
        assert_eq!(created[0].amount, 250.0);
    }

    #[tokio::test]
    async fn test_unsupported_mime_never_enters_extracting() {
        let extraction = FakeExtraction::unused();
        let service = CaptureService::new(extraction, FakeStore::new(), SyncBus::new());

        let upload = ReceiptUpload {
            bytes: b"plain text".to_vec(),
            mime_type: "text/plain".to_string(),
            filename: "note.txt".to_string(),
        };

        let error = service.submit_file(upload).await.unwrap_err();
        assert_eq!(error.error_type(), "UnsupportedFileType");
        assert_eq!(service.status(), CaptureStatus::Failed);
        // ネットワーク呼び出しは発生しない
        assert_eq!(service.extraction.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_moves_to_failed_and_retry_returns_to_idle() {
        let extraction = FakeExtraction::with_response(Err(
            ExtractionError::network_unreachable("connection refused"),
        ));
        let service = CaptureService::new(extraction, FakeStore::new(), SyncBus::new());

        let error = service.submit_file(jpeg_upload()).await.unwrap_err();
        assert_eq!(error.error_type(), "NetworkUnreachable");
        assert_eq!(service.status(), CaptureStatus::Failed);

        // 抽出失敗からのretryは再アップロード待ちのIdleへ
        assert_eq!(service.retry(), CaptureStatus::Idle);
    }

    #[tokio::test]
    async fn test_manual_entry_required_prefills_today() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::ManualEntryRequired {
                prefill: ExtractedRecord::manual_placeholder(),
                note: "OCRエンジンが利用できません".to_string(),
            }));
        let service = CaptureService::new(extraction, FakeStore::new(), SyncBus::new());

        let status = service.submit_file(jpeg_upload()).await.unwrap();
        assert_eq!(status, CaptureStatus::ManualDrafting);

        let session = service.snapshot();
        // 警告であってエラーではない
        assert!(session.warning.is_some());
        assert!(session.last_error.is_none());
        let record = session.pending_record.unwrap();
        assert_eq!(record.date.provenance, DateProvenance::DefaultedToday);
        assert_eq!(
            session.draft.date,
            dates::local_today().format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_validation_order_vendor_first() {
        let service = CaptureService::new(FakeExtraction::unused(), FakeStore::new(), SyncBus::new());
        service.toggle_manual();
        service.edit_field(DraftField::Amount, "abc");
        service.edit_field(DraftField::Category, "Nonsense");

        // 店舗名・金額・カテゴリがすべて不正でも、最初の失敗だけが返る
        let error = service.save().await.unwrap_err();
        assert_eq!(error.error_type(), "MissingVendor");
        assert_eq!(service.status(), CaptureStatus::ManualDrafting);
    }

    #[tokio::test]
    async fn test_missing_vendor_keeps_drafting() {
        let service = CaptureService::new(FakeExtraction::unused(), FakeStore::new(), SyncBus::new());
        service.toggle_manual();
        service.edit_field(DraftField::Amount, "100");
        service.edit_field(DraftField::Category, "Food & Dining");

        let error = service.save().await.unwrap_err();
        assert_eq!(error.error_type(), "MissingVendor");
        assert_eq!(service.status(), CaptureStatus::ManualDrafting);
        assert_eq!(service.store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_without_transition() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(ExtractedRecord {
                amount: 0.0,
                ..cafe_record()
            })));
        let service = CaptureService::new(extraction, FakeStore::new(), SyncBus::new());

        service.submit_file(jpeg_upload()).await.unwrap();
        assert_eq!(service.status(), CaptureStatus::ReadyToReview);

        let error = service.save().await.unwrap_err();
        assert_eq!(error.error_type(), "InvalidAmount");
        // Savingへは遷移せず、POSTも発生しない
        assert_eq!(service.status(), CaptureStatus::ReadyToReview);
        assert_eq!(service.store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let service = CaptureService::new(FakeExtraction::unused(), FakeStore::new(), SyncBus::new());
        service.toggle_manual();
        service.edit_field(DraftField::Vendor, "Cafe X");
        service.edit_field(DraftField::Amount, "100");
        service.edit_field(DraftField::Category, "Food");

        let error = service.save().await.unwrap_err();
        assert_eq!(error.error_type(), "MissingCategory");
    }

    #[tokio::test]
    async fn test_double_save_issues_single_post() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        let mut store = FakeStore::new();
        store.delay = Some(Duration::from_millis(50));
        let service = Arc::new(CaptureService::new(extraction, store, SyncBus::new()));

        service.submit_file(jpeg_upload()).await.unwrap();

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.save().await })
        };
        // 最初の保存がSavingへ遷移するのを待つ
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(service.status(), CaptureStatus::Saving);

        // 保存中の二重保存は何もしない
        let second = service.save().await.unwrap();
        assert_eq!(second, CaptureStatus::Saving);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first, CaptureStatus::Saved);
        assert_eq!(service.store.post_count(), 1);
    }

    #[tokio::test]
    async fn test_abandon_discards_late_extraction_result() {
        let mut extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        extraction.delay = Some(Duration::from_millis(50));
        let service = Arc::new(CaptureService::new(extraction, FakeStore::new(), SyncBus::new()));

        let submit = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.submit_file(jpeg_upload()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(service.status(), CaptureStatus::Extracting);

        // 抽出中に破棄すると、遅れて届いた結果は適用されない
        service.abandon();
        let status = submit.await.unwrap().unwrap();
        assert_eq!(status, CaptureStatus::Idle);

        let session = service.snapshot();
        assert_eq!(session.status, CaptureStatus::Idle);
        assert!(session.pending_record.is_none());
    }

    #[tokio::test]
    async fn test_abandon_discards_late_save_result() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        let mut store = FakeStore::new();
        store.delay = Some(Duration::from_millis(50));
        let service = Arc::new(CaptureService::new(extraction, store, SyncBus::new()));

        let added = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&added);
        let _sub = service.bus.subscribe(SyncEventKind::ExpenseAdded, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        service.submit_file(jpeg_upload()).await.unwrap();

        let save = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.save().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(service.status(), CaptureStatus::Saving);

        // 保存中に破棄すると、遅れて届いた保存結果はSavedへ遷移させない
        service.abandon();
        let status = save.await.unwrap().unwrap();
        assert_eq!(status, CaptureStatus::Idle);

        let session = service.snapshot();
        assert_eq!(session.status, CaptureStatus::Idle);
        assert!(session.pending_record.is_none());
        // 通知も配信されない
        assert_eq!(added.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_then_retry_and_resave() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        let store = FakeStore::failing_once(PersistenceError::service_error(503, "unavailable"));
        let service = CaptureService::new(extraction, store, SyncBus::new());

        service.submit_file(jpeg_upload()).await.unwrap();
        let error = service.save().await.unwrap_err();
        assert_eq!(error.error_type(), "ServiceError");
        assert_eq!(service.status(), CaptureStatus::Failed);

        // 保存失敗からのretryは確認状態へ戻る（抽出は再実行しない）
        assert_eq!(service.retry(), CaptureStatus::ReadyToReview);
        assert_eq!(service.extraction.calls.load(Ordering::SeqCst), 1);

        let status = service.save().await.unwrap();
        assert_eq!(status, CaptureStatus::Saved);
        assert_eq!(service.store.post_count(), 1);
    }

    #[tokio::test]
    async fn test_saved_resets_to_idle_after_display_delay() {
        let extraction =
            FakeExtraction::with_response(Ok(ExtractionOutcome::Extracted(cafe_record())));
        let service = CaptureService::new(extraction, FakeStore::new(), SyncBus::new())
            .with_saved_display(Duration::from_millis(10));

        service.submit_file(jpeg_upload()).await.unwrap();
        service.save().await.unwrap();
        assert_eq!(service.status(), CaptureStatus::Saved);

        service.reset_after_saved().await;
        let session = service.snapshot();
        assert_eq!(session.status, CaptureStatus::Idle);
        assert!(session.pending_record.is_none());
        assert!(session.draft.vendor.is_empty());
    }

    #[tokio::test]
    async fn test_save_date_falls_back_to_today_when_cleared() {
        let service = CaptureService::new(FakeExtraction::unused(), FakeStore::new(), SyncBus::new());
        service.toggle_manual();
        service.edit_field(DraftField::Vendor, "Metro");
        service.edit_field(DraftField::Amount, "40");
        service.edit_field(DraftField::Category, "Transportation");
        service.edit_field(DraftField::Date, "");

        service.save().await.unwrap();
        let created = service.store.created.lock().unwrap();
        assert_eq!(
            created[0].date,
            dates::local_today().format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_toggle_manual_twice_returns_to_idle() {
        let service = CaptureService::new(FakeExtraction::unused(), FakeStore::new(), SyncBus::new());
        assert_eq!(service.toggle_manual(), CaptureStatus::ManualDrafting);
        service.edit_field(DraftField::Vendor, "Cafe X");

        assert_eq!(service.toggle_manual(), CaptureStatus::Idle);
        assert!(service.snapshot().draft.vendor.is_empty());
    }
}
