use crate::features::capture::errors::CaptureError;
use crate::features::extraction::models::{ExtractedRecord, DEFAULT_CURRENCY};
use crate::shared::dates;
use uuid::Uuid;

/// キャプチャの入力経路
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// レシートファイルのアップロード
    FileUpload,
    /// 手入力
    Manual,
}

/// キャプチャセッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    /// 待機中
    Idle,
    /// 抽出サービスへ問い合わせ中
    Extracting,
    /// 抽出結果の確認・修正待ち
    ReadyToReview,
    /// 手入力フォームの編集中
    ManualDrafting,
    /// 保存リクエスト送信中
    Saving,
    /// 保存完了（表示猶予の後Idleへ戻る）
    Saved,
    /// 抽出または保存に失敗
    Failed,
}

/// 編集対象のフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Vendor,
    Amount,
    Category,
    Date,
}

/// 保存前の編集用ドラフト
///
/// 入力途中の不完全な値をそのまま保持できるよう、金額も文字列で持ちます。
/// 検証は保存時にまとめて行い、入力中は一切ブロックしません。
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub vendor: String,
    /// 金額の入力文字列（保存時に数値へ変換）
    pub amount: String,
    pub currency: String,
    pub category: String,
    /// YYYY-MM-DD形式を想定（保存時に正規化されるため厳密でなくてよい）
    pub date: String,
    pub items: Vec<String>,
}

impl ExpenseDraft {
    /// 今日の日付だけが入った空のドラフトを作成
    pub fn empty_today() -> Self {
        Self {
            vendor: String::new(),
            amount: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            category: String::new(),
            date: dates::today().as_ymd_string(),
            items: Vec::new(),
        }
    }

    /// 抽出結果からドラフトを事前入力する
    pub fn from_record(record: &ExtractedRecord) -> Self {
        Self {
            vendor: record.vendor.clone(),
            amount: if record.amount > 0.0 {
                record.amount.to_string()
            } else {
                String::new()
            },
            currency: record.currency.clone(),
            category: record.category.clone(),
            date: record.date.as_ymd_string(),
            items: record.items.clone(),
        }
    }

    /// フィールドを更新する
    pub fn set(&mut self, field: DraftField, value: &str) {
        match field {
            DraftField::Vendor => self.vendor = value.to_string(),
            DraftField::Amount => self.amount = value.to_string(),
            DraftField::Category => self.category = value.to_string(),
            DraftField::Date => self.date = value.to_string(),
        }
    }
}

impl Default for ExpenseDraft {
    fn default() -> Self {
        Self::empty_today()
    }
}

/// キャプチャセッション
///
/// 進行中のキャプチャひとつ分の状態。システム全体で同時にひとつだけ
/// 存在し、状態機械の遷移関数以外からは変更されません。
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// セッション識別子（リセットごとに採番し直す）
    pub id: Uuid,
    pub mode: CaptureMode,
    pub status: CaptureStatus,
    /// 抽出サービスが返した正規化済みレコード（手入力のみの場合はNone）
    pub pending_record: Option<ExtractedRecord>,
    /// 編集用ドラフト
    pub draft: ExpenseDraft,
    /// 直近のエラー
    pub last_error: Option<CaptureError>,
    /// ハードエラーではない警告（手入力要求の通知など）
    pub warning: Option<String>,
    /// 遅延して届いた非同期結果を破棄するための世代番号
    pub(crate) generation: u64,
    /// Failedからretry()で戻る先
    pub(crate) resume_status: CaptureStatus,
}

impl CaptureSession {
    /// 新しい待機状態のセッションを作成
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: CaptureMode::FileUpload,
            status: CaptureStatus::Idle,
            pending_record: None,
            draft: ExpenseDraft::empty_today(),
            last_error: None,
            warning: None,
            generation: 0,
            resume_status: CaptureStatus::Idle,
        }
    }

    /// 待機状態へ戻す
    ///
    /// ドラフト・抽出結果・エラーをすべて破棄し、識別子を採番し直して
    /// 世代番号を進めます。以後、前の世代の非同期結果は適用されません。
    pub(crate) fn reset_to_idle(&mut self) {
        self.id = Uuid::new_v4();
        self.mode = CaptureMode::FileUpload;
        self.status = CaptureStatus::Idle;
        self.pending_record = None;
        self.draft = ExpenseDraft::empty_today();
        self.last_error = None;
        self.warning = None;
        self.generation += 1;
        self.resume_status = CaptureStatus::Idle;
    }

    /// 失敗状態へ遷移する
    pub(crate) fn fail(&mut self, error: CaptureError, resume: CaptureStatus) {
        self.status = CaptureStatus::Failed;
        self.last_error = Some(error);
        self.resume_status = resume;
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}
