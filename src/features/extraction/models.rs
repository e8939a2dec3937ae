use crate::features::categories;
use crate::shared::dates::{self, CanonicalDate};
use serde::{Deserialize, Serialize};

/// 対応ファイル形式の許可リスト
///
/// ここに無いMIMEタイプはネットワーク送信前に拒否されます。
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "application/pdf",
];

/// デフォルト通貨
pub const DEFAULT_CURRENCY: &str = "INR";

/// 抽出できなかった場合のプレースホルダーの店舗名
pub const PLACEHOLDER_VENDOR: &str = "Unknown Vendor";

/// アップロード対象のレシートファイル
///
/// アクティブなキャプチャセッションだけが所有する一時データです。
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    /// ファイル内容
    pub bytes: Vec<u8>,
    /// MIMEタイプ（例: image/jpeg）
    pub mime_type: String,
    /// 元のファイル名
    pub filename: String,
}

impl ReceiptUpload {
    /// MIMEタイプが許可リストに含まれるかを判定
    pub fn is_supported(&self) -> bool {
        SUPPORTED_MIME_TYPES.contains(&self.mime_type.as_str())
    }

    /// マルチパートのフィールド名を取得（PDFは"pdf"、画像は"image"）
    pub fn multipart_field_name(&self) -> &'static str {
        if self.mime_type == "application/pdf" {
            "pdf"
        } else {
            "image"
        }
    }
}

/// 抽出サービスのレスポンス（ワイヤーモデル）
///
/// `POST /api/process-bill`のJSONボディに対応します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessBillResponse {
    pub success: bool,
    /// OCRが実行できず手入力が必要な場合にtrue
    pub manual_entry_required: Option<bool>,
    pub vendor: Option<String>,
    pub amount: Option<f64>,
    /// 一部のレスポンスはamountの代わりにtotal_amountを返す
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    /// 候補日付のリスト（先頭が最優先）
    pub dates: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    /// OCRの生テキスト（監査・デバッグ表示用）
    pub extracted_text: Option<String>,
    pub confidence: Option<f64>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// 抽出結果の正規化済みレコード
///
/// 自動抽出・手入力のどちらの経路でも、保存直前の形はこの型に揃います。
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    /// 店舗名
    pub vendor: String,
    /// 金額（負にはならない。金額が取れなかった場合は0で、保存時に弾かれる）
    pub amount: f64,
    /// 通貨コード
    pub currency: String,
    /// カテゴリ名（固定セットのいずれか、または空）
    pub category: String,
    /// 正規化済みの日付（この時点で必ず実在するカレンダー日付）
    pub date: CanonicalDate,
    /// 明細行
    pub items: Vec<String>,
    /// OCRの生テキスト
    pub raw_text: Option<String>,
}

impl ExtractedRecord {
    /// 手入力用のプレースホルダーレコードを作成
    ///
    /// 日付は今日（DefaultedToday）で事前入力されます。
    pub fn manual_placeholder() -> Self {
        Self {
            vendor: String::new(),
            amount: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            category: String::new(),
            date: dates::today(),
            items: Vec::new(),
            raw_text: None,
        }
    }
}

/// 抽出の結果
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    /// 構造化フィールドの抽出に成功
    Extracted(ExtractedRecord),
    /// リクエスト自体は有効だが抽出を実行できなかった（例: OCRエンジン未導入）。
    /// 呼び出し側はプレースホルダー入りの手入力フォームを提示する。
    ManualEntryRequired {
        /// 事前入力用レコード（日付は今日で補完済み）
        prefill: ExtractedRecord,
        /// ユーザーへ表示する警告文
        note: String,
    },
}

impl ProcessBillResponse {
    /// ワイヤーレスポンスを抽出結果へ変換する
    ///
    /// # 変換規則
    /// - `manual_entry_required`が立っていれば手入力要求（エラーではない）
    /// - 金額は`amount`優先、無ければ`total_amount`、どちらも無ければ0
    /// - 日付は`dates`リストの先頭を優先し、無ければ`date`を使用して正規化
    /// - カテゴリが固定セット外の場合は空にする（保存前の選択を必須にする）
    pub fn into_outcome(self) -> ExtractionOutcome {
        if self.manual_entry_required.unwrap_or(false) {
            let note = self.message.unwrap_or_else(|| {
                "自動抽出を実行できませんでした。内容を手入力してください。".to_string()
            });

            let prefill = ExtractedRecord {
                vendor: self
                    .vendor
                    .filter(|v| !v.trim().is_empty() && v != PLACEHOLDER_VENDOR)
                    .unwrap_or_default(),
                amount: 0.0,
                currency: self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                category: String::new(),
                // 手入力の初期値は常に今日の日付
                date: dates::today(),
                items: self.items.unwrap_or_default(),
                raw_text: self.extracted_text,
            };

            log::info!("抽出サービスが手入力を要求しました: note={note}");
            return ExtractionOutcome::ManualEntryRequired { prefill, note };
        }

        let amount = self
            .amount
            .or(self.total_amount)
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(0.0);

        // 候補リストの先頭を優先し、正規化を通して必ず実在する日付にする
        let date_candidate = self
            .dates
            .as_ref()
            .and_then(|list| list.first().cloned())
            .or(self.date);
        let date = dates::normalize(date_candidate.as_deref());

        let category = match self.category {
            Some(c) if categories::is_known(&c) => c,
            Some(_) | None => String::new(),
        };

        ExtractionOutcome::Extracted(ExtractedRecord {
            vendor: self.vendor.map(|v| v.trim().to_string()).unwrap_or_default(),
            amount,
            currency: self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            category,
            date,
            items: self.items.unwrap_or_default(),
            raw_text: self.extracted_text,
        })
    }
}
