/// 抽出機能モジュール
///
/// レシートファイルを外部OCRサービスへ送信し、構造化された経費フィールド
/// （またはmanual-entry-requiredシグナル）として解釈するゲートウェイです。
pub mod api_client;
pub mod errors;
pub mod models;

pub use api_client::{ExtractionClient, ExtractionService};
pub use errors::ExtractionError;
pub use models::{ExtractedRecord, ExtractionOutcome, ProcessBillResponse, ReceiptUpload};
