/// 経費キャプチャ機能モジュール
///
/// レシートアップロード・手入力のどちらの経路も、ひとつの状態機械を
/// 通って検証・保存されます。保存成功時には同期バスへ通知を配信します。
pub mod errors;
pub mod models;
pub mod service;

pub use errors::{CaptureError, ValidationError};
pub use models::{CaptureMode, CaptureSession, CaptureStatus, DraftField, ExpenseDraft};
pub use service::CaptureService;
