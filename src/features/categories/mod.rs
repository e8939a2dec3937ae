/// カテゴリ機能モジュール
///
/// 経費カテゴリの固定セットとその検証を提供します。
pub mod models;

pub use models::{all, is_known};
