/// 経費機能モジュール
///
/// 経費永続化サービス（CRUD・集計・ヘルスチェック）とのAPIクライアントと
/// 関連モデルを提供します。コアは既存経費を変更せず、新規作成のみ行います。
pub mod api_client;
pub mod errors;
pub mod models;

pub use api_client::{ExpenseApiClient, ExpenseStore};
pub use errors::PersistenceError;
pub use models::{
    total_in_currency, AnalyticsResponse, CategorySlice, CurrencyTotal, ExpenseFilter,
    MonthlyPoint, NewExpense, PersistedExpense,
};
