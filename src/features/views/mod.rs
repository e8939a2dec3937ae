/// データビュー機能モジュール
///
/// テーブル・円グラフ・折れ線グラフ・予算メーターなど、読み取り専用の
/// ビューをひとつの共通パターンで支えます。各ビューは自分の読み取り
/// クエリだけを持ち、同期バスの通知を受けたら次の描画前に再取得します。
pub mod queries;
pub mod synced_view;

pub use queries::{
    delete_and_notify, budget_status, BudgetStatus, BudgetUtilizationQuery,
    CategoryBreakdownQuery, MonthlyTrendQuery, RecentExpensesQuery,
};
pub use synced_view::{SyncedView, ViewQuery};
