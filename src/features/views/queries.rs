// 各ビューの読み取りクエリ
//
// テーブル・円グラフ・折れ線グラフ・予算メーターは同じ永続化サービスを
// 読みますが、必要な形がそれぞれ異なるため個別のクエリとして実装します。

use crate::features::expenses::api_client::ExpenseApiClient;
use crate::features::expenses::errors::PersistenceError;
use crate::features::expenses::models::{
    CategorySlice, ExpenseFilter, MonthlyPoint, PersistedExpense,
};
use crate::features::sync::{SyncBus, SyncEvent};
use crate::features::views::synced_view::ViewQuery;
use crate::shared::dates;
use log::info;
use std::sync::Arc;

/// 経費テーブル用のクエリ
pub struct RecentExpensesQuery {
    client: Arc<ExpenseApiClient>,
    filter: ExpenseFilter,
}

impl RecentExpensesQuery {
    pub fn new(client: Arc<ExpenseApiClient>, filter: ExpenseFilter) -> Self {
        Self { client, filter }
    }
}

impl ViewQuery for RecentExpensesQuery {
    type Output = Vec<PersistedExpense>;

    async fn load(&self) -> Result<Vec<PersistedExpense>, PersistenceError> {
        self.client.list(&self.filter).await
    }
}

/// カテゴリ別集計（円グラフ）用のクエリ
pub struct CategoryBreakdownQuery {
    client: Arc<ExpenseApiClient>,
}

impl CategoryBreakdownQuery {
    pub fn new(client: Arc<ExpenseApiClient>) -> Self {
        Self { client }
    }
}

impl ViewQuery for CategoryBreakdownQuery {
    type Output = Vec<CategorySlice>;

    async fn load(&self) -> Result<Vec<CategorySlice>, PersistenceError> {
        Ok(self.client.analytics().await?.category_data)
    }
}

/// 月別推移（折れ線グラフ）用のクエリ
pub struct MonthlyTrendQuery {
    client: Arc<ExpenseApiClient>,
}

impl MonthlyTrendQuery {
    pub fn new(client: Arc<ExpenseApiClient>) -> Self {
        Self { client }
    }
}

impl ViewQuery for MonthlyTrendQuery {
    type Output = Vec<MonthlyPoint>;

    async fn load(&self) -> Result<Vec<MonthlyPoint>, PersistenceError> {
        Ok(self.client.analytics().await?.monthly_data)
    }
}

/// 予算メーターの表示データ
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    /// 今月の支出合計
    pub spent: f64,
    /// 月次予算（未設定の場合はNone）
    pub budget: Option<f64>,
    /// 予算の消化率（0〜100にクランプ。予算未設定の場合はNone）
    pub percent_used: Option<f64>,
}

/// 支出と予算から予算メーターの表示データを組み立てる
///
/// 消化率はメーター表示用に100%でクランプします。予算が未設定または
/// 0以下の場合は消化率を出しません。
pub fn budget_status(spent: f64, budget: Option<f64>) -> BudgetStatus {
    let percent_used = budget
        .filter(|b| *b > 0.0)
        .map(|b| (spent / b * 100.0).clamp(0.0, 100.0));

    BudgetStatus {
        spent,
        budget,
        percent_used,
    }
}

/// 予算メーター用のクエリ
///
/// 集計エンドポイントの月別データから今月分を取り出し、設定された
/// 月次予算と突き合わせます。
pub struct BudgetUtilizationQuery {
    client: Arc<ExpenseApiClient>,
    monthly_budget: Option<f64>,
}

impl BudgetUtilizationQuery {
    pub fn new(client: Arc<ExpenseApiClient>, monthly_budget: Option<f64>) -> Self {
        Self {
            client,
            monthly_budget,
        }
    }
}

impl ViewQuery for BudgetUtilizationQuery {
    type Output = BudgetStatus;

    async fn load(&self) -> Result<BudgetStatus, PersistenceError> {
        let analytics = self.client.analytics().await?;
        let current_month = dates::local_today().format("%Y-%m").to_string();

        let spent = analytics
            .monthly_data
            .iter()
            .find(|point| point.month == current_month)
            .map(|point| point.amount)
            .unwrap_or(0.0);

        Ok(budget_status(spent, self.monthly_budget))
    }
}

/// 経費を削除して各ビューへ通知する
///
/// 削除はビュー側（テーブルの行操作）から行われるため、キャプチャの
/// 状態機械は経由しません。削除成功時のみ通知を配信します。
pub async fn delete_and_notify(
    client: &ExpenseApiClient,
    bus: &SyncBus,
    expense: PersistedExpense,
) -> Result<(), PersistenceError> {
    client.delete(expense.id).await?;
    info!("経費を削除しました: id={}, vendor={}", expense.id, expense.vendor);
    bus.publish(&SyncEvent::expense_deleted(Some(expense)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_status_percent() {
        let status = budget_status(2500.0, Some(10000.0));
        assert_eq!(status.percent_used, Some(25.0));
    }

    #[test]
    fn test_budget_status_clamps_overspend() {
        let status = budget_status(15000.0, Some(10000.0));
        assert_eq!(status.percent_used, Some(100.0));
    }

    #[test]
    fn test_budget_status_without_budget() {
        assert_eq!(budget_status(500.0, None).percent_used, None);
        // 0以下の予算は未設定と同じ扱い
        assert_eq!(budget_status(500.0, Some(0.0)).percent_used, None);
    }
}
