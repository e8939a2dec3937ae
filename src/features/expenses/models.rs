use serde::{Deserialize, Serialize};

/// 永続化済みの経費データモデル
///
/// 永続化サービスが所有するエンティティ。コアは作成のみ行い、
/// 既存レコードを変更しません。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PersistedExpense {
    pub id: i64,
    pub vendor: String,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    /// YYYY-MM-DD形式（保存時に正規化済みであることが保証される）
    pub date: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// 経費作成用DTO
///
/// `POST /api/expenses`のリクエストボディ。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewExpense {
    pub vendor: String,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    /// YYYY-MM-DD形式
    pub date: String,
    pub items: Vec<String>,
}

/// 経費作成レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateExpenseResponse {
    pub success: bool,
    pub message: Option<String>,
    pub expense: Option<PersistedExpense>,
    pub error: Option<String>,
}

/// 経費一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseListResponse {
    pub success: bool,
    #[serde(default)]
    pub expenses: Vec<PersistedExpense>,
    pub total: Option<usize>,
}

/// カテゴリ別集計（円グラフ用）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

/// 月別集計（折れ線グラフ用）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyPoint {
    /// YYYY-MM形式
    pub month: String,
    pub amount: f64,
}

/// 集計レスポンス（`GET /api/analytics`）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyticsResponse {
    pub success: bool,
    #[serde(rename = "categoryData", default)]
    pub category_data: Vec<CategorySlice>,
    #[serde(rename = "monthlyData", default)]
    pub monthly_data: Vec<MonthlyPoint>,
    #[serde(rename = "totalExpenses")]
    pub total_expenses: Option<f64>,
    #[serde(rename = "averageExpense")]
    pub average_expense: Option<f64>,
    #[serde(rename = "expenseCount")]
    pub expense_count: Option<usize>,
}

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    /// サービスが正常かどうか
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// 経費一覧の取得フィルター
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// カテゴリ名（固定セットのいずれか）
    pub category: Option<String>,
    /// この日付以降（YYYY-MM-DD）
    pub start_date: Option<String>,
    /// この日付以前（YYYY-MM-DD）
    pub end_date: Option<String>,
}

impl ExpenseFilter {
    /// クエリパラメータの組を構築する（URLエンコードはHTTPクライアント側で行う）
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![];

        if let Some(c) = &self.category {
            params.push(("category", c.clone()));
        }
        if let Some(s) = &self.start_date {
            params.push(("start_date", s.clone()));
        }
        if let Some(e) = &self.end_date {
            params.push(("end_date", e.clone()));
        }

        params
    }
}

/// 単一通貨での合計
///
/// 為替レートを持たないため、通貨が一致する行だけを合計します。
/// 固定レート（×80など）による疑似換算は行いません。
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTotal {
    /// 対象通貨
    pub currency: String,
    /// 通貨が一致した行の合計金額
    pub total: f64,
    /// 通貨が一致せず合計から除外した行数
    pub skipped: usize,
}

/// 指定通貨の経費だけを合計する
///
/// # 引数
/// * `expenses` - 経費一覧
/// * `currency` - 合計対象の通貨コード
pub fn total_in_currency(expenses: &[PersistedExpense], currency: &str) -> CurrencyTotal {
    let mut total = 0.0;
    let mut skipped = 0;

    for expense in expenses {
        if expense.currency == currency {
            total += expense.amount;
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::debug!("通貨不一致のため{skipped}件を合計から除外しました: currency={currency}");
    }

    CurrencyTotal {
        currency: currency.to_string(),
        total,
        skipped,
    }
}
