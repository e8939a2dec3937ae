// 経費永続化サービスとの通信を行うクライアント

use crate::features::expenses::errors::PersistenceError;
use crate::features::expenses::models::{
    AnalyticsResponse, CreateExpenseResponse, ExpenseFilter, ExpenseListResponse, HealthResponse,
    NewExpense, PersistedExpense,
};
use crate::shared::config::ServiceConfig;
use log::{debug, info, warn};
use reqwest::Client;
use std::time::Duration;

/// 経費書き込みのインターフェース
///
/// 状態機械の保存ステップへ注入するための継ぎ目。本番実装は
/// `ExpenseApiClient`、テストでは呼び出し回数を記録するフェイクを使います。
pub trait ExpenseStore {
    /// 新しい経費を作成する
    fn create(
        &self,
        expense: &NewExpense,
    ) -> impl std::future::Future<Output = Result<PersistedExpense, PersistenceError>> + Send;
}

/// 経費永続化サービスのHTTPクライアント
pub struct ExpenseApiClient {
    client: Client,
    config: ServiceConfig,
}

impl ExpenseApiClient {
    /// 新しい経費APIクライアントを作成
    pub fn new(config: ServiceConfig) -> Result<Self, PersistenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                PersistenceError::network_unreachable(format!("HTTPクライアント初期化失敗: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// 経費一覧を取得する
    ///
    /// # 引数
    /// * `filter` - カテゴリ・期間のフィルター
    pub async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<PersistedExpense>, PersistenceError> {
        let url = format!("{}/api/expenses", self.config.expense_base_url);
        debug!("経費一覧を取得: url={url}");

        let response: ExpenseListResponse = self
            .get_with_retry(self.client.get(&url).query(&filter.to_query_pairs()))
            .await?;

        if !response.success {
            return Err(PersistenceError::service_error(
                200,
                "経費一覧の取得に失敗しました",
            ));
        }

        info!("経費一覧取得成功: count={}", response.expenses.len());
        Ok(response.expenses)
    }

    /// 経費を削除する
    ///
    /// # 引数
    /// * `id` - 経費ID
    pub async fn delete(&self, id: i64) -> Result<(), PersistenceError> {
        let url = format!("{}/api/expenses/{id}", self.config.expense_base_url);
        info!("経費削除リクエスト送信: id={id}");

        // 削除は冪等なため接続失敗時はリトライする
        let mut attempts = 0;
        loop {
            match self.client.delete(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        info!("経費削除成功: id={id}");
                        return Ok(());
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(PersistenceError::service_error(status.as_u16(), body));
                }
                Err(e) => {
                    let mapped: PersistenceError = e.into();
                    if mapped.is_retryable() && attempts < self.config.max_retries {
                        attempts += 1;
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "削除リクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                            self.config.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(mapped);
                }
            }
        }
    }

    /// カテゴリ別・月別の集計を取得する
    pub async fn analytics(&self) -> Result<AnalyticsResponse, PersistenceError> {
        let url = format!("{}/api/analytics", self.config.expense_base_url);
        debug!("集計データを取得: url={url}");

        let response: AnalyticsResponse = self.get_with_retry(self.client.get(&url)).await?;

        if !response.success {
            return Err(PersistenceError::service_error(
                200,
                "集計データの取得に失敗しました",
            ));
        }

        Ok(response)
    }

    /// サービスのヘルスチェック
    ///
    /// # 戻り値
    /// サービスが正常な場合はtrue
    pub async fn health_check(&self) -> Result<bool, PersistenceError> {
        let url = format!("{}/api/health", self.config.expense_base_url);
        debug!("ヘルスチェック開始: url={url}");

        let response: HealthResponse = self.get_with_retry(self.client.get(&url)).await?;
        Ok(response.is_healthy())
    }

    /// 接続失敗に限りリトライ機能付きでGET系リクエストを送信
    async fn get_with_retry<T>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PersistenceError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempts = 0;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                PersistenceError::network_unreachable("リクエストのクローンに失敗しました")
            })?;

            match cloned.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(PersistenceError::service_error(status.as_u16(), body));
                    }

                    return response.json().await.map_err(|e| {
                        PersistenceError::malformed_response(format!("JSONの解釈に失敗: {e}"))
                    });
                }
                Err(e) => {
                    let mapped: PersistenceError = e.into();
                    if mapped.is_retryable() && attempts < self.config.max_retries {
                        attempts += 1;
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "APIリクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                            self.config.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(mapped);
                }
            }
        }
    }
}

impl ExpenseStore for ExpenseApiClient {
    /// 新しい経費を作成する
    ///
    /// # 注意
    /// 二重登録を避けるため、作成リクエストはリトライしません。
    /// 失敗はそのまま呼び出し元（キャプチャセッション）へ返します。
    async fn create(&self, expense: &NewExpense) -> Result<PersistedExpense, PersistenceError> {
        let url = format!("{}/api/expenses", self.config.expense_base_url);
        info!(
            "経費作成リクエスト送信: vendor={}, amount={} {}",
            expense.vendor, expense.amount, expense.currency
        );

        let response = self.client.post(&url).json(expense).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::service_error(status.as_u16(), body));
        }

        let parsed: CreateExpenseResponse = response.json().await.map_err(|e| {
            PersistenceError::malformed_response(format!("JSONの解釈に失敗: {e}"))
        })?;

        if !parsed.success {
            let message = parsed
                .error
                .unwrap_or_else(|| "経費の作成に失敗しました".to_string());
            return Err(PersistenceError::service_error(status.as_u16(), message));
        }

        let persisted = parsed.expense.ok_or_else(|| {
            PersistenceError::malformed_response("作成レスポンスに経費データがありません")
        })?;

        info!("経費作成成功: id={}", persisted.id);
        Ok(persisted)
    }
}
