// 抽出サービス（レシートOCR）との通信を行うクライアント

use crate::features::extraction::errors::ExtractionError;
use crate::features::extraction::models::{ExtractionOutcome, ProcessBillResponse, ReceiptUpload};
use crate::shared::config::ServiceConfig;
use log::{info, warn};
use reqwest::{multipart, Client};
use std::time::Duration;

/// 抽出サービスのインターフェース
///
/// 状態機械へ注入するための継ぎ目。本番実装は`ExtractionClient`、
/// テストではスクリプト化したフェイクを差し込みます。
pub trait ExtractionService {
    /// レシートファイルを送信し、抽出結果を取得する
    fn extract(
        &self,
        upload: &ReceiptUpload,
    ) -> impl std::future::Future<Output = Result<ExtractionOutcome, ExtractionError>> + Send;
}

/// 抽出サービスのHTTPクライアント
pub struct ExtractionClient {
    client: Client,
    config: ServiceConfig,
}

impl ExtractionClient {
    /// 新しい抽出クライアントを作成
    ///
    /// # 引数
    /// * `config` - サービス設定（ベースURL・タイムアウト・リトライ回数）
    pub fn new(config: ServiceConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ExtractionError::network_unreachable(format!("HTTPクライアント初期化失敗: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// マルチパートフォームを構築する（リトライごとに再作成が必要）
    fn build_form(&self, upload: &ReceiptUpload) -> Result<multipart::Form, ExtractionError> {
        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| {
                ExtractionError::unsupported_file_type(format!("{}: {e}", upload.mime_type))
            })?;

        Ok(multipart::Form::new().part(upload.multipart_field_name().to_string(), part))
    }
}

impl ExtractionService for ExtractionClient {
    async fn extract(
        &self,
        upload: &ReceiptUpload,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        // 許可リスト外はネットワーク送信前に即時失敗
        if !upload.is_supported() {
            return Err(ExtractionError::unsupported_file_type(&upload.mime_type));
        }

        info!(
            "レシート抽出を開始: filename={}, mime={}, size={}bytes",
            upload.filename,
            upload.mime_type,
            upload.bytes.len()
        );

        let url = format!("{}/api/process-bill", self.config.extraction_base_url);

        // 接続失敗に限りリトライ機能付きでリクエスト送信
        let mut attempts = 0;
        loop {
            let form = self.build_form(upload)?;

            match self.client.post(&url).multipart(form).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(ExtractionError::service_error(status.as_u16(), body));
                    }

                    let parsed: ProcessBillResponse = response.json().await.map_err(|e| {
                        ExtractionError::malformed_response(format!("JSONの解釈に失敗: {e}"))
                    })?;

                    // 2xxかつsuccess=falseはサービス側の処理失敗
                    if !parsed.success {
                        let message = parsed
                            .error
                            .unwrap_or_else(|| "抽出処理に失敗しました".to_string());
                        return Err(ExtractionError::service_error(status.as_u16(), message));
                    }

                    info!("レシート抽出が完了しました: filename={}", upload.filename);
                    return Ok(parsed.into_outcome());
                }
                Err(e) => {
                    let mapped: ExtractionError = e.into();
                    if mapped.is_retryable() && attempts < self.config.max_retries {
                        attempts += 1;
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "抽出リクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
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
