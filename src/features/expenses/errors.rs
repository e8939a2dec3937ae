use log::error;
use serde::{Deserialize, Serialize};

/// 永続化エラーの種類
///
/// 保存試行中（Saving）に発生するとキャプチャセッションをFailed状態へ
/// 遷移させます。自動リトライは行わず、ユーザーの再保存操作を待ちます。
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum PersistenceError {
    /// 永続化サービスへ接続できない（タイムアウト含む）
    #[error("ネットワークエラー: {message}")]
    NetworkUnreachable { message: String },

    /// 永続化サービスが非2xxレスポンスを返した
    #[error("経費サービスエラー: HTTP {status} - {message}")]
    ServiceError { status: u16, message: String },

    /// 2xxだがレスポンスボディを解釈できない
    #[error("レスポンス解析エラー: {message}")]
    MalformedResponse { message: String },
}

impl PersistenceError {
    /// ネットワークエラーを作成
    pub fn network_unreachable<S: Into<String>>(message: S) -> Self {
        let msg = message.into();
        error!("経費サービスへの接続に失敗: {msg}");
        Self::NetworkUnreachable { message: msg }
    }

    /// サービスエラーを作成
    pub fn service_error<S: Into<String>>(status: u16, message: S) -> Self {
        let msg = message.into();
        error!("経費サービスエラー: status={status}, message={msg}");
        Self::ServiceError {
            status,
            message: msg,
        }
    }

    /// レスポンス解析エラーを作成
    pub fn malformed_response<S: Into<String>>(message: S) -> Self {
        let msg = message.into();
        error!("経費サービスのレスポンス解析に失敗: {msg}");
        Self::MalformedResponse { message: msg }
    }

    /// エラーの種類を取得
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable { .. } => "NetworkUnreachable",
            Self::ServiceError { .. } => "ServiceError",
            Self::MalformedResponse { .. } => "MalformedResponse",
        }
    }

    /// エラーが再試行可能かどうかを判定
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkUnreachable { .. } => true,
            Self::ServiceError { status, .. } => *status >= 500,
            Self::MalformedResponse { .. } => false,
        }
    }

    /// ユーザー向けのエラーメッセージを取得
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NetworkUnreachable { .. } => {
                "経費サービスへ接続できません。ネットワーク接続を確認して、もう一度保存してください。".to_string()
            }
            Self::ServiceError { .. } => {
                "経費の保存でサーバーエラーが発生しました。しばらく時間をおいて、もう一度保存してください。".to_string()
            }
            Self::MalformedResponse { .. } => {
                "経費サービスの応答を解釈できませんでした。もう一度保存してください。".to_string()
            }
        }
    }
}

/// reqwestエラーからPersistenceErrorへの変換
impl From<reqwest::Error> for PersistenceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::network_unreachable(format!("HTTPリクエストタイムアウト: {error}"))
        } else if error.is_connect() {
            Self::network_unreachable(format!("接続エラー: {error}"))
        } else if error.is_decode() {
            Self::malformed_response(format!("レスポンス解析エラー: {error}"))
        } else {
            Self::network_unreachable(format!("HTTPエラー: {error}"))
        }
    }
}
