use log::{error, warn};
use serde::{Deserialize, Serialize};

/// 抽出エラーの種類
///
/// いずれもキャプチャセッションをFailed状態へ遷移させます（入力バリデーション
/// エラーとは別系統）。握りつぶさず、必ずユーザー向けメッセージを持ちます。
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ExtractionError {
    /// 許可リスト外のファイル形式（ネットワーク送信前に検出）
    #[error("未対応のファイル形式: {mime_type}")]
    UnsupportedFileType { mime_type: String },

    /// 抽出サービスへ接続できない（タイムアウト含む）
    #[error("ネットワークエラー: {message}")]
    NetworkUnreachable { message: String },

    /// 抽出サービスが非2xxレスポンスを返した
    #[error("抽出サービスエラー: HTTP {status} - {message}")]
    ServiceError { status: u16, message: String },

    /// 2xxだがレスポンスボディを解釈できない
    #[error("レスポンス解析エラー: {message}")]
    MalformedResponse { message: String },
}

impl ExtractionError {
    /// 未対応ファイル形式エラーを作成
    pub fn unsupported_file_type<S: Into<String>>(mime_type: S) -> Self {
        let mime = mime_type.into();
        warn!("未対応のファイル形式が指定されました: {mime}");
        Self::UnsupportedFileType { mime_type: mime }
    }

    /// ネットワークエラーを作成
    pub fn network_unreachable<S: Into<String>>(message: S) -> Self {
        let msg = message.into();
        error!("抽出サービスへの接続に失敗: {msg}");
        Self::NetworkUnreachable { message: msg }
    }

    /// サービスエラーを作成
    pub fn service_error<S: Into<String>>(status: u16, message: S) -> Self {
        let msg = message.into();
        error!("抽出サービスエラー: status={status}, message={msg}");
        Self::ServiceError {
            status,
            message: msg,
        }
    }

    /// レスポンス解析エラーを作成
    pub fn malformed_response<S: Into<String>>(message: S) -> Self {
        let msg = message.into();
        error!("抽出サービスのレスポンス解析に失敗: {msg}");
        Self::MalformedResponse { message: msg }
    }

    /// エラーの種類を取得
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType { .. } => "UnsupportedFileType",
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
            Self::UnsupportedFileType { .. } => false,
            Self::MalformedResponse { .. } => false,
        }
    }

    /// ユーザー向けのエラーメッセージを取得
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UnsupportedFileType { mime_type } => {
                format!(
                    "このファイル形式（{mime_type}）には対応していません。JPEG・PNG・GIF・BMP・PDFのいずれかを選択してください。"
                )
            }
            Self::NetworkUnreachable { .. } => {
                "抽出サービスへ接続できません。ネットワーク接続を確認して再試行するか、手入力に切り替えてください。".to_string()
            }
            Self::ServiceError { .. } => {
                "抽出サービスでエラーが発生しました。しばらく時間をおいて再試行するか、手入力に切り替えてください。".to_string()
            }
            Self::MalformedResponse { .. } => {
                "抽出サービスの応答を解釈できませんでした。再試行するか、手入力に切り替えてください。".to_string()
            }
        }
    }
}

/// reqwestエラーからExtractionErrorへの変換
impl From<reqwest::Error> for ExtractionError {
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
