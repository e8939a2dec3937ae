use crate::features::expenses::errors::PersistenceError;
use crate::features::extraction::errors::ExtractionError;
use log::warn;
use serde::{Deserialize, Serialize};

/// 入力検証エラーの種類
///
/// フィールド編集で解消できるローカルなエラーです。セッションは
/// 現在の状態（ReadyToReview / ManualDrafting）に留まります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    /// 店舗名が未入力（空白のみ含む）
    #[error("店舗名が入力されていません")]
    MissingVendor,

    /// 金額が未入力、数値でない、または0以下
    #[error("金額は0より大きい数値を入力してください")]
    InvalidAmount,

    /// カテゴリが未選択、または固定セット外
    #[error("カテゴリが選択されていません")]
    MissingCategory,
}

impl ValidationError {
    /// エラーの種類を取得
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::MissingVendor => "MissingVendor",
            Self::InvalidAmount => "InvalidAmount",
            Self::MissingCategory => "MissingCategory",
        }
    }
}

/// キャプチャ中に発生するエラーの分類
///
/// 検証エラーは編集で回復、抽出・永続化エラーは操作全体の再実行が必要です。
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum CaptureError {
    /// 保存前の入力検証に失敗
    #[error("入力エラー: {0}")]
    Validation(#[from] ValidationError),

    /// レシート抽出に失敗
    #[error("抽出エラー: {0}")]
    Extraction(#[from] ExtractionError),

    /// 経費の保存に失敗
    #[error("保存エラー: {0}")]
    Persistence(#[from] PersistenceError),
}

impl CaptureError {
    /// 検証エラーを作成
    pub fn validation(error: ValidationError) -> Self {
        warn!("入力検証に失敗: {}", error.error_type());
        Self::Validation(error)
    }

    /// エラーの種類を取得
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_type(),
            Self::Extraction(e) => e.error_type(),
            Self::Persistence(e) => e.error_type(),
        }
    }

    /// ユーザー向けのエラーメッセージを取得
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Extraction(e) => e.user_friendly_message(),
            Self::Persistence(e) => e.user_friendly_message(),
        }
    }

    /// ユーザーへ提示する対処方法
    pub fn suggested_remedy(&self) -> &'static str {
        match self {
            Self::Validation(_) => "該当フィールドを修正して、もう一度保存してください。",
            Self::Extraction(ExtractionError::UnsupportedFileType { .. }) => {
                "JPEG・PNG・GIF・BMP・PDFのいずれかの形式で再アップロードするか、手入力に切り替えてください。"
            }
            Self::Extraction(_) => {
                "もう一度アップロードするか、手入力に切り替えてください。"
            }
            Self::Persistence(_) => "ネットワーク接続を確認して、もう一度保存してください。",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_types() {
        assert_eq!(ValidationError::MissingVendor.error_type(), "MissingVendor");
        assert_eq!(ValidationError::InvalidAmount.error_type(), "InvalidAmount");
        assert_eq!(
            ValidationError::MissingCategory.error_type(),
            "MissingCategory"
        );
    }

    #[test]
    fn test_capture_error_wraps_inner_type() {
        let error = CaptureError::validation(ValidationError::InvalidAmount);
        assert_eq!(error.error_type(), "InvalidAmount");

        let error: CaptureError = ExtractionError::unsupported_file_type("text/plain").into();
        assert_eq!(error.error_type(), "UnsupportedFileType");
        assert!(error.suggested_remedy().contains("手入力"));

        let error: CaptureError = PersistenceError::service_error(502, "bad gateway").into();
        assert_eq!(error.error_type(), "ServiceError");
        assert!(error.suggested_remedy().contains("もう一度保存"));
    }
}
