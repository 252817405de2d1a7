//! # LTI Launch エラー型
//!
//! 起動ハンドラの全ゲートで共通のエラー型。
//! レスポンス本文はLMS経由でブラウザに表示されるプレーンテキスト。

use axum::http::StatusCode;

/// 起動処理のエラー型。
///
/// どのエラーもリクエストに対して終端的であり、内部で再試行しない。
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// 設定エラー: コンシューマキーまたは共有シークレットが未設定
    #[error("Server not configured")]
    NotConfigured,
    /// 設定エラー: Webhook URLがリクエストにも環境変数にもない
    #[error("No Apps Script URL configured (custom_appscript_url param or APPS_SCRIPT_URL env var).")]
    WebhookNotConfigured,
    /// 認証エラー: LTI署名の検証失敗
    #[error("Invalid LTI request")]
    Unauthorized(String),
    /// 検証エラー: 必須の起動パラメータが欠落
    #[error("Assignment missing {0} parameter")]
    MissingParameter(String),
    /// プロビジョニングエラー: Webhookが失敗を返した（上流のエラー文字列を含む）
    #[error("Failed to create student copy: {0}")]
    ProvisioningFailed(String),
    /// プロビジョニングエラー: Webhookへの通信またはレスポンス解析に失敗
    #[error("Server error while calling Apps Script")]
    WebhookUnreachable(String),
    /// 予期しないエラー
    #[error("Server error")]
    Internal(String),
}

impl LaunchError {
    /// HTTPステータスコードへの対応。
    pub fn status(&self) -> StatusCode {
        match self {
            LaunchError::NotConfigured
            | LaunchError::ProvisioningFailed(_)
            | LaunchError::WebhookUnreachable(_)
            | LaunchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LaunchError::WebhookNotConfigured | LaunchError::MissingParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            LaunchError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl axum::response::IntoResponse for LaunchError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match &self {
            LaunchError::Unauthorized(detail) => {
                tracing::error!(%detail, "LTI検証に失敗しました");
            }
            LaunchError::WebhookUnreachable(detail) => {
                tracing::error!(%detail, "Apps Scriptの呼び出しに失敗しました");
            }
            LaunchError::Internal(detail) => {
                tracing::error!(%detail, "内部エラー");
            }
            other => {
                tracing::error!(status = %status, error = %other, "起動リクエストを拒否しました");
            }
        }
        (status, self.to_string()).into_response()
    }
}
