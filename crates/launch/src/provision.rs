//! # ドキュメント複製Webhookの呼び出し
//!
//! Apps Script Web Appに複製リクエストを1回だけ送信する。再試行はしない。
//! 上流のHTTPステータスは見ず、レスポンスJSONの `success` が `true` かどうかで成否を判定する。

use std::time::Duration;

use lti_launch_types::{ProvisionRequest, ProvisionResponse};

use crate::error::LaunchError;

/// Webhookにドキュメント複製を依頼し、複製されたファイルIDを返す。
///
/// `timeout` がNoneの場合は応答まで待ち続ける。
pub async fn request_copy(
    http_client: &reqwest::Client,
    webhook_url: &str,
    request: &ProvisionRequest,
    timeout: Option<Duration>,
) -> Result<String, LaunchError> {
    let mut builder = http_client.post(webhook_url).json(request);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| LaunchError::WebhookUnreachable(format!("HTTP送信失敗: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LaunchError::WebhookUnreachable(format!("レスポンス読み取り失敗: {e}")))?;

    // JSONとして読めない本文は通信失敗扱い。スキーマは強制せず存在チェックのみ行う。
    let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
        LaunchError::WebhookUnreachable(format!(
            "レスポンスのパースに失敗 (HTTP {status}): {e}"
        ))
    })?;
    let parsed = ProvisionResponse::from_value(&value);

    if !parsed.success {
        tracing::error!(
            webhook_url,
            http_status = %status,
            upstream_error = ?parsed.error,
            "Apps Scriptが失敗を返しました"
        );
        return Err(LaunchError::ProvisioningFailed(
            parsed.error.unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    match parsed.file_id.filter(|id| !id.is_empty()) {
        Some(file_id) => {
            tracing::info!(webhook_url, file_id = %file_id, "学生用コピーを作成しました");
            Ok(file_id)
        }
        None => {
            tracing::error!(webhook_url, "Apps Scriptの成功レスポンスにfileIdがありません");
            Err(LaunchError::ProvisioningFailed("unknown".to_string()))
        }
    }
}
