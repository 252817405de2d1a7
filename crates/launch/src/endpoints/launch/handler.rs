//! # /launch メインハンドラ
//!
//! ## 処理フロー
//! 1. コンシューマキー・共有シークレットの存在確認
//! 2. LTI署名を検証
//! 3. 起動パラメータを抽出（テンプレートドキュメントは必須）
//! 4. Webhook URLを決定（リクエスト指定 > 環境変数）
//! 5. Webhookにドキュメント複製を依頼
//! 6. インタースティシャルページへリダイレクト
//!
//! 各ステップは順番に通過するゲートであり、失敗した時点で即座にエラー応答を返す。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::auth::SignedLaunch;
use crate::config::LaunchState;
use crate::error::LaunchError;
use crate::params::LaunchParams;
use crate::provision::request_copy;
use crate::redirect::{interstitial_url, resolve_origin};

/// 必須パラメータ名（エラーメッセージ用）
const TEMPLATE_DOC_PARAM: &str = "custom_doc_url";

/// POST /launch — LTI起動ハンドラ。
pub async fn handle_launch(
    State(state): State<Arc<LaunchState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, LaunchError> {
    // Step 1. 認証情報
    let credentials = state.config.credentials().ok_or_else(|| {
        tracing::error!("CANVAS_CONSUMER_KEYまたはCANVAS_SHARED_SECRETが未設定です");
        LaunchError::NotConfigured
    })?;

    // Step 2. 署名検証
    let form: Vec<(String, String)> = url::form_urlencoded::parse(&body).into_owned().collect();
    let launch = SignedLaunch::from_request(&method, &uri, &headers, &form)
        .map_err(|e| LaunchError::Unauthorized(e.to_string()))?;

    match state.authenticator.validate(&launch, &credentials).await {
        Ok(true) => {}
        Ok(false) => return Err(LaunchError::Unauthorized("署名が一致しません".to_string())),
        Err(e) => return Err(LaunchError::Unauthorized(e.to_string())),
    }

    // Step 3. 起動パラメータ
    let params = LaunchParams::from_form(&form);
    let provision_request = params
        .provision_request()
        .ok_or_else(|| LaunchError::MissingParameter(TEMPLATE_DOC_PARAM.to_string()))?;

    // Step 4. Webhook URL
    let webhook_url = params
        .webhook_url(state.config.default_webhook_url.as_deref())
        .ok_or(LaunchError::WebhookNotConfigured)?;

    // Step 5. ドキュメント複製
    let file_id = request_copy(
        &state.http_client,
        webhook_url,
        &provision_request,
        state.config.webhook_timeout,
    )
    .await?;

    // Step 6. リダイレクト
    let origin = resolve_origin(state.config.public_origin.as_deref(), &headers)?;
    let location = interstitial_url(
        &origin,
        &file_id,
        &params.student_email,
        &params.teacher_email,
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
