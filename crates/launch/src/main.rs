//! # LTI Launch ハンドラ
//!
//! LMS（Canvas等）からのLTI 1.x 起動を受け付け、Apps Script Web Appに
//! 学生用ドキュメントのコピー作成を依頼し、インタースティシャルページへ
//! リダイレクトするHTTPサーバー。
//!
//! ## API エンドポイント
//! - `POST /launch` — LTI起動
//! - `GET /health` — 死活監視
//!
//! ## 環境変数
//! - `CANVAS_CONSUMER_KEY` / `CANVAS_SHARED_SECRET` — LTI認証情報
//! - `APPS_SCRIPT_URL` — デフォルトのWebhook URL
//! - `HOSTNAME` — リダイレクト先のオリジン（`https://...` 形式）
//! - `WEBHOOK_TIMEOUT_SECS` — Webhook呼び出しのタイムアウト（未設定なら無制限）
//! - `BIND_ADDR` — 待ち受けアドレス（デフォルト `0.0.0.0:3000`）

mod auth;
mod config;
mod endpoints;
mod error;
mod params;
mod provision;
mod redirect;

use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth::OAuth1Authenticator;
use crate::config::{LaunchConfig, LaunchState};
use crate::endpoints::{handle_health, handle_launch};

/// ハンドラ内のpanicを汎用の500応答に変換する。
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("不明なpanic");
    tracing::error!(%detail, "リクエスト処理中にpanicが発生しました");
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// ルーターを構築する。
pub(crate) fn build_router(state: Arc<LaunchState>) -> axum::Router {
    axum::Router::new()
        .route("/launch", axum::routing::post(handle_launch))
        .route("/health", axum::routing::get(handle_health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = LaunchConfig::from_env()?;

    if config.credentials().is_none() {
        tracing::warn!(
            "CANVAS_CONSUMER_KEYまたはCANVAS_SHARED_SECRETが未設定です。起動リクエストは500で拒否されます"
        );
    }
    match &config.default_webhook_url {
        Some(url) => tracing::info!(apps_script_url = %url, "デフォルトのWebhook URLを設定"),
        None => tracing::info!("APPS_SCRIPT_URLが未設定です。custom_appscript_urlが必須になります"),
    }
    if let Some(timeout) = config.webhook_timeout {
        tracing::info!(timeout_secs = timeout.as_secs(), "Webhookタイムアウトを設定");
    }

    let addr = config.bind_addr;
    let state = Arc::new(LaunchState {
        config,
        http_client: reqwest::Client::new(),
        authenticator: Box::new(OAuth1Authenticator::default()),
    });

    let app = build_router(state);

    tracing::info!("LTI Launchハンドラを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
