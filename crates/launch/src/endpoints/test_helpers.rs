//! # エンドポイントテスト用共通ヘルパー
//!
//! Webhookのモックサーバーと、署名検証のモック実装。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::{AuthError, Authenticator, ConsumerCredentials, SignedLaunch};

/// 起動中のモックWebhook。
pub struct MockWebhook {
    /// Webhook URL
    pub url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockWebhook {
    /// これまでに受信したリクエストボディ。
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }

    /// これまでの呼び出し回数。
    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

/// テスト用モックWebhookを起動する。
///
/// `POST /exec` への呼び出しごとに `responses` を順に返し、
/// 使い切った後は最後の要素を返し続ける。
pub async fn start_mock_webhook(responses: Vec<serde_json::Value>) -> MockWebhook {
    use axum::routing::post;

    let received = Arc::new(Mutex::new(Vec::new()));
    let recorder = received.clone();
    let responses = Arc::new(responses);

    let app = axum::Router::new().route(
        "/exec",
        post(move |body: axum::body::Bytes| {
            let recorder = recorder.clone();
            let responses = responses.clone();
            async move {
                let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
                let index = {
                    let mut received = recorder.lock().unwrap();
                    received.push(value);
                    received.len() - 1
                };
                let response = responses
                    .get(index)
                    .or_else(|| responses.last())
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                match response {
                    // 文字列はJSONではない本文としてそのまま返す
                    serde_json::Value::String(raw) => raw,
                    other => other.to_string(),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    MockWebhook {
        url: format!("http://127.0.0.1:{port}/exec"),
        received,
    }
}

/// 署名検証のモック。呼び出し回数を記録し、固定の結果を返す。
pub struct MockAuthenticator {
    outcome: Result<bool, String>,
    calls: Arc<AtomicUsize>,
}

impl MockAuthenticator {
    /// 常に正当と判定する。
    pub fn accepting() -> Self {
        Self::with_outcome(Ok(true))
    }

    /// 常に署名不一致と判定する。
    pub fn rejecting() -> Self {
        Self::with_outcome(Ok(false))
    }

    /// 常に検証エラーを返す。
    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: Result<bool, String>) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 呼び出し回数を共有するカウンタ。
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl Authenticator for MockAuthenticator {
    async fn validate(
        &self,
        _launch: &SignedLaunch,
        _credentials: &ConsumerCredentials,
    ) -> Result<bool, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map_err(AuthError::InvalidParameters)
    }
}
