//! # 起動ハンドラ設定・共有状態
//!
//! 環境変数からの設定読み込みと、ハンドラに注入する共有状態の定義。
//! 設定はプロセス起動時に一度だけ読み込み、以降は変更しない。

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use crate::auth::{Authenticator, ConsumerCredentials};

/// 待ち受けアドレスのデフォルト値
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// 起動ハンドラの設定。
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// LTIコンシューマキー（`CANVAS_CONSUMER_KEY`）
    pub consumer_key: Option<String>,
    /// LTI共有シークレット（`CANVAS_SHARED_SECRET`）
    pub consumer_secret: Option<String>,
    /// デフォルトのWebhook URL（`APPS_SCRIPT_URL`）
    pub default_webhook_url: Option<String>,
    /// リダイレクト先のオリジン（`HOSTNAME`）。
    /// `http://` / `https://` で始まる値のみ採用する。
    pub public_origin: Option<String>,
    /// Webhook呼び出しのタイムアウト（`WEBHOOK_TIMEOUT_SECS`）。
    /// Noneの場合は応答まで待ち続ける。
    pub webhook_timeout: Option<Duration>,
    /// 待ち受けアドレス（`BIND_ADDR`）
    pub bind_addr: SocketAddr,
}

impl LaunchConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から構築する。空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let public_origin = match get("HOSTNAME") {
            Some(origin) if origin.starts_with("http://") || origin.starts_with("https://") => {
                Some(origin.trim_end_matches('/').to_string())
            }
            Some(other) => {
                tracing::debug!(hostname = %other, "HOSTNAMEがオリジン形式ではないため無視します");
                None
            }
            None => None,
        };

        let webhook_timeout = get("WEBHOOK_TIMEOUT_SECS")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("WEBHOOK_TIMEOUT_SECSは秒数である必要があります: {v}"))
            })
            .transpose()?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDRのパースに失敗")?;

        Ok(Self {
            consumer_key: get("CANVAS_CONSUMER_KEY"),
            consumer_secret: get("CANVAS_SHARED_SECRET"),
            default_webhook_url: get("APPS_SCRIPT_URL"),
            public_origin,
            webhook_timeout,
            bind_addr,
        })
    }

    /// コンシューマキーと共有シークレットの組。どちらかが欠けていればNone。
    pub fn credentials(&self) -> Option<ConsumerCredentials> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) => Some(ConsumerCredentials {
                key: key.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        }
    }
}

/// 起動ハンドラの共有状態。全リクエストから読み取り専用で参照される。
pub struct LaunchState {
    /// 起動時に読み込んだ設定
    pub config: LaunchConfig,
    /// Webhook呼び出し用HTTPクライアント
    pub http_client: reqwest::Client,
    /// LTI署名検証（トレイトで抽象化）
    pub authenticator: Box<dyn Authenticator>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LaunchConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.consumer_key.is_none());
        assert!(config.credentials().is_none());
        assert!(config.default_webhook_url.is_none());
        assert!(config.public_origin.is_none());
        assert!(config.webhook_timeout.is_none());
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_full_config() {
        let config = LaunchConfig::from_lookup(lookup(&[
            ("CANVAS_CONSUMER_KEY", "key"),
            ("CANVAS_SHARED_SECRET", "secret"),
            ("APPS_SCRIPT_URL", "https://script.google.com/macros/s/X/exec"),
            ("HOSTNAME", "https://launch.example.com/"),
            ("WEBHOOK_TIMEOUT_SECS", "30"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        let creds = config.credentials().unwrap();
        assert_eq!(creds.key, "key");
        assert_eq!(creds.secret, "secret");
        assert_eq!(
            config.default_webhook_url.as_deref(),
            Some("https://script.google.com/macros/s/X/exec")
        );
        assert_eq!(config.public_origin.as_deref(), Some("https://launch.example.com"));
        assert_eq!(config.webhook_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }

    /// シークレットだけが空の場合は認証情報なしとして扱われることを確認
    #[test]
    fn test_empty_secret_counts_as_missing() {
        let config = LaunchConfig::from_lookup(lookup(&[
            ("CANVAS_CONSUMER_KEY", "key"),
            ("CANVAS_SHARED_SECRET", ""),
        ]))
        .unwrap();
        assert!(config.credentials().is_none());
    }

    /// コンテナが設定するマシン名のHOSTNAMEは無視されることを確認
    #[test]
    fn test_machine_hostname_is_ignored() {
        let config = LaunchConfig::from_lookup(lookup(&[("HOSTNAME", "a1b2c3d4e5f6")])).unwrap();
        assert!(config.public_origin.is_none());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(LaunchConfig::from_lookup(lookup(&[("WEBHOOK_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_invalid_bind_addr_is_rejected() {
        assert!(LaunchConfig::from_lookup(lookup(&[("BIND_ADDR", "not-an-addr")])).is_err());
    }
}
