//! # OAuth 1.0a (HMAC-SHA1) によるLTI 1.x 起動検証
//!
//! LTI 1.x のLMSは起動フォームをOAuth 1.0a の HMAC-SHA1 で署名する。
//! 本実装はステートレスで、nonceは記録しない（タイムスタンプの許容幅のみ検査）。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;

use super::{AuthError, Authenticator, ConsumerCredentials, SignedLaunch};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 の非予約文字（ALPHA / DIGIT / "-" / "." / "_" / "~"）以外を全てエンコードする。
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 受け付けるLTIメッセージ種別
const SUPPORTED_MESSAGE_TYPES: &[&str] = &["basic-lti-launch-request", "ContentItemSelectionRequest"];

/// 受け付けるLTIバージョン
const SUPPORTED_LTI_VERSIONS: &[&str] = &["LTI-1p0", "LTI-1p2"];

/// タイムスタンプの許容ずれ（秒）のデフォルト値
const DEFAULT_MAX_CLOCK_SKEW_SECS: u64 = 300;

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// OAuthパラメータエンコード（RFC 5849 §3.6）。
pub fn oauth_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// 署名ベース文字列を構築する（RFC 5849 §3.4.1）。
/// `oauth_signature` は署名対象から除外する。
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "oauth_signature")
        .map(|(k, v)| (oauth_encode(k), oauth_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        oauth_encode(url),
        oauth_encode(&normalized)
    )
}

/// 共有シークレットで署名ベース文字列のHMAC-SHA1を計算する。
/// トークンシークレットはLTIでは常に空。
fn hmac_for(base_string: &str, consumer_secret: &str) -> Result<HmacSha1, AuthError> {
    let key = format!("{}&", oauth_encode(consumer_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(mac)
}

/// 署名ベース文字列にHMAC-SHA1署名を付け、Base64で返す（LMS側の署名手順）。
#[cfg(test)]
pub fn sign(base_string: &str, consumer_secret: &str) -> Result<String, AuthError> {
    let mac = hmac_for(base_string, consumer_secret)?;
    Ok(b64().encode(mac.finalize().into_bytes()))
}

/// OAuth 1.0a HMAC-SHA1 によるLTI起動検証。
#[derive(Debug, Clone)]
pub struct OAuth1Authenticator {
    max_clock_skew: Duration,
}

impl Default for OAuth1Authenticator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_MAX_CLOCK_SKEW_SECS))
    }
}

impl OAuth1Authenticator {
    /// タイムスタンプの許容ずれを指定して構築する。
    pub fn new(max_clock_skew: Duration) -> Self {
        Self { max_clock_skew }
    }

    /// 現在時刻（UNIX秒）を基準に検証する。
    pub fn validate_at(
        &self,
        launch: &SignedLaunch,
        credentials: &ConsumerCredentials,
        now: u64,
    ) -> Result<bool, AuthError> {
        check_lti_parameters(launch)?;

        if launch.param("oauth_consumer_key") != Some(credentials.key.as_str()) {
            return Err(AuthError::ConsumerKeyMismatch);
        }

        let method = launch.param("oauth_signature_method").unwrap_or_default();
        if method != "HMAC-SHA1" {
            return Err(AuthError::UnsupportedSignatureMethod(method.to_string()));
        }

        let timestamp = launch
            .param("oauth_timestamp")
            .ok_or_else(|| AuthError::InvalidTimestamp("未指定".to_string()))?;
        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| AuthError::InvalidTimestamp(timestamp.to_string()))?;
        if now.abs_diff(timestamp) > self.max_clock_skew.as_secs() {
            return Err(AuthError::InvalidTimestamp(format!(
                "{timestamp} (現在時刻 {now})"
            )));
        }

        let Some(provided) = launch.param("oauth_signature") else {
            return Ok(false);
        };
        let Ok(provided) = b64().decode(provided) else {
            return Ok(false);
        };

        let base_string = signature_base_string(&launch.method, &launch.url, &launch.params);
        let mac = hmac_for(&base_string, &credentials.secret)?;
        Ok(mac.verify_slice(&provided).is_ok())
    }
}

/// LTIメッセージとして最低限必要なパラメータを検査する。
fn check_lti_parameters(launch: &SignedLaunch) -> Result<(), AuthError> {
    let message_type = launch.param("lti_message_type").unwrap_or_default();
    if !SUPPORTED_MESSAGE_TYPES.contains(&message_type) {
        return Err(AuthError::InvalidParameters(format!(
            "lti_message_type: {message_type:?}"
        )));
    }

    let version = launch.param("lti_version").unwrap_or_default();
    if !SUPPORTED_LTI_VERSIONS.contains(&version) {
        return Err(AuthError::InvalidParameters(format!("lti_version: {version:?}")));
    }

    if message_type == "basic-lti-launch-request"
        && launch.param("resource_link_id").map_or(true, str::is_empty)
    {
        return Err(AuthError::InvalidParameters(
            "resource_link_idがありません".to_string(),
        ));
    }

    Ok(())
}

#[async_trait::async_trait]
impl Authenticator for OAuth1Authenticator {
    async fn validate(
        &self,
        launch: &SignedLaunch,
        credentials: &ConsumerCredentials,
    ) -> Result<bool, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Internal(format!("時刻取得失敗: {e}")))?
            .as_secs();
        self.validate_at(launch, credentials, now)
    }
}
