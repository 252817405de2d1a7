//! # LTI起動リクエストの認証
//!
//! LMSから届いた起動リクエストの真正性検証をトレイトで抽象化する。
//! ハンドラは署名アルゴリズムに依存せず、テストではモック実装に差し替える。

pub mod oauth1;

use axum::http::{HeaderMap, Method, Uri};

pub use oauth1::OAuth1Authenticator;

/// LTIコンシューマの認証情報。
#[derive(Debug, Clone)]
pub struct ConsumerCredentials {
    /// コンシューマキー
    pub key: String,
    /// 共有シークレット
    pub secret: String,
}

/// 署名検証エラー。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// LTIの必須パラメータが不正
    #[error("不正なLTIパラメータ: {0}")]
    InvalidParameters(String),
    /// コンシューマキーが設定と一致しない
    #[error("oauth_consumer_keyが一致しません")]
    ConsumerKeyMismatch,
    /// 未対応の署名方式
    #[error("未対応の署名方式: {0}")]
    UnsupportedSignatureMethod(String),
    /// タイムスタンプが欠落・不正・許容範囲外
    #[error("oauth_timestampが不正です: {0}")]
    InvalidTimestamp(String),
    /// 署名対象URLを復元できない
    #[error("起動URLを復元できません: {0}")]
    LaunchUrl(String),
    /// 署名計算の内部エラー
    #[error("署名計算に失敗: {0}")]
    Internal(String),
}

/// 署名検証に必要な起動リクエストの内容。
#[derive(Debug, Clone)]
pub struct SignedLaunch {
    /// HTTPメソッド
    pub method: String,
    /// クエリを除いた起動URL（スキーム + ホスト + パス）
    pub url: String,
    /// クエリ文字列とフォーム本文の全パラメータ（受信順、重複を保持）
    pub params: Vec<(String, String)>,
}

impl SignedLaunch {
    /// 受信したHTTPリクエストから構築する。
    ///
    /// スキームは `X-Forwarded-Proto`、なければ `https`。
    /// ホストは `X-Forwarded-Host`、なければ `Host` ヘッダ。
    pub fn from_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        form: &[(String, String)],
    ) -> Result<Self, AuthError> {
        let scheme = first_header_value(headers, "x-forwarded-proto").unwrap_or("https");
        let host = request_host(headers)
            .ok_or_else(|| AuthError::LaunchUrl("Hostヘッダがありません".to_string()))?;

        let mut url = url::Url::parse(&format!("{scheme}://{host}{}", uri.path()))
            .map_err(|e| AuthError::LaunchUrl(e.to_string()))?;
        url.set_query(None);
        url.set_fragment(None);

        let mut params: Vec<(String, String)> = uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        params.extend(form.iter().cloned());

        Ok(Self {
            method: method.as_str().to_string(),
            url: url.to_string(),
            params,
        })
    }

    /// 指定名の最初のパラメータ値。
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// クライアントから見たホスト名。`X-Forwarded-Host`、なければ `Host` ヘッダ。
/// 署名対象URLとリダイレクト先で同じ値を使う。
pub(crate) fn request_host(headers: &HeaderMap) -> Option<&str> {
    first_header_value(headers, "x-forwarded-host").or_else(|| first_header_value(headers, "host"))
}

/// カンマ区切りヘッダの先頭要素（プロキシが多段の場合は最初のクライアント側の値）。
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// LTI起動リクエストの真正性検証の抽象インターフェース。
///
/// - `Ok(true)`: 正当なリクエスト
/// - `Ok(false)`: 署名不一致
/// - `Err(_)`: 検証処理自体のエラー（パラメータ不正等）
///
/// ハンドラはどちらの失敗も401として扱う。
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// 起動リクエストを認証情報で検証する。
    async fn validate(
        &self,
        launch: &SignedLaunch,
        credentials: &ConsumerCredentials,
    ) -> Result<bool, AuthError>;
}
