//! # インタースティシャルページへのリダイレクト

use axum::http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::auth::request_host;
use crate::error::LaunchError;

/// JavaScriptの `encodeURIComponent` と同じ文字集合。
/// 英数字と `- _ . ! ~ * ' ( )` 以外をエンコードする。
const URI_COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// インタースティシャルページのパス
const INTERSTITIAL_PATH: &str = "/interstitial.html";

/// クエリ値をエンコードする。
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT_ENCODE_SET).to_string()
}

/// リダイレクト先のオリジンを決定する。
/// 設定済みのオリジンが優先され、なければ `https://{ホスト}`。
/// ホストは署名検証と同じく `X-Forwarded-Host` を `Host` より優先する。
pub fn resolve_origin(
    public_origin: Option<&str>,
    headers: &HeaderMap,
) -> Result<String, LaunchError> {
    if let Some(origin) = public_origin {
        return Ok(origin.trim_end_matches('/').to_string());
    }

    let host = request_host(headers)
        .ok_or_else(|| LaunchError::Internal("Hostヘッダがありません".to_string()))?;

    Ok(format!("https://{host}"))
}

/// インタースティシャルページのURLを構築する。
pub fn interstitial_url(
    origin: &str,
    file_id: &str,
    student_email: &str,
    teacher_email: &str,
) -> String {
    format!(
        "{origin}{INTERSTITIAL_PATH}?fileId={}&studentEmail={}&teacherEmail={}",
        encode_component(file_id),
        encode_component(student_email),
        encode_component(teacher_email),
    )
}
