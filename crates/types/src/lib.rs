//! # LTI Launch 共有型定義
//!
//! 起動ハンドラとドキュメント複製Webhook（Apps Script Web App）の間で
//! やり取りされるJSONをRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - フィールド名: camelCase（Apps Script側のJavaScript実装に合わせる）
//! - 省略可能フィールド: 未設定時はシリアライズしない

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Webhookリクエスト
// ---------------------------------------------------------------------------

/// Webhookに送信するドキュメント複製リクエスト。
/// 起動ごとに1回だけ構築され、永続化されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    /// 複製元テンプレートドキュメントのURL（または参照文字列）
    pub template_doc_url: String,
    /// 学生のメールアドレス。LMSが送らない場合は空文字列。
    pub student_email: String,
    /// 課題名。LMSが送らない場合は空文字列。
    pub assignment_name: String,
}

// ---------------------------------------------------------------------------
// Webhookレスポンス
// ---------------------------------------------------------------------------

/// Webhookから返されるドキュメント複製結果。
///
/// スキーマは強制しない。`success` が欠けている場合は失敗として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    /// 複製に成功したか
    #[serde(default)]
    pub success: bool,
    /// 複製されたドキュメントのファイルID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// 失敗時のエラーメッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionResponse {
    /// 成功レスポンスを構築する。
    pub fn succeeded(file_id: impl Into<String>) -> Self {
        Self {
            success: true,
            file_id: Some(file_id.into()),
            error: None,
        }
    }

    /// 任意のJSON値から存在チェックだけで読み取る。
    ///
    /// - `success` は `true` のときだけ成功とみなす（`null`・文字列等は失敗）
    /// - `fileId` / `error` は空でない文字列のときだけ採用する
    /// - `null` やオブジェクト以外の本文は失敗レスポンスになる
    pub fn from_value(value: &serde_json::Value) -> Self {
        let string_field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            success: value.get("success") == Some(&serde_json::Value::Bool(true)),
            file_id: string_field("fileId"),
            error: string_field("error"),
        }
    }

    /// 失敗レスポンスを構築する。
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_id: None,
            error: Some(error.into()),
        }
    }
}
