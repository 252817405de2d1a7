//! # 起動パラメータの抽出
//!
//! LTI起動フォームから必要な値を取り出す。各値は候補フィールドを順に見て、
//! 最初に空でない値を採用する。

use lti_launch_types::ProvisionRequest;

/// 学生メールアドレスの候補フィールド
const STUDENT_EMAIL_FIELDS: &[&str] = &["lis_person_contact_email_primary", "user_email"];
/// テンプレートドキュメントの候補フィールド
const TEMPLATE_DOC_FIELDS: &[&str] = &["custom_doc_url", "custom_doc"];
/// Webhook URL上書きの候補フィールド
const WEBHOOK_URL_FIELDS: &[&str] = &["custom_appscript_url", "custom_appscript"];
/// 教員メールアドレスの候補フィールド
const TEACHER_EMAIL_FIELDS: &[&str] = &["custom_teacher_email"];
/// 課題名の候補フィールド
const ASSIGNMENT_NAME_FIELDS: &[&str] = &["resource_link_title", "context_title"];

/// 起動フォームから抽出したパラメータ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// 学生メールアドレス（空を許容）
    pub student_email: String,
    /// テンプレートドキュメント。唯一の必須項目。
    pub template_doc: Option<String>,
    /// リクエスト側で指定されたWebhook URL
    pub webhook_url_override: Option<String>,
    /// 教員メールアドレス（空を許容）
    pub teacher_email: String,
    /// 課題名（空を許容）
    pub assignment_name: String,
}

impl LaunchParams {
    /// フォームのキー・値の組から構築する。
    pub fn from_form(form: &[(String, String)]) -> Self {
        Self {
            student_email: first_non_empty(form, STUDENT_EMAIL_FIELDS).unwrap_or_default(),
            template_doc: first_non_empty(form, TEMPLATE_DOC_FIELDS),
            webhook_url_override: first_non_empty(form, WEBHOOK_URL_FIELDS),
            teacher_email: first_non_empty(form, TEACHER_EMAIL_FIELDS).unwrap_or_default(),
            assignment_name: first_non_empty(form, ASSIGNMENT_NAME_FIELDS).unwrap_or_default(),
        }
    }

    /// Webhook URLを決定する。リクエストの指定がデフォルトより優先される。
    pub fn webhook_url<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.webhook_url_override.as_deref().or(default)
    }

    /// Webhookに送る複製リクエストを構築する。テンプレート未指定ならNone。
    pub fn provision_request(&self) -> Option<ProvisionRequest> {
        let template_doc_url = self.template_doc.clone()?;
        Some(ProvisionRequest {
            template_doc_url,
            student_email: self.student_email.clone(),
            assignment_name: self.assignment_name.clone(),
        })
    }
}

/// 候補フィールドを順に見て、最初の空でない値を返す。
/// 同名フィールドが複数ある場合も受信順に見る。
fn first_non_empty(form: &[(String, String)], fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        form.iter()
            .find(|(k, v)| k == field && !v.is_empty())
            .map(|(_, v)| v.clone())
    })
}
