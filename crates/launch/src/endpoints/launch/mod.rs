//! # POST /launch エンドポイント
//!
//! LMSからのLTI起動を受け付け、学生用ドキュメントのコピーを作成して
//! インタースティシャルページへリダイレクトする。
//!
//! ## モジュール構成
//! - `handler`: メインハンドラ（検証 → パラメータ抽出 → Webhook呼び出し → リダイレクト）

mod handler;

pub use handler::handle_launch;
