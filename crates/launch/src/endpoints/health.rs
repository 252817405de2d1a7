//! # GET /health
//!
//! 死活監視用エンドポイント。

/// GET /health — 常に `ok` を返す。
pub async fn handle_health() -> &'static str {
    "ok"
}
