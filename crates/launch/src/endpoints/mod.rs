//! # 起動ハンドラのエンドポイント

pub mod health;
pub mod launch;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use health::handle_health;
pub use launch::handle_launch;
