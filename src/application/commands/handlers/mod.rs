//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod cleanup_handlers;

pub use cleanup_handlers::*;
