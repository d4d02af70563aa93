//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod url_cache_repo;

pub use database::*;
pub use url_cache_repo::*;
