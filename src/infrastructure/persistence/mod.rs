//! Persistence Layer - 数据持久化
//!
//! SQLite 存储实现（外部流地址缓存）

pub mod sqlite;

pub use self::sqlite::SqliteUrlCacheRepository;
