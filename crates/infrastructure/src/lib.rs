//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储、数据库迁移，以及按配置选择存储后端的装配逻辑。

pub mod builder;
pub mod migrations;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureError};
pub use migrations::MIGRATOR;
pub use repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository, PgStorage};
