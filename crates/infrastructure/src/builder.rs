use std::sync::Arc;

use application::{MemoryMessageRepository, MemoryParticipantRepository};
use config::{AppConfig, StorageBackend};
use domain::{MessageRepository, ParticipantRepository};
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 按配置选出的存储后端，应用层只看到两个仓储接口。
#[derive(Clone)]
pub struct Infrastructure {
    pub backend: StorageBackend,
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
}

impl Infrastructure {
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        match config.storage.backend {
            StorageBackend::Postgres => {
                let pool =
                    create_pg_pool(&config.database.url, config.database.max_connections).await?;
                MIGRATOR.run(&pool).await?;
                tracing::info!("数据库迁移完成");

                let storage = PgStorage::new(pool);
                Ok(Self {
                    backend: StorageBackend::Postgres,
                    participant_repository: storage.participant_repository,
                    message_repository: storage.message_repository,
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("使用内存存储，进程退出后数据丢失");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            participant_repository: Arc::new(MemoryParticipantRepository::new()),
            message_repository: Arc::new(MemoryMessageRepository::new()),
        }
    }
}
