use std::sync::Arc;

use domain::{
    MessageRepository, NewMessage, NewParticipant, Participant, ParticipantName,
    ParticipantRepository, RepositoryError,
};

use crate::{clock::Clock, error::ApplicationError};

pub struct ParticipantServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册参与者并广播进入通知。
    ///
    /// 两次写入依次进行：先写参与者，再写进入通知。通知写入失败时删除刚写入的
    /// 参与者并返回错误，不会留下没有进入通知的参与者。
    pub async fn join(&self, raw_name: &str) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(raw_name)?;
        if name.is_broadcast_sentinel() {
            return Err(ApplicationError::validation(
                "name",
                "is reserved for broadcast messages",
            ));
        }

        if self
            .deps
            .participant_repository
            .find_by_name(&name)
            .await?
            .is_some()
        {
            return Err(ApplicationError::Conflict(format!(
                "participant '{name}' already exists"
            )));
        }

        let now = self.deps.clock.now();
        let id = self
            .deps
            .participant_repository
            .insert(NewParticipant::joined(name.clone(), now))
            .await
            .map_err(|err| match err {
                // 查询和写入之间被并发注册抢先
                RepositoryError::Conflict => {
                    ApplicationError::Conflict(format!("participant '{name}' already exists"))
                }
                other => ApplicationError::Store(other),
            })?;

        if let Err(err) = self
            .deps
            .message_repository
            .insert(NewMessage::arrival(&name, now))
            .await
        {
            tracing::warn!(participant = %name, error = %err, "写入进入通知失败，撤销注册");
            if let Err(compensation) = self.deps.participant_repository.delete(id).await {
                tracing::error!(
                    participant = %name,
                    participant_id = %id,
                    error = %compensation,
                    "撤销注册失败，参与者没有进入通知"
                );
            }
            return Err(ApplicationError::Store(err));
        }

        tracing::info!(participant = %name, participant_id = %id, "参与者加入");

        Ok(Participant {
            id,
            name,
            last_activity: now,
        })
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list().await?)
    }
}
