use std::sync::Arc;

use domain::{
    Message, MessageContent, MessageId, MessageKind, MessageRepository, NewMessage,
    ParticipantName, ParticipantRepository,
};
use uuid::Uuid;

use crate::{clock::Clock, error::ApplicationError};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub id: Uuid,
    pub caller: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

pub struct MessageServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 消息收发
///
/// 调用方身份和所有自由文本字段都先经过 `sanitize`，所有权检查只比较清洗后的值。
pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn post(&self, request: PostMessageRequest) -> Result<Message, ApplicationError> {
        let from = ParticipantName::parse(&request.from)?;
        let content = MessageContent::parse(&request.to, &request.text, request.kind)?;

        if self
            .deps
            .participant_repository
            .find_by_name(&from)
            .await?
            .is_none()
        {
            return Err(ApplicationError::participant_not_found(&from));
        }

        let new_message = NewMessage::authored(&from, content, self.deps.clock.now());
        let id = self
            .deps
            .message_repository
            .insert(new_message.clone())
            .await?;

        tracing::debug!(message_id = %id, from = %from, to = %new_message.to, "消息已发送");

        Ok(Message {
            id,
            from: new_message.from,
            to: new_message.to,
            text: new_message.text,
            kind: new_message.kind,
            time: new_message.time,
        })
    }

    /// 调用方可见的消息，按插入顺序排列；`limit` 只保留最近的若干条。
    pub async fn list(
        &self,
        caller: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let caller = ParticipantName::parse(caller)?;
        let limit = match limit {
            None => None,
            Some(value) if value > 0 => Some(u32::try_from(value).unwrap_or(u32::MAX)),
            Some(_) => {
                return Err(ApplicationError::validation(
                    "limit",
                    "must be a positive integer",
                ))
            }
        };

        Ok(self
            .deps
            .message_repository
            .list_visible_to(&caller, limit)
            .await?)
    }

    /// 整体改写 `to`/`text`/`type`，`time` 保持不变。
    pub async fn edit(&self, request: EditMessageRequest) -> Result<Message, ApplicationError> {
        let caller = ParticipantName::parse(&request.caller)?;
        let content = MessageContent::parse(&request.to, &request.text, request.kind)?;
        let mut message = self.owned_message(request.id, &caller).await?;

        let updated = self
            .deps
            .message_repository
            .update(message.id, content.clone())
            .await?;
        if !updated {
            return Err(ApplicationError::message_not_found(message.id));
        }

        message.apply(content);
        tracing::debug!(message_id = %message.id, caller = %caller, "消息已修改");
        Ok(message)
    }

    pub async fn remove(&self, id: Uuid, caller: &str) -> Result<(), ApplicationError> {
        let caller = ParticipantName::parse(caller)?;
        let message = self.owned_message(id, &caller).await?;

        if !self.deps.message_repository.delete(message.id).await? {
            return Err(ApplicationError::message_not_found(message.id));
        }

        tracing::debug!(message_id = %message.id, caller = %caller, "消息已删除");
        Ok(())
    }

    async fn owned_message(
        &self,
        id: Uuid,
        caller: &ParticipantName,
    ) -> Result<Message, ApplicationError> {
        let id = MessageId::from(id);
        let message = self
            .deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::message_not_found(id))?;

        // 状态通知与加入/清理事件一一对应，不允许任何人改动
        if message.kind == MessageKind::Status {
            tracing::warn!(message_id = %id, caller = %caller, "拒绝修改状态通知");
            return Err(ApplicationError::Authorization(format!(
                "status message {id} cannot be changed"
            )));
        }

        if !message.is_owned_by(caller) {
            tracing::warn!(message_id = %id, caller = %caller, owner = %message.from, "拒绝修改他人消息");
            return Err(ApplicationError::Authorization(format!(
                "message {id} does not belong to '{caller}'"
            )));
        }

        Ok(message)
    }
}
