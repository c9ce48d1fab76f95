//! 内存实现的存储（用于测试和单机演示）
//!
//! 每个方法只持有一次锁，对应“单条记录原子操作”的存储语义。

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    Message, MessageContent, MessageId, MessageRepository, NewMessage, NewParticipant,
    Participant, ParticipantId, ParticipantName, ParticipantRepository, RepositoryError,
    RepositoryResult, Timestamp,
};

#[derive(Default)]
pub struct MemoryParticipantRepository {
    participants: RwLock<Vec<Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn insert(&self, participant: NewParticipant) -> RepositoryResult<ParticipantId> {
        let mut participants = self.participants.write().await;
        if participants.iter().any(|p| p.name == participant.name) {
            return Err(RepositoryError::Conflict);
        }

        let id = ParticipantId::from(Uuid::new_v4());
        participants.push(Participant {
            id,
            name: participant.name,
            last_activity: participant.last_activity,
        });
        Ok(id)
    }

    async fn find_by_name(
        &self,
        name: &ParticipantName,
    ) -> RepositoryResult<Option<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.iter().find(|p| &p.name == name).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        Ok(self.participants.read().await.clone())
    }

    async fn list_inactive_since(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants
            .iter()
            .filter(|p| p.last_activity < cutoff)
            .cloned()
            .collect())
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> RepositoryResult<bool> {
        let mut participants = self.participants.write().await;
        match participants.iter_mut().find(|p| &p.name == name) {
            Some(participant) => {
                participant.last_activity = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ParticipantId) -> RepositoryResult<bool> {
        let mut participants = self.participants.write().await;
        let before = participants.len();
        participants.retain(|p| p.id != id);
        Ok(participants.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按插入顺序返回全部消息，不做可见性过滤。
    pub async fn all(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId> {
        let id = MessageId::from(Uuid::new_v4());
        self.messages.write().await.push(Message {
            id,
            from: message.from,
            to: message.to,
            text: message.text,
            kind: message.kind,
            time: message.time,
        });
        Ok(id)
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_visible_to(
        &self,
        caller: &ParticipantName,
        limit: Option<u32>,
    ) -> RepositoryResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let visible: Vec<Message> = messages
            .iter()
            .filter(|m| m.is_visible_to(caller))
            .cloned()
            .collect();

        let skip = match limit {
            Some(limit) => visible.len().saturating_sub(limit as usize),
            None => 0,
        };
        Ok(visible.into_iter().skip(skip).collect())
    }

    async fn update(&self, id: MessageId, content: MessageContent) -> RepositoryResult<bool> {
        let mut messages = self.messages.write().await;
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.apply(content);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: MessageId) -> RepositoryResult<bool> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() != before)
    }
}
