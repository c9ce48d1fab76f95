//! 存储层接口定义
//!
//! 存储只保证单条记录操作的原子性，不提供跨记录事务。所有“成对写入”
//! （进入、超时移除）都由上层按固定顺序拆成多次单记录写入。

use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::message::{Message, MessageContent, NewMessage};
use crate::participant::{NewParticipant, Participant};
use crate::value_objects::{MessageId, ParticipantId, ParticipantName, Timestamp};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 插入新参与者并返回存储分配的标识；名称重复时返回 `RepositoryError::Conflict`。
    async fn insert(&self, participant: NewParticipant) -> RepositoryResult<ParticipantId>;

    async fn find_by_name(&self, name: &ParticipantName)
        -> RepositoryResult<Option<Participant>>;

    /// 全部参与者，顺序由实现决定。
    async fn list(&self) -> RepositoryResult<Vec<Participant>>;

    /// `last_activity < cutoff` 的参与者。
    async fn list_inactive_since(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>>;

    /// 单条原子更新 `last_activity`；名称不存在时返回 `false`。
    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> RepositoryResult<bool>;

    /// 按标识删除；记录已不存在时返回 `false`。
    async fn delete(&self, id: ParticipantId) -> RepositoryResult<bool>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId>;

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;

    /// 对 `caller` 可见的消息，按插入顺序（旧的在前）返回。
    ///
    /// 给定 `limit` 时只返回最近的 `limit` 条，顺序仍然是旧的在前。
    async fn list_visible_to(
        &self,
        caller: &ParticipantName,
        limit: Option<u32>,
    ) -> RepositoryResult<Vec<Message>>;

    /// 改写 `to`/`text`/`kind`，`time` 与插入位置不变；记录不存在时返回 `false`。
    async fn update(&self, id: MessageId, content: MessageContent) -> RepositoryResult<bool>;

    async fn delete(&self, id: MessageId) -> RepositoryResult<bool>;
}
