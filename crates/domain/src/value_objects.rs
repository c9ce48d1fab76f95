use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::sanitize::sanitize;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 广播目标：`to` 等于该值的消息对所有参与者可见。参与者不能使用这个名字。
pub const BROADCAST_SENTINEL: &str = "Todos";

/// 消息 `time` 字段的展示格式。
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub fn format_time(at: Timestamp) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// 参与者唯一标识（由存储分配）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ParticipantId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ParticipantId> for Uuid {
    fn from(value: ParticipantId) -> Self {
        value.0
    }
}

/// 消息唯一标识（由存储分配，创建后不可变）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

/// 经过清洗、非空的参与者名称。
///
/// 既用于注册时的名称，也用于请求方身份（`User` 头），两者走同一条清洗流程，
/// 之后的比较都是清洗后值的精确比较。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let value = sanitize(value);
        if value.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_broadcast_sentinel(&self) -> bool {
        self.0 == BROADCAST_SENTINEL
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
