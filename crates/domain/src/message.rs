use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::sanitize::sanitize;
use crate::value_objects::{
    format_time, MessageId, ParticipantName, Timestamp, BROADCAST_SENTINEL,
};

/// 参与者进入时写入的状态消息文本。
pub const ARRIVAL_NOTICE: &str = "entra na sala...";

/// 参与者因超时被移除时写入的状态消息文本。
pub const DEPARTURE_NOTICE: &str = "sai da sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 用户可以直接发送或改写成的类型；`status` 只由系统产生。
    pub fn is_user_authored(&self) -> bool {
        matches!(self, MessageKind::Message | MessageKind::PrivateMessage)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown message type '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl Message {
    /// 可见性规则：广播消息、自己发出的消息、发给自己的消息。
    pub fn is_visible_to(&self, caller: &ParticipantName) -> bool {
        self.to == BROADCAST_SENTINEL || self.from == caller.as_str() || self.to == caller.as_str()
    }

    pub fn is_owned_by(&self, caller: &ParticipantName) -> bool {
        self.from == caller.as_str()
    }

    pub fn apply(&mut self, content: MessageContent) {
        self.to = content.to;
        self.text = content.text;
        self.kind = content.kind;
    }
}

/// 尚未写入存储的消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl NewMessage {
    pub fn arrival(name: &ParticipantName, at: Timestamp) -> Self {
        Self::status(name, ARRIVAL_NOTICE, at)
    }

    pub fn departure(name: &ParticipantName, at: Timestamp) -> Self {
        Self::status(name, DEPARTURE_NOTICE, at)
    }

    pub fn authored(from: &ParticipantName, content: MessageContent, at: Timestamp) -> Self {
        Self {
            from: from.as_str().to_owned(),
            to: content.to,
            text: content.text,
            kind: content.kind,
            time: format_time(at),
        }
    }

    fn status(name: &ParticipantName, text: &str, at: Timestamp) -> Self {
        Self {
            from: name.as_str().to_owned(),
            to: BROADCAST_SENTINEL.to_owned(),
            text: text.to_owned(),
            kind: MessageKind::Status,
            time: format_time(at),
        }
    }
}

/// 用户可写的消息内容（`to`/`text`/`kind`），已清洗并校验。
///
/// 发送与编辑共用这一结构，编辑就是同形状的整体改写。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

impl MessageContent {
    pub fn parse(to: &str, text: &str, kind: MessageKind) -> Result<Self, DomainError> {
        if !kind.is_user_authored() {
            return Err(DomainError::invalid_argument(
                "type",
                "must be message or private_message",
            ));
        }

        let to = sanitize(to);
        if to.is_empty() {
            return Err(DomainError::invalid_argument("to", "cannot be empty"));
        }

        let text = sanitize(text);
        if text.is_empty() {
            return Err(DomainError::invalid_argument("text", "cannot be empty"));
        }

        Ok(Self { to, text, kind })
    }
}
