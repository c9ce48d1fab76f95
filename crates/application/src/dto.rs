use domain::{Message, MessageKind, Participant, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub id: Uuid,
    pub name: String,
    pub last_activity: Timestamp,
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            id: Uuid::from(participant.id),
            name: participant.name.as_str().to_owned(),
            last_activity: participant.last_activity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            from: message.from.clone(),
            to: message.to.clone(),
            text: message.text.clone(),
            kind: message.kind,
            time: message.time.clone(),
        }
    }
}
