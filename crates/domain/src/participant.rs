use chrono::Duration;
use serde::Serialize;

use crate::value_objects::{ParticipantId, ParticipantName, Timestamp};

/// 已注册、被跟踪在线状态的参与者。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: ParticipantName,
    pub last_activity: Timestamp,
}

impl Participant {
    /// `now - last_activity > timeout` 时视为过期；恰好等于超时不算过期。
    pub fn is_stale(&self, now: Timestamp, timeout: Duration) -> bool {
        now.signed_duration_since(self.last_activity) > timeout
    }
}

/// 尚未写入存储的参与者，标识由存储在插入时分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: ParticipantName,
    pub last_activity: Timestamp,
}

impl NewParticipant {
    pub fn joined(name: ParticipantName, at: Timestamp) -> Self {
        Self {
            name,
            last_activity: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn participant(last_activity: Timestamp) -> Participant {
        Participant {
            id: ParticipantId::from(Uuid::new_v4()),
            name: ParticipantName::parse("Ana").unwrap(),
            last_activity,
        }
    }

    #[test]
    fn stale_only_strictly_after_timeout() {
        let now = Utc::now();
        let timeout = Duration::seconds(10);

        assert!(!participant(now).is_stale(now, timeout));
        assert!(!participant(now - timeout).is_stale(now, timeout));
        assert!(participant(now - timeout - Duration::milliseconds(1)).is_stale(now, timeout));
    }
}
