use std::sync::Arc;

use chrono::Duration;
use domain::{Participant, ParticipantName, ParticipantRepository, Timestamp};

use crate::{clock::Clock, error::ApplicationError};

pub struct PresenceTrackerDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 在线状态跟踪
///
/// 不在进程内缓存任何状态：每次 `touch` 都立即写入存储，过期判断也总是
/// 基于存储中的 `last_activity`，这样清理任务和请求处理可以完全独立运行。
pub struct PresenceTracker {
    deps: PresenceTrackerDependencies,
    timeout: Duration,
}

impl PresenceTracker {
    pub fn new(deps: PresenceTrackerDependencies, timeout: Duration) -> Self {
        Self { deps, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 记录一次活动（心跳）。
    ///
    /// 两个并发的 `touch` 以存储的写入顺序为准，后写者生效。
    pub async fn touch(&self, raw_name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::parse(raw_name)?;
        let now = self.deps.clock.now();

        let found = self.deps.participant_repository.touch(&name, now).await?;
        if !found {
            return Err(ApplicationError::participant_not_found(&name));
        }

        tracing::debug!(participant = %name, "刷新参与者活动时间");
        Ok(())
    }

    pub fn is_stale(participant: &Participant, now: Timestamp, timeout: Duration) -> bool {
        participant.is_stale(now, timeout)
    }

    /// 当前未过期的参与者。
    pub async fn list_active(&self) -> Result<Vec<Participant>, ApplicationError> {
        let now = self.deps.clock.now();
        let participants = self.deps.participant_repository.list().await?;
        Ok(participants
            .into_iter()
            .filter(|p| !Self::is_stale(p, now, self.timeout))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryParticipantRepository;
    use chrono::Utc;
    use domain::{MockParticipantRepository, NewParticipant, RepositoryError};

    struct Fixture {
        tracker: PresenceTracker,
        repo: Arc<MemoryParticipantRepository>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryParticipantRepository::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tracker = PresenceTracker::new(
            PresenceTrackerDependencies {
                participant_repository: repo.clone(),
                clock: clock.clone(),
            },
            Duration::seconds(10),
        );
        Fixture {
            tracker,
            repo,
            clock,
        }
    }

    async fn join(fixture: &Fixture, name: &str) {
        let name = ParticipantName::parse(name).unwrap();
        fixture
            .repo
            .insert(NewParticipant::joined(name, fixture.clock.now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn touch_writes_current_time() {
        let f = fixture();
        join(&f, "Ana").await;

        f.clock.advance(Duration::seconds(7));
        f.tracker.touch("Ana").await.unwrap();

        let stored = f
            .repo
            .find_by_name(&ParticipantName::parse("Ana").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_activity, f.clock.now());
    }

    #[tokio::test]
    async fn touch_sanitizes_identity() {
        let f = fixture();
        join(&f, "Ana").await;

        f.tracker.touch("  <b>Ana</b> ").await.unwrap();
    }

    #[tokio::test]
    async fn touch_unknown_participant_is_not_found() {
        let f = fixture();

        let err = f.tracker.touch("ghost").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn touch_empty_identity_is_validation_error() {
        let f = fixture();

        let err = f.tracker.touch("   ").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn list_active_skips_stale_participants() {
        let f = fixture();
        join(&f, "old").await;
        f.clock.advance(Duration::seconds(8));
        join(&f, "new").await;
        f.clock.advance(Duration::seconds(5));

        let active = f.tracker.list_active().await.unwrap();
        let names: Vec<_> = active.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["new"]);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let mut repo = MockParticipantRepository::new();
        repo.expect_touch()
            .returning(|_, _| Err(RepositoryError::storage("connection refused")));

        let tracker = PresenceTracker::new(
            PresenceTrackerDependencies {
                participant_repository: Arc::new(repo),
                clock: Arc::new(ManualClock::default()),
            },
            Duration::seconds(10),
        );

        let err = tracker.touch("Ana").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Store(_)));
    }
}
