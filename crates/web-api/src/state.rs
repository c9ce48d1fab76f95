use std::sync::Arc;

use application::{
    Clock, EvictionSweeper, EvictionSweeperDependencies, MessageService,
    MessageServiceDependencies, ParticipantService, ParticipantServiceDependencies,
    PresenceTracker, PresenceTrackerDependencies,
};
use chrono::Duration;
use domain::{MessageRepository, ParticipantRepository};

#[derive(Clone)]
pub struct AppState {
    pub participant_service: Arc<ParticipantService>,
    pub message_service: Arc<MessageService>,
    pub presence_tracker: Arc<PresenceTracker>,
    /// 清理任务由进程另行调度，这里只持有引用以便共享同一实例
    pub sweeper: Arc<EvictionSweeper>,
}

impl AppState {
    /// 用同一组仓储和时钟装配全部服务。
    pub fn new(
        participant_repository: Arc<dyn ParticipantRepository>,
        message_repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        presence_timeout: Duration,
    ) -> Self {
        let participant_service = ParticipantService::new(ParticipantServiceDependencies {
            participant_repository: participant_repository.clone(),
            message_repository: message_repository.clone(),
            clock: clock.clone(),
        });
        let message_service = MessageService::new(MessageServiceDependencies {
            participant_repository: participant_repository.clone(),
            message_repository: message_repository.clone(),
            clock: clock.clone(),
        });
        let presence_tracker = PresenceTracker::new(
            PresenceTrackerDependencies {
                participant_repository: participant_repository.clone(),
                clock: clock.clone(),
            },
            presence_timeout,
        );
        let sweeper = EvictionSweeper::new(
            EvictionSweeperDependencies {
                participant_repository,
                message_repository,
                clock,
            },
            presence_timeout,
        );

        Self {
            participant_service: Arc::new(participant_service),
            message_service: Arc::new(message_service),
            presence_tracker: Arc::new(presence_tracker),
            sweeper: Arc::new(sweeper),
        }
    }
}
