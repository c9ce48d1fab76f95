//! 应用层实现。
//!
//! 提供参与者注册、消息收发、在线状态跟踪和超时清理等用例服务。
//! 服务之间不共享进程内可变状态，唯一的共享资源是存储。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod presence;
pub mod scheduler;
pub mod services;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use presence::{PresenceTracker, PresenceTrackerDependencies};
pub use scheduler::{spawn_periodic, PeriodicTask};
pub use services::{
    EditMessageRequest, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PostMessageRequest,
};
pub use sweeper::{EvictionSweeper, EvictionSweeperDependencies, SweepReport, SweepState};
