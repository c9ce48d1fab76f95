//! 超时参与者清理
//!
//! 每一轮：查询 `last_activity < now - timeout` 的参与者，对每个候选者独立执行
//! 成对写入：先写离开通知，再按标识删除参与者。顺序固定为“先消息后删除”，
//! 两步之间失败最多留下一条看起来重复的离开通知，而不会出现参与者悄无声息
//! 消失的情况。
//!
//! 与心跳的竞争：过期判断和删除之间没有加锁。恰好在边界上发送心跳的参与者
//! 可能在这一轮被误删，也可能被多保留一轮。这是接受的最终一致性取舍；只保证
//! 真正不活跃的参与者在超时后的一个清理周期内被移除。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use domain::{
    MessageRepository, NewMessage, Participant, ParticipantRepository, RepositoryError, Timestamp,
};
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::watch;

use crate::{clock::Clock, scheduler::PeriodicTask};

/// 清理任务的运行状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Scanning,
    Evicting,
}

/// 一轮清理的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// 本轮查询到的过期参与者数量
    pub scanned: usize,
    /// 完成成对写入（离开通知 + 删除）的数量
    pub evicted: usize,
    /// 成对写入失败的数量，留给下一轮
    pub failed: usize,
    /// 过期查询本身失败，本轮没有任何写入
    pub store_unavailable: bool,
}

#[derive(Debug, Error)]
enum EvictionError {
    #[error("departure notice not written: {0}")]
    Notice(RepositoryError),
    #[error("departure notice written but participant not deleted: {0}")]
    Delete(RepositoryError),
}

pub struct EvictionSweeperDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct EvictionSweeper {
    deps: EvictionSweeperDependencies,
    timeout: Duration,
    state: watch::Sender<SweepState>,
}

impl EvictionSweeper {
    pub fn new(deps: EvictionSweeperDependencies, timeout: Duration) -> Self {
        let (state, _) = watch::channel(SweepState::Idle);
        Self {
            deps,
            timeout,
            state,
        }
    }

    pub fn state(&self) -> SweepState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SweepState> {
        self.state.subscribe()
    }

    /// 执行一轮清理。不返回错误：存储不可用时本轮无效果，等下一轮自然重试。
    pub async fn sweep(&self) -> SweepReport {
        self.state.send_replace(SweepState::Scanning);

        let now = self.deps.clock.now();
        let cutoff = now - self.timeout;

        let candidates = match self
            .deps
            .participant_repository
            .list_inactive_since(cutoff)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::error!(error = %err, "查询过期参与者失败，本轮跳过");
                self.state.send_replace(SweepState::Idle);
                return SweepReport {
                    store_unavailable: true,
                    ..SweepReport::default()
                };
            }
        };

        self.state.send_replace(SweepState::Evicting);

        let outcomes = join_all(candidates.iter().map(|p| self.evict(p, now))).await;

        let mut report = SweepReport {
            scanned: candidates.len(),
            ..SweepReport::default()
        };
        for (participant, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.evicted += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        participant = %participant.name,
                        error = %err,
                        "移除过期参与者失败"
                    );
                }
            }
        }

        self.state.send_replace(SweepState::Idle);

        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                evicted = report.evicted,
                failed = report.failed,
                "超时清理完成"
            );
        } else {
            tracing::debug!("超时清理完成，没有过期参与者");
        }

        report
    }

    async fn evict(&self, participant: &Participant, now: Timestamp) -> Result<(), EvictionError> {
        self.deps
            .message_repository
            .insert(NewMessage::departure(&participant.name, now))
            .await
            .map_err(EvictionError::Notice)?;

        let deleted = self
            .deps
            .participant_repository
            .delete(participant.id)
            .await
            .map_err(EvictionError::Delete)?;

        if deleted {
            tracing::info!(
                participant = %participant.name,
                last_activity = %participant.last_activity,
                "参与者超时离开"
            );
        } else {
            tracing::debug!(participant = %participant.name, "参与者记录已不存在");
        }

        Ok(())
    }
}

#[async_trait]
impl PeriodicTask for EvictionSweeper {
    fn name(&self) -> &'static str {
        "eviction-sweeper"
    }

    async fn tick(&self) {
        self.sweep().await;
    }
}
