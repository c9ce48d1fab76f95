//! 固定周期的后台任务
//!
//! 周期任务只暴露一个 `tick`，调度与任务本身分离：生产环境用
//! [`spawn_periodic`] 按固定周期触发，测试里直接调用一次 `tick`。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// 执行一轮。任务自己处理并记录错误，不向调度器返回。
    async fn tick(&self);
}

/// 每隔 `period` 触发一次 `task.tick()`，直到 `shutdown` 被取消。
///
/// 第一次触发发生在启动后一个周期；上一轮未结束时错过的触发直接跳过，
/// 同一任务的两轮永远不会重叠。单轮 panic 只记录日志，调度继续。
pub fn spawn_periodic<T>(task: Arc<T>, period: Duration, shutdown: CancellationToken) -> JoinHandle<()>
where
    T: PeriodicTask,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval 的第一次 tick 立即完成
        interval.tick().await;

        tracing::info!(task = task.name(), period_secs = period.as_secs(), "周期任务已启动");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(task = task.name(), "周期任务收到停止信号");
                    break;
                }
                _ = interval.tick() => {
                    if AssertUnwindSafe(task.tick()).catch_unwind().await.is_err() {
                        tracing::error!(task = task.name(), "周期任务本轮 panic，等待下一轮");
                    }
                }
            }
        }
    })
}
