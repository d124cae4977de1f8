//! # Interval 模块
//!
//! 基于 `tokio::time` 的定时服务。
//!
//! 每个定时器是一个 `spawn_local` 任务，因此必须在 [`tokio::task::LocalSet`]
//! 内使用（见 [`crate::block_on_local`]）。取消句柄会中止任务，
//! 尚未投递的 tick 不会再执行。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use view_fx::{Outcome, Repeat, TickFn, TimerHandle, TimerId, TimerService};

/// tokio 定时服务
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    next_id: Rc<Cell<u64>>,
}

impl IntervalTimer {
    /// 创建定时服务
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        TimerId(id)
    }
}

impl TimerService for IntervalTimer {
    fn schedule(&self, period: Duration, repeat: Repeat, mut tick: TickFn) -> TimerHandle {
        let id = self.next_id();
        let mut remaining = match repeat {
            Repeat::Times(0) => return TimerHandle::finished(id),
            Repeat::Times(n) => Some(n),
            Repeat::Forever => None,
        };

        // tokio 的 interval 不接受 0 周期
        let period = period.max(Duration::from_millis(1));
        let handle = TimerHandle::new(id);
        let task_handle = handle.clone();

        let task = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if task_handle.is_cancelled() {
                    break;
                }

                tick();

                if let Some(left) = remaining.as_mut() {
                    *left -= 1;
                    if *left == 0 {
                        trace!(timer = %task_handle.id(), "interval finished");
                        task_handle.finish();
                        break;
                    }
                }
            }
        });

        let abort = task.abort_handle();
        handle.completion().on_settled(move |outcome| {
            if *outcome == Outcome::Cancelled {
                abort.abort();
            }
        });
        handle
    }
}
