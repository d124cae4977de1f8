//! # Timer 模块
//!
//! 宿主定时服务接口。
//!
//! 定时服务按固定周期重复调用回调，次数有限或无限，返回可取消、
//! 可等待的 [`TimerHandle`]。
//!
//! - [`TimerService`]：宿主实现的接口
//! - [`ManualTimer`]：手动推进的确定性时钟，用于测试和无头运行

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::completion::{Completion, Outcome};

/// tick 回调
pub type TickFn = Box<dyn FnMut()>;

/// 重复次数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repeat {
    /// 固定次数，最后一次 tick 之后 resolve；0 次立即 resolve
    Times(u32),
    /// 无限重复，只能被取消
    Forever,
}

impl Repeat {
    /// 是否有界
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Times(_))
    }
}

/// 定时器 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerId({})", self.0)
    }
}

struct HandleState {
    cancelled: Cell<bool>,
    completion: Completion,
}

/// 定时器句柄
///
/// 克隆共享同一个定时器。取消后不再投递任何 tick。
#[derive(Clone)]
pub struct TimerHandle {
    id: TimerId,
    state: Rc<HandleState>,
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("cancelled", &self.state.cancelled.get())
            .field("completion", &self.state.completion)
            .finish()
    }
}

impl TimerHandle {
    /// 创建句柄（供 `TimerService` 实现使用）
    pub fn new(id: TimerId) -> Self {
        Self {
            id,
            state: Rc::new(HandleState {
                cancelled: Cell::new(false),
                completion: Completion::pending(),
            }),
        }
    }

    /// 创建一个已完成、从未调度过的句柄
    pub fn finished(id: TimerId) -> Self {
        let handle = Self::new(id);
        handle.finish();
        handle
    }

    /// 定时器 ID
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// 取消定时器
    ///
    /// 已完成的定时器取消无效果。
    pub fn cancel(&self) {
        if self.state.completion.is_settled() {
            return;
        }
        self.state.cancelled.set(true);
        self.state.completion.settle(Outcome::Cancelled);
    }

    /// 标记为已完成（供 `TimerService` 实现在最后一次 tick 之后调用）
    pub fn finish(&self) {
        self.state.completion.settle(Outcome::Resolved);
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// 是否仍在运行（未完成也未取消）
    pub fn is_active(&self) -> bool {
        !self.state.completion.is_settled()
    }

    /// 完成信号
    pub fn completion(&self) -> Completion {
        self.state.completion.clone()
    }

    /// 判断两个句柄是否指向同一个定时器
    pub fn same_as(&self, other: &TimerHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

/// 宿主定时服务
pub trait TimerService {
    /// 按 `period` 周期调度 `tick`
    ///
    /// 第一次 tick 在一个周期之后。`Repeat::Times(n)` 在第 n 次 tick 之后
    /// 完成句柄；`Repeat::Times(0)` 不调度任何 tick，直接返回已完成的句柄。
    fn schedule(&self, period: Duration, repeat: Repeat, tick: TickFn) -> TimerHandle;
}

struct ManualEntry {
    handle: TimerHandle,
    period: Duration,
    next_due: Duration,
    remaining: Option<u32>,
    tick: Option<TickFn>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    entries: Vec<ManualEntry>,
}

/// 手动推进的确定性时钟
///
/// 调用 [`ManualTimer::advance`] 推进时间，到期的 tick 按到期时间顺序
/// （同一时刻按调度顺序）串行投递。tick 回调里可以继续调度或取消定时器。
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Rc<RefCell<ManualState>>,
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.entries.len())
            .finish()
    }
}

impl ManualTimer {
    /// 创建时钟（时间从 0 开始）
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前时间
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// 仍在调度中的定时器数量
    pub fn pending_count(&self) -> usize {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.handle.is_active())
            .count()
    }

    /// 推进若干毫秒
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    /// 推进时间，投递期间到期的所有 tick
    ///
    /// 返回投递的 tick 数量。
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.borrow().now + by;
        let mut delivered = 0;

        while let Some((index, due)) = self.next_due(target) {
            // 取出回调后释放借用，回调里可以再调用本时钟
            let (handle, mut tick) = {
                let mut state = self.state.borrow_mut();
                state.now = due;
                let entry = &mut state.entries[index];
                entry.next_due += entry.period;
                if let Some(remaining) = entry.remaining.as_mut() {
                    *remaining -= 1;
                }
                match entry.tick.take() {
                    Some(tick) => (entry.handle.clone(), tick),
                    None => continue,
                }
            };

            tick();
            delivered += 1;

            let finished = {
                let mut state = self.state.borrow_mut();
                let entry = state
                    .entries
                    .iter_mut()
                    .find(|e| e.handle.same_as(&handle));
                match entry {
                    Some(entry) => {
                        entry.tick = Some(tick);
                        entry.remaining == Some(0)
                    }
                    None => false,
                }
            };

            if finished && !handle.is_cancelled() {
                trace!(timer = %handle.id(), "manual timer finished");
                handle.finish();
            }
            self.prune();
        }

        self.state.borrow_mut().now = target;
        delivered
    }

    /// 找到最早到期、仍有效的定时器
    fn next_due(&self, target: Duration) -> Option<(usize, Duration)> {
        self.prune();
        let state = self.state.borrow();
        state
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.next_due <= target && e.tick.is_some())
            .min_by_key(|(_, e)| (e.next_due, e.handle.id()))
            .map(|(i, e)| (i, e.next_due))
    }

    /// 移除已取消或已完成的定时器
    fn prune(&self) {
        self.state
            .borrow_mut()
            .entries
            .retain(|e| e.handle.is_active() && e.remaining != Some(0));
    }
}

impl TimerService for ManualTimer {
    fn schedule(&self, period: Duration, repeat: Repeat, tick: TickFn) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = TimerId(state.next_id);

        let remaining = match repeat {
            Repeat::Times(0) => return TimerHandle::finished(id),
            Repeat::Times(n) => Some(n),
            Repeat::Forever => None,
        };

        let handle = TimerHandle::new(id);
        let next_due = state.now + period;
        state.entries.push(ManualEntry {
            handle: handle.clone(),
            period,
            next_due,
            remaining,
            tick: Some(tick),
        });
        handle
    }
}
