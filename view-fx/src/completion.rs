//! # Completion 模块
//!
//! 单线程的完成信号。
//!
//! 有限次数的定时器在最后一次 tick 之后 resolve，被取消时 settle 为
//! `Cancelled`；`set_model` 在宿主通知加载结果时 resolve / reject。
//!
//! 既可以 `.await`（实现了 [`Future`]），也可以用 [`Completion::outcome`]
//! 同步查询，后者方便在假时钟下写确定性测试。

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::{FxError, FxResult};

/// 完成结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 正常完成
    Resolved,
    /// 被取消
    Cancelled,
    /// 失败
    Rejected(FxError),
}

impl Outcome {
    /// 转换为 Result
    pub fn into_result(self) -> FxResult<()> {
        match self {
            Self::Resolved => Ok(()),
            Self::Cancelled => Err(FxError::Cancelled),
            Self::Rejected(e) => Err(e),
        }
    }
}

type SettleCallback = Box<dyn FnOnce(&Outcome)>;

#[derive(Default)]
struct Inner {
    outcome: Option<Outcome>,
    callbacks: Vec<SettleCallback>,
    wakers: Vec<Waker>,
}

/// 完成信号
///
/// 克隆共享同一个状态。只会 settle 一次，之后的 settle 调用被忽略。
#[derive(Clone, Default)]
pub struct Completion {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.inner.borrow().outcome)
            .finish()
    }
}

impl Completion {
    /// 创建未完成的信号
    pub fn pending() -> Self {
        Self::default()
    }

    /// 创建已经 resolve 的信号
    pub fn resolved() -> Self {
        let completion = Self::pending();
        completion.settle(Outcome::Resolved);
        completion
    }

    /// 当前结果（未完成时为 `None`）
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.borrow().outcome.clone()
    }

    /// 是否已完成
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().outcome.is_some()
    }

    /// 是否已正常完成
    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.borrow().outcome, Some(Outcome::Resolved))
    }

    /// 设置结果
    ///
    /// 返回 `false` 表示此前已经 settle。
    /// 回调在释放内部借用之后执行，回调里可以再访问这个信号。
    pub fn settle(&self, outcome: Outcome) -> bool {
        let (callbacks, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.outcome.is_some() {
                return false;
            }
            inner.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut inner.callbacks),
                std::mem::take(&mut inner.wakers),
            )
        };

        for callback in callbacks {
            callback(&outcome);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// 注册完成回调
    ///
    /// 已完成时立即执行。
    pub fn on_settled(&self, callback: impl FnOnce(&Outcome) + 'static) {
        let outcome = {
            let mut inner = self.inner.borrow_mut();
            match &inner.outcome {
                Some(outcome) => outcome.clone(),
                None => {
                    inner.callbacks.push(Box::new(callback));
                    return;
                }
            }
        };
        callback(&outcome);
    }
}

impl Future for Completion {
    type Output = FxResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        match &inner.outcome {
            Some(outcome) => Poll::Ready(outcome.clone().into_result()),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_settle_once() {
        let c = Completion::pending();
        assert!(!c.is_settled());

        assert!(c.settle(Outcome::Resolved));
        assert!(!c.settle(Outcome::Cancelled));
        assert_eq!(c.outcome(), Some(Outcome::Resolved));
        assert!(c.is_resolved());
    }

    #[test]
    fn test_callbacks() {
        let c = Completion::pending();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        c.on_settled(move |o| {
            assert_eq!(o, &Outcome::Cancelled);
            h.set(h.get() + 1);
        });
        assert_eq!(hits.get(), 0);

        c.settle(Outcome::Cancelled);
        assert_eq!(hits.get(), 1);

        // 已完成后注册的回调立即执行
        let h = hits.clone();
        c.on_settled(move |_| h.set(h.get() + 10));
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn test_reentrant_callback() {
        let c = Completion::pending();
        let seen = Rc::new(Cell::new(false));

        let c2 = c.clone();
        let s = seen.clone();
        c.on_settled(move |_| s.set(c2.is_settled()));
        c.settle(Outcome::Resolved);
        assert!(seen.get());
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Outcome::Resolved.into_result(), Ok(()));
        assert_eq!(Outcome::Cancelled.into_result(), Err(FxError::Cancelled));
        let err = FxError::ModelLoadFailed {
            src: "a.pvz".to_string(),
        };
        assert_eq!(Outcome::Rejected(err.clone()).into_result(), Err(err));
    }

    #[test]
    fn test_poll() {
        use std::task::Waker;

        let mut c = Completion::pending();
        let mut cx = Context::from_waker(Waker::noop());
        assert!(Pin::new(&mut c).poll(&mut cx).is_pending());

        c.settle(Outcome::Resolved);
        assert_eq!(Pin::new(&mut c).poll(&mut cx), Poll::Ready(Ok(())));
    }
}
