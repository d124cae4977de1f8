//! # Event 模块
//!
//! 宿主事件总线接口，以及单线程内存实现。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 模型加载成功事件
pub const MODEL_LOADED: &str = "modelLoaded";

/// 模型加载失败事件
pub const MODEL_LOAD_FAILED: &str = "modelloadfailed";

/// 订阅 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// 事件监听器
pub type Listener = Box<dyn FnMut()>;

/// 宿主事件总线
pub trait EventBus {
    /// 订阅事件
    fn subscribe(&self, event: &str, listener: Listener) -> SubscriptionId;

    /// 取消订阅，ID 不存在时无效果
    fn unsubscribe(&self, id: SubscriptionId);
}

struct Subscription {
    id: SubscriptionId,
    event: String,
    listener: Rc<RefCell<Listener>>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

/// 内存事件总线
///
/// 监听器可以在回调中订阅或取消订阅（包括取消自己）。
/// 广播期间被取消的监听器不会再收到这一次事件。
#[derive(Clone, Default)]
pub struct LocalEventBus {
    state: Rc<RefCell<BusState>>,
}

impl fmt::Debug for LocalEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEventBus")
            .field("subscriptions", &self.state.borrow().subscriptions.len())
            .finish()
    }
}

impl LocalEventBus {
    /// 创建事件总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 广播事件，返回收到事件的监听器数量
    pub fn emit(&self, event: &str) -> usize {
        let targets: Vec<(SubscriptionId, Rc<RefCell<Listener>>)> = self
            .state
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.event == event)
            .map(|s| (s.id, s.listener.clone()))
            .collect();

        let mut delivered = 0;
        for (id, listener) in targets {
            if !self.is_subscribed(id) {
                continue;
            }
            // 监听器重入自身时跳过
            if let Ok(mut listener) = listener.try_borrow_mut() {
                listener();
                delivered += 1;
            }
        }
        delivered
    }

    /// 某个事件的监听器数量
    pub fn listener_count(&self, event: &str) -> usize {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.event == event)
            .count()
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .any(|s| s.id == id)
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, event: &str, listener: Listener) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.subscriptions.push(Subscription {
            id,
            event: event.to_string(),
            listener: Rc::new(RefCell::new(listener)),
        });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state
            .borrow_mut()
            .subscriptions
            .retain(|s| s.id != id);
    }
}
