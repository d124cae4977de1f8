//! # Tween 模块
//!
//! 补间引擎：用宿主定时器周期性地给控件数值属性加上固定增量。
//!
//! ## 核心约束
//!
//! - 每个 [`AnimationKey`]（控件名 + 属性名）同一时刻最多一个动画
//! - 对同一个键启动新动画时，先取消旧定时器，再安装新的
//! - 有界动画在最后一次 tick 后从注册表移除，然后 resolve 句柄
//! - 无界动画只能被 `stop` / `toggle` 终止

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::timer::{Repeat, TimerHandle, TimerId, TimerService};
use crate::value::PropertyValue;
use crate::widget::{Widget, rotation_property};

/// 动画 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u64);

/// 动画键
///
/// 唯一标识一个动画槽位。显示为 `widget.property`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationKey {
    /// 控件名称
    pub widget: String,
    /// 属性名称
    pub property: String,
}

impl AnimationKey {
    /// 创建动画键
    pub fn new(widget: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            widget: widget.into(),
            property: property.into(),
        }
    }

    /// 由控件和属性创建
    pub fn of(widget: &dyn Widget, property: &str) -> Self {
        Self::new(widget.name(), property)
    }
}

impl fmt::Display for AnimationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.widget, self.property)
    }
}

/// 补间时间参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// 总时长
    pub duration: Duration,
    /// tick 间隔
    pub delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            delay: Duration::from_millis(50),
        }
    }
}

impl Timing {
    /// 创建时间参数
    pub fn new(duration: Duration, delay: Duration) -> Self {
        Self { duration, delay }
    }

    /// 以毫秒创建
    pub fn from_millis(duration: u64, delay: u64) -> Self {
        Self::new(Duration::from_millis(duration), Duration::from_millis(delay))
    }

    /// tick 次数：`floor(duration / delay)`
    pub fn tick_count(&self) -> FxResult<u32> {
        if self.delay.is_zero() {
            return Err(FxError::invalid_timing("tick 间隔不能为 0"));
        }
        let count = self.duration.as_nanos() / self.delay.as_nanos();
        u32::try_from(count).map_err(|_| FxError::invalid_timing("tick 次数过多"))
    }
}

/// 进行中的动画
#[derive(Debug)]
pub struct Animation {
    /// 动画 ID
    pub id: AnimationId,
    /// 动画键
    pub key: AnimationKey,
    /// 定时器句柄
    pub handle: TimerHandle,
    /// 每次 tick 的增量
    pub delta_per_tick: f64,
    /// 总 tick 次数（`Forever` 为无界）
    pub repeat: Repeat,
    delivered: Rc<Cell<u32>>,
}

impl Animation {
    /// 剩余 tick 次数；无界动画返回 `None`
    pub fn remaining_ticks(&self) -> Option<u32> {
        match self.repeat {
            Repeat::Times(total) => Some(total.saturating_sub(self.delivered.get())),
            Repeat::Forever => None,
        }
    }

    /// 已投递的 tick 次数
    pub fn delivered_ticks(&self) -> u32 {
        self.delivered.get()
    }
}

type Registry = Rc<RefCell<HashMap<AnimationKey, Animation>>>;

/// 补间引擎
///
/// 持有动画注册表。注册表放在 `Rc<RefCell<_>>` 中，
/// 有界动画完成时由定时器回调把自己移除。
pub struct TweenEngine {
    timer: Rc<dyn TimerService>,
    animations: Registry,
    next_anim_id: u64,
}

impl fmt::Debug for TweenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenEngine")
            .field("animations", &self.animations.borrow().len())
            .finish()
    }
}

impl TweenEngine {
    /// 创建补间引擎
    pub fn new(timer: Rc<dyn TimerService>) -> Self {
        Self {
            timer,
            animations: Rc::new(RefCell::new(HashMap::new())),
            next_anim_id: 1,
        }
    }

    fn next_animation_id(&mut self) -> AnimationId {
        let id = AnimationId(self.next_anim_id);
        self.next_anim_id += 1;
        id
    }

    // ========== 动画控制 ==========

    /// 在 `timing.duration` 内把属性从 `from` 线性变化到 `to`
    ///
    /// 立即把属性设为 `from`，然后每 `timing.delay` 加一次
    /// `(to - from) / tick_count`。tick 次数为 0 时只设置初始值，
    /// 返回已完成的句柄，不登记动画。
    pub fn animate_from_to(
        &mut self,
        widget: Rc<dyn Widget>,
        property: &str,
        from: f64,
        to: f64,
        timing: Timing,
    ) -> FxResult<TimerHandle> {
        let count = timing.tick_count()?;
        let key = AnimationKey::of(widget.as_ref(), property);

        self.cancel_existing(&key);
        widget.set_property(property, PropertyValue::Number(from));

        if count == 0 {
            debug!(key = %key, "tween has no ticks, initial value only");
            return Ok(TimerHandle::finished(TimerId(0)));
        }

        let delta = (to - from) / f64::from(count);
        Ok(self.install(key, widget, delta, timing.delay, Repeat::Times(count)))
    }

    /// 每 `delay` 给属性加一次 `delta`，无限持续
    ///
    /// 不设置初始值。返回的句柄不会自己 resolve，停止时 settle 为取消。
    pub fn animate_by(
        &mut self,
        widget: Rc<dyn Widget>,
        property: &str,
        delta: f64,
        delay: Duration,
    ) -> FxResult<TimerHandle> {
        if delay.is_zero() {
            return Err(FxError::invalid_timing("tick 间隔不能为 0"));
        }
        let key = AnimationKey::of(widget.as_ref(), property);

        self.cancel_existing(&key);
        Ok(self.install(key, widget, delta, delay, Repeat::Forever))
    }

    /// 停止动画，键不存在时无效果
    pub fn stop_animation(&mut self, widget: &dyn Widget, property: &str) {
        let key = AnimationKey::of(widget, property);
        // 先释放注册表借用，取消会触发完成回调
        let removed = self.animations.borrow_mut().remove(&key);
        if let Some(animation) = removed {
            debug!(key = %key, id = animation.id.0, "stop animation");
            animation.handle.cancel();
        }
    }

    /// 有动画则停止，否则启动 `animate_from_to`
    ///
    /// 返回新启动动画的句柄；停止时返回 `None`。
    pub fn toggle_animate_from_to(
        &mut self,
        widget: Rc<dyn Widget>,
        property: &str,
        from: f64,
        to: f64,
        timing: Timing,
    ) -> FxResult<Option<TimerHandle>> {
        if self.is_animating(widget.as_ref(), property) {
            self.stop_animation(widget.as_ref(), property);
            Ok(None)
        } else {
            self.animate_from_to(widget, property, from, to, timing)
                .map(Some)
        }
    }

    /// 有动画则停止，否则启动 `animate_by`
    pub fn toggle_animate_by(
        &mut self,
        widget: Rc<dyn Widget>,
        property: &str,
        delta: f64,
        delay: Duration,
    ) -> FxResult<Option<TimerHandle>> {
        if self.is_animating(widget.as_ref(), property) {
            self.stop_animation(widget.as_ref(), property);
            Ok(None)
        } else {
            self.animate_by(widget, property, delta, delay).map(Some)
        }
    }

    /// 绕某个轴持续旋转（属性 `r<axis>`）
    pub fn animate_rotation(
        &mut self,
        widget: Rc<dyn Widget>,
        axis: &str,
        delta_angle: f64,
        delay: Duration,
    ) -> FxResult<TimerHandle> {
        self.animate_by(widget, &rotation_property(axis), delta_angle, delay)
    }

    /// 停止旋转
    pub fn stop_rotation(&mut self, widget: &dyn Widget, axis: &str) {
        self.stop_animation(widget, &rotation_property(axis));
    }

    /// 切换旋转
    pub fn toggle_rotation(
        &mut self,
        widget: Rc<dyn Widget>,
        axis: &str,
        delta_angle: f64,
        delay: Duration,
    ) -> FxResult<Option<TimerHandle>> {
        self.toggle_animate_by(widget, &rotation_property(axis), delta_angle, delay)
    }

    /// 取消全部动画
    pub fn stop_all(&mut self) {
        let drained: Vec<Animation> = self
            .animations
            .borrow_mut()
            .drain()
            .map(|(_, animation)| animation)
            .collect();
        for animation in drained {
            debug!(key = %animation.key, "stop animation");
            animation.handle.cancel();
        }
    }

    // ========== 查询方法 ==========

    /// 某个属性是否有动画
    pub fn is_animating(&self, widget: &dyn Widget, property: &str) -> bool {
        self.animations
            .borrow()
            .contains_key(&AnimationKey::of(widget, property))
    }

    /// 活跃动画数量
    pub fn active_count(&self) -> usize {
        self.animations.borrow().len()
    }

    /// 某个键的剩余 tick 次数
    ///
    /// - `None`: 没有动画
    /// - `Some(None)`: 无界动画
    pub fn remaining_ticks(&self, key: &AnimationKey) -> Option<Option<u32>> {
        self.animations
            .borrow()
            .get(key)
            .map(Animation::remaining_ticks)
    }

    /// 某个键当前动画的定时器句柄
    pub fn handle(&self, key: &AnimationKey) -> Option<TimerHandle> {
        self.animations
            .borrow()
            .get(key)
            .map(|a| a.handle.clone())
    }

    // ========== 内部实现 ==========

    fn cancel_existing(&mut self, key: &AnimationKey) {
        let previous = self.animations.borrow_mut().remove(key);
        if let Some(previous) = previous {
            debug!(key = %key, id = previous.id.0, "replace running animation");
            previous.handle.cancel();
        }
    }

    fn install(
        &mut self,
        key: AnimationKey,
        widget: Rc<dyn Widget>,
        delta: f64,
        delay: Duration,
        repeat: Repeat,
    ) -> TimerHandle {
        let id = self.next_animation_id();
        let delivered = Rc::new(Cell::new(0));

        let tick = {
            let property = key.property.clone();
            let delivered = delivered.clone();
            move || {
                delivered.set(delivered.get() + 1);
                apply_delta(widget.as_ref(), &property, delta);
            }
        };
        let handle = self.timer.schedule(delay, repeat, Box::new(tick));

        debug!(key = %key, id = id.0, delta, ?repeat, "start animation");

        if repeat.is_bounded() {
            // 完成时移除自己；键已被新动画占用时不动
            let registry = Rc::downgrade(&self.animations);
            let key = key.clone();
            let own = handle.clone();
            handle.completion().on_settled(move |_| {
                if let Some(registry) = registry.upgrade() {
                    let mut registry = registry.borrow_mut();
                    if registry.get(&key).is_some_and(|a| a.handle.same_as(&own)) {
                        registry.remove(&key);
                    }
                }
            });
        }

        if handle.is_active() {
            self.animations.borrow_mut().insert(
                key.clone(),
                Animation {
                    id,
                    key,
                    handle: handle.clone(),
                    delta_per_tick: delta,
                    repeat,
                    delivered,
                },
            );
        }
        handle
    }
}

impl Drop for TweenEngine {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// 给属性加上增量；属性缺失或不是数值时跳过本次 tick
fn apply_delta(widget: &dyn Widget, property: &str, delta: f64) {
    match widget.get_property(property).and_then(|v| v.as_number()) {
        Some(current) => {
            widget.set_property(property, PropertyValue::Number(current + delta));
        }
        None => {
            warn!(
                widget = widget.name(),
                property, "property is missing or not numeric, tick skipped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Outcome;
    use crate::timer::ManualTimer;
    use crate::widget::SceneWidget;

    fn setup() -> (ManualTimer, TweenEngine, Rc<SceneWidget>) {
        let timer = ManualTimer::new();
        let engine = TweenEngine::new(Rc::new(timer.clone()));
        let widget = Rc::new(SceneWidget::new("cube").with("rx", 0.0));
        (timer, engine, widget)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_timing_tick_count() {
        assert_eq!(Timing::default().tick_count(), Ok(20));
        assert_eq!(Timing::from_millis(1000, 300).tick_count(), Ok(3));
        assert_eq!(Timing::from_millis(40, 50).tick_count(), Ok(0));
        assert!(Timing::from_millis(1000, 0).tick_count().is_err());
    }

    #[test]
    fn test_animate_from_to() {
        let (timer, mut engine, widget) = setup();

        let handle = engine
            .animate_from_to(widget.clone(), "opacity", 0.0, 1.0, Timing::default())
            .unwrap();

        // 初始值立即设置
        assert_eq!(widget.number("opacity"), Some(0.0));
        assert_eq!(widget.write_count("opacity"), 1);

        let key = AnimationKey::new("cube", "opacity");
        assert_eq!(engine.remaining_ticks(&key), Some(Some(20)));

        timer.advance_ms(50);
        assert!(approx(widget.number("opacity").unwrap(), 0.05));
        assert_eq!(engine.remaining_ticks(&key), Some(Some(19)));

        assert_eq!(timer.advance_ms(2000), 19);
        assert!(approx(widget.number("opacity").unwrap(), 1.0));
        // 1 次初始值 + 20 次 tick
        assert_eq!(widget.write_count("opacity"), 21);

        assert!(handle.completion().is_resolved());
        assert!(!engine.is_animating(widget.as_ref(), "opacity"));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_zero_ticks_sets_initial_value_only() {
        let (timer, mut engine, widget) = setup();

        let handle = engine
            .animate_from_to(
                widget.clone(),
                "scale",
                2.0,
                5.0,
                Timing::from_millis(30, 50),
            )
            .unwrap();

        assert!(handle.completion().is_resolved());
        assert_eq!(widget.number("scale"), Some(2.0));
        assert_eq!(engine.active_count(), 0);

        timer.advance_ms(1000);
        assert_eq!(widget.write_count("scale"), 1);
    }

    #[test]
    fn test_restart_cancels_previous() {
        let (timer, mut engine, widget) = setup();

        let first = engine
            .animate_from_to(widget.clone(), "opacity", 0.0, 1.0, Timing::default())
            .unwrap();
        timer.advance_ms(100);

        let second = engine
            .animate_from_to(widget.clone(), "opacity", 1.0, 0.0, Timing::default())
            .unwrap();
        assert_eq!(first.completion().outcome(), Some(Outcome::Cancelled));
        assert_eq!(engine.active_count(), 1);

        let writes_before = widget.write_count("opacity");
        timer.advance_ms(50);
        // 每个外部 tick 只有一次写入
        assert_eq!(widget.write_count("opacity"), writes_before + 1);
        assert!(approx(widget.number("opacity").unwrap(), 0.95));

        timer.advance_ms(1000);
        assert!(second.completion().is_resolved());
        assert!(approx(widget.number("opacity").unwrap(), 0.0));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_animate_by_unbounded() {
        let (timer, mut engine, widget) = setup();

        let handle = engine
            .animate_by(widget.clone(), "rx", 5.0, Duration::from_millis(50))
            .unwrap();
        // 不设置初始值
        assert_eq!(widget.write_count("rx"), 0);

        timer.advance_ms(10_000);
        assert_eq!(widget.number("rx"), Some(1000.0));
        assert!(handle.is_active());
        assert_eq!(
            engine.remaining_ticks(&AnimationKey::new("cube", "rx")),
            Some(None)
        );

        engine.stop_animation(widget.as_ref(), "rx");
        assert_eq!(handle.completion().outcome(), Some(Outcome::Cancelled));
        timer.advance_ms(1000);
        assert_eq!(widget.number("rx"), Some(1000.0));
    }

    #[test]
    fn test_stop_absent_is_noop() {
        let (_timer, mut engine, widget) = setup();
        engine.stop_animation(widget.as_ref(), "opacity");
        assert_eq!(engine.active_count(), 0);
        assert_eq!(widget.write_count("opacity"), 0);
    }

    #[test]
    fn test_toggle_animate_by() {
        let (timer, mut engine, widget) = setup();
        let delay = Duration::from_millis(50);

        engine.animate_by(widget.clone(), "rx", 1.0, delay).unwrap();

        // 第一次：停止
        let r = engine.toggle_animate_by(widget.clone(), "rx", 1.0, delay).unwrap();
        assert!(r.is_none());
        assert!(!engine.is_animating(widget.as_ref(), "rx"));

        // 第二次：启动
        let r = engine.toggle_animate_by(widget.clone(), "rx", 1.0, delay).unwrap();
        assert!(r.is_some());
        assert!(engine.is_animating(widget.as_ref(), "rx"));

        timer.advance_ms(100);
        assert_eq!(widget.number("rx"), Some(2.0));
    }

    #[test]
    fn test_toggle_from_to_after_completion_restarts() {
        let (timer, mut engine, widget) = setup();
        let timing = Timing::from_millis(100, 50);

        engine
            .toggle_animate_from_to(widget.clone(), "scale", 1.0, 2.0, timing)
            .unwrap();
        timer.advance_ms(100);
        assert!(!engine.is_animating(widget.as_ref(), "scale"));

        // 已完成的动画不在注册表中，切换会重新启动
        let r = engine
            .toggle_animate_from_to(widget.clone(), "scale", 1.0, 2.0, timing)
            .unwrap();
        assert!(r.is_some());
        assert_eq!(widget.number("scale"), Some(1.0));
    }

    #[test]
    fn test_rotation() {
        let (timer, mut engine, widget) = setup();
        let delay = Duration::from_millis(10);

        engine
            .animate_rotation(widget.clone(), "Y", 2.0, delay)
            .unwrap();
        // ry 不存在时 tick 被跳过，但动画仍然登记
        timer.advance_ms(50);
        assert!(engine.is_animating(widget.as_ref(), "ry"));
        assert_eq!(widget.get_property("ry"), None);
    }

    #[test]
    fn test_rotation_toggle() {
        let (timer, mut engine, widget) = setup();
        let delay = Duration::from_millis(10);

        engine
            .toggle_rotation(widget.clone(), "X", 3.0, delay)
            .unwrap();
        timer.advance_ms(30);
        assert_eq!(widget.number("rx"), Some(9.0));

        engine
            .toggle_rotation(widget.clone(), "x", 3.0, delay)
            .unwrap();
        timer.advance_ms(30);
        assert_eq!(widget.number("rx"), Some(9.0));

        engine.animate_rotation(widget.clone(), "x", 1.0, delay).unwrap();
        engine.stop_rotation(widget.as_ref(), "X");
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_independent_keys() {
        let (timer, mut engine, widget) = setup();
        let other = Rc::new(SceneWidget::new("sphere"));

        engine
            .animate_from_to(widget.clone(), "opacity", 0.0, 1.0, Timing::default())
            .unwrap();
        engine
            .animate_from_to(other.clone(), "opacity", 1.0, 0.0, Timing::default())
            .unwrap();
        engine
            .animate_from_to(widget.clone(), "scale", 1.0, 3.0, Timing::default())
            .unwrap();
        assert_eq!(engine.active_count(), 3);

        timer.advance_ms(1000);
        assert!(approx(widget.number("opacity").unwrap(), 1.0));
        assert!(approx(other.number("opacity").unwrap(), 0.0));
        assert!(approx(widget.number("scale").unwrap(), 3.0));
    }

    #[test]
    fn test_drop_cancels_all() {
        let (timer, mut engine, widget) = setup();
        let handle = engine
            .animate_by(widget.clone(), "rx", 1.0, Duration::from_millis(10))
            .unwrap();

        drop(engine);
        assert_eq!(handle.completion().outcome(), Some(Outcome::Cancelled));
        timer.advance_ms(100);
        assert_eq!(widget.number("rx"), Some(0.0));
    }

    #[test]
    fn test_zero_delay_rejected() {
        let (_timer, mut engine, widget) = setup();
        let err = engine
            .animate_by(widget, "rx", 1.0, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, FxError::InvalidTiming { .. }));
    }
}
