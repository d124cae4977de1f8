//! # View 模块
//!
//! [`ViewFx`]：挂在一个视图上的操作集合。
//!
//! 持有补间注册表和声音注册表，生命周期与宿主视图一致：
//! 视图销毁时调用 [`ViewFx::teardown`]（或直接 drop），
//! 所有动画被取消、所有跟踪中的声音被停止。
//!
//! ```rust,ignore
//! let mut fx = ViewFx::new(host, FxConfig::default());
//!
//! fx.fade_in("logo", None)?;
//! fx.toggle_rotation("gear", "Y", 5.0, None)?;
//! fx.highlight("valve", Some(HighlightOptions::new(3, 200.0, Duration::from_millis(40))))?;
//! fx.set_model("engine", "engine.pvz").await?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::audio::{AudioBackend, SoundRegistry};
use crate::color::css_rgba;
use crate::completion::{Completion, Outcome};
use crate::config::FxConfig;
use crate::error::{FxError, FxResult};
use crate::event::{EventBus, MODEL_LOAD_FAILED, MODEL_LOADED, SubscriptionId};
use crate::pulse::{self, HighlightOptions};
use crate::timer::{Repeat, TimerHandle, TimerService};
use crate::tween::{Timing, TweenEngine};
use crate::value::PropertyValue;
use crate::widget::{Scene, Target, Widget, props, rotation_property};

/// 宿主提供的能力
#[derive(Clone)]
pub struct ViewHost {
    /// 控件解析
    pub scene: Rc<dyn Scene>,
    /// 定时服务
    pub timer: Rc<dyn TimerService>,
    /// 事件总线
    pub events: Rc<dyn EventBus>,
    /// 音频输出
    pub audio: Rc<dyn AudioBackend>,
}

/// 闪烁参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashOptions {
    /// 闪烁次数，可见性共切换 `2 * times` 次
    pub times: u32,
    /// 切换间隔
    pub delay: Duration,
}

impl FlashOptions {
    /// 创建闪烁参数
    pub fn new(times: u32, delay: Duration) -> Self {
        Self { times, delay }
    }
}

/// 视图操作集合
pub struct ViewFx {
    host: ViewHost,
    config: FxConfig,
    tweens: TweenEngine,
    sounds: SoundRegistry,
}

impl fmt::Debug for ViewFx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewFx")
            .field("config", &self.config)
            .field("tweens", &self.tweens)
            .field("sounds", &self.sounds)
            .finish()
    }
}

impl ViewFx {
    /// 创建视图操作集合
    pub fn new(host: ViewHost, config: FxConfig) -> Self {
        let tweens = TweenEngine::new(host.timer.clone());
        Self {
            host,
            config,
            tweens,
            sounds: SoundRegistry::new(),
        }
    }

    /// 当前配置
    pub fn config(&self) -> &FxConfig {
        &self.config
    }

    /// 补间引擎（查询用）
    pub fn tweens(&self) -> &TweenEngine {
        &self.tweens
    }

    /// 声音注册表（查询用）
    pub fn sounds(&self) -> &SoundRegistry {
        &self.sounds
    }

    /// 解析控件
    ///
    /// 名称经场景解析，已解析的控件原样返回。
    pub fn widget(&self, target: impl Into<Target>) -> FxResult<Rc<dyn Widget>> {
        match target.into() {
            Target::Name(name) => self
                .host
                .scene
                .widget(&name)
                .ok_or_else(|| FxError::widget_not_found(name)),
            Target::Widget(widget) => Ok(widget),
        }
    }

    fn timing_or_default(&self, timing: Option<Timing>) -> Timing {
        timing.unwrap_or_else(|| self.config.tween.timing())
    }

    fn delay_or_default(&self, delay: Option<Duration>) -> Duration {
        delay.unwrap_or_else(|| self.config.tween.delay())
    }

    // ========== 补间 ==========

    /// 属性从 `from` 补间到 `to`
    pub fn animate_from_to(
        &mut self,
        target: impl Into<Target>,
        property: &str,
        from: f64,
        to: f64,
        timing: Option<Timing>,
    ) -> FxResult<TimerHandle> {
        let widget = self.widget(target)?;
        let timing = self.timing_or_default(timing);
        self.tweens
            .animate_from_to(widget, property, from, to, timing)
    }

    /// 属性按固定增量持续变化
    pub fn animate_by(
        &mut self,
        target: impl Into<Target>,
        property: &str,
        delta: f64,
        delay: Option<Duration>,
    ) -> FxResult<TimerHandle> {
        let widget = self.widget(target)?;
        let delay = self.delay_or_default(delay);
        self.tweens.animate_by(widget, property, delta, delay)
    }

    /// 停止属性动画，没有动画时无效果
    pub fn stop_animation(&mut self, target: impl Into<Target>, property: &str) -> FxResult<()> {
        let widget = self.widget(target)?;
        self.tweens.stop_animation(widget.as_ref(), property);
        Ok(())
    }

    /// 切换 `animate_from_to`
    pub fn toggle_animate_from_to(
        &mut self,
        target: impl Into<Target>,
        property: &str,
        from: f64,
        to: f64,
        timing: Option<Timing>,
    ) -> FxResult<Option<TimerHandle>> {
        let widget = self.widget(target)?;
        let timing = self.timing_or_default(timing);
        self.tweens
            .toggle_animate_from_to(widget, property, from, to, timing)
    }

    /// 切换 `animate_by`
    pub fn toggle_animate_by(
        &mut self,
        target: impl Into<Target>,
        property: &str,
        delta: f64,
        delay: Option<Duration>,
    ) -> FxResult<Option<TimerHandle>> {
        let widget = self.widget(target)?;
        let delay = self.delay_or_default(delay);
        self.tweens.toggle_animate_by(widget, property, delta, delay)
    }

    /// 绕轴持续旋转
    pub fn animate_rotation(
        &mut self,
        target: impl Into<Target>,
        axis: &str,
        delta_angle: f64,
        delay: Option<Duration>,
    ) -> FxResult<TimerHandle> {
        let widget = self.widget(target)?;
        let delay = self.delay_or_default(delay);
        self.tweens
            .animate_rotation(widget, axis, delta_angle, delay)
    }

    /// 停止旋转
    pub fn stop_rotation(&mut self, target: impl Into<Target>, axis: &str) -> FxResult<()> {
        let widget = self.widget(target)?;
        self.tweens.stop_rotation(widget.as_ref(), axis);
        Ok(())
    }

    /// 切换旋转
    pub fn toggle_rotation(
        &mut self,
        target: impl Into<Target>,
        axis: &str,
        delta_angle: f64,
        delay: Option<Duration>,
    ) -> FxResult<Option<TimerHandle>> {
        let widget = self.widget(target)?;
        let delay = self.delay_or_default(delay);
        self.tweens
            .toggle_rotation(widget, axis, delta_angle, delay)
    }

    /// 颜色高亮
    ///
    /// 只返回完成信号，高亮一旦开始就会运行到结束。
    pub fn highlight(
        &self,
        target: impl Into<Target>,
        options: Option<HighlightOptions>,
    ) -> FxResult<Completion> {
        let widget = self.widget(target)?;
        let options = options.unwrap_or(self.config.highlight);
        pulse::highlight(self.host.timer.as_ref(), widget, options)
    }

    // ========== 基于补间的效果 ==========

    /// 从当前不透明度淡出到 0
    pub fn fade_out(
        &mut self,
        target: impl Into<Target>,
        timing: Option<Timing>,
    ) -> FxResult<TimerHandle> {
        self.tween_from_current(target, props::OPACITY, 0.0, timing)
    }

    /// 从当前不透明度淡入到 1
    pub fn fade_in(
        &mut self,
        target: impl Into<Target>,
        timing: Option<Timing>,
    ) -> FxResult<TimerHandle> {
        self.tween_from_current(target, props::OPACITY, 1.0, timing)
    }

    /// 从当前缩放补间到 `factor`
    pub fn scale(
        &mut self,
        target: impl Into<Target>,
        factor: f64,
        timing: Option<Timing>,
    ) -> FxResult<TimerHandle> {
        self.tween_from_current(target, props::SCALE, factor, timing)
    }

    fn tween_from_current(
        &mut self,
        target: impl Into<Target>,
        property: &str,
        to: f64,
        timing: Option<Timing>,
    ) -> FxResult<TimerHandle> {
        let widget = self.widget(target)?;
        let from = numeric_property(widget.as_ref(), property)?;
        let timing = self.timing_or_default(timing);
        self.tweens.animate_from_to(widget, property, from, to, timing)
    }

    // ========== 可见性 ==========

    /// 显示
    pub fn show(&self, target: impl Into<Target>) -> FxResult<()> {
        self.set_property(target, props::VISIBLE, true)
    }

    /// 隐藏
    pub fn hide(&self, target: impl Into<Target>) -> FxResult<()> {
        self.set_property(target, props::VISIBLE, false)
    }

    /// 切换可见性
    pub fn toggle_visibility(&self, target: impl Into<Target>) -> FxResult<()> {
        let widget = self.widget(target)?;
        toggle_visible(widget.as_ref());
        Ok(())
    }

    /// 闪烁：可见性切换 `2 * times` 次
    pub fn flash(
        &self,
        target: impl Into<Target>,
        options: Option<FlashOptions>,
    ) -> FxResult<TimerHandle> {
        let widget = self.widget(target)?;
        let options = options.unwrap_or_else(|| {
            FlashOptions::new(self.config.flash.times, self.config.flash.delay())
        });
        if options.delay.is_zero() {
            return Err(FxError::invalid_timing("闪烁间隔不能为 0"));
        }

        debug!(widget = widget.name(), times = options.times, "flash");
        let count = options.times.saturating_mul(2);
        Ok(self.host.timer.schedule(
            options.delay,
            Repeat::Times(count),
            Box::new(move || toggle_visible(widget.as_ref())),
        ))
    }

    // ========== 属性读写 ==========

    /// 读取属性
    pub fn get_property(
        &self,
        target: impl Into<Target>,
        property: &str,
    ) -> FxResult<Option<PropertyValue>> {
        let widget = self.widget(target)?;
        Ok(widget.get_property(property))
    }

    /// 写入属性
    pub fn set_property(
        &self,
        target: impl Into<Target>,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> FxResult<()> {
        let widget = self.widget(target)?;
        widget.set_property(property, value.into());
        Ok(())
    }

    /// 数值属性加上增量
    pub fn change_property(
        &self,
        target: impl Into<Target>,
        property: &str,
        delta: f64,
    ) -> FxResult<()> {
        let widget = self.widget(target)?;
        let current = numeric_property(widget.as_ref(), property)?;
        widget.set_property(property, PropertyValue::Number(current + delta));
        Ok(())
    }

    /// 绕轴旋转一次
    pub fn rotate(&self, target: impl Into<Target>, axis: &str, delta: f64) -> FxResult<()> {
        self.change_property(target, &rotation_property(axis), delta)
    }

    /// 序列控件的当前步骤
    pub fn get_current_step(&self, target: impl Into<Target>) -> FxResult<Option<PropertyValue>> {
        self.get_property(target, props::CURRENT_STEP)
    }

    // ========== 颜色与资源 ==========

    /// 设置颜色覆盖
    pub fn set_color(&self, target: impl Into<Target>, r: u8, g: u8, b: u8) -> FxResult<()> {
        self.set_property(target, props::COLOR, css_rgba(r, g, b))
    }

    /// 清除颜色覆盖
    pub fn reset_color(&self, target: impl Into<Target>) -> FxResult<()> {
        self.set_property(target, props::COLOR, PropertyValue::empty())
    }

    /// 设置图片资源
    pub fn set_image_source(&self, target: impl Into<Target>, resource_name: &str) -> FxResult<()> {
        let src = self.config.resource_path(resource_name);
        self.set_property(target, props::SRC, src)
    }

    /// 切换模型并等待加载结果
    ///
    /// 先订阅 `modelLoaded` / `modelloadfailed`，再设置 `src`。
    /// 任一事件到达后两个订阅都被取消；失败时以
    /// [`FxError::ModelLoadFailed`] reject。
    pub fn set_model(&self, target: impl Into<Target>, model_name: &str) -> FxResult<Completion> {
        let widget = self.widget(target)?;
        let src = self.config.resource_path(model_name);
        let completion = Completion::pending();
        let subscriptions: Rc<RefCell<Vec<SubscriptionId>>> = Rc::new(RefCell::new(Vec::new()));

        let settle_with = |outcome: Outcome| {
            let events = self.host.events.clone();
            let subscriptions = subscriptions.clone();
            let completion = completion.clone();
            move || {
                let ids = std::mem::take(&mut *subscriptions.borrow_mut());
                for id in ids {
                    events.unsubscribe(id);
                }
                completion.settle(outcome.clone());
            }
        };

        let loaded = self
            .host
            .events
            .subscribe(MODEL_LOADED, Box::new(settle_with(Outcome::Resolved)));
        let failed = self.host.events.subscribe(
            MODEL_LOAD_FAILED,
            Box::new(settle_with(Outcome::Rejected(FxError::ModelLoadFailed {
                src: src.clone(),
            }))),
        );
        subscriptions.borrow_mut().extend([loaded, failed]);

        debug!(widget = widget.name(), src = %src, "set model");
        widget.set_property(props::SRC, src.into());
        Ok(completion)
    }

    // ========== 声音 ==========

    /// 播放声音
    pub fn play_sound(&mut self, src: &str, looping: bool) -> FxResult<()> {
        self.sounds.play(self.host.audio.as_ref(), src, looping)
    }

    /// 停止声音，未在播放时无效果
    pub fn stop_sound(&mut self, src: &str) {
        self.sounds.stop(src);
    }

    // ========== 序列 ==========

    /// 播放序列的全部步骤
    pub fn play_all_sequence_steps(&self, id: &str) -> FxResult<()> {
        self.sequence(id)?.play_all();
        Ok(())
    }

    /// 播放序列的下一步
    pub fn play_next_sequence_step(&self, id: &str) -> FxResult<()> {
        self.sequence(id)?.play_next();
        Ok(())
    }

    fn sequence(&self, id: &str) -> FxResult<Rc<dyn crate::widget::SequencePlayer>> {
        self.host
            .scene
            .sequence(id)
            .ok_or_else(|| FxError::SequenceNotFound { id: id.to_string() })
    }

    // ========== 生命周期 ==========

    /// 视图销毁：取消全部动画，停止全部声音
    pub fn teardown(&mut self) {
        debug!(
            animations = self.tweens.active_count(),
            sounds = self.sounds.len(),
            "view teardown"
        );
        self.tweens.stop_all();
        self.sounds.stop_all();
    }
}

impl Drop for ViewFx {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn numeric_property(widget: &dyn Widget, property: &str) -> FxResult<f64> {
    widget
        .get_property(property)
        .and_then(|v| v.as_number())
        .ok_or_else(|| FxError::NotNumeric {
            widget: widget.name().to_string(),
            property: property.to_string(),
        })
}

fn toggle_visible(widget: &dyn Widget) {
    let visible = widget
        .get_property(props::VISIBLE)
        .is_some_and(|v| v.is_truthy());
    widget.set_property(props::VISIBLE, PropertyValue::Bool(!visible));
}
