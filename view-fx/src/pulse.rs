//! # Pulse 模块
//!
//! 高亮脉冲：固定色相、亮度 0.5，饱和度在 0 与 100 之间往返，
//! 结束后清除控件的颜色覆盖。
//!
//! 高亮不进入补间注册表，也没有取消接口：只返回完成信号，总是运行到结束。

use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::hsl_to_rgb;
use crate::completion::Completion;
use crate::error::{FxError, FxResult};
use crate::timer::{Repeat, TimerService};
use crate::value::PropertyValue;
use crate::widget::{Widget, props};

/// 饱和度上限
const MAX_SATURATION: i32 = 100;

/// 每次 tick 的饱和度步长
const SATURATION_STEP: i32 = 10;

/// 高亮参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    /// 往返次数
    pub times: u32,
    /// 色相（角度，0-360）
    pub hue: f64,
    /// tick 间隔（毫秒）
    pub interval_ms: u64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            times: 2,
            hue: 0.0,
            interval_ms: 50,
        }
    }
}

impl HighlightOptions {
    /// 创建高亮参数
    pub fn new(times: u32, hue: f64, interval: Duration) -> Self {
        Self {
            times,
            hue,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// tick 间隔
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// 总 tick 次数：`times * 2 * (100 / 10) + 1`
    ///
    /// `times` 过大导致溢出时返回 [`FxError::InvalidTiming`]。
    pub fn tick_count(&self) -> FxResult<u32> {
        let half_cycle = (MAX_SATURATION / SATURATION_STEP) as u32;
        self.times
            .checked_mul(2 * half_cycle)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| FxError::invalid_timing(format!("高亮次数 {} 过大", self.times)))
    }
}

/// 饱和度振荡器
///
/// 每次 `next` 返回当前饱和度，然后前进一步；越过或到达边界时反向。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaturationOscillator {
    saturation: i32,
    step: i32,
}

impl Default for SaturationOscillator {
    fn default() -> Self {
        Self {
            saturation: 0,
            step: SATURATION_STEP,
        }
    }
}

impl Iterator for SaturationOscillator {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let current = self.saturation;
        self.saturation += self.step;
        if self.saturation <= 0 || self.saturation >= MAX_SATURATION {
            self.step = -self.step;
        }
        Some(current)
    }
}

/// 某个饱和度对应的 CSS 颜色
pub fn pulse_color(hue: f64, saturation: i32) -> String {
    hsl_to_rgb(
        hue / 360.0,
        f64::from(saturation) / f64::from(MAX_SATURATION),
        0.5,
    )
    .to_css()
}

/// 启动高亮
///
/// 返回的完成信号在最后一次 tick 之后 resolve，此时颜色已被清空。
pub fn highlight(
    timer: &dyn TimerService,
    widget: Rc<dyn Widget>,
    options: HighlightOptions,
) -> FxResult<Completion> {
    if options.interval_ms == 0 {
        return Err(FxError::invalid_timing("高亮间隔不能为 0"));
    }

    let count = options.tick_count()?;
    debug!(
        widget = widget.name(),
        times = options.times,
        hue = options.hue,
        count,
        "start highlight"
    );

    let tick = {
        let widget = widget.clone();
        let hue = options.hue;
        let mut oscillator = SaturationOscillator::default();
        move || {
            if let Some(saturation) = oscillator.next() {
                widget.set_property(props::COLOR, pulse_color(hue, saturation).into());
            }
        }
    };

    let completion = timer
        .schedule(options.interval(), Repeat::Times(count), Box::new(tick))
        .completion();
    completion.on_settled(move |_| {
        widget.set_property(props::COLOR, PropertyValue::empty());
    });
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;
    use crate::widget::SceneWidget;

    #[test]
    fn test_tick_count() {
        assert_eq!(HighlightOptions::default().tick_count(), Ok(41));
        assert_eq!(HighlightOptions::new(1, 120.0, Duration::from_millis(20)).tick_count(), Ok(21));
        assert_eq!(HighlightOptions::new(0, 0.0, Duration::from_millis(20)).tick_count(), Ok(1));
    }

    #[test]
    fn test_tick_count_overflow() {
        let options = HighlightOptions::new(300_000_000, 0.0, Duration::from_millis(50));
        assert!(matches!(options.tick_count(), Err(FxError::InvalidTiming { .. })));

        // 恰好不溢出的上限
        let max = (u32::MAX - 1) / 20;
        let interval = Duration::from_millis(50);
        assert_eq!(
            HighlightOptions::new(max, 0.0, interval).tick_count(),
            Ok(max * 20 + 1)
        );
        assert!(HighlightOptions::new(max + 1, 0.0, interval).tick_count().is_err());

        let timer = ManualTimer::new();
        let widget = Rc::new(SceneWidget::new("cube"));
        assert!(highlight(&timer, widget.clone(), options).is_err());
        assert_eq!(timer.pending_count(), 0);
        assert_eq!(widget.write_count("color"), 0);
    }

    #[test]
    fn test_oscillator_bounces() {
        let values: Vec<i32> = SaturationOscillator::default().take(23).collect();
        assert_eq!(
            values,
            vec![
                0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 90, 80, 70, 60, 50, 40, 30, 20, 10,
                0, 10, 20
            ]
        );
    }

    #[test]
    fn test_pulse_color_bounds() {
        assert_eq!(pulse_color(0.0, 0), "rgba(128, 128, 128, 1)");
        assert_eq!(pulse_color(0.0, 100), "rgba(255, 0, 0, 1)");
        assert_eq!(pulse_color(120.0, 100), "rgba(0, 255, 0, 1)");
    }

    #[test]
    fn test_highlight_runs_to_completion() {
        let timer = ManualTimer::new();
        let widget = Rc::new(SceneWidget::new("cube"));

        let completion = highlight(&timer, widget.clone(), HighlightOptions::default()).unwrap();

        timer.advance_ms(50);
        assert_eq!(widget.text("color").as_deref(), Some("rgba(128, 128, 128, 1)"));

        // 第 11 次 tick 饱和度到达 100
        timer.advance_ms(500);
        assert_eq!(widget.text("color").as_deref(), Some("rgba(255, 0, 0, 1)"));
        assert!(!completion.is_settled());

        assert_eq!(timer.advance_ms(10_000), 30);
        assert!(completion.is_resolved());

        // 41 次着色 + 1 次清空
        let writes = widget.writes_of("color");
        assert_eq!(writes.len(), 42);
        assert_eq!(writes[40], PropertyValue::from("rgba(128, 128, 128, 1)"));
        assert_eq!(widget.text("color").as_deref(), Some(""));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let timer = ManualTimer::new();
        let widget = Rc::new(SceneWidget::new("cube"));
        let options = HighlightOptions::new(2, 0.0, Duration::ZERO);
        assert!(highlight(&timer, widget, options).is_err());
    }
}
