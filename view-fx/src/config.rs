//! # Config 模块
//!
//! 各操作的默认参数。
//!
//! 操作参数传 `None` 时使用这里的默认值。配置以 JSON 表示，缺失的字段
//! 取默认值；文件读取由宿主负责（见 `view-fx-host`）。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};
use crate::pulse::HighlightOptions;
use crate::tween::Timing;

/// 补间默认参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    /// 总时长（毫秒）
    pub duration_ms: u64,
    /// tick 间隔（毫秒）
    pub delay_ms: u64,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            delay_ms: 50,
        }
    }
}

impl TweenConfig {
    /// 转换为补间时间参数
    pub fn timing(&self) -> Timing {
        Timing::from_millis(self.duration_ms, self.delay_ms)
    }

    /// tick 间隔
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// 闪烁默认参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    /// 闪烁次数（每次包含一隐一显）
    pub times: u32,
    /// 切换间隔（毫秒）
    pub delay_ms: u64,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            times: 3,
            delay_ms: 300,
        }
    }
}

impl FlashConfig {
    /// 切换间隔
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// view-fx 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConfig {
    /// 补间
    #[serde(default)]
    pub tween: TweenConfig,

    /// 高亮
    #[serde(default)]
    pub highlight: HighlightOptions,

    /// 闪烁
    #[serde(default)]
    pub flash: FlashConfig,

    /// 上传资源的路径前缀（图片、模型）
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

fn default_resource_prefix() -> String {
    "app/resources/Uploaded/".to_string()
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            tween: TweenConfig::default(),
            highlight: HighlightOptions::default(),
            flash: FlashConfig::default(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

impl FxConfig {
    /// 从 JSON 解析
    pub fn from_json(content: &str) -> FxResult<Self> {
        serde_json::from_str(content).map_err(|e| FxError::Config {
            message: e.to_string(),
        })
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> FxResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FxError::Config {
            message: e.to_string(),
        })
    }

    /// 拼接上传资源路径
    pub fn resource_path(&self, name: &str) -> String {
        format!("{}{}", self.resource_prefix, name)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> FxResult<()> {
        if self.tween.delay_ms == 0 {
            return Err(invalid("tween.delay_ms 必须大于 0"));
        }
        if self.highlight.interval_ms == 0 {
            return Err(invalid("highlight.interval_ms 必须大于 0"));
        }
        if self.flash.delay_ms == 0 {
            return Err(invalid("flash.delay_ms 必须大于 0"));
        }
        if !self.highlight.hue.is_finite() {
            return Err(invalid("highlight.hue 必须是有限数值"));
        }
        if self.highlight.tick_count().is_err() {
            return Err(invalid("highlight.times 过大"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> FxError {
    FxError::Config {
        message: message.to_string(),
    }
}
