//! # Error 模块
//!
//! 定义 view-fx 中使用的错误类型。

use thiserror::Error;

/// view-fx 统一错误类型
///
/// 需要 `Clone + PartialEq`：[`Completion`](crate::Completion) 会把错误
/// 保存下来，交给每一个等待者。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// 控件未找到
    #[error("控件 '{name}' 未找到")]
    WidgetNotFound { name: String },

    /// 序列播放器未找到
    #[error("序列控件 '{id}' 未找到")]
    SequenceNotFound { id: String },

    /// 属性不是数值
    #[error("控件 '{widget}' 的属性 '{property}' 不是数值")]
    NotNumeric { widget: String, property: String },

    /// 无效的时间参数
    #[error("无效的时间参数: {message}")]
    InvalidTiming { message: String },

    /// 模型加载失败（宿主触发 `modelloadfailed`）
    #[error("模型 '{src}' 加载失败")]
    ModelLoadFailed { src: String },

    /// 定时器被取消
    #[error("定时器已取消")]
    Cancelled,

    /// 音频错误
    #[error("音频错误: {message}")]
    Audio { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config { message: String },
}

impl FxError {
    pub(crate) fn widget_not_found(name: impl Into<String>) -> Self {
        Self::WidgetNotFound { name: name.into() }
    }

    pub(crate) fn invalid_timing(message: impl Into<String>) -> Self {
        Self::InvalidTiming {
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type FxResult<T> = Result<T, FxError>;
