//! # view-fx
//!
//! AR/3D 创作工具视图脚本的辅助库：属性补间、颜色高亮、可见性切换、
//! 声音播放、模型加载等针对具名控件的操作。
//!
//! ## 架构概述
//!
//! `view-fx` 是纯逻辑核心，不依赖任何 IO 或异步运行时。
//! 宿主通过能力接口注入控件、定时器、事件总线和音频：
//!
//! ```text
//! Host                                view-fx
//!   │                                    │
//!   │──── ViewHost { scene, timer, ─────►│ ViewFx::new
//!   │          events, audio }           │
//!   │                                    │
//!   │◄─── schedule(period, repeat) ──────│ 补间 / 高亮 / 闪烁
//!   │──── tick() ───────────────────────►│ 修改控件属性
//!   │──── emit("modelLoaded") ──────────►│ set_model resolve
//! ```
//!
//! ## 核心类型
//!
//! - [`ViewFx`]：视图操作集合，持有动画注册表和声音注册表
//! - [`TweenEngine`]：按 (控件, 属性) 管理的线性补间
//! - [`highlight`]：饱和度往返的颜色脉冲
//! - [`hsl_to_rgb`]：HSL → RGB
//! - [`TimerService`] / [`Widget`] / [`Scene`] / [`EventBus`] / [`AudioBackend`]：宿主能力
//! - [`ManualTimer`] / [`SceneGraph`] / [`LocalEventBus`] / [`MemoryAudio`]：内存实现
//!
//! ## 模块结构
//!
//! - [`color`]：颜色转换
//! - [`tween`]：补间引擎
//! - [`pulse`]：高亮脉冲
//! - [`view`]：视图操作集合
//! - [`widget`] / [`timer`] / [`event`] / [`audio`]：宿主接口
//! - [`completion`]：完成信号
//! - [`config`]：默认参数
//! - [`error`]：错误类型

pub mod audio;
pub mod color;
pub mod completion;
pub mod config;
pub mod error;
pub mod event;
pub mod pulse;
pub mod timer;
pub mod tween;
pub mod value;
pub mod view;
pub mod widget;

// 重导出核心类型
pub use audio::{AudioBackend, AudioEvent, MemoryAudio, Playback, SoundRegistry};
pub use color::{Rgb, css_rgba, hsl_to_rgb};
pub use completion::{Completion, Outcome};
pub use config::{FlashConfig, FxConfig, TweenConfig};
pub use error::{FxError, FxResult};
pub use event::{EventBus, LocalEventBus, MODEL_LOAD_FAILED, MODEL_LOADED, SubscriptionId};
pub use pulse::{HighlightOptions, SaturationOscillator, highlight, pulse_color};
pub use timer::{ManualTimer, Repeat, TickFn, TimerHandle, TimerId, TimerService};
pub use tween::{Animation, AnimationId, AnimationKey, Timing, TweenEngine};
pub use value::PropertyValue;
pub use view::{FlashOptions, ViewFx, ViewHost};
pub use widget::{Scene, SceneGraph, SceneWidget, SequencePlayer, Target, Widget, props};
