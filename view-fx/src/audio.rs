//! # Audio 模块
//!
//! 声音播放接口与按源路径管理的声音注册表。
//!
//! 每个源路径只跟踪一个播放实例。对同一路径再次播放时只替换注册表项，
//! 不会先停止旧实例，旧实例继续播放且不再被跟踪。

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{FxError, FxResult};

/// 正在播放的声音
///
/// 只有 `stop` 会停止播放，句柄被丢弃时声音继续。
pub trait Playback {
    /// 停止播放
    fn stop(&self);
}

/// 宿主音频输出
pub trait AudioBackend {
    /// 开始播放
    fn play(&self, src: &str, looping: bool) -> FxResult<Box<dyn Playback>>;
}

/// 声音注册表
#[derive(Default)]
pub struct SoundRegistry {
    sounds: HashMap<String, Box<dyn Playback>>,
}

impl fmt::Debug for SoundRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundRegistry")
            .field("sounds", &self.sounds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SoundRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 播放并登记
    pub fn play(&mut self, backend: &dyn AudioBackend, src: &str, looping: bool) -> FxResult<()> {
        let playback = backend.play(src, looping)?;
        debug!(src, looping, "play sound");
        // 旧实例不调用 stop，只是不再跟踪
        if self.sounds.insert(src.to_string(), playback).is_some() {
            debug!(src, "previous playback no longer tracked");
        }
        Ok(())
    }

    /// 停止并移除，路径未登记时无效果
    pub fn stop(&mut self, src: &str) {
        if let Some(playback) = self.sounds.remove(src) {
            debug!(src, "stop sound");
            playback.stop();
        }
    }

    /// 停止全部
    pub fn stop_all(&mut self) {
        for (src, playback) in self.sounds.drain() {
            debug!(src = %src, "stop sound");
            playback.stop();
        }
    }

    /// 是否正在跟踪某个路径
    pub fn is_playing(&self, src: &str) -> bool {
        self.sounds.contains_key(src)
    }

    /// 跟踪中的数量
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

/// 音频调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// 开始播放
    Play { id: u64, src: String, looping: bool },
    /// 停止播放
    Stop { id: u64, src: String },
}

#[derive(Default)]
struct MemoryAudioState {
    next_id: u64,
    events: Vec<AudioEvent>,
    broken: HashSet<String>,
}

/// 只记录调用的音频后端，用于测试和无头宿主
#[derive(Clone, Default)]
pub struct MemoryAudio {
    state: Rc<RefCell<MemoryAudioState>>,
}

impl fmt::Debug for MemoryAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAudio")
            .field("events", &self.state.borrow().events.len())
            .finish()
    }
}

impl MemoryAudio {
    /// 创建后端
    pub fn new() -> Self {
        Self::default()
    }

    /// 调用记录
    pub fn events(&self) -> Vec<AudioEvent> {
        self.state.borrow().events.clone()
    }

    /// 标记无法播放的源，之后播放它返回 [`FxError::Audio`]
    pub fn mark_broken(&self, src: impl Into<String>) {
        self.state.borrow_mut().broken.insert(src.into());
    }
}

struct MemoryPlayback {
    id: u64,
    src: String,
    state: Rc<RefCell<MemoryAudioState>>,
}

impl Playback for MemoryPlayback {
    fn stop(&self) {
        self.state.borrow_mut().events.push(AudioEvent::Stop {
            id: self.id,
            src: self.src.clone(),
        });
    }
}

impl AudioBackend for MemoryAudio {
    fn play(&self, src: &str, looping: bool) -> FxResult<Box<dyn Playback>> {
        let mut state = self.state.borrow_mut();
        if state.broken.contains(src) {
            return Err(FxError::Audio {
                message: format!("无法解码 '{src}'"),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.events.push(AudioEvent::Play {
            id,
            src: src.to_string(),
            looping,
        });
        Ok(Box::new(MemoryPlayback {
            id,
            src: src.to_string(),
            state: self.state.clone(),
        }))
    }
}
