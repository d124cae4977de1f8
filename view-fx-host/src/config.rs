//! # Config 模块
//!
//! 配置文件读写。
//!
//! ## 配置优先级
//!
//! 1. 调用方显式传入的参数（最高）
//! 2. 配置文件 (view-fx.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use view_fx::{FxConfig, FxError};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "view-fx.json";

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    /// IO 错误
    #[error("配置文件 {path:?} 读写失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析或验证失败
    #[error("配置文件 {path:?} 无效: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: FxError,
    },
}

/// 读取并验证配置文件
pub fn try_load(path: impl AsRef<Path>) -> Result<FxConfig, ConfigLoadError> {
    let path = path.as_ref();
    let invalid = |source| ConfigLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FxConfig::from_json(&content).map_err(invalid)?;
    config.validate().map_err(invalid)?;
    Ok(config)
}

/// 加载配置文件
///
/// 如果文件不存在、解析失败或验证失败，返回默认配置并记录警告。
pub fn load(path: impl AsRef<Path>) -> FxConfig {
    let path = path.as_ref();

    if !path.exists() {
        warn!(path = %path.display(), "配置文件不存在，使用默认配置");
        return FxConfig::default();
    }

    match try_load(path) {
        Ok(config) => {
            info!(path = %path.display(), "配置文件加载成功");
            config
        }
        Err(e) => {
            warn!(error = %e, "配置文件无效，使用默认配置");
            FxConfig::default()
        }
    }
}

/// 保存配置到文件
pub fn save(config: &FxConfig, path: impl AsRef<Path>) -> Result<(), ConfigLoadError> {
    let path = path.as_ref();
    let json = config.to_json().map_err(|source| ConfigLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
