//! # Logging 模块
//!
//! tracing-subscriber 初始化。

use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 订阅者
///
/// 过滤规则优先取 `RUST_LOG`，否则使用 `default_filter`（如 `"info"`、
/// `"view_fx=debug"`）。重复调用时返回 `false`，不会 panic。
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        // 同一进程中其它测试可能已经安装过订阅者，只要求第二次一定失败
        let _ = init("debug");
        assert!(!init("debug"));
    }
}
