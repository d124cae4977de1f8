//! # view-fx-host
//!
//! view-fx 的 tokio 宿主适配。
//!
//! - [`IntervalTimer`]：`tokio::time` 驱动的定时服务
//! - [`logging`]：tracing-subscriber 初始化
//! - [`config`]：配置文件读写
//! - [`block_on_local`]：在 current_thread 运行时 + `LocalSet` 中驱动视图
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! view_fx_host::logging::init("info");
//! let config = view_fx_host::config::load("view-fx.json");
//!
//! view_fx_host::block_on_local(async move {
//!     let host = ViewHost {
//!         scene,
//!         timer: Rc::new(IntervalTimer::new()),
//!         events,
//!         audio,
//!     };
//!     let mut fx = ViewFx::new(host, config);
//!     fx.fade_in("logo", None)?.completion().await
//! })??;
//! ```

pub mod config;
pub mod interval;
pub mod logging;

use std::future::Future;

pub use interval::IntervalTimer;

/// 在 current_thread 运行时的 `LocalSet` 中运行 `future`
///
/// view-fx 的能力接口基于 `Rc`，定时任务用 `spawn_local` 调度。
pub fn block_on_local<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = tokio::task::LocalSet::new();
    Ok(local.block_on(&runtime, future))
}
