//! # IntervalTimer 集成测试
//!
//! 在暂停的 tokio 时钟下驱动 ViewFx，验证真实定时器与核心逻辑的配合。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::LocalSet;
use view_fx::{
    FxConfig, FxError, HighlightOptions, LocalEventBus, MemoryAudio, Outcome, Repeat,
    SceneGraph, SceneWidget, TimerService, Timing, ViewFx, ViewHost, MODEL_LOAD_FAILED,
};
use view_fx_host::IntervalTimer;

fn view(scene: Rc<SceneGraph>, events: LocalEventBus) -> ViewFx {
    let host = ViewHost {
        scene,
        timer: Rc::new(IntervalTimer::new()),
        events: Rc::new(events),
        audio: Rc::new(MemoryAudio::new()),
    };
    ViewFx::new(host, FxConfig::default())
}

fn counter() -> (Rc<Cell<u32>>, Box<dyn FnMut()>) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, Box::new(move || c.set(c.get() + 1)))
}

#[tokio::test(start_paused = true)]
async fn test_bounded_interval() {
    LocalSet::new()
        .run_until(async {
            let timer = IntervalTimer::new();
            let (count, tick) = counter();

            let handle = timer.schedule(Duration::from_millis(50), Repeat::Times(3), tick);

            tokio::time::sleep(Duration::from_millis(75)).await;
            assert_eq!(count.get(), 1);

            assert_eq!(handle.completion().await, Ok(()));
            assert_eq!(count.get(), 3);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_times() {
    LocalSet::new()
        .run_until(async {
            let timer = IntervalTimer::new();
            let (count, tick) = counter();

            let handle = timer.schedule(Duration::from_millis(50), Repeat::Times(0), tick);
            assert!(handle.completion().is_resolved());

            tokio::time::sleep(Duration::from_millis(500)).await;
            assert_eq!(count.get(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_cancel_forever() {
    LocalSet::new()
        .run_until(async {
            let timer = IntervalTimer::new();
            let (count, tick) = counter();

            let handle = timer.schedule(Duration::from_millis(10), Repeat::Forever, tick);
            tokio::time::sleep(Duration::from_millis(105)).await;
            assert_eq!(count.get(), 10);

            handle.cancel();
            assert_eq!(handle.completion().await, Err(FxError::Cancelled));

            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(count.get(), 10);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_fade_in_with_real_timer() {
    LocalSet::new()
        .run_until(async {
            let scene = Rc::new(SceneGraph::new());
            let cube = scene.add(SceneWidget::new("cube").with("opacity", 0.0));
            let mut fx = view(scene, LocalEventBus::new());

            let handle = fx
                .fade_in("cube", Some(Timing::from_millis(1000, 50)))
                .unwrap();
            handle.completion().await.unwrap();

            let opacity = cube.number("opacity").unwrap();
            assert!((opacity - 1.0).abs() < 1e-9);
            // 1 次初始值 + 20 次 tick
            assert_eq!(cube.write_count("opacity"), 21);
            assert_eq!(fx.tweens().active_count(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_replace_animation_with_real_timer() {
    LocalSet::new()
        .run_until(async {
            let scene = Rc::new(SceneGraph::new());
            let cube = scene.add(SceneWidget::new("cube"));
            let mut fx = view(scene, LocalEventBus::new());

            let first = fx.animate_from_to("cube", "scale", 1.0, 5.0, None).unwrap();
            tokio::time::sleep(Duration::from_millis(120)).await;

            let second = fx
                .animate_from_to("cube", "scale", 2.0, 3.0, Some(Timing::from_millis(100, 50)))
                .unwrap();
            assert_eq!(first.completion().outcome(), Some(Outcome::Cancelled));

            second.completion().await.unwrap();
            assert!((cube.number("scale").unwrap() - 3.0).abs() < 1e-9);

            // 第一个动画不再写入
            let writes = cube.write_count("scale");
            tokio::time::sleep(Duration::from_millis(2000)).await;
            assert_eq!(cube.write_count("scale"), writes);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_highlight_with_real_timer() {
    LocalSet::new()
        .run_until(async {
            let scene = Rc::new(SceneGraph::new());
            let cube = scene.add(SceneWidget::new("cube"));
            let fx = view(scene, LocalEventBus::new());

            let completion = fx
                .highlight("cube", Some(HighlightOptions::new(1, 240.0, Duration::from_millis(20))))
                .unwrap();
            completion.await.unwrap();

            // 21 次着色 + 1 次清空
            assert_eq!(cube.write_count("color"), 22);
            assert_eq!(cube.text("color").as_deref(), Some(""));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_set_model_rejects() {
    LocalSet::new()
        .run_until(async {
            let scene = Rc::new(SceneGraph::new());
            scene.add(SceneWidget::new("engine"));
            let events = LocalEventBus::new();
            let fx = view(scene, events.clone());

            let completion = fx.set_model("engine", "engine.pvz").unwrap();

            let bus = events.clone();
            tokio::task::spawn_local(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                bus.emit(MODEL_LOAD_FAILED);
            });

            let err = completion.await.unwrap_err();
            assert_eq!(
                err,
                FxError::ModelLoadFailed {
                    src: "app/resources/Uploaded/engine.pvz".to_string()
                }
            );
        })
        .await;
}

#[test]
fn test_block_on_local() {
    let count = view_fx_host::block_on_local(async {
        let timer = IntervalTimer::new();
        let (count, tick) = counter();
        let handle = timer.schedule(Duration::from_millis(1), Repeat::Times(2), tick);
        handle.completion().await.unwrap();
        count.get()
    })
    .unwrap();
    assert_eq!(count, 2);
}
