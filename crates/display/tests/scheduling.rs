//! Timer-driven rendering through the display surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;
use chrono::{TimeZone, Utc};
use sunclock_core::{exposure, Projection};
use sunclock_display::{
    DisplaySurface, FixedClock, GateObserver, GateOp, MemoryImageSource, SurfaceConfig,
};
use sunclock_parallel::ProcessingMode;

#[derive(Default)]
struct RenderCounter(AtomicUsize);

impl GateObserver for RenderCounter {
    fn entered(&self, op: GateOp) {
        if op == GateOp::Render {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn exited(&self, _op: GateOp) {}
}

fn surface(interval: Duration) -> DisplaySurface {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2020, 11, 14, 21, 34, 0).unwrap());
    let config = SurfaceConfig {
        interval,
        mode: ProcessingMode::ParallelWith(2),
        ..SurfaceConfig::default()
    };
    DisplaySurface::new(MemoryImageSource::new(), clock, config).unwrap()
}

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

#[test]
fn shown_surface_renders_periodically_until_hidden() {
    let s = surface(Duration::from_millis(10));
    s.set_projection(Some(Projection::Equirectangular)).unwrap();
    s.on_resize(64, 32).unwrap();

    assert!(s.is_running());
    assert!(wait_until(|| s.scheduled_passes() >= 3));

    assert!(s.on_hide());
    assert!(!s.on_hide());
    thread::sleep(Duration::from_millis(40));
    let frozen = s.scheduled_passes();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(s.scheduled_passes(), frozen);

    assert!(s.on_show());
    assert!(wait_until(|| s.scheduled_passes() > frozen));
}

#[test]
fn show_renders_immediately() {
    let s = surface(Duration::from_secs(3600));
    let counter = Arc::new(RenderCounter::default());
    s.set_gate_observer(Some(counter.clone()));

    assert!(s.on_show());
    assert!(!s.on_show());
    assert!(wait_until(|| s.scheduled_passes() == 1));
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn resize_restarts_a_stopped_timer() {
    let s = surface(Duration::from_secs(3600));
    assert!(!s.is_running());
    s.on_resize(10, 10).unwrap();
    assert!(s.is_running());
}

#[test]
fn shutdown_stops_the_timer() {
    let s = surface(Duration::from_millis(5));
    s.set_projection(Some(Projection::Cassini)).unwrap();
    s.on_resize(20, 20).unwrap();
    assert!(wait_until(|| s.scheduled_passes() >= 1));

    s.shutdown();
    let after = s.scheduled_passes();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(s.scheduled_passes(), after);
    assert!(!s.on_show());
}

#[test]
fn inspect_uses_the_surface_clock() {
    let instant = Utc.with_ymd_and_hms(2020, 11, 14, 21, 34, 0).unwrap();
    let s = surface(Duration::from_secs(3600));
    s.set_projection(Some(Projection::Equirectangular)).unwrap();
    s.on_resize(360, 180).unwrap();

    let hit = s.inspect(120.0, 60.0).unwrap();
    assert_abs_diff_eq!(hit.geographic.latitude(), 30.0, epsilon = 1e-9);
    assert_abs_diff_eq!(hit.geographic.longitude(), -60.0, epsilon = 1e-9);
    assert_abs_diff_eq!(hit.exposure, exposure(&hit.geographic, &instant), epsilon = 1e-12);
}
