use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use std::time::{Duration, Instant};

static SLOW_SOLVE_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static CONFIGURE: Once = Once::new();

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SOLVE_COUNT: Cell<u64> = Cell::new(0);
    static SLOW_SOLVE_COUNT: Cell<u64> = Cell::new(0);
}

/// 读取慢求解阈值（毫秒）
///
/// 开关：
/// - `OSD_PLANNER_SLOW_SOLVE_MS=500` 配置慢求解阈值
/// - 未配置时 Debug 默认 1000ms，Release 默认 3000ms
fn slow_solve_threshold_ms() -> u64 {
    CONFIGURE.call_once(|| {
        let ms = std::env::var("OSD_PLANNER_SLOW_SOLVE_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 1_000 } else { 3_000 });
        SLOW_SOLVE_THRESHOLD_MS.store(ms, Ordering::Relaxed);
    });
    SLOW_SOLVE_THRESHOLD_MS.load(Ordering::Relaxed)
}

/// 记录一次求解器调用（由求解器后端调用）
pub fn record_solve(model_name: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = slow_solve_threshold_ms();
    let active = PERF_DEPTH.with(|d| d.get() > 0);

    if active {
        SOLVE_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }

    if threshold > 0 && ms >= threshold {
        tracing::warn!(
            target: "slow_solve",
            duration_ms = ms,
            model = %model_name,
            "slow solve"
        );
        if active {
            SLOW_SOLVE_COUNT.with(|c| c.set(c.get().saturating_add(1)));
        }
    }
}

/// 性能统计 Guard：记录 elapsed_ms + 求解次数 + 慢求解次数
///
/// 使用方式：
/// ```ignore
/// let _perf = osd_shift_planner::perf::PerfGuard::new("horizon_search");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    solve_start: u64,
    slow_solve_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let solve_start = SOLVE_COUNT.with(|c| c.get());
        let slow_solve_start = SLOW_SOLVE_COUNT.with(|c| c.get());
        Self {
            op,
            start: Instant::now(),
            solve_start,
            slow_solve_start,
        }
    }

    /// 本 Guard 生命周期内的求解次数
    pub fn solve_count(&self) -> u64 {
        SOLVE_COUNT
            .with(|c| c.get())
            .saturating_sub(self.solve_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let solve_count = self.solve_count();
        let slow_solve_count = SLOW_SOLVE_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_solve_start);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            solve_count,
            slow_solve_count,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_counts_only_inside_scope() {
        record_solve("outside", Duration::from_millis(1));

        let guard = PerfGuard::new("test");
        record_solve("inside_1", Duration::from_millis(1));
        record_solve("inside_2", Duration::from_millis(1));
        assert_eq!(guard.solve_count(), 2);
    }
}
