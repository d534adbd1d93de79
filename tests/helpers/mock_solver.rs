// ==========================================
// 求解器替身 - 用于集成测试
// ==========================================
// CountingSolver: 包装真实求解器并计数
// RefusingSolver: 一律返回 Not Solved 并计数（断言“未调用求解器”）
// ZeroSolver: 声称 Optimal 但所有变量取 0（触发结果复核）
// ==========================================

use osd_shift_planner::domain::SolveStatus;
use osd_shift_planner::solver::{GoodLpSolver, MipModel, MipSolution, MipSolver, SolverConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 计数包装器
pub struct CountingSolver {
    inner: GoodLpSolver,
    calls: AtomicUsize,
    models: Mutex<Vec<String>>,
}

impl CountingSolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: GoodLpSolver::new(),
            calls: AtomicUsize::new(0),
            models: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 按调用顺序记录的模型名
    pub fn model_names(&self) -> Vec<String> {
        self.models.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl MipSolver for CountingSolver {
    fn name(&self) -> &str {
        "counting"
    }

    fn solve(&self, model: &MipModel, config: &SolverConfig) -> MipSolution {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut models) = self.models.lock() {
            models.push(model.name().to_string());
        }
        self.inner.solve(model, config)
    }
}

/// 拒绝求解
#[derive(Default)]
pub struct RefusingSolver {
    calls: AtomicUsize,
}

impl RefusingSolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MipSolver for RefusingSolver {
    fn name(&self) -> &str {
        "refusing"
    }

    fn solve(&self, _model: &MipModel, _config: &SolverConfig) -> MipSolution {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MipSolution::not_optimal(SolveStatus::NotSolved)
    }
}

/// 声称最优但返回全 0
#[derive(Default)]
pub struct ZeroSolver;

impl MipSolver for ZeroSolver {
    fn name(&self) -> &str {
        "zero"
    }

    fn solve(&self, model: &MipModel, _config: &SolverConfig) -> MipSolution {
        MipSolution::optimal(vec![0.0; model.variables().len()], 0.0)
    }
}
