// ==========================================
// 口服固体制剂排班优化系统 - 最大产能搜索
// ==========================================
// 固定周期，在 [1, 周期 × 27] 上二分搜索四工序均可行的最大批次
// 27 = 单工序每天理论批次上界
// 迭代次数有上限（默认 50），即使可行性不单调也保证终止
// ==========================================
// 前提: 周期固定时可行性对批次单调（B 可行 ⇒ 所有 B' < B 可行）
// 探测记录按顺序保存，可据此复核单调性
// ==========================================

use crate::domain::params::{PlanningParams, StageDemand};
use crate::domain::schedule::{CombinedResult, ThroughputPlan, ThroughputProbe};
use crate::engine::aggregator::StageAggregator;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::perf::PerfGuard;
use crate::solver::MipSolver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputSearchConfig {
    pub max_iterations: u32,
    /// 单工序每天理论批次上界（决定搜索上界）
    pub max_batches_per_day: u32,
}

impl Default for ThroughputSearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            max_batches_per_day: 27,
        }
    }
}

// ==========================================
// ThroughputSearch - 最大产能搜索
// ==========================================
pub struct ThroughputSearch<S>
where
    S: MipSolver + ?Sized,
{
    aggregator: StageAggregator<S>,
    config: ThroughputSearchConfig,
}

impl<S> ThroughputSearch<S>
where
    S: MipSolver + ?Sized,
{
    pub fn new(aggregator: StageAggregator<S>) -> Self {
        Self {
            aggregator,
            config: ThroughputSearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ThroughputSearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ThroughputSearchConfig {
        &self.config
    }

    /// 搜索固定周期下的最大可行批次
    ///
    /// # 返回
    /// - Ok(ThroughputPlan): 最大可行批次 + 对应汇总结果 + 探测记录
    /// - Err(NoFeasibleThroughput): 没有任何探测可行
    /// - Err(StageInfeasible): 结构性不可行（与批次无关）
    pub fn search(&self, params: &PlanningParams) -> PlanningResult<ThroughputPlan> {
        let _perf = PerfGuard::new("throughput_search");
        params.validate().map_err(PlanningError::InvalidParameter)?;

        let num_workdays = params.num_workdays;
        let mut lower = 1u32;
        let mut upper = num_workdays.saturating_mul(self.config.max_batches_per_day);
        let mut iterations = 0u32;
        let mut probes: Vec<ThroughputProbe> = Vec::new();
        let mut best: Option<(u32, CombinedResult)> = None;

        info!(num_workdays, upper, "开始最大产能搜索");

        while lower <= upper && iterations < self.config.max_iterations {
            iterations += 1;
            let batches = lower + (upper - lower) / 2;

            match self
                .aggregator
                .aggregate(&StageDemand::uniform(batches), params)
            {
                Ok(combined) => {
                    debug!(batches, iteration = iterations, "可行");
                    probes.push(ThroughputProbe {
                        batches,
                        feasible: true,
                    });
                    best = Some((batches, combined));
                    lower = batches + 1;
                }
                Err(PlanningError::StageInfeasible { stage, source }) => {
                    if source.is_structural() {
                        warn!(stage = %stage, reason = %source, "结构性不可行，停止最大产能搜索");
                        return Err(PlanningError::StageInfeasible { stage, source });
                    }
                    debug!(batches, iteration = iterations, stage = %stage, "不可行");
                    probes.push(ThroughputProbe {
                        batches,
                        feasible: false,
                    });
                    upper = batches - 1;
                }
                Err(other) => return Err(other),
            }
        }

        if !is_monotonic(&probes) {
            warn!(num_workdays, "探测结果不满足单调性，最大批次可能偏小");
        }

        match best {
            Some((max_feasible_batches, combined)) => {
                info!(
                    num_workdays,
                    max_feasible_batches,
                    iterations,
                    "最大产能搜索完成"
                );
                Ok(ThroughputPlan {
                    num_workdays,
                    max_feasible_batches,
                    combined,
                    iterations,
                    probes,
                })
            }
            None => Err(PlanningError::NoFeasibleThroughput {
                num_workdays,
                iterations,
            }),
        }
    }
}

/// 探测记录是否与单调性一致: 任一可行批次都小于所有不可行批次
pub fn is_monotonic(probes: &[ThroughputProbe]) -> bool {
    let max_feasible = probes.iter().filter(|p| p.feasible).map(|p| p.batches).max();
    let min_infeasible = probes.iter().filter(|p| !p.feasible).map(|p| p.batches).min();
    match (max_feasible, min_infeasible) {
        (Some(f), Some(i)) => f < i,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(batches: u32, feasible: bool) -> ThroughputProbe {
        ThroughputProbe { batches, feasible }
    }

    #[test]
    fn test_monotonic_probe_log() {
        let probes = vec![probe(14, false), probe(7, true), probe(10, false), probe(9, true)];
        assert!(is_monotonic(&probes));
    }

    #[test]
    fn test_non_monotonic_probe_log() {
        let probes = vec![probe(10, false), probe(12, true)];
        assert!(!is_monotonic(&probes));
        assert!(is_monotonic(&[]));
    }

    #[test]
    fn test_default_config() {
        let config = ThroughputSearchConfig::default();
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.max_batches_per_day, 27);
    }
}
