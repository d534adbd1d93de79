// ==========================================
// 口服固体制剂排班优化系统 - 排产周期搜索
// ==========================================
// 给定总批次（四工序相同），从初始周期开始按 7 天步长递增，
// 返回首个可行周期的汇总结果
// ==========================================
// 停止条件: 可行，或当前周期 > 上限(365)
// 跳步: 产能不足时，闭式下界已证明不可行的周期不再求解（仍落在 7 天网格上）
// 结构性不可行与周期无关，立即返回
// ==========================================

use crate::domain::params::{PlanningParams, StageDemand};
use crate::domain::schedule::{CombinedResult, HorizonPlan};
use crate::domain::types::StageKind;
use crate::engine::aggregator::StageAggregator;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::perf::PerfGuard;
use crate::solver::MipSolver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonSearchConfig {
    /// 每次递增的天数
    pub step_days: u32,
    /// 周期上限（超过后停止递增）
    pub ceiling_days: u32,
}

impl Default for HorizonSearchConfig {
    fn default() -> Self {
        Self {
            step_days: 7,
            ceiling_days: 365,
        }
    }
}

// ==========================================
// HorizonSearch - 周期搜索
// ==========================================
pub struct HorizonSearch<S>
where
    S: MipSolver + ?Sized,
{
    aggregator: StageAggregator<S>,
    config: HorizonSearchConfig,
}

impl<S> HorizonSearch<S>
where
    S: MipSolver + ?Sized,
{
    pub fn new(aggregator: StageAggregator<S>) -> Self {
        Self {
            aggregator,
            config: HorizonSearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HorizonSearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HorizonSearchConfig {
        &self.config
    }

    /// 搜索首个可行周期
    ///
    /// # 参数
    /// - total_batches: 总批次（同时作为四个工序的需求）
    /// - params: 共享参数，num_workdays 为初始周期
    ///
    /// # 返回
    /// - Ok(HorizonPlan): 首个可行周期的汇总结果 + 完工天数估算
    /// - Err(HorizonExhausted): 超过上限仍不可行
    /// - Err(StageInfeasible): 结构性不可行（与周期无关）
    pub fn search(&self, total_batches: u32, params: &PlanningParams) -> PlanningResult<HorizonPlan> {
        let _perf = PerfGuard::new("horizon_search");
        if self.config.step_days == 0 {
            return Err(PlanningError::InvalidParameter(
                "周期搜索步长必须大于 0".to_string(),
            ));
        }
        params.validate().map_err(PlanningError::InvalidParameter)?;

        let demand = StageDemand::uniform(total_batches);
        let mut current_days = params.num_workdays;
        // 闭式产能下界: 小于该值的周期不可能可行
        let mut lower_bound_days = 0u32;
        let mut attempted_workdays: Vec<u32> = Vec::new();

        info!(
            total_batches,
            initial_workdays = current_days,
            ceiling_days = self.config.ceiling_days,
            "开始周期搜索"
        );

        loop {
            if current_days >= lower_bound_days {
                attempted_workdays.push(current_days);
                match self
                    .aggregator
                    .aggregate(&demand, &params.with_workdays(current_days))
                {
                    Ok(combined) => {
                        let total_days_needed = completion_days(&combined);
                        info!(
                            workdays_allocated = current_days,
                            total_days_needed,
                            attempts = attempted_workdays.len(),
                            "周期搜索完成"
                        );
                        return Ok(HorizonPlan {
                            total_batches,
                            combined,
                            workdays_allocated: current_days,
                            total_days_needed,
                            attempted_workdays,
                        });
                    }
                    Err(PlanningError::StageInfeasible { stage, source }) => {
                        if source.is_structural() {
                            warn!(stage = %stage, reason = %source, "结构性不可行，停止周期搜索");
                            return Err(PlanningError::StageInfeasible { stage, source });
                        }
                        if let Some(additional) = source.additional_days() {
                            lower_bound_days =
                                lower_bound_days.max(current_days.saturating_add(additional));
                        }
                        debug!(
                            workdays = current_days,
                            stage = %stage,
                            lower_bound_days,
                            "周期不可行，继续递增"
                        );
                    }
                    Err(other) => return Err(other),
                }
            } else {
                debug!(workdays = current_days, lower_bound_days, "产能下界未达到，跳过求解");
            }

            if current_days > self.config.ceiling_days {
                break;
            }
            current_days = current_days.saturating_add(self.config.step_days);
        }

        let last_workdays = current_days;
        warn!(
            total_batches,
            last_workdays,
            ceiling_days = self.config.ceiling_days,
            "周期上限内无可行排班"
        );
        Err(PlanningError::HorizonExhausted {
            total_batches,
            last_workdays,
            ceiling_days: self.config.ceiling_days,
        })
    }
}

/// 考虑工序先后的完工天数估算
///
/// 下游工序在上游产出第一批后即可开工，每道工序固定错后 1 天:
/// 工序 k 不早于 days_used(称量) + k 完工，整体取最大值，即 days_used(称量) + 3。
/// 这是近似值，不是批次级关键路径；各工序自身的占用天数不参与计算。
pub fn completion_days(combined: &CombinedResult) -> u32 {
    let dispensing_days = combined.dispensing.days_used;
    StageKind::ALL
        .iter()
        .map(|stage| dispensing_days + stage.index())
        .max()
        .unwrap_or(dispensing_days)
}
