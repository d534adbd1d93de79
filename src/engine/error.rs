// ==========================================
// 口服固体制剂排班优化系统 - 引擎层错误类型
// ==========================================
// 不可行不是程序故障: 一律以类型化结果返回，调用方据此提示用户调整参数
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::{ProcessStep, SolveStatus, StageKind};
use thiserror::Error;

/// 单工序不可行信号
///
/// 三种来源共用同一信号，只有诊断信息不同；不会返回部分结果
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageInfeasibility {
    // ===== 结构性不可行（建模前检出） =====
    #[error("工序 {stage} 工步 {step} 没有可用设备")]
    NoEnabledResource { stage: StageKind, step: ProcessStep },

    // ===== 产能不可行（闭式预检，不调用求解器） =====
    #[error(
        "工序 {stage} 工步 {step} 产能不足: 需求 {batches_required} 批, {num_workdays} 天内日产能上限 {max_daily_output} 批, 至少还需 {additional_days} 天"
    )]
    CapacityShortfall {
        stage: StageKind,
        step: ProcessStep,
        batches_required: u32,
        num_workdays: u32,
        max_daily_output: u32,
        additional_days: u32,
    },

    // ===== 求解器未得到最优解 =====
    #[error("工序 {stage} 求解未得到最优解 (status={status}), 按产能上限估算还需 {additional_days} 天")]
    SolverNonOptimal {
        stage: StageKind,
        status: SolveStatus,
        additional_days: u32,
    },
}

impl StageInfeasibility {
    pub fn stage(&self) -> StageKind {
        match self {
            StageInfeasibility::NoEnabledResource { stage, .. }
            | StageInfeasibility::CapacityShortfall { stage, .. }
            | StageInfeasibility::SolverNonOptimal { stage, .. } => *stage,
        }
    }

    /// 最少还需增加的天数（结构性不可行无此诊断）
    pub fn additional_days(&self) -> Option<u32> {
        match self {
            StageInfeasibility::NoEnabledResource { .. } => None,
            StageInfeasibility::CapacityShortfall {
                additional_days, ..
            }
            | StageInfeasibility::SolverNonOptimal {
                additional_days, ..
            } => Some(*additional_days),
        }
    }

    /// 与排产周期无关的不可行（加天数也无法解决）
    pub fn is_structural(&self) -> bool {
        matches!(self, StageInfeasibility::NoEnabledResource { .. })
    }
}

/// 汇总 / 搜索层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    #[error("参数无效: {0}")]
    InvalidParameter(String),

    #[error("工序 {stage} 不可行: {source}")]
    StageInfeasible {
        stage: StageKind,
        #[source]
        source: StageInfeasibility,
    },

    #[error("总批次 {total_batches} 在 {ceiling_days} 天上限内无可行排班 (最后尝试 {last_workdays} 天)")]
    HorizonExhausted {
        total_batches: u32,
        last_workdays: u32,
        ceiling_days: u32,
    },

    #[error("{num_workdays} 天周期内没有任何可行批次 (迭代 {iterations} 次)")]
    NoFeasibleThroughput { num_workdays: u32, iterations: u32 },

    #[error("未配置工序 {0} 的产能目录")]
    MissingStageCatalog(StageKind),
}

impl From<StageInfeasibility> for PlanningError {
    fn from(source: StageInfeasibility) -> Self {
        PlanningError::StageInfeasible {
            stage: source.stage(),
            source,
        }
    }
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
