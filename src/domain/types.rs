// ==========================================
// 口服固体制剂排班优化系统 - 领域类型定义
// ==========================================
// 工序: 称量(Dispensing) → 制粒(Granulation) → 压片(Tableting) → 包衣(Coating)
// 班次: 早班 / 中班 / 夜班，每台设备每天每班次最多开动一次
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工序 (Stage)
// ==========================================
// 顺序即流水线顺序，index() 用于完工天数估算的下游偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    Dispensing,  // 称量
    Granulation, // 制粒
    Tableting,   // 压片
    Coating,     // 包衣
}

impl StageKind {
    /// 流水线顺序
    pub const ALL: [StageKind; 4] = [
        StageKind::Dispensing,
        StageKind::Granulation,
        StageKind::Tableting,
        StageKind::Coating,
    ];

    /// 在流水线中的位置（称量=0）
    pub fn index(&self) -> u32 {
        match self {
            StageKind::Dispensing => 0,
            StageKind::Granulation => 1,
            StageKind::Tableting => 2,
            StageKind::Coating => 3,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Dispensing => write!(f, "DISPENSING"),
            StageKind::Granulation => write!(f, "GRANULATION"),
            StageKind::Tableting => write!(f, "TABLETING"),
            StageKind::Coating => write!(f, "COATING"),
        }
    }
}

// ==========================================
// 班次 (Shift)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shift {
    Morning, // 早班
    Evening, // 中班
    Night,   // 夜班
}

impl Shift {
    pub const ALL: [Shift; 3] = [Shift::Morning, Shift::Evening, Shift::Night];

    /// 每天班次数
    pub const PER_DAY: u32 = 3;
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::Morning => write!(f, "MORNING"),
            Shift::Evening => write!(f, "EVENING"),
            Shift::Night => write!(f, "NIGHT"),
        }
    }
}

// ==========================================
// 工步 (Process Step)
// ==========================================
// 需求约束按工步建立：包衣工序同时要求配液批次与包衣批次均满足需求
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStep {
    Dispensing,
    Granulation,
    Tableting,
    SolutionPreparation, // 包衣配液
    Coating,
}

impl fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStep::Dispensing => write!(f, "DISPENSING"),
            ProcessStep::Granulation => write!(f, "GRANULATION"),
            ProcessStep::Tableting => write!(f, "TABLETING"),
            ProcessStep::SolutionPreparation => write!(f, "SOLUTION_PREPARATION"),
            ProcessStep::Coating => write!(f, "COATING"),
        }
    }
}

// ==========================================
// 设备 / 子工序 (Machine)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Machine {
    DispensingRoom,   // 称量间（整条线视为一个资源）
    GranulationSuite, // 制粒线（粉碎 + 整粒 + 总混并行）
    P3030,
    P3090i,
    Ima,
    SolutionPrep, // 配液
    Bosch,
    Glatt,
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::DispensingRoom => write!(f, "DISPENSING_ROOM"),
            Machine::GranulationSuite => write!(f, "GRANULATION_SUITE"),
            Machine::P3030 => write!(f, "P3030"),
            Machine::P3090i => write!(f, "P3090I"),
            Machine::Ima => write!(f, "IMA"),
            Machine::SolutionPrep => write!(f, "SOLUTION"),
            Machine::Bosch => write!(f, "BOSCH"),
            Machine::Glatt => write!(f, "GLATT"),
        }
    }
}

// ==========================================
// 求解状态 (Solve Status)
// ==========================================
// 非 Optimal 一律视为不可行，不区分原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Unbounded => write!(f, "Unbounded"),
            SolveStatus::NotSolved => write!(f, "Not Solved"),
        }
    }
}

// ==========================================
// 排班模式 (Planning Mode)
// ==========================================
// 对应三种使用方式：分工序需求 / 统一总批次 / 最大产能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningMode {
    Individual,
    Uniform,
    Maximum,
}

impl PlanningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanningMode::Individual => "INDIVIDUAL",
            PlanningMode::Uniform => "UNIFORM",
            PlanningMode::Maximum => "MAXIMUM",
        }
    }

    pub fn parse(s: &str) -> Option<PlanningMode> {
        match s.trim().to_uppercase().as_str() {
            "INDIVIDUAL" => Some(PlanningMode::Individual),
            "UNIFORM" => Some(PlanningMode::Uniform),
            "MAXIMUM" => Some(PlanningMode::Maximum),
            _ => None,
        }
    }
}

impl fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_index_follows_pipeline_order() {
        let indices: Vec<u32> = StageKind::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_planning_mode_parse() {
        assert_eq!(PlanningMode::parse(" uniform "), Some(PlanningMode::Uniform));
        assert_eq!(PlanningMode::parse("MAXIMUM"), Some(PlanningMode::Maximum));
        assert_eq!(PlanningMode::parse("weekly"), None);
    }

    #[test]
    fn test_stage_serde_matches_display() {
        let json = serde_json::to_string(&StageKind::Granulation).unwrap();
        assert_eq!(json, "\"GRANULATION\"");
        assert_eq!(StageKind::Granulation.to_string(), "GRANULATION");
    }
}
