// ==========================================
// 口服固体制剂排班优化系统 - 领域模型层
// ==========================================
// 职责: 产能目录、排产周期、排班参数、排班结果、保存的方案
// 红线: 不含求解逻辑，不含数据访问逻辑
// ==========================================

pub mod calendar;
pub mod capacity;
pub mod params;
pub mod scenario;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use calendar::PlanningHorizon;
pub use capacity::{CapacityCatalog, MachineSelection, ResourceSpec, ShiftCapacity, StageCatalog};
pub use params::{apply_buffer, ObjectiveWeights, PlanningParams, StageDemand};
pub use scenario::{PlanningScenario, ScenarioSummary};
pub use schedule::{
    CombinedResult, DayAssignment, HorizonPlan, ResourceUsage, ShiftCounts, StageResult,
    StepOutput, ThroughputPlan, ThroughputProbe,
};
pub use types::{Machine, PlanningMode, ProcessStep, Shift, SolveStatus, StageKind};
