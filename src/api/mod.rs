// ==========================================
// 口服固体制剂排班优化系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod error;
pub mod export;
pub mod planning_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use export::{
    combined_to_csv_string, comparison_to_csv_string, write_combined_csv, write_comparison_csv,
};
pub use planning_api::{
    PlanningApi, PlanningOutcome, PlanningOverrides, PlanningRequest, ScenarioComparisonRow,
    ScenarioParameters,
};
