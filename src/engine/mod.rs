// ==========================================
// 口服固体制剂排班优化系统 - 引擎层
// ==========================================
// 职责: 单工序建模求解、四工序汇总、周期搜索、最大产能搜索
// 红线: 引擎不访问数据库；不可行以类型化错误返回，不 panic
// ==========================================

pub mod aggregator;
pub mod error;
pub mod horizon_search;
pub mod stage_model;
pub mod throughput_search;

// 重导出核心引擎
pub use aggregator::StageAggregator;
pub use error::{PlanningError, PlanningResult, StageInfeasibility};
pub use horizon_search::{completion_days, HorizonSearch, HorizonSearchConfig};
pub use stage_model::{DayLinking, StageMilp, StageScheduleModel};
pub use throughput_search::{is_monotonic, ThroughputSearch, ThroughputSearchConfig};
