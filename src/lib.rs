// ==========================================
// 口服固体制剂排班优化系统 - 核心库
// ==========================================
// 产线: 称量 → 制粒 → 压片 → 包衣（四工序独立排班，人数相加）
// 技术栈: Rust + good_lp(HiGHS) + SQLite
// 系统定位: 决策支持系统 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 产能目录、参数与结果
pub mod domain;

// 求解器边界 - 整数规划模型与求解后端
pub mod solver;

// 引擎层 - 单工序模型、汇总、搜索
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据仓储层 - 方案存档
pub mod repository;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（求解次数/慢求解）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Machine, PlanningMode, ProcessStep, Shift, SolveStatus, StageKind};

// 领域实体
pub use domain::{
    CapacityCatalog, CombinedResult, HorizonPlan, MachineSelection, ObjectiveWeights,
    PlanningParams, PlanningScenario, StageDemand, StageResult, ThroughputPlan,
};

// 引擎
pub use engine::{
    HorizonSearch, PlanningError, StageAggregator, StageInfeasibility, StageScheduleModel,
    ThroughputSearch,
};

// 求解器
pub use solver::{GoodLpSolver, MipSolver, SolverConfig};

// API
pub use api::{ApiError, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "口服固体制剂排班优化系统";
