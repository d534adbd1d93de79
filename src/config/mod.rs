// ==========================================
// 口服固体制剂排班优化系统 - 配置层
// ==========================================
// 职责: 排班默认参数、搜索/求解配置、权重方案
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod weight_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use weight_profile::WeightProfile;
