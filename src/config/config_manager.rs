// ==========================================
// 口服固体制剂排班优化系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)，当前只使用 global scope
// 约定: 缺失键回落默认值；格式错误返回错误（不静默回落）
// ==========================================

use crate::config::weight_profile::WeightProfile;
use crate::db::open_sqlite_connection;
use crate::domain::capacity::MachineSelection;
use crate::domain::params::{ObjectiveWeights, PlanningParams};
use crate::engine::{HorizonSearchConfig, ThroughputSearchConfig};
use crate::solver::SolverConfig;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

const WEIGHT_PROFILE_PREFIX: &str = "weight_profile/";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_schema()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_schema()?;
        Ok(manager)
    }

    fn ensure_schema(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL DEFAULT 'global',
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        debug!(key, value, "配置已更新");
        Ok(())
    }

    /// 删除 global scope 的配置值（恢复默认）
    pub fn remove_global_config_value(&self, key: &str) -> Result<bool, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 读取并解析配置值；缺失回落默认值，格式错误返回错误
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_config_value(key)? {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| format!("配置项 {} 格式错误 (值: {}): {}", key, raw, e).into()),
            None => Ok(default),
        }
    }

    fn get_bool_or_default(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(format!("配置项 {} 不是布尔值 (值: {})", key, raw).into()),
            },
            None => Ok(default),
        }
    }

    // ===== 排班参数 =====

    /// 目标函数权重
    pub fn get_objective_weights(&self) -> Result<ObjectiveWeights, Box<dyn Error>> {
        let defaults = ObjectiveWeights::default();
        let weights = ObjectiveWeights {
            staff: self.get_parsed_or_default(config_keys::WEIGHT_STAFF, defaults.staff)?,
            morning: self.get_parsed_or_default(config_keys::WEIGHT_MORNING, defaults.morning)?,
            evening: self.get_parsed_or_default(config_keys::WEIGHT_EVENING, defaults.evening)?,
            night: self.get_parsed_or_default(config_keys::WEIGHT_NIGHT, defaults.night)?,
            weekend: self.get_parsed_or_default(config_keys::WEIGHT_WEEKEND, defaults.weekend)?,
            days_used: self
                .get_parsed_or_default(config_keys::WEIGHT_DAYS_USED, defaults.days_used)?,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// 人员富余比例（默认 0.15）
    pub fn get_buffer_ratio(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::BUFFER_RATIO, defaults::BUFFER_RATIO)
    }

    /// 默认排产周期（默认 30 天）
    pub fn get_default_workdays(&self) -> Result<u32, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::DEFAULT_WORKDAYS, defaults::WORKDAYS)
    }

    /// 默认总批次（默认 50）
    pub fn get_default_total_batches(&self) -> Result<u32, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::DEFAULT_TOTAL_BATCHES, defaults::TOTAL_BATCHES)
    }

    /// 设备启停开关
    pub fn get_machine_selection(&self) -> Result<MachineSelection, Box<dyn Error>> {
        Ok(MachineSelection {
            p3030: self.get_bool_or_default(config_keys::MACHINE_P3030, true)?,
            p3090i: self.get_bool_or_default(config_keys::MACHINE_P3090I, true)?,
            ima: self.get_bool_or_default(config_keys::MACHINE_IMA, true)?,
            bosch: self.get_bool_or_default(config_keys::MACHINE_BOSCH, true)?,
            glatt: self.get_bool_or_default(config_keys::MACHINE_GLATT, true)?,
        })
    }

    /// 由配置组装默认排班参数
    pub fn get_default_params(&self) -> Result<PlanningParams, Box<dyn Error>> {
        Ok(PlanningParams::new(self.get_default_workdays()?)
            .with_buffer_ratio(self.get_buffer_ratio()?)
            .with_weights(self.get_objective_weights()?)
            .with_machines(self.get_machine_selection()?))
    }

    // ===== 搜索 / 求解配置 =====

    pub fn get_horizon_search_config(&self) -> Result<HorizonSearchConfig, Box<dyn Error>> {
        let defaults = HorizonSearchConfig::default();
        let config = HorizonSearchConfig {
            step_days: self.get_parsed_or_default(config_keys::HORIZON_STEP_DAYS, defaults.step_days)?,
            ceiling_days: self
                .get_parsed_or_default(config_keys::HORIZON_CEILING_DAYS, defaults.ceiling_days)?,
        };
        if config.step_days == 0 {
            return Err(format!("配置项 {} 必须大于 0", config_keys::HORIZON_STEP_DAYS).into());
        }
        Ok(config)
    }

    pub fn get_throughput_search_config(&self) -> Result<ThroughputSearchConfig, Box<dyn Error>> {
        let defaults = ThroughputSearchConfig::default();
        Ok(ThroughputSearchConfig {
            max_iterations: self.get_parsed_or_default(
                config_keys::THROUGHPUT_MAX_ITERATIONS,
                defaults.max_iterations,
            )?,
            max_batches_per_day: defaults.max_batches_per_day,
        })
    }

    pub fn get_solver_config(&self) -> Result<SolverConfig, Box<dyn Error>> {
        let defaults = SolverConfig::default();
        let rounding_tolerance: f64 = self.get_parsed_or_default(
            config_keys::SOLVER_ROUNDING_TOLERANCE,
            defaults.rounding_tolerance,
        )?;
        if !rounding_tolerance.is_finite() || !(0.0..0.5).contains(&rounding_tolerance) {
            return Err(format!(
                "配置项 {} 必须在 [0, 0.5) 内 (值: {})",
                config_keys::SOLVER_ROUNDING_TOLERANCE,
                rounding_tolerance
            )
            .into());
        }
        let time_limit_secs: f64 = self.get_parsed_or_default(
            config_keys::SOLVER_TIME_LIMIT_SECS,
            defaults.time_limit_secs,
        )?;
        let config = SolverConfig {
            rounding_tolerance,
            verify_solution: self
                .get_bool_or_default(config_keys::SOLVER_VERIFY_SOLUTION, defaults.verify_solution)?,
            time_limit_secs,
        };
        if !config.has_valid_time_limit() {
            return Err(format!(
                "配置项 {} 必须为正数 (值: {})",
                config_keys::SOLVER_TIME_LIMIT_SECS,
                time_limit_secs
            )
            .into());
        }
        Ok(config)
    }

    // ===== 权重方案 =====

    /// 读取权重方案（存储于 config_kv: weight_profile/{profile_id}）
    pub fn get_weight_profile(&self, profile_id: &str) -> Result<Option<WeightProfile>, Box<dyn Error>> {
        let id = profile_id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let key = format!("{}{}", WEIGHT_PROFILE_PREFIX, id);
        let raw = match self.get_config_value(&key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let profile: WeightProfile = serde_json::from_str(&raw)?;
        Ok(Some(profile))
    }

    /// 保存权重方案（同 ID 覆盖）
    pub fn save_weight_profile(&self, profile: &WeightProfile) -> Result<(), Box<dyn Error>> {
        profile.validate()?;
        let key = format!("{}{}", WEIGHT_PROFILE_PREFIX, profile.profile_id.trim());
        let raw = serde_json::to_string(profile)?;
        self.set_global_config_value(&key, &raw)
    }

    /// 列出全部权重方案（按 ID 排序）
    pub fn list_weight_profiles(&self) -> Result<Vec<WeightProfile>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key LIKE ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map(params![format!("{}%", WEIGHT_PROFILE_PREFIX)], |row| {
            row.get::<_, String>(0)
        })?;

        let mut profiles = Vec::new();
        for row in rows {
            let raw = row?;
            profiles.push(serde_json::from_str::<WeightProfile>(&raw)?);
        }
        Ok(profiles)
    }

    pub fn delete_weight_profile(&self, profile_id: &str) -> Result<bool, Box<dyn Error>> {
        self.remove_global_config_value(&format!("{}{}", WEIGHT_PROFILE_PREFIX, profile_id.trim()))
    }

    // ===== 快照 =====

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 保存方案时记录当时的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖现有 global 配置；快照中没有的键保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const BUFFER_RATIO: f64 = 0.15;
    pub const WORKDAYS: u32 = 30;
    pub const TOTAL_BATCHES: u32 = 50;
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 目标函数权重
    pub const WEIGHT_STAFF: &str = "weight_staff";
    pub const WEIGHT_MORNING: &str = "weight_morning";
    pub const WEIGHT_EVENING: &str = "weight_evening";
    pub const WEIGHT_NIGHT: &str = "weight_night";
    pub const WEIGHT_WEEKEND: &str = "weight_weekend";
    pub const WEIGHT_DAYS_USED: &str = "weight_days_used";

    // 排班默认值
    pub const BUFFER_RATIO: &str = "buffer_ratio";
    pub const DEFAULT_WORKDAYS: &str = "default_workdays";
    pub const DEFAULT_TOTAL_BATCHES: &str = "default_total_batches";

    // 设备开关 (true/false)
    pub const MACHINE_P3030: &str = "machine_p3030";
    pub const MACHINE_P3090I: &str = "machine_p3090i";
    pub const MACHINE_IMA: &str = "machine_ima";
    pub const MACHINE_BOSCH: &str = "machine_bosch";
    pub const MACHINE_GLATT: &str = "machine_glatt";

    // 搜索
    pub const HORIZON_STEP_DAYS: &str = "horizon_step_days";
    pub const HORIZON_CEILING_DAYS: &str = "horizon_ceiling_days";
    pub const THROUGHPUT_MAX_ITERATIONS: &str = "throughput_max_iterations";

    // 求解器
    pub const SOLVER_ROUNDING_TOLERANCE: &str = "solver_rounding_tolerance";
    pub const SOLVER_VERIFY_SOLUTION: &str = "solver_verify_solution";
    pub const SOLVER_TIME_LIMIT_SECS: &str = "solver_time_limit_secs";
}
