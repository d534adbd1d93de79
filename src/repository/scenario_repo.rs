// ==========================================
// 口服固体制剂排班优化系统 - 排班方案仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: planning_scenario（参数/结果以 JSON 原样保存，摘要单独成列便于对比）
// ==========================================

use crate::domain::scenario::{PlanningScenario, ScenarioSummary};
use crate::domain::types::PlanningMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SELECT_COLUMNS: &str = r#"
    SELECT scenario_id, mode, label, created_at,
           parameters_json, result_json,
           staff_required, staff_with_buffer, days_used, batches_produced
    FROM planning_scenario
"#;

/// 与 SELECT_COLUMNS 顺序一致，用于把列序号还原为字段名
const COLUMN_NAMES: [&str; 10] = [
    "scenario_id",
    "mode",
    "label",
    "created_at",
    "parameters_json",
    "result_json",
    "staff_required",
    "staff_with_buffer",
    "days_used",
    "batches_produced",
];

// ==========================================
// ScenarioRepository - 排班方案仓储
// ==========================================
pub struct ScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScenarioRepository {
    /// 创建仓储实例（建表失败时记录告警，使用时再暴露错误）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("planning_scenario ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table_and_indexes(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS planning_scenario (
              scenario_id TEXT PRIMARY KEY,
              mode TEXT NOT NULL CHECK(mode IN ('INDIVIDUAL', 'UNIFORM', 'MAXIMUM')),
              label TEXT,
              created_at TEXT NOT NULL,

              parameters_json TEXT NOT NULL,
              result_json TEXT NOT NULL,

              staff_required INTEGER NOT NULL DEFAULT 0,
              staff_with_buffer INTEGER NOT NULL DEFAULT 0,
              days_used INTEGER NOT NULL DEFAULT 0,
              batches_produced INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_planning_scenario_created_at ON planning_scenario(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_planning_scenario_mode ON planning_scenario(mode);
            "#,
        )?;
        Ok(())
    }

    pub fn insert(&self, scenario: &PlanningScenario) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO planning_scenario (
              scenario_id, mode, label, created_at,
              parameters_json, result_json,
              staff_required, staff_with_buffer, days_used, batches_produced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                scenario.scenario_id,
                scenario.mode.as_str(),
                scenario.label,
                scenario.created_at.format(TIMESTAMP_WRITE_FORMAT).to_string(),
                scenario.parameters_json,
                scenario.result_json,
                scenario.summary.staff_required,
                scenario.summary.staff_with_buffer,
                scenario.summary.days_used,
                scenario.summary.batches_produced,
            ],
        )?;

        Ok(())
    }

    /// 按 ID 查询
    ///
    /// # 返回
    /// - Ok(Some(PlanningScenario)): 找到方案
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_id(&self, scenario_id: &str) -> RepositoryResult<Option<PlanningScenario>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE scenario_id = ?1", SELECT_COLUMNS))?;

        match stmt.query_row(params![scenario_id], |row| map_row(row)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(map_read_error(e)),
        }
    }

    /// 按 ID 查询，不存在时返回 NotFound
    pub fn get_by_id(&self, scenario_id: &str) -> RepositoryResult<PlanningScenario> {
        self.find_by_id(scenario_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "PlanningScenario".to_string(),
                id: scenario_id.to_string(),
            })
    }

    /// 查询全部方案（最新在前）
    pub fn list_all(&self) -> RepositoryResult<Vec<PlanningScenario>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], |row| map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(map_read_error)?;
        Ok(rows)
    }

    /// 按模式查询（最新在前）
    pub fn list_by_mode(&self, mode: PlanningMode) -> RepositoryResult<Vec<PlanningScenario>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE mode = ?1 ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![mode.as_str()], |row| map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()
            .map_err(map_read_error)?;
        Ok(rows)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM planning_scenario", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    /// 删除方案，返回删除行数
    pub fn delete(&self, scenario_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM planning_scenario WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        Ok(rows)
    }

    /// 清空全部方案，返回删除行数
    pub fn clear_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM planning_scenario", [])?;
        Ok(rows)
    }
}

/// 列值无法还原为领域类型时报字段错误，其余按数据库错误处理
fn map_read_error(err: rusqlite::Error) -> RepositoryError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(idx, _, source) => {
            RepositoryError::FieldValueError {
                field: COLUMN_NAMES.get(idx).copied().unwrap_or("unknown").to_string(),
                message: source.to_string(),
            }
        }
        other => other.into(),
    }
}

fn map_row(row: &Row) -> SqliteResult<PlanningScenario> {
    let scenario_id: String = row.get(0)?;
    let mode_str: String = row.get(1)?;
    let label: Option<String> = row.get(2)?;
    let created_at_str: String = row.get(3)?;
    let parameters_json: String = row.get(4)?;
    let result_json: String = row.get(5)?;

    let mode = PlanningMode::parse(&mode_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("未知的排班模式: {}", mode_str).into(),
        )
    })?;
    let created_at =
        NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_READ_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(PlanningScenario {
        scenario_id,
        mode,
        label,
        created_at,
        parameters_json,
        result_json,
        summary: ScenarioSummary {
            staff_required: row.get(6)?,
            staff_with_buffer: row.get(7)?,
            days_used: row.get(8)?,
            batches_produced: row.get(9)?,
        },
    })
}
