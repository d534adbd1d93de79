// ==========================================
// 口服固体制剂排班优化系统 - 排班方案（保存/对比）
// ==========================================
// 方案 = 一次排班的参数 + 结果副本 + 摘要，按不透明 ID 检索
// ==========================================

use crate::domain::schedule::CombinedResult;
use crate::domain::types::PlanningMode;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 方案摘要（对比视图使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// 四工序最少人数之和
    pub staff_required: u32,
    /// 四工序含富余人数之和
    pub staff_with_buffer: u32,
    /// 各工序占用天数的最大值
    pub days_used: u32,
    /// 四工序成品批次之和
    pub batches_produced: u32,
}

impl ScenarioSummary {
    pub fn from_combined(combined: &CombinedResult) -> Self {
        Self {
            staff_required: combined.total_min_headcount,
            staff_with_buffer: combined.total_headcount_with_buffer,
            days_used: combined.max_days_used(),
            batches_produced: combined.total_batches_produced(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningScenario {
    pub scenario_id: String,
    pub mode: PlanningMode,
    pub label: Option<String>,
    pub created_at: NaiveDateTime,
    pub parameters_json: String,
    pub result_json: String,
    pub summary: ScenarioSummary,
}

impl PlanningScenario {
    /// 新建方案（生成 UUID v4 与当前本地时间）
    pub fn new<P, R>(
        mode: PlanningMode,
        parameters: &P,
        result: &R,
        summary: ScenarioSummary,
    ) -> serde_json::Result<Self>
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        Ok(Self {
            scenario_id: Uuid::new_v4().to_string(),
            mode,
            label: None,
            created_at: now_millis(),
            parameters_json: serde_json::to_string(parameters)?,
            result_json: serde_json::to_string(result)?,
            summary,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = if label.trim().is_empty() {
            None
        } else {
            Some(label)
        };
        self
    }

    pub fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.parameters_json)
    }

    pub fn result(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.result_json)
    }
}

/// 当前本地时间（截断到毫秒，与存储精度一致）
fn now_millis() -> NaiveDateTime {
    let now = Local::now().naive_local();
    let millis = now.nanosecond() / 1_000_000 * 1_000_000;
    now.with_nanosecond(millis).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_scenario_has_unique_id() {
        let params = json!({"total_batches": 10});
        let a = PlanningScenario::new(PlanningMode::Uniform, &params, &json!({}), ScenarioSummary::default())
            .unwrap();
        let b = PlanningScenario::new(PlanningMode::Uniform, &params, &json!({}), ScenarioSummary::default())
            .unwrap();
        assert_ne!(a.scenario_id, b.scenario_id);
        assert_eq!(a.parameters().unwrap()["total_batches"], 10);
    }

    #[test]
    fn test_blank_label_is_dropped() {
        let s = PlanningScenario::new(PlanningMode::Maximum, &json!({}), &json!({}), ScenarioSummary::default())
            .unwrap()
            .with_label("   ");
        assert!(s.label.is_none());
    }
}
