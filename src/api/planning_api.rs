// ==========================================
// 口服固体制剂排班优化系统 - 排班 API
// ==========================================
// 职责:
// 1. 合并请求覆写与配置默认值，校验输入
// 2. 三种排班模式: 分工序需求 / 统一总批次(周期搜索) / 最大产能(二分搜索)
// 3. 方案保存、查询、删除、对比
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::domain::capacity::MachineSelection;
use crate::domain::params::{ObjectiveWeights, PlanningParams, StageDemand};
use crate::domain::scenario::{PlanningScenario, ScenarioSummary};
use crate::domain::schedule::{CombinedResult, HorizonPlan, ThroughputPlan};
use crate::domain::types::PlanningMode;
use crate::engine::{HorizonSearch, StageAggregator, ThroughputSearch};
use crate::repository::ScenarioRepository;
use crate::solver::{GoodLpSolver, MipSolver};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// 请求 / 响应
// ==========================================

/// 请求级参数覆写（未提供的项取配置默认值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningOverrides {
    #[serde(default)]
    pub num_workdays: Option<u32>,
    #[serde(default)]
    pub buffer_ratio: Option<f64>,
    /// 直接指定权重（优先于权重方案）
    #[serde(default)]
    pub weights: Option<ObjectiveWeights>,
    /// 使用已保存的权重方案
    #[serde(default)]
    pub weight_profile_id: Option<String>,
    #[serde(default)]
    pub machines: Option<MachineSelection>,
}

/// 排班请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningRequest {
    /// 各工序独立需求
    Individual { demand: StageDemand },
    /// 统一总批次（缺省取配置 default_total_batches），num_workdays 为初始周期
    Uniform {
        #[serde(default)]
        total_batches: Option<u32>,
    },
    /// 固定周期下的最大批次
    Maximum,
}

impl PlanningRequest {
    pub fn mode(&self) -> PlanningMode {
        match self {
            PlanningRequest::Individual { .. } => PlanningMode::Individual,
            PlanningRequest::Uniform { .. } => PlanningMode::Uniform,
            PlanningRequest::Maximum => PlanningMode::Maximum,
        }
    }
}

/// 排班结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningOutcome {
    Individual(CombinedResult),
    Uniform(HorizonPlan),
    Maximum(ThroughputPlan),
}

impl PlanningOutcome {
    pub fn mode(&self) -> PlanningMode {
        match self {
            PlanningOutcome::Individual(_) => PlanningMode::Individual,
            PlanningOutcome::Uniform(_) => PlanningMode::Uniform,
            PlanningOutcome::Maximum(_) => PlanningMode::Maximum,
        }
    }

    pub fn combined(&self) -> &CombinedResult {
        match self {
            PlanningOutcome::Individual(c) => c,
            PlanningOutcome::Uniform(plan) => &plan.combined,
            PlanningOutcome::Maximum(plan) => &plan.combined,
        }
    }
}

/// 保存到方案中的参数（请求 + 合并后的实际参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub request: PlanningRequest,
    pub params: PlanningParams,
}

/// 方案对比行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparisonRow {
    pub scenario_id: String,
    pub mode: PlanningMode,
    pub label: Option<String>,
    pub created_at: NaiveDateTime,
    pub summary: ScenarioSummary,
}

impl From<&PlanningScenario> for ScenarioComparisonRow {
    fn from(s: &PlanningScenario) -> Self {
        Self {
            scenario_id: s.scenario_id.clone(),
            mode: s.mode,
            label: s.label.clone(),
            created_at: s.created_at,
            summary: s.summary,
        }
    }
}

// ==========================================
// PlanningApi - 排班 API
// ==========================================
pub struct PlanningApi<S = GoodLpSolver>
where
    S: MipSolver + ?Sized,
{
    config_manager: Arc<ConfigManager>,
    scenario_repo: Arc<ScenarioRepository>,
    solver: Arc<S>,
}

impl PlanningApi<GoodLpSolver> {
    /// 打开数据库并使用默认求解器
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)), Arc::new(GoodLpSolver::new()))
    }
}

impl<S> PlanningApi<S>
where
    S: MipSolver + ?Sized,
{
    pub fn new(
        config_manager: Arc<ConfigManager>,
        scenario_repo: Arc<ScenarioRepository>,
        solver: Arc<S>,
    ) -> Self {
        Self {
            config_manager,
            scenario_repo,
            solver,
        }
    }

    /// 从已有连接创建（配置与方案共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>, solver: Arc<S>) -> ApiResult<Self> {
        let config_manager = ConfigManager::from_connection(conn.clone()).map_err(ApiError::config)?;
        let scenario_repo = ScenarioRepository::new(conn);
        Ok(Self::new(
            Arc::new(config_manager),
            Arc::new(scenario_repo),
            solver,
        ))
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    // ==========================================
    // 参数合并
    // ==========================================

    /// 合并覆写与配置默认值，并校验
    pub fn resolve_params(&self, overrides: &PlanningOverrides) -> ApiResult<PlanningParams> {
        let mut params = self
            .config_manager
            .get_default_params()
            .map_err(ApiError::config)?;

        if let Some(days) = overrides.num_workdays {
            params = params.with_workdays(days);
        }
        if let Some(ratio) = overrides.buffer_ratio {
            params = params.with_buffer_ratio(ratio);
        }
        if let Some(id) = overrides.weight_profile_id.as_deref() {
            let profile = self
                .config_manager
                .get_weight_profile(id)
                .map_err(ApiError::config)?
                .ok_or_else(|| ApiError::NotFound(format!("权重方案(id={})不存在", id)))?;
            params = params.with_weights(profile.weights);
        }
        if let Some(weights) = overrides.weights {
            params = params.with_weights(weights);
        }
        if let Some(machines) = overrides.machines {
            params = params.with_machines(machines);
        }

        params.validate().map_err(ApiError::InvalidInput)?;
        Ok(params)
    }

    fn aggregator(&self) -> ApiResult<StageAggregator<S>> {
        let solver_config = self
            .config_manager
            .get_solver_config()
            .map_err(ApiError::config)?;
        Ok(StageAggregator::new(self.solver.clone()).with_solver_config(solver_config))
    }

    // ==========================================
    // 三种排班模式
    // ==========================================

    /// 分工序需求排班
    pub fn plan_individual(
        &self,
        demand: &StageDemand,
        overrides: &PlanningOverrides,
    ) -> ApiResult<CombinedResult> {
        let params = self.resolve_params(overrides)?;
        Ok(self.aggregator()?.aggregate(demand, &params)?)
    }

    /// 统一总批次排班（周期搜索）
    pub fn plan_uniform(
        &self,
        total_batches: Option<u32>,
        overrides: &PlanningOverrides,
    ) -> ApiResult<HorizonPlan> {
        let params = self.resolve_params(overrides)?;
        let total_batches = self.resolve_total_batches(total_batches)?;
        let search_config = self
            .config_manager
            .get_horizon_search_config()
            .map_err(ApiError::config)?;

        let search = HorizonSearch::new(self.aggregator()?).with_config(search_config);
        Ok(search.search(total_batches, &params)?)
    }

    /// 最大产能排班（二分搜索）
    pub fn plan_maximum(&self, overrides: &PlanningOverrides) -> ApiResult<ThroughputPlan> {
        let params = self.resolve_params(overrides)?;
        let search_config = self
            .config_manager
            .get_throughput_search_config()
            .map_err(ApiError::config)?;

        let search = ThroughputSearch::new(self.aggregator()?).with_config(search_config);
        Ok(search.search(&params)?)
    }

    /// 按请求执行排班
    pub fn run(
        &self,
        request: &PlanningRequest,
        overrides: &PlanningOverrides,
    ) -> ApiResult<PlanningOutcome> {
        let outcome = match request {
            PlanningRequest::Individual { demand } => {
                PlanningOutcome::Individual(self.plan_individual(demand, overrides)?)
            }
            PlanningRequest::Uniform { total_batches } => {
                PlanningOutcome::Uniform(self.plan_uniform(*total_batches, overrides)?)
            }
            PlanningRequest::Maximum => PlanningOutcome::Maximum(self.plan_maximum(overrides)?),
        };

        let combined = outcome.combined();
        info!(
            mode = %outcome.mode(),
            num_workdays = combined.num_workdays,
            total_min_headcount = combined.total_min_headcount,
            "排班完成"
        );
        Ok(outcome)
    }

    fn resolve_total_batches(&self, total_batches: Option<u32>) -> ApiResult<u32> {
        match total_batches {
            Some(b) => Ok(b),
            None => self
                .config_manager
                .get_default_total_batches()
                .map_err(ApiError::config),
        }
    }

    // ==========================================
    // 方案管理
    // ==========================================

    /// 保存方案
    ///
    /// # 参数
    /// - request/overrides: 产生该结果的请求（与结果一同保存，便于复现）
    /// - outcome: 排班结果
    /// - label: 方案备注（可选）
    pub fn save_scenario(
        &self,
        request: &PlanningRequest,
        overrides: &PlanningOverrides,
        outcome: &PlanningOutcome,
        label: Option<&str>,
    ) -> ApiResult<PlanningScenario> {
        if request.mode() != outcome.mode() {
            return Err(ApiError::InvalidInput(format!(
                "请求模式 {} 与结果模式 {} 不一致",
                request.mode(),
                outcome.mode()
            )));
        }

        let request = match request {
            PlanningRequest::Uniform { total_batches } => PlanningRequest::Uniform {
                total_batches: Some(self.resolve_total_batches(*total_batches)?),
            },
            other => other.clone(),
        };
        let parameters = ScenarioParameters {
            request,
            params: self.resolve_params(overrides)?,
        };
        let summary = ScenarioSummary::from_combined(outcome.combined());

        let mut scenario = PlanningScenario::new(outcome.mode(), &parameters, outcome, summary)?;
        if let Some(label) = label {
            scenario = scenario.with_label(label);
        }

        self.scenario_repo.insert(&scenario)?;
        info!(scenario_id = %scenario.scenario_id, mode = %scenario.mode, "方案已保存");
        Ok(scenario)
    }

    /// 查询全部方案（最新在前）
    pub fn list_scenarios(&self) -> ApiResult<Vec<PlanningScenario>> {
        Ok(self.scenario_repo.list_all()?)
    }

    pub fn get_scenario(&self, scenario_id: &str) -> ApiResult<PlanningScenario> {
        Self::validate_scenario_id(scenario_id)?;
        Ok(self.scenario_repo.get_by_id(scenario_id.trim())?)
    }

    /// 读取方案中保存的排班结果
    pub fn get_scenario_outcome(&self, scenario_id: &str) -> ApiResult<PlanningOutcome> {
        let scenario = self.get_scenario(scenario_id)?;
        Ok(serde_json::from_str(&scenario.result_json)?)
    }

    pub fn delete_scenario(&self, scenario_id: &str) -> ApiResult<()> {
        Self::validate_scenario_id(scenario_id)?;
        let deleted = self.scenario_repo.delete(scenario_id.trim())?;
        if deleted == 0 {
            return Err(ApiError::NotFound(format!(
                "PlanningScenario(id={})不存在",
                scenario_id
            )));
        }
        Ok(())
    }

    /// 清空全部方案，返回删除数量
    pub fn clear_scenarios(&self) -> ApiResult<usize> {
        let deleted = self.scenario_repo.clear_all()?;
        info!(deleted, "方案已清空");
        Ok(deleted)
    }

    /// 方案对比（按传入顺序；为空时对比全部方案）
    pub fn compare_scenarios(&self, scenario_ids: &[String]) -> ApiResult<Vec<ScenarioComparisonRow>> {
        if scenario_ids.is_empty() {
            return Ok(self
                .scenario_repo
                .list_all()?
                .iter()
                .map(ScenarioComparisonRow::from)
                .collect());
        }

        scenario_ids
            .iter()
            .map(|id| self.get_scenario(id).map(|s| ScenarioComparisonRow::from(&s)))
            .collect()
    }

    fn validate_scenario_id(scenario_id: &str) -> ApiResult<()> {
        if scenario_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("方案 ID 不能为空".to_string()));
        }
        Ok(())
    }
}
