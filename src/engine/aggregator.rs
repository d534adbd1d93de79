// ==========================================
// 口服固体制剂排班优化系统 - 四工序汇总器
// ==========================================
// 按流水线顺序依次求解四个工序，共享周期/富余比例/权重/设备开关
// 任一工序不可行立即返回（不做部分汇总）
// 人数汇总: 各工序独立优化后直接相加
// ==========================================

use crate::domain::capacity::CapacityCatalog;
use crate::domain::params::{PlanningParams, StageDemand};
use crate::domain::schedule::{CombinedResult, StageResult};
use crate::domain::types::StageKind;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::stage_model::{DayLinking, StageScheduleModel};
use crate::perf::PerfGuard;
use crate::solver::{MipSolver, SolverConfig};
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// StageAggregator - 四工序汇总器
// ==========================================
pub struct StageAggregator<S>
where
    S: MipSolver + ?Sized,
{
    solver: Arc<S>,
    catalog: CapacityCatalog,
    solver_config: SolverConfig,
    day_linking: DayLinking,
}

impl<S> StageAggregator<S>
where
    S: MipSolver + ?Sized,
{
    /// 创建汇总器（标准产能目录 + 默认求解配置）
    ///
    /// # 参数
    /// - solver: 求解器（各工序依次调用，无共享可变状态）
    pub fn new(solver: Arc<S>) -> Self {
        Self {
            solver,
            catalog: CapacityCatalog::standard(),
            solver_config: SolverConfig::default(),
            day_linking: DayLinking::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: CapacityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_solver_config(mut self, solver_config: SolverConfig) -> Self {
        self.solver_config = solver_config;
        self
    }

    pub fn with_day_linking(mut self, day_linking: DayLinking) -> Self {
        self.day_linking = day_linking;
        self
    }

    pub fn catalog(&self) -> &CapacityCatalog {
        &self.catalog
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    /// 取某工序的排班模型
    pub fn stage_model(&self, stage: StageKind) -> PlanningResult<StageScheduleModel> {
        let catalog = self
            .catalog
            .stage(stage)
            .ok_or(PlanningError::MissingStageCatalog(stage))?;
        Ok(StageScheduleModel::new(catalog.clone()).with_day_linking(self.day_linking))
    }

    /// 单工序求解（含参数校验）
    pub fn solve_stage(
        &self,
        stage: StageKind,
        batches_required: u32,
        params: &PlanningParams,
    ) -> PlanningResult<StageResult> {
        params.validate().map_err(PlanningError::InvalidParameter)?;
        let model = self.stage_model(stage)?;
        let result = model.solve(
            batches_required,
            params,
            self.solver.as_ref(),
            &self.solver_config,
        )?;
        Ok(result)
    }

    /// 四工序汇总
    ///
    /// # 参数
    /// - demand: 各工序需求批次
    /// - params: 四工序共享参数
    ///
    /// # 返回
    /// - Ok(CombinedResult): 四个工序的结果 + 人数合计
    /// - Err(PlanningError::StageInfeasible): 首个不可行工序
    pub fn aggregate(
        &self,
        demand: &StageDemand,
        params: &PlanningParams,
    ) -> PlanningResult<CombinedResult> {
        let _perf = PerfGuard::new("stage_aggregate");
        params.validate().map_err(PlanningError::InvalidParameter)?;

        debug!(
            num_workdays = params.num_workdays,
            dispensing = demand.dispensing,
            granulation = demand.granulation,
            tableting = demand.tableting,
            coating = demand.coating,
            "开始四工序汇总"
        );

        let mut results: Vec<StageResult> = Vec::with_capacity(StageKind::ALL.len());
        for stage in StageKind::ALL {
            let model = self.stage_model(stage)?;
            let result = model
                .solve(
                    demand.get(stage),
                    params,
                    self.solver.as_ref(),
                    &self.solver_config,
                )
                .map_err(|e| {
                    info!(stage = %stage, reason = %e, "工序不可行，汇总中止");
                    PlanningError::from(e)
                })?;
            results.push(result);
        }

        let mut it = results.into_iter();
        let (Some(dispensing), Some(granulation), Some(tableting), Some(coating)) =
            (it.next(), it.next(), it.next(), it.next())
        else {
            return Err(PlanningError::InvalidParameter(
                "工序结果数量不足".to_string(),
            ));
        };

        let combined = CombinedResult::new(
            params.num_workdays,
            dispensing,
            granulation,
            tableting,
            coating,
        );

        info!(
            num_workdays = combined.num_workdays,
            total_min_headcount = combined.total_min_headcount,
            total_headcount_with_buffer = combined.total_headcount_with_buffer,
            "四工序汇总完成"
        );
        Ok(combined)
    }
}

impl<S> Clone for StageAggregator<S>
where
    S: MipSolver + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            solver: Arc::clone(&self.solver),
            catalog: self.catalog.clone(),
            solver_config: self.solver_config,
            day_linking: self.day_linking,
        }
    }
}
