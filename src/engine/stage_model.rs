// ==========================================
// 口服固体制剂排班优化系统 - 单工序排班模型
// ==========================================
// 四个工序共用同一套建模逻辑，差异只在产能目录（产出/人数表）
// ==========================================
// 流程:
//   1) 结构预检: 每个工步至少一个可用设备
//   2) 产能预检: 日产能上限 × 天数 < 需求 → 直接不可行，不建模
//   3) 建模: 开动变量(设备×班次×天) + 人数变量 + 占用日指示变量
//   4) 求解: 非 Optimal 一律视为不可行
//   5) 提取: 各班次开动次数、各工步产出、人数、占用天数
// 红线: 返回的产出必须 ≥ 需求，否则按不可行处理，不返回部分结果
// ==========================================

use crate::domain::calendar::PlanningHorizon;
use crate::domain::capacity::{ResourceSpec, ShiftCapacity, StageCatalog};
use crate::domain::params::{apply_buffer, ObjectiveWeights, PlanningParams};
use crate::domain::schedule::{DayAssignment, ResourceUsage, ShiftCounts, StageResult, StepOutput};
use crate::domain::types::{ProcessStep, Shift, SolveStatus, StageKind};
use crate::engine::error::StageInfeasibility;
use crate::solver::{LinearExpr, MipModel, MipSolution, MipSolver, Relation, SolverConfig, VarId};
use tracing::{debug, info, instrument, warn};

/// 复核约束时使用的绝对容差
const CONSTRAINT_TOLERANCE: f64 = 1e-6;

/// 占用日指示变量的联动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayLinking {
    /// 每个开动变量一条约束: day_used[d] ≥ x
    #[default]
    PerActivation,
    /// 每天一条约束: day_used[d] ≥ Σx / 当天变量数
    ///
    /// 仅因开动变量与指示变量均为二元变量而成立
    Aggregated,
}

/// 开动变量及其含义
#[derive(Debug, Clone, Copy)]
pub struct ActivationVar {
    pub resource: ResourceSpec,
    pub shift: Shift,
    pub day: u32,
    pub var: VarId,
}

/// 已构建的单工序整数规划模型
#[derive(Debug, Clone)]
pub struct StageMilp {
    pub model: MipModel,
    pub activations: Vec<ActivationVar>,
    pub staff: VarId,
    pub day_used: Vec<VarId>,
}

// ==========================================
// StageScheduleModel - 单工序排班模型
// ==========================================
#[derive(Debug, Clone)]
pub struct StageScheduleModel {
    catalog: StageCatalog,
    day_linking: DayLinking,
}

impl StageScheduleModel {
    pub fn new(catalog: StageCatalog) -> Self {
        Self {
            catalog,
            day_linking: DayLinking::default(),
        }
    }

    pub fn with_day_linking(mut self, day_linking: DayLinking) -> Self {
        self.day_linking = day_linking;
        self
    }

    pub fn stage(&self) -> StageKind {
        self.catalog.stage
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    // ==========================================
    // 预检
    // ==========================================

    /// 结构预检 + 产能预检
    ///
    /// # 返回
    /// - Ok: 可用资源列表（进入建模）
    /// - Err: 不可行信号（不调用求解器）
    pub fn precheck(
        &self,
        batches_required: u32,
        params: &PlanningParams,
    ) -> Result<Vec<ResourceSpec>, StageInfeasibility> {
        let stage = self.stage();
        let enabled = self.catalog.enabled_resources(&params.machines);
        let steps = self.catalog.steps();

        // 1) 结构性不可行: 某工步没有任何可用设备（含整个工序没有资源）
        if enabled.is_empty() && steps.is_empty() {
            return Err(StageInfeasibility::NoEnabledResource {
                stage,
                step: default_step(stage),
            });
        }
        for step in &steps {
            if !self.catalog.has_enabled_resource(*step, &params.machines) {
                return Err(StageInfeasibility::NoEnabledResource { stage, step: *step });
            }
        }

        // 2) 产能预检: 取缺口最大的工步作为诊断
        let mut worst: Option<StageInfeasibility> = None;
        for step in &steps {
            let max_daily_output = self.catalog.max_daily_output(*step, &params.machines);
            let capacity = u64::from(max_daily_output) * u64::from(params.num_workdays);
            if capacity >= u64::from(batches_required) {
                continue;
            }

            let additional_days =
                required_days(batches_required, max_daily_output).saturating_sub(params.num_workdays);
            let is_worse = worst
                .as_ref()
                .and_then(|w| w.additional_days())
                .map_or(true, |d| additional_days > d);
            if is_worse {
                worst = Some(StageInfeasibility::CapacityShortfall {
                    stage,
                    step: *step,
                    batches_required,
                    num_workdays: params.num_workdays,
                    max_daily_output,
                    additional_days,
                });
            }
        }

        match worst {
            Some(shortfall) => {
                debug!(stage = %stage, reason = %shortfall, "产能预检不通过");
                Err(shortfall)
            }
            None => Ok(enabled),
        }
    }

    /// 按闭式产能上限估算还需增加的天数（各工步取最大）
    pub fn estimate_additional_days(&self, batches_required: u32, params: &PlanningParams) -> u32 {
        self.catalog
            .steps()
            .iter()
            .map(|step| {
                let max_daily = self.catalog.max_daily_output(*step, &params.machines);
                required_days(batches_required, max_daily).saturating_sub(params.num_workdays)
            })
            .max()
            .unwrap_or(0)
    }

    // ==========================================
    // 建模
    // ==========================================

    /// 构建整数规划模型
    pub fn build(
        &self,
        batches_required: u32,
        params: &PlanningParams,
        enabled: &[ResourceSpec],
    ) -> StageMilp {
        let stage = self.stage();
        let horizon = PlanningHorizon::new(params.num_workdays);
        let weights = &params.weights;
        let mut model = MipModel::new(format!("{}_schedule", stage.to_string().to_lowercase()));

        // ----- 变量 -----
        let mut activations = Vec::with_capacity(enabled.len() * 3 * params.num_workdays as usize);
        for resource in enabled {
            for shift in Shift::ALL {
                for day in horizon.days() {
                    let var = model.add_binary(format!("{}_{}_{}", shift, resource.machine, day));
                    activations.push(ActivationVar {
                        resource: *resource,
                        shift,
                        day,
                        var,
                    });
                }
            }
        }
        let staff = model.add_integer("staff");
        let day_used: Vec<VarId> = horizon
            .days()
            .map(|day| model.add_binary(format!("day_used_{}", day)))
            .collect();

        // ----- 目标函数 -----
        let mut objective = LinearExpr::new();
        objective.add_term(staff, weights.staff);
        for a in &activations {
            objective.add_term(a.var, activation_cost(weights, a.shift, a.day));
        }
        for var in &day_used {
            objective.add_term(*var, weights.days_used);
        }
        model.set_objective(objective);

        // ----- (a) 需求约束（按工步） -----
        for step in self.catalog.steps() {
            let mut produced = LinearExpr::new();
            for a in activations.iter().filter(|a| a.resource.step == step) {
                produced.add_term(a.var, f64::from(a.resource.batches_per_shift));
            }
            model.add_constraint(
                format!("demand_{}", step),
                produced,
                Relation::GreaterOrEqual,
                f64::from(batches_required),
            );
        }

        // ----- (b) 人数约束: staff ≥ 当天三个班次人数之和 -----
        for day in horizon.days() {
            let mut expr = LinearExpr::new().with_term(staff, 1.0);
            for a in activations.iter().filter(|a| a.day == day) {
                expr.add_term(a.var, -f64::from(a.resource.staff_per_shift));
            }
            model.add_constraint(
                format!("staff_day_{}", day),
                expr,
                Relation::GreaterOrEqual,
                0.0,
            );
        }

        // ----- (c) 占用日联动 -----
        for (day, indicator) in horizon.days().zip(day_used.iter()) {
            let todays: Vec<&ActivationVar> = activations.iter().filter(|a| a.day == day).collect();
            match self.day_linking {
                DayLinking::PerActivation => {
                    for a in todays {
                        model.add_constraint(
                            format!("day_used_{}_{}_{}", day, a.resource.machine, a.shift),
                            LinearExpr::new()
                                .with_term(*indicator, 1.0)
                                .with_term(a.var, -1.0),
                            Relation::GreaterOrEqual,
                            0.0,
                        );
                    }
                }
                DayLinking::Aggregated => {
                    if todays.is_empty() {
                        continue;
                    }
                    let share = 1.0 / todays.len() as f64;
                    let mut expr = LinearExpr::new().with_term(*indicator, 1.0);
                    for a in todays {
                        expr.add_term(a.var, -share);
                    }
                    model.add_constraint(
                        format!("day_used_{}", day),
                        expr,
                        Relation::GreaterOrEqual,
                        0.0,
                    );
                }
            }
        }

        StageMilp {
            model,
            activations,
            staff,
            day_used,
        }
    }

    // ==========================================
    // 求解
    // ==========================================

    /// 求解单工序排班
    ///
    /// # 参数
    /// - `batches_required`: 需求批次（≥ 0）
    /// - `params`: 周期、富余比例、权重、设备开关
    /// - `solver`: 外部求解器
    /// - `config`: 本次求解的求解配置
    ///
    /// # 返回
    /// - Ok(StageResult): 最优排班
    /// - Err(StageInfeasibility): 不可行（结构 / 产能 / 求解器）
    #[instrument(skip(self, params, solver, config), fields(
        stage = %self.stage(),
        num_workdays = params.num_workdays
    ))]
    pub fn solve<S: MipSolver + ?Sized>(
        &self,
        batches_required: u32,
        params: &PlanningParams,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<StageResult, StageInfeasibility> {
        let enabled = self.precheck(batches_required, params)?;
        let milp = self.build(batches_required, params, &enabled);

        debug!(
            variables = milp.model.variables().len(),
            constraints = milp.model.constraints().len(),
            solver = solver.name(),
            "模型构建完成"
        );

        let solution = solver.solve(&milp.model, config);
        if !solution.status.is_optimal() {
            let infeasible = self.non_optimal(batches_required, params, solution.status);
            info!(status = %solution.status, "求解未得到最优解");
            return Err(infeasible);
        }

        if config.verify_solution {
            if let Some(violated) = milp
                .model
                .first_violation(solution.values(), CONSTRAINT_TOLERANCE)
            {
                warn!(constraint = %violated.name, "求解器返回值违反约束，按未求解处理");
                return Err(self.non_optimal(batches_required, params, SolveStatus::NotSolved));
            }
        }

        let result = self.extract(batches_required, params, &milp, &solution, config)?;

        info!(
            batches_required,
            final_batches = result.final_batches,
            min_headcount = result.min_headcount,
            days_used = result.days_used,
            "单工序排班完成"
        );
        Ok(result)
    }

    fn non_optimal(
        &self,
        batches_required: u32,
        params: &PlanningParams,
        status: SolveStatus,
    ) -> StageInfeasibility {
        StageInfeasibility::SolverNonOptimal {
            stage: self.stage(),
            status,
            additional_days: self.estimate_additional_days(batches_required, params),
        }
    }

    // ==========================================
    // 结果提取
    // ==========================================

    fn extract(
        &self,
        batches_required: u32,
        params: &PlanningParams,
        milp: &StageMilp,
        solution: &MipSolution,
        config: &SolverConfig,
    ) -> Result<StageResult, StageInfeasibility> {
        let horizon = PlanningHorizon::new(params.num_workdays);
        let tolerance = config.rounding_tolerance;

        let mut resources: Vec<ResourceUsage> = Vec::new();
        let mut schedule: Vec<DayAssignment> = horizon
            .days()
            .map(|day| DayAssignment {
                day,
                is_weekend: PlanningHorizon::is_weekend(day),
                activations: Vec::new(),
                staff_required: 0,
            })
            .collect();

        for a in &milp.activations {
            let active = match solution.integral_value(a.var, tolerance) {
                Some(v) => v,
                None => {
                    warn!(var = a.var.index(), "开动变量取值非整数，按未求解处理");
                    return Err(self.non_optimal(batches_required, params, SolveStatus::NotSolved));
                }
            };

            let usage = match resources.iter_mut().position(|r| r.machine == a.resource.machine) {
                Some(idx) => &mut resources[idx],
                None => {
                    resources.push(ResourceUsage {
                        machine: a.resource.machine,
                        step: a.resource.step,
                        shifts: ShiftCounts::default(),
                        batches_produced: 0,
                    });
                    let last = resources.len() - 1;
                    &mut resources[last]
                }
            };

            if active == 0 {
                continue;
            }
            usage.shifts.add(a.shift, active);
            usage.batches_produced += active * a.resource.batches_per_shift;

            let day = &mut schedule[a.day as usize];
            day.activations.push((a.resource.machine, a.shift));
            day.staff_required += active * a.resource.staff_per_shift;
        }

        // 产出按与需求约束相同的产出表重算
        let step_outputs: Vec<StepOutput> = self
            .catalog
            .steps()
            .into_iter()
            .map(|step| StepOutput {
                step,
                batches_produced: resources
                    .iter()
                    .filter(|r| r.step == step)
                    .map(|r| r.batches_produced)
                    .sum(),
            })
            .collect();

        if let Some(short) = step_outputs
            .iter()
            .find(|o| o.batches_produced < batches_required)
        {
            warn!(
                step = %short.step,
                produced = short.batches_produced,
                batches_required,
                "产出低于需求，按未求解处理"
            );
            return Err(self.non_optimal(batches_required, params, SolveStatus::NotSolved));
        }

        let final_batches = step_outputs
            .iter()
            .map(|o| o.batches_produced)
            .min()
            .unwrap_or(0);

        // 人数 = 单日最大需求；人数权重为正时与人数变量最优值一致
        let peak_staff = schedule.iter().map(|d| d.staff_required).max().unwrap_or(0);
        if let Some(staff_value) = solution.integral_value(milp.staff, tolerance) {
            if staff_value != peak_staff {
                debug!(staff_value, peak_staff, "人数变量高于单日峰值");
            }
        }

        let days_used = schedule.iter().filter(|d| !d.activations.is_empty()).count() as u32;
        let pct_demand_completed = if batches_required > 0 {
            f64::from(final_batches) / f64::from(batches_required) * 100.0
        } else {
            0.0
        };

        Ok(StageResult {
            stage: self.stage(),
            batches_required,
            resources,
            step_outputs,
            final_batches,
            pct_demand_completed,
            min_headcount: peak_staff,
            headcount_with_buffer: apply_buffer(peak_staff, params.buffer_ratio),
            days_used,
            num_workdays: params.num_workdays,
            solver_status: solution.status,
            objective_value: solution.objective_value,
            schedule,
        })
    }
}

/// 单个开动变量的目标系数: 班次权重 + 周末权重
fn activation_cost(weights: &ObjectiveWeights, shift: Shift, day: u32) -> f64 {
    let shift_weight = match shift {
        Shift::Morning => weights.morning,
        Shift::Evening => weights.evening,
        Shift::Night => weights.night,
    };
    if PlanningHorizon::is_weekend(day) {
        shift_weight + weights.weekend
    } else {
        shift_weight
    }
}

/// 满负荷下完成需求所需天数: ceil(需求 / 日产能)
fn required_days(batches_required: u32, max_daily_output: u32) -> u32 {
    if batches_required == 0 {
        return 0;
    }
    if max_daily_output == 0 {
        return u32::MAX;
    }
    batches_required.div_ceil(max_daily_output)
}

fn default_step(stage: StageKind) -> ProcessStep {
    match stage {
        StageKind::Dispensing => ProcessStep::Dispensing,
        StageKind::Granulation => ProcessStep::Granulation,
        StageKind::Tableting => ProcessStep::Tableting,
        StageKind::Coating => ProcessStep::Coating,
    }
}
