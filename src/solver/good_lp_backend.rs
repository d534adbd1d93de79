// ==========================================
// 口服固体制剂排班优化系统 - good_lp 求解后端
// ==========================================
// 后端: HiGHS（分支定界 + 预处理，单次求解受 SolverConfig 时限约束）
// 职责: MipModel → good_lp 问题 → 状态 + 变量取值
// 超时: 即使已有可行解也按 NotSolved 返回，不把非最优解交给上层
// ==========================================

use crate::domain::types::SolveStatus;
use crate::perf;
use crate::solver::{LinearExpr, MipModel, MipSolution, MipSolver, Relation, SolverConfig, VarKind};
use good_lp::{
    constraint, highs, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithTimeLimit,
};
use std::time::Instant;
use tracing::{debug, warn};

/// 默认求解器（无状态，可在多个工序求解间共享）
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }

    fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
        expr.terms()
            .iter()
            .fold(Expression::from(expr.constant()), |acc, (var, coef)| {
                acc + *coef * handles[var.index()]
            })
    }

    fn run(&self, model: &MipModel, config: &SolverConfig) -> MipSolution {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| match def.kind {
                VarKind::Binary => vars.add(variable().binary().name(def.name.clone())),
                VarKind::NonNegativeInteger => {
                    vars.add(variable().integer().min(0.0).name(def.name.clone()))
                }
            })
            .collect();

        let objective = Self::to_expression(model.objective(), &handles);
        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .with_time_limit(config.time_limit_secs);

        for c in model.constraints() {
            let lhs = Self::to_expression(&c.lhs, &handles);
            let rhs = c.rhs;
            let built = match c.relation {
                Relation::GreaterOrEqual => constraint!(lhs >= rhs),
                Relation::LessOrEqual => constraint!(lhs <= rhs),
                Relation::Equal => constraint!(lhs == rhs),
            };
            problem = problem.with(built);
        }

        match problem.solve() {
            Ok(solution) if matches!(solution.status(), SolutionStatus::TimeLimit) => {
                warn!(
                    model = %model.name(),
                    time_limit_secs = config.time_limit_secs,
                    "求解超时，按未求解处理"
                );
                MipSolution::not_optimal(SolveStatus::NotSolved)
            }
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
                let objective_value = model.objective().evaluate(&values);
                MipSolution::optimal(values, objective_value)
            }
            Err(ResolutionError::Infeasible) => MipSolution::not_optimal(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => MipSolution::not_optimal(SolveStatus::Unbounded),
            Err(e) => {
                warn!(model = %model.name(), error = %e, "求解器返回错误，按未求解处理");
                MipSolution::not_optimal(SolveStatus::NotSolved)
            }
        }
    }
}

impl MipSolver for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp/highs"
    }

    fn solve(&self, model: &MipModel, config: &SolverConfig) -> MipSolution {
        if !config.has_valid_time_limit() {
            warn!(
                model = %model.name(),
                time_limit_secs = config.time_limit_secs,
                "求解时限无效，不调用求解器"
            );
            return MipSolution::not_optimal(SolveStatus::NotSolved);
        }

        debug!(
            model = %model.name(),
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "开始求解"
        );

        let started = Instant::now();
        let solution = self.run(model, config);
        let elapsed = started.elapsed();
        perf::record_solve(model.name(), elapsed);

        debug!(
            model = %model.name(),
            status = %solution.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "求解完成"
        );
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_covering_problem() {
        // min x + y, 2x + 3y >= 4, x,y 为二元变量 → x = y = 1 (目标 2)
        let mut model = MipModel::new("cover");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model.set_objective(LinearExpr::new().with_term(x, 1.0).with_term(y, 1.0));
        model.add_constraint(
            "demand",
            LinearExpr::new().with_term(x, 2.0).with_term(y, 3.0),
            Relation::GreaterOrEqual,
            4.0,
        );

        let solution = GoodLpSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.integral_value(x, 1e-6), Some(1));
        assert_eq!(solution.integral_value(y, 1e-6), Some(1));
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_problem_reports_status() {
        let mut model = MipModel::new("impossible");
        let x = model.add_binary("x");
        model.set_objective(LinearExpr::new().with_term(x, 1.0));
        model.add_constraint(
            "too_much",
            LinearExpr::new().with_term(x, 1.0),
            Relation::GreaterOrEqual,
            2.0,
        );

        let solution = GoodLpSolver::new().solve(&model, &SolverConfig::default());
        assert!(!solution.status.is_optimal());
        assert!(solution.values().is_empty());
    }

    #[test]
    fn test_integer_variable_takes_ceiling() {
        // min s, s >= 2.5 (s 为整数) → s = 3
        let mut model = MipModel::new("ceil");
        let s = model.add_integer("s");
        model.set_objective(LinearExpr::new().with_term(s, 1.0));
        model.add_constraint(
            "floor",
            LinearExpr::new().with_term(s, 2.0),
            Relation::GreaterOrEqual,
            5.0,
        );

        let solution = GoodLpSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.integral_value(s, 1e-6), Some(3));
    }

    #[test]
    fn test_invalid_time_limit_is_not_solved() {
        let mut model = MipModel::new("no_budget");
        let x = model.add_binary("x");
        model.set_objective(LinearExpr::new().with_term(x, 1.0));

        for secs in [0.0, -1.0, f64::NAN] {
            let config = SolverConfig::default().with_time_limit_secs(secs);
            let solution = GoodLpSolver::new().solve(&model, &config);
            assert_eq!(solution.status, SolveStatus::NotSolved);
        }
    }
}
