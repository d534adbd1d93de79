// ==========================================
// 口服固体制剂排班优化系统 - 求解器边界
// ==========================================
// 职责: 与具体求解器无关的整数规划模型 + 求解接口
// 约定: 求解器只返回 状态 + 每个变量的取值，核心不读取求解器内部状态
// 配置: SolverConfig 随每次求解显式传入，不使用进程级单例
// ==========================================

pub mod good_lp_backend;

pub use good_lp_backend::GoodLpSolver;

use crate::domain::types::SolveStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// 变量
// ==========================================

/// 模型内变量句柄（按添加顺序编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    NonNegativeInteger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

// ==========================================
// 线性表达式 / 约束
// ==========================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub lhs: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.relation {
            Relation::GreaterOrEqual => lhs >= self.rhs - tolerance,
            Relation::LessOrEqual => lhs <= self.rhs + tolerance,
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

// ==========================================
// MipModel - 最小化整数规划模型
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct MipModel {
    name: String,
    variables: Vec<VarDef>,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
}

impl MipModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarKind::Binary)
    }

    pub fn add_integer(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarKind::NonNegativeInteger)
    }

    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId {
        self.variables.push(VarDef { name, kind });
        VarId(self.variables.len() - 1)
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            lhs,
            relation,
            rhs,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.variables
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// 返回第一个被违反的约束（用于校验求解器返回值）
    pub fn first_violation(&self, values: &[f64], tolerance: f64) -> Option<&LinearConstraint> {
        self.constraints
            .iter()
            .find(|c| !c.is_satisfied(values, tolerance))
    }
}

// ==========================================
// 求解结果
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct MipSolution {
    pub status: SolveStatus,
    values: Vec<f64>,
    pub objective_value: f64,
}

impl MipSolution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            objective_value,
        }
    }

    pub fn not_optimal(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    /// 取整后的取值；偏离整数超过容差返回 None
    pub fn integral_value(&self, var: VarId, tolerance: f64) -> Option<u32> {
        let raw = self.value(var);
        let rounded = raw.round();
        if (raw - rounded).abs() > tolerance || rounded < 0.0 {
            return None;
        }
        Some(rounded as u32)
    }
}

// ==========================================
// SolverConfig - 求解配置（每次求解显式传入）
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 整数变量取整容差
    pub rounding_tolerance: f64,
    /// 是否用返回值复核全部约束（违反时按非最优处理）
    pub verify_solution: bool,
    /// 单次求解时限（秒），超时按未求解处理
    pub time_limit_secs: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rounding_tolerance: 1e-6,
            verify_solution: true,
            time_limit_secs: 60.0,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// 时限必须为正的有限值
    pub fn has_valid_time_limit(&self) -> bool {
        self.time_limit_secs.is_finite() && self.time_limit_secs > 0.0
    }
}

// ==========================================
// Trait: MipSolver
// ==========================================
// 外部整数规划求解器（黑盒）
// 实现必须无共享可变状态，以便不同工序的求解互不影响
pub trait MipSolver: Send + Sync {
    fn name(&self) -> &str;

    /// 阻塞求解；任何后端错误都折算为非 Optimal 状态
    fn solve(&self, model: &MipModel, config: &SolverConfig) -> MipSolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_evaluation_and_violation() {
        let mut model = MipModel::new("t");
        let x = model.add_binary("x");
        let y = model.add_integer("y");
        model.add_constraint(
            "cover",
            LinearExpr::new().with_term(x, 3.0).with_term(y, 1.0),
            Relation::GreaterOrEqual,
            4.0,
        );

        assert!(model.first_violation(&[1.0, 1.0], 1e-9).is_none());
        let violated = model.first_violation(&[1.0, 0.0], 1e-9).unwrap();
        assert_eq!(violated.name, "cover");
    }

    #[test]
    fn test_zero_coefficients_are_dropped() {
        let mut model = MipModel::new("t");
        let x = model.add_binary("x");
        let expr = LinearExpr::new().with_term(x, 0.0);
        assert!(expr.terms().is_empty());
    }

    #[test]
    fn test_integral_value_rejects_fractional() {
        let mut model = MipModel::new("t");
        let x = model.add_integer("x");
        let ok = MipSolution::optimal(vec![2.0000001], 0.0);
        assert_eq!(ok.integral_value(x, 1e-6), Some(2));
        let fractional = MipSolution::optimal(vec![1.5], 0.0);
        assert_eq!(fractional.integral_value(x, 1e-6), None);
    }
}
