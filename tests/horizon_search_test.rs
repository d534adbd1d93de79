// ==========================================
// 周期搜索集成测试
// ==========================================
// 测试目标: 首个可行周期、产能下界跳跃、上限耗尽、结构性不可行提前返回
// ==========================================

mod helpers;

use helpers::mock_solver::{CountingSolver, RefusingSolver};
use osd_shift_planner::domain::{MachineSelection, StageKind};
use osd_shift_planner::engine::{
    completion_days, HorizonSearch, HorizonSearchConfig, PlanningError, StageAggregator,
};
use std::sync::Arc;
use test_helpers::params;

fn unit_step_search(solver: Arc<CountingSolver>) -> HorizonSearch<CountingSolver> {
    HorizonSearch::new(StageAggregator::new(solver)).with_config(HorizonSearchConfig {
        step_days: 1,
        ceiling_days: 10,
    })
}

#[test]
fn test_first_feasible_horizon_is_returned() {
    let solver = CountingSolver::new();
    let plan = unit_step_search(Arc::clone(&solver))
        .search(10, &params(1))
        .expect("应找到可行周期");

    // 1 天: 称量日产能 9 批不足 → 2 天可行
    assert_eq!(plan.attempted_workdays, vec![1, 2]);
    assert_eq!(plan.workdays_allocated, 2);
    assert_eq!(plan.combined.num_workdays, 2);
    assert_eq!(plan.total_batches, 10);
    for stage in plan.combined.stages() {
        assert!(stage.final_batches >= 10);
    }
    // 1 天被产能预检拦截，2 天求解四个工序
    assert_eq!(solver.calls(), 4);
}

#[test]
fn test_capacity_lower_bound_skips_hopeless_horizons() {
    let solver = CountingSolver::new();
    let plan = unit_step_search(Arc::clone(&solver))
        .search(20, &params(1))
        .unwrap();

    // ceil(20 / 9) = 3 → 2 天不必尝试
    assert_eq!(plan.attempted_workdays, vec![1, 3]);
    assert_eq!(plan.workdays_allocated, 3);
    assert_eq!(solver.calls(), 4);
}

#[test]
fn test_completion_days_accounts_for_stage_offsets() {
    let plan = unit_step_search(CountingSolver::new())
        .search(10, &params(1))
        .unwrap();

    let combined = &plan.combined;
    // 10 批 > 称量日产能 9 批 → 称量占用 2 天，涂层错后 3 天
    assert_eq!(combined.dispensing.days_used, 2);
    assert_eq!(plan.total_days_needed, 5);
    assert_eq!(completion_days(combined), 5);
}

#[test]
fn test_exhausted_ceiling_reports_last_horizon() {
    let solver = RefusingSolver::new();
    let search = HorizonSearch::new(StageAggregator::new(Arc::clone(&solver)));

    let err = search.search(10_000, &params(1)).unwrap_err();

    // 下界远超上限: 只尝试首个周期，之后按步长跳过直到越过上限
    assert_eq!(
        err,
        PlanningError::HorizonExhausted {
            total_batches: 10_000,
            last_workdays: 372,
            ceiling_days: 365,
        }
    );
    assert_eq!(solver.calls(), 0);
}

#[test]
fn test_structural_infeasibility_stops_search() {
    let solver = CountingSolver::new();
    let mut machines = MachineSelection::default();
    machines.bosch = false;
    machines.glatt = false;

    let err = HorizonSearch::new(StageAggregator::new(Arc::clone(&solver)))
        .search(0, &params(1).with_machines(machines))
        .unwrap_err();

    match err {
        PlanningError::StageInfeasible { stage, source } => {
            assert_eq!(stage, StageKind::Coating);
            assert!(source.is_structural());
        }
        other => panic!("unexpected: {:?}", other),
    }
    // 只跑了一个周期: 前三个工序各求解一次
    assert_eq!(solver.calls(), 3);
}

#[test]
fn test_zero_batches_still_carries_stage_offsets() {
    let plan = HorizonSearch::new(StageAggregator::new(CountingSolver::new()))
        .search(0, &params(1))
        .unwrap();

    assert_eq!(plan.workdays_allocated, 1);
    assert_eq!(plan.combined.dispensing.days_used, 0);
    assert_eq!(plan.total_days_needed, 3);
    assert_eq!(plan.combined.total_min_headcount, 0);
}

#[test]
fn test_zero_step_is_rejected() {
    let err = HorizonSearch::new(StageAggregator::new(RefusingSolver::new()))
        .with_config(HorizonSearchConfig {
            step_days: 0,
            ceiling_days: 365,
        })
        .search(10, &params(1))
        .unwrap_err();

    assert!(matches!(err, PlanningError::InvalidParameter(_)));
}
