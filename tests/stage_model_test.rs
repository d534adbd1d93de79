// ==========================================
// 单工序排班模型集成测试
// ==========================================
// 测试目标: 手算最优解、零需求、预检不调用求解器、结果复核、逐日人数
// ==========================================

mod helpers;

use helpers::mock_solver::{CountingSolver, RefusingSolver, ZeroSolver};
use osd_shift_planner::domain::{
    CapacityCatalog, Machine, MachineSelection, ProcessStep, SolveStatus, StageKind, StageResult,
};
use osd_shift_planner::engine::{DayLinking, StageInfeasibility, StageScheduleModel};
use osd_shift_planner::solver::{GoodLpSolver, SolverConfig};
use test_helpers::{bosch_only, params};

fn model(stage: StageKind) -> StageScheduleModel {
    let catalog = CapacityCatalog::standard();
    StageScheduleModel::new(catalog.stage(stage).expect("标准目录缺少工序").clone())
}

/// 每天三个班次人数之和不超过返回的人数
fn assert_daily_staff_within_headcount(result: &StageResult) {
    for day in &result.schedule {
        assert!(
            day.staff_required <= result.min_headcount,
            "第 {} 天人数 {} 超过 {}",
            day.day,
            day.staff_required,
            result.min_headcount
        );
    }
}

/// 按目录产出表重算产出，必须与结果一致且不低于需求
fn assert_production_consistent(result: &StageResult) {
    let catalog = CapacityCatalog::standard();
    let stage = catalog.stage(result.stage).unwrap();
    for output in &result.step_outputs {
        let recomputed: u32 = result
            .resources
            .iter()
            .filter(|r| r.step == output.step)
            .map(|r| {
                let spec = stage.resources.iter().find(|s| s.machine == r.machine).unwrap();
                r.shifts.total() * spec.batches_per_shift
            })
            .sum();
        assert_eq!(recomputed, output.batches_produced);
        assert!(output.batches_produced >= result.batches_required);
    }
}

// ==========================================
// 手算最优解
// ==========================================

#[test]
fn test_coating_bosch_only_matches_hand_computed_optimum() {
    osd_shift_planner::logging::init_test();

    // 需求 8 批 / 2 天 / 仅 BOSCH:
    // 包衣 4 个班次 + 配液 2 个班次，两天各 3 个班次 → 每天 6 人
    let result = model(StageKind::Coating)
        .solve(8, &bosch_only(2), &GoodLpSolver::new(), &SolverConfig::default())
        .expect("应可行");

    assert_eq!(result.solver_status, SolveStatus::Optimal);
    assert_eq!(result.min_headcount, 6);
    assert_eq!(result.step_output(ProcessStep::SolutionPreparation), Some(8));
    assert_eq!(result.step_output(ProcessStep::Coating), Some(8));
    assert_eq!(result.final_batches, 8);
    assert!((result.pct_demand_completed - 100.0).abs() < 1e-9);
    assert_eq!(result.days_used, 2);
    assert_eq!(result.resource(Machine::Glatt), None);
    assert_daily_staff_within_headcount(&result);
    assert_production_consistent(&result);
}

#[test]
fn test_buffered_headcount_is_ceiled() {
    let result = model(StageKind::Coating)
        .solve(
            8,
            &bosch_only(2).with_buffer_ratio(0.2),
            &GoodLpSolver::new(),
            &SolverConfig::default(),
        )
        .unwrap();

    // ceil(6 × 1.2) = 8
    assert_eq!(result.min_headcount, 6);
    assert_eq!(result.headcount_with_buffer, 8);
}

#[test]
fn test_tableting_prefers_high_yield_press() {
    // 10 批 / 2 天: P3090i 每班 2 批，5 个班次分两天 → 单日最多 3 个班次 = 9 人
    let result = model(StageKind::Tableting)
        .solve(10, &params(2), &GoodLpSolver::new(), &SolverConfig::default())
        .unwrap();

    assert_eq!(result.min_headcount, 9);
    assert!(result.final_batches >= 10);
    assert_daily_staff_within_headcount(&result);
    assert_production_consistent(&result);
}

#[test]
fn test_aggregated_day_linking_reaches_same_headcount() {
    let result = model(StageKind::Coating)
        .with_day_linking(DayLinking::Aggregated)
        .solve(8, &bosch_only(2), &GoodLpSolver::new(), &SolverConfig::default())
        .unwrap();

    assert_eq!(result.min_headcount, 6);
    assert_eq!(result.days_used, 2);
}

// ==========================================
// 零需求
// ==========================================

#[test]
fn test_zero_demand_is_feasible_with_no_activity() {
    for stage in StageKind::ALL {
        let result = model(stage)
            .solve(0, &params(3), &GoodLpSolver::new(), &SolverConfig::default())
            .unwrap();

        assert_eq!(result.min_headcount, 0, "{}", stage);
        assert_eq!(result.headcount_with_buffer, 0);
        assert_eq!(result.days_used, 0);
        assert_eq!(result.pct_demand_completed, 0.0);
        assert_eq!(result.shift_totals().total(), 0);
        assert!(result.schedule.iter().all(|d| d.activations.is_empty()));
    }
}

// ==========================================
// 不可行: 不调用求解器
// ==========================================

#[test]
fn test_no_enabled_machine_never_calls_solver() {
    let solver = RefusingSolver::new();
    let p = params(5).with_machines(MachineSelection::none());

    for stage in [StageKind::Tableting, StageKind::Coating] {
        let err = model(stage)
            .solve(4, &p, solver.as_ref(), &SolverConfig::default())
            .unwrap_err();
        assert!(err.is_structural());
        assert_eq!(err.stage(), stage);
        assert_eq!(err.additional_days(), None);
    }
    assert_eq!(solver.calls(), 0);
}

#[test]
fn test_capacity_shortfall_never_calls_solver() {
    let solver = RefusingSolver::new();
    let err = model(StageKind::Dispensing)
        .solve(30, &params(2), solver.as_ref(), &SolverConfig::default())
        .unwrap_err();

    match err {
        StageInfeasibility::CapacityShortfall {
            max_daily_output,
            additional_days,
            ..
        } => {
            assert_eq!(max_daily_output, 9);
            assert_eq!(additional_days, 2);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(solver.calls(), 0);
}

// ==========================================
// 求解器非最优 / 返回值复核
// ==========================================

#[test]
fn test_non_optimal_status_maps_to_infeasible() {
    let solver = RefusingSolver::new();
    let err = model(StageKind::Dispensing)
        .solve(9, &params(1), solver.as_ref(), &SolverConfig::default())
        .unwrap_err();

    assert_eq!(
        err,
        StageInfeasibility::SolverNonOptimal {
            stage: StageKind::Dispensing,
            status: SolveStatus::NotSolved,
            additional_days: 0,
        }
    );
    assert_eq!(solver.calls(), 1);
}

#[test]
fn test_violating_optimal_answer_is_rejected() {
    for verify_solution in [true, false] {
        let config = SolverConfig {
            verify_solution,
            ..SolverConfig::default()
        };
        let err = model(StageKind::Granulation)
            .solve(3, &params(1), &ZeroSolver, &config)
            .unwrap_err();
        assert!(matches!(
            err,
            StageInfeasibility::SolverNonOptimal {
                status: SolveStatus::NotSolved,
                ..
            }
        ));
    }
}

// ==========================================
// 单调性
// ==========================================

#[test]
fn test_more_workdays_never_breaks_feasibility() {
    let solver = CountingSolver::new();
    let m = model(StageKind::Dispensing);

    assert!(m
        .solve(10, &params(1), solver.as_ref(), &SolverConfig::default())
        .is_err());
    for days in 2..=4 {
        let result = m
            .solve(10, &params(days), solver.as_ref(), &SolverConfig::default())
            .unwrap();
        assert_eq!(result.num_workdays, days);
        assert_daily_staff_within_headcount(&result);
    }
    // 1 天被产能预检拦截
    assert_eq!(solver.calls(), 3);
}

#[test]
fn test_weekend_days_are_avoided_when_possible() {
    // 7 天周期、需求 9 批: 工作日足够，不应排到周末
    let result = model(StageKind::Dispensing)
        .solve(9, &params(7), &GoodLpSolver::new(), &SolverConfig::default())
        .unwrap();

    for day in result.schedule.iter().filter(|d| d.is_weekend) {
        assert!(day.activations.is_empty(), "周末第 {} 天被排班", day.day);
    }
    assert_eq!(result.final_batches, 9);
}

#[test]
fn test_exhausted_time_budget_reports_not_solved() {
    // 30 天 / 50 批的压片模型远不可能在 1 纳秒内求完
    let config = SolverConfig::default().with_time_limit_secs(1e-9);
    let err = model(StageKind::Tableting)
        .solve(50, &params(30), &GoodLpSolver::new(), &config)
        .unwrap_err();

    assert!(
        matches!(
            err,
            StageInfeasibility::SolverNonOptimal {
                stage: StageKind::Tableting,
                status: SolveStatus::NotSolved,
                additional_days: 0,
            }
        ),
        "{:?}",
        err
    );
}
