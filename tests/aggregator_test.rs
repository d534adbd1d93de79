// ==========================================
// 四工序汇总器集成测试
// ==========================================

mod helpers;

use helpers::mock_solver::{CountingSolver, RefusingSolver};
use osd_shift_planner::domain::{
    CapacityCatalog, MachineSelection, StageCatalog, StageDemand, StageKind,
};
use osd_shift_planner::config::{defaults, ConfigManager};
use osd_shift_planner::engine::{DayLinking, PlanningError, StageAggregator};
use osd_shift_planner::solver::GoodLpSolver;
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::{create_test_db, params};

#[test]
fn test_aggregate_solves_stages_in_pipeline_order() {
    let solver = CountingSolver::new();
    let aggregator = StageAggregator::new(Arc::clone(&solver));

    let demand = StageDemand {
        dispensing: 6,
        granulation: 6,
        tableting: 4,
        coating: 4,
    };
    let combined = aggregator.aggregate(&demand, &params(2)).expect("应可行");

    assert_eq!(
        solver.model_names(),
        vec![
            "dispensing_schedule",
            "granulation_schedule",
            "tableting_schedule",
            "coating_schedule"
        ]
    );
    assert_eq!(combined.num_workdays, 2);
    assert_eq!(
        combined.total_min_headcount,
        combined.stages().map(|s| s.min_headcount).sum::<u32>()
    );
    assert_eq!(
        combined.total_headcount_with_buffer,
        combined.stages().map(|s| s.headcount_with_buffer).sum::<u32>()
    );
    for stage in StageKind::ALL {
        let result = combined.stage(stage);
        assert_eq!(result.stage, stage);
        assert!(result.final_batches >= demand.get(stage));
    }
}

#[test]
fn test_dispensing_headcount_for_six_batches_over_two_days() {
    // 6 批 / 2 天: 每天 1 个班次（3 批），称量间 6 人/班
    let aggregator = StageAggregator::new(Arc::new(GoodLpSolver::new()));
    let result = aggregator
        .solve_stage(StageKind::Dispensing, 6, &params(2))
        .unwrap();

    assert_eq!(result.min_headcount, 6);
    assert_eq!(result.final_batches, 6);
    assert_eq!(result.days_used, 2);
}

#[test]
fn test_buffer_applies_per_stage_before_summing() {
    let aggregator = StageAggregator::new(Arc::new(GoodLpSolver::new()));
    let combined = aggregator
        .aggregate(&StageDemand::uniform(3), &params(1).with_buffer_ratio(0.15))
        .unwrap();

    for stage in combined.stages() {
        let expected = (f64::from(stage.min_headcount) * (1.0 + 0.15) - 1e-9).ceil() as u32;
        assert_eq!(stage.headcount_with_buffer, expected);
    }
}

#[test]
fn test_first_infeasible_stage_stops_aggregation() {
    let solver = CountingSolver::new();
    let aggregator = StageAggregator::new(Arc::clone(&solver));

    let p = params(3).with_machines(MachineSelection::none());
    let err = aggregator.aggregate(&StageDemand::uniform(3), &p).unwrap_err();

    match err {
        PlanningError::StageInfeasible { stage, source } => {
            assert_eq!(stage, StageKind::Tableting);
            assert!(source.is_structural());
        }
        other => panic!("unexpected: {:?}", other),
    }
    // 称量、制粒已求解，包衣未求解
    assert_eq!(solver.calls(), 2);
}

#[test]
fn test_invalid_params_rejected_before_solving() {
    let solver = RefusingSolver::new();
    let aggregator = StageAggregator::new(Arc::clone(&solver));

    let err = aggregator
        .aggregate(&StageDemand::uniform(3), &params(0))
        .unwrap_err();
    assert!(matches!(err, PlanningError::InvalidParameter(_)));

    let err = aggregator
        .aggregate(&StageDemand::uniform(3), &params(2).with_buffer_ratio(-0.1))
        .unwrap_err();
    assert!(matches!(err, PlanningError::InvalidParameter(_)));

    assert_eq!(solver.calls(), 0);
}

#[test]
fn test_missing_stage_catalog_is_reported() {
    let standard = CapacityCatalog::standard();
    let partial: Vec<StageCatalog> = standard
        .stages()
        .iter()
        .filter(|s| s.stage != StageKind::Coating)
        .cloned()
        .collect();

    let aggregator = StageAggregator::new(Arc::new(GoodLpSolver::new()))
        .with_catalog(CapacityCatalog::new(partial));
    let err = aggregator
        .aggregate(&StageDemand::uniform(0), &params(1))
        .unwrap_err();

    assert_eq!(err, PlanningError::MissingStageCatalog(StageKind::Coating));
}

#[test]
fn test_day_linking_modes_agree_on_headcount() {
    let demand = StageDemand::uniform(4);
    let per_activation = StageAggregator::new(Arc::new(GoodLpSolver::new()))
        .aggregate(&demand, &params(2))
        .unwrap();
    let aggregated = StageAggregator::new(Arc::new(GoodLpSolver::new()))
        .with_day_linking(DayLinking::Aggregated)
        .aggregate(&demand, &params(2))
        .unwrap();

    assert_eq!(
        per_activation.total_min_headcount,
        aggregated.total_min_headcount
    );
}

// ==========================================
// 默认配置规模（30 天 / 50 批）
// ==========================================

#[test]
fn test_default_config_scale_solves_within_bound() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let params = manager.get_default_params().unwrap();
    let solver_config = manager.get_solver_config().unwrap();
    assert_eq!(params.num_workdays, defaults::WORKDAYS);

    let solver = CountingSolver::new();
    let aggregator =
        StageAggregator::new(Arc::clone(&solver)).with_solver_config(solver_config);

    let started = Instant::now();
    let combined = aggregator
        .aggregate(&StageDemand::uniform(defaults::TOTAL_BATCHES), &params)
        .expect("默认规模应可行");
    let elapsed = started.elapsed();

    // 称量/制粒: 每天一个班次即可 (17 班次 ≤ 22 个工作日)，6 人
    // 压片: 只开 P3090i，每天一个班次，3 人
    // 包衣: 配液 13 + 包衣 25 个班次 > 30 天，每天两个班次，4 人
    assert_eq!(combined.dispensing.min_headcount, 6);
    assert_eq!(combined.granulation.min_headcount, 6);
    assert_eq!(combined.tableting.min_headcount, 3);
    assert_eq!(combined.coating.min_headcount, 4);
    assert_eq!(combined.total_min_headcount, 19);
    for stage in combined.stages() {
        assert!(stage.final_batches >= defaults::TOTAL_BATCHES);
    }
    assert_eq!(solver.calls(), 4);
    assert!(
        elapsed < Duration::from_secs(60),
        "默认规模求解耗时 {:?}",
        elapsed
    );
}
