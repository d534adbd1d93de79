// ==========================================
// 口服固体制剂排班优化系统 - CSV 导出
// ==========================================
// 汇总结果: 每个工序一行 + 合计行
// 方案对比: 每个方案一行
// ==========================================

use crate::api::error::ApiResult;
use crate::api::planning_api::ScenarioComparisonRow;
use crate::domain::schedule::CombinedResult;
use csv::Writer;
use std::io::Write;

const COMBINED_HEADER: &[&str] = &[
    "stage",
    "batches_required",
    "final_batches",
    "pct_demand_completed",
    "min_headcount",
    "headcount_with_buffer",
    "days_used",
    "morning_shifts",
    "evening_shifts",
    "night_shifts",
];

const COMPARISON_HEADER: &[&str] = &[
    "scenario_id",
    "mode",
    "label",
    "created_at",
    "staff_required",
    "staff_with_buffer",
    "days_used",
    "batches_produced",
];

/// 导出四工序汇总结果
pub fn write_combined_csv<W: Write>(combined: &CombinedResult, writer: W) -> ApiResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(COMBINED_HEADER)?;

    for stage in combined.stages() {
        let shifts = stage.shift_totals();
        wtr.write_record(&[
            stage.stage.to_string(),
            stage.batches_required.to_string(),
            stage.final_batches.to_string(),
            format!("{:.1}", stage.pct_demand_completed),
            stage.min_headcount.to_string(),
            stage.headcount_with_buffer.to_string(),
            stage.days_used.to_string(),
            shifts.morning.to_string(),
            shifts.evening.to_string(),
            shifts.night.to_string(),
        ])?;
    }

    wtr.write_record(&[
        "TOTAL".to_string(),
        String::new(),
        combined.total_batches_produced().to_string(),
        String::new(),
        combined.total_min_headcount.to_string(),
        combined.total_headcount_with_buffer.to_string(),
        combined.max_days_used().to_string(),
        String::new(),
        String::new(),
        String::new(),
    ])?;

    wtr.flush()?;
    Ok(())
}

/// 导出方案对比
pub fn write_comparison_csv<W: Write>(rows: &[ScenarioComparisonRow], writer: W) -> ApiResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(COMPARISON_HEADER)?;

    for row in rows {
        wtr.write_record(&[
            row.scenario_id.clone(),
            row.mode.to_string(),
            row.label.clone().unwrap_or_default(),
            row.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.summary.staff_required.to_string(),
            row.summary.staff_with_buffer.to_string(),
            row.summary.days_used.to_string(),
            row.summary.batches_produced.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// 导出为字符串（CLI 输出使用）
pub fn combined_to_csv_string(combined: &CombinedResult) -> ApiResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_combined_csv(combined, &mut buf)?;
    String::from_utf8(buf).map_err(|e| crate::api::error::ApiError::ExportError(e.to_string()))
}

pub fn comparison_to_csv_string(rows: &[ScenarioComparisonRow]) -> ApiResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_comparison_csv(rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| crate::api::error::ApiError::ExportError(e.to_string()))
}
