// ==========================================
// 口服固体制剂排班优化系统 - 排班结果
// ==========================================
// 所有结果对象构造后只读；每次汇总调用重新生成
// ==========================================

use crate::domain::types::{Machine, ProcessStep, Shift, SolveStatus, StageKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftCounts - 各班次开动次数（周期内合计）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftCounts {
    pub morning: u32,
    pub evening: u32,
    pub night: u32,
}

impl ShiftCounts {
    pub fn get(&self, shift: Shift) -> u32 {
        match shift {
            Shift::Morning => self.morning,
            Shift::Evening => self.evening,
            Shift::Night => self.night,
        }
    }

    pub fn add(&mut self, shift: Shift, count: u32) {
        match shift {
            Shift::Morning => self.morning += count,
            Shift::Evening => self.evening += count,
            Shift::Night => self.night += count,
        }
    }

    pub fn total(&self) -> u32 {
        self.morning + self.evening + self.night
    }
}

/// 单个资源的使用情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub machine: Machine,
    pub step: ProcessStep,
    pub shifts: ShiftCounts,
    pub batches_produced: u32,
}

/// 单个工步的产出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub step: ProcessStep,
    pub batches_produced: u32,
}

/// 某一天的开动明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAssignment {
    pub day: u32,
    pub is_weekend: bool,
    pub activations: Vec<(Machine, Shift)>,
    /// 当天三个班次人数之和（班次间人员不复用）
    pub staff_required: u32,
}

// ==========================================
// StageResult - 单工序排班结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageKind,
    pub batches_required: u32,
    pub resources: Vec<ResourceUsage>,
    pub step_outputs: Vec<StepOutput>,
    /// 成品批次 = 各工步产出的最小值
    pub final_batches: u32,
    pub pct_demand_completed: f64,
    pub min_headcount: u32,
    pub headcount_with_buffer: u32,
    pub days_used: u32,
    pub num_workdays: u32,
    pub solver_status: SolveStatus,
    pub objective_value: f64,
    pub schedule: Vec<DayAssignment>,
}

impl StageResult {
    /// 合计各班次开动次数（所有资源）
    pub fn shift_totals(&self) -> ShiftCounts {
        let mut totals = ShiftCounts::default();
        for usage in &self.resources {
            for shift in Shift::ALL {
                totals.add(shift, usage.shifts.get(shift));
            }
        }
        totals
    }

    pub fn resource(&self, machine: Machine) -> Option<&ResourceUsage> {
        self.resources.iter().find(|r| r.machine == machine)
    }

    pub fn step_output(&self, step: ProcessStep) -> Option<u32> {
        self.step_outputs
            .iter()
            .find(|o| o.step == step)
            .map(|o| o.batches_produced)
    }
}

// ==========================================
// CombinedResult - 四工序汇总
// ==========================================
// 各工序独立优化后人数直接相加（不做跨工序人员共享）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub num_workdays: u32,
    pub dispensing: StageResult,
    pub granulation: StageResult,
    pub tableting: StageResult,
    pub coating: StageResult,
    pub total_min_headcount: u32,
    pub total_headcount_with_buffer: u32,
}

impl CombinedResult {
    pub fn new(
        num_workdays: u32,
        dispensing: StageResult,
        granulation: StageResult,
        tableting: StageResult,
        coating: StageResult,
    ) -> Self {
        let stages = [&dispensing, &granulation, &tableting, &coating];
        let total_min_headcount: u32 = stages.iter().map(|s| s.min_headcount).sum();
        let total_headcount_with_buffer: u32 = stages.iter().map(|s| s.headcount_with_buffer).sum();

        Self {
            num_workdays,
            dispensing,
            granulation,
            tableting,
            coating,
            total_min_headcount,
            total_headcount_with_buffer,
        }
    }

    pub fn stage(&self, stage: StageKind) -> &StageResult {
        match stage {
            StageKind::Dispensing => &self.dispensing,
            StageKind::Granulation => &self.granulation,
            StageKind::Tableting => &self.tableting,
            StageKind::Coating => &self.coating,
        }
    }

    /// 按流水线顺序遍历
    pub fn stages(&self) -> impl Iterator<Item = &StageResult> {
        StageKind::ALL.into_iter().map(move |s| self.stage(s))
    }

    /// 最长占用天数（各工序取最大）
    pub fn max_days_used(&self) -> u32 {
        self.stages().map(|s| s.days_used).max().unwrap_or(0)
    }

    /// 各工序成品批次之和
    pub fn total_batches_produced(&self) -> u32 {
        self.stages().map(|s| s.final_batches).sum()
    }
}

// ==========================================
// HorizonPlan - 总批次目标下的周期搜索结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonPlan {
    pub total_batches: u32,
    pub combined: CombinedResult,
    /// 实际分配的周期天数（首个可行周期）
    pub workdays_allocated: u32,
    /// 考虑工序先后的完工天数估算（近似，非批次级关键路径）
    pub total_days_needed: u32,
    /// 尝试过的周期（按顺序）
    pub attempted_workdays: Vec<u32>,
}

// ==========================================
// ThroughputPlan - 固定周期下的最大产能
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputProbe {
    pub batches: u32,
    pub feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputPlan {
    pub num_workdays: u32,
    pub max_feasible_batches: u32,
    pub combined: CombinedResult,
    pub iterations: u32,
    pub probes: Vec<ThroughputProbe>,
}
