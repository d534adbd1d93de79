// ==========================================
// 口服固体制剂排班优化系统 - 排班参数
// ==========================================
// 目标权重顺序体现计划优先级:
//   人数(≈100) > 夜班/周末 > 占用天数 > 早/中班偏好
// ==========================================

use crate::domain::capacity::MachineSelection;
use crate::domain::types::StageKind;
use serde::{Deserialize, Serialize};

// ==========================================
// ObjectiveWeights - 目标函数权重
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub staff: f64,     // 人数
    pub morning: f64,   // 早班开动次数
    pub evening: f64,   // 中班开动次数
    pub night: f64,     // 夜班开动次数
    pub weekend: f64,   // 周末开动次数
    pub days_used: f64, // 占用天数
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            staff: 100.0,
            morning: 0.0,
            evening: 0.1,
            night: 2.0,
            weekend: 3.0,
            days_used: 1.0,
        }
    }
}

impl ObjectiveWeights {
    /// 校验权重（有限且非负）
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("staff", self.staff),
            ("morning", self.morning),
            ("evening", self.evening),
            ("night", self.night),
            ("weekend", self.weekend),
            ("days_used", self.days_used),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("权重 {} 必须为非负有限数, 实际为 {}", name, value));
            }
        }
        Ok(())
    }
}

// ==========================================
// PlanningParams - 四工序共享参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningParams {
    pub num_workdays: u32,
    /// 人员富余比例（建议 0.0 ~ 0.3，不做硬性限制）
    pub buffer_ratio: f64,
    pub weights: ObjectiveWeights,
    pub machines: MachineSelection,
}

impl PlanningParams {
    pub fn new(num_workdays: u32) -> Self {
        Self {
            num_workdays,
            buffer_ratio: 0.0,
            weights: ObjectiveWeights::default(),
            machines: MachineSelection::default(),
        }
    }

    pub fn with_buffer_ratio(mut self, buffer_ratio: f64) -> Self {
        self.buffer_ratio = buffer_ratio;
        self
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_machines(mut self, machines: MachineSelection) -> Self {
        self.machines = machines;
        self
    }

    /// 同参数换周期（搜索算法逐步调整周期时使用）
    pub fn with_workdays(mut self, num_workdays: u32) -> Self {
        self.num_workdays = num_workdays;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_workdays == 0 {
            return Err("排产周期至少为 1 天".to_string());
        }
        if !self.buffer_ratio.is_finite() || self.buffer_ratio < 0.0 {
            return Err(format!(
                "人员富余比例必须为非负有限数, 实际为 {}",
                self.buffer_ratio
            ));
        }
        self.weights.validate()
    }
}

// ==========================================
// StageDemand - 各工序需求批次
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageDemand {
    pub dispensing: u32,
    pub granulation: u32,
    pub tableting: u32,
    pub coating: u32,
}

impl StageDemand {
    /// 四工序相同需求（总批次目标）
    pub fn uniform(batches: u32) -> Self {
        Self {
            dispensing: batches,
            granulation: batches,
            tableting: batches,
            coating: batches,
        }
    }

    pub fn get(&self, stage: StageKind) -> u32 {
        match stage {
            StageKind::Dispensing => self.dispensing,
            StageKind::Granulation => self.granulation,
            StageKind::Tableting => self.tableting,
            StageKind::Coating => self.coating,
        }
    }
}

/// 计算含富余的人数: ceil(min_headcount × (1 + buffer_ratio))
///
/// 与直接对浮点乘积取整的结果有意不同: 乘积可能带 11.000000000000002 这类误差，
/// 直接取整会多算 1 人（如 10 × 1.1 得 12），这里取整前扣除 1e-9，按精确值 11 计。
/// 真实乘积与整数的差距远大于 1e-9，其余情况与直接取整一致。
pub fn apply_buffer(min_headcount: u32, buffer_ratio: f64) -> u32 {
    let raw = f64::from(min_headcount) * (1.0 + buffer_ratio);
    let buffered = (raw - 1e-9).ceil();
    if buffered <= 0.0 || !buffered.is_finite() {
        return 0;
    }
    buffered as u32
}
