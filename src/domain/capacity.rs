// ==========================================
// 口服固体制剂排班优化系统 - 产能目录
// ==========================================
// 每个工序的静态资源表: {设备: 每班产出批次, 每班所需人数}
// 纯数据，不含求解逻辑
// ==========================================

use crate::domain::types::{Machine, ProcessStep, Shift, StageKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ResourceSpec - 资源（设备/子工序）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub machine: Machine,
    pub step: ProcessStep,        // 产出计入的工步
    pub batches_per_shift: u32,   // 每个开动班次的产出批次
    pub staff_per_shift: u32,     // 每个开动班次的人数
    pub toggleable: bool,         // 是否可由用户停用
}

impl ResourceSpec {
    pub const fn new(
        machine: Machine,
        step: ProcessStep,
        batches_per_shift: u32,
        staff_per_shift: u32,
        toggleable: bool,
    ) -> Self {
        Self {
            machine,
            step,
            batches_per_shift,
            staff_per_shift,
            toggleable,
        }
    }
}

// ==========================================
// MachineSelection - 设备启停开关
// ==========================================
// 只有可停用的设备受开关控制；称量间/制粒线/配液始终可用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSelection {
    pub p3030: bool,
    pub p3090i: bool,
    pub ima: bool,
    pub bosch: bool,
    pub glatt: bool,
}

impl Default for MachineSelection {
    fn default() -> Self {
        Self {
            p3030: true,
            p3090i: true,
            ima: true,
            bosch: true,
            glatt: true,
        }
    }
}

impl MachineSelection {
    /// 全部停用（用于结构性不可行的场景）
    pub fn none() -> Self {
        Self {
            p3030: false,
            p3090i: false,
            ima: false,
            bosch: false,
            glatt: false,
        }
    }

    pub fn is_enabled(&self, machine: Machine) -> bool {
        match machine {
            Machine::P3030 => self.p3030,
            Machine::P3090i => self.p3090i,
            Machine::Ima => self.ima,
            Machine::Bosch => self.bosch,
            Machine::Glatt => self.glatt,
            Machine::DispensingRoom | Machine::GranulationSuite | Machine::SolutionPrep => true,
        }
    }

    pub fn set(&mut self, machine: Machine, enabled: bool) {
        match machine {
            Machine::P3030 => self.p3030 = enabled,
            Machine::P3090i => self.p3090i = enabled,
            Machine::Ima => self.ima = enabled,
            Machine::Bosch => self.bosch = enabled,
            Machine::Glatt => self.glatt = enabled,
            Machine::DispensingRoom | Machine::GranulationSuite | Machine::SolutionPrep => {}
        }
    }
}

// ==========================================
// StageCatalog - 单工序资源表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCatalog {
    pub stage: StageKind,
    pub resources: Vec<ResourceSpec>,
}

impl StageCatalog {
    pub fn new(stage: StageKind, resources: Vec<ResourceSpec>) -> Self {
        Self { stage, resources }
    }

    /// 本工序涉及的工步（按首次出现顺序，去重）
    pub fn steps(&self) -> Vec<ProcessStep> {
        let mut steps = Vec::new();
        for r in &self.resources {
            if !steps.contains(&r.step) {
                steps.push(r.step);
            }
        }
        steps
    }

    /// 按开关过滤后的可用资源
    pub fn enabled_resources(&self, machines: &MachineSelection) -> Vec<ResourceSpec> {
        self.resources
            .iter()
            .filter(|r| !r.toggleable || machines.is_enabled(r.machine))
            .copied()
            .collect()
    }
}

// ==========================================
// Trait: ShiftCapacity
// ==========================================
// 用途: 快速可行性预检（闭式上界，不建模）
pub trait ShiftCapacity {
    /// 某工步在所有可用资源全班次开动时的日产出上限
    fn max_daily_output(&self, step: ProcessStep, machines: &MachineSelection) -> u32;

    /// 某工步是否至少有一个可用资源
    fn has_enabled_resource(&self, step: ProcessStep, machines: &MachineSelection) -> bool;
}

impl ShiftCapacity for StageCatalog {
    fn max_daily_output(&self, step: ProcessStep, machines: &MachineSelection) -> u32 {
        let per_shift: u32 = self
            .enabled_resources(machines)
            .iter()
            .filter(|r| r.step == step)
            .map(|r| r.batches_per_shift)
            .sum();
        per_shift * Shift::PER_DAY
    }

    fn has_enabled_resource(&self, step: ProcessStep, machines: &MachineSelection) -> bool {
        self.enabled_resources(machines)
            .iter()
            .any(|r| r.step == step)
    }
}

// ==========================================
// CapacityCatalog - 四工序产能目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityCatalog {
    stages: Vec<StageCatalog>,
}

impl CapacityCatalog {
    /// 由自定义资源表构造（每个工序必须且只能出现一次）
    pub fn new(stages: Vec<StageCatalog>) -> Self {
        Self { stages }
    }

    /// 标准产线
    ///
    /// - 称量: 1 个称量间，3 批/班，6 人/班（4 辅料 + 2 原料药）
    /// - 制粒: 粉碎/整粒/总混并行，3 批/班，6 人/班
    /// - 压片: P3030 1 批/班，P3090i 2 批/班，IMA 1 批/班，各 3 人/班
    /// - 包衣: 配液 4 批/班（2 小时/批），BOSCH/GLATT 各 2 批/班，均 2 人/班
    pub fn standard() -> Self {
        use crate::domain::types::Machine::*;
        use crate::domain::types::ProcessStep as P;

        Self::new(vec![
            StageCatalog::new(
                StageKind::Dispensing,
                vec![ResourceSpec::new(DispensingRoom, P::Dispensing, 3, 6, false)],
            ),
            StageCatalog::new(
                StageKind::Granulation,
                vec![ResourceSpec::new(GranulationSuite, P::Granulation, 3, 6, false)],
            ),
            StageCatalog::new(
                StageKind::Tableting,
                vec![
                    ResourceSpec::new(P3030, P::Tableting, 1, 3, true),
                    ResourceSpec::new(P3090i, P::Tableting, 2, 3, true),
                    ResourceSpec::new(Ima, P::Tableting, 1, 3, true),
                ],
            ),
            StageCatalog::new(
                StageKind::Coating,
                vec![
                    ResourceSpec::new(SolutionPrep, P::SolutionPreparation, 4, 2, false),
                    ResourceSpec::new(Bosch, P::Coating, 2, 2, true),
                    ResourceSpec::new(Glatt, P::Coating, 2, 2, true),
                ],
            ),
        ])
    }

    pub fn stage(&self, stage: StageKind) -> Option<&StageCatalog> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn stages(&self) -> &[StageCatalog] {
        &self.stages
    }
}

impl Default for CapacityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_all_stages() {
        let catalog = CapacityCatalog::standard();
        for stage in StageKind::ALL {
            assert!(catalog.stage(stage).is_some(), "缺少工序 {}", stage);
        }
    }

    #[test]
    fn test_max_daily_output_respects_toggles() {
        let catalog = CapacityCatalog::standard();
        let tableting = catalog.stage(StageKind::Tableting).unwrap();

        let all = MachineSelection::default();
        assert_eq!(tableting.max_daily_output(ProcessStep::Tableting, &all), 12);

        let mut no_p3090i = all;
        no_p3090i.p3090i = false;
        assert_eq!(tableting.max_daily_output(ProcessStep::Tableting, &no_p3090i), 6);
    }

    #[test]
    fn test_coating_has_two_steps_and_solution_is_always_enabled() {
        let catalog = CapacityCatalog::standard();
        let coating = catalog.stage(StageKind::Coating).unwrap();
        assert_eq!(
            coating.steps(),
            vec![ProcessStep::SolutionPreparation, ProcessStep::Coating]
        );

        let none = MachineSelection::none();
        assert!(coating.has_enabled_resource(ProcessStep::SolutionPreparation, &none));
        assert!(!coating.has_enabled_resource(ProcessStep::Coating, &none));
        assert_eq!(coating.max_daily_output(ProcessStep::SolutionPreparation, &none), 12);
    }
}
