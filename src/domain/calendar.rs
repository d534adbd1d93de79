// ==========================================
// 口服固体制剂排班优化系统 - 排产周期
// ==========================================
// 日序号 0..num_workdays-1，第 0 天为周一
// 周末判定: d mod 7 ∈ {5, 6}，所有工序共用同一判定
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningHorizon {
    num_workdays: u32,
}

impl PlanningHorizon {
    pub fn new(num_workdays: u32) -> Self {
        Self { num_workdays }
    }

    pub fn num_workdays(&self) -> u32 {
        self.num_workdays
    }

    pub fn days(&self) -> impl Iterator<Item = u32> {
        0..self.num_workdays
    }

    /// 是否周末（周六/周日）
    pub fn is_weekend(day: u32) -> bool {
        matches!(day % 7, 5 | 6)
    }

    pub fn weekend_days(&self) -> Vec<u32> {
        self.days().filter(|d| Self::is_weekend(*d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekend_days_for_two_weeks() {
        let horizon = PlanningHorizon::new(14);
        assert_eq!(horizon.weekend_days(), vec![5, 6, 12, 13]);
    }

    #[test]
    fn test_short_horizon_has_no_weekend() {
        assert!(PlanningHorizon::new(5).weekend_days().is_empty());
        assert_eq!(PlanningHorizon::new(0).days().count(), 0);
    }
}
