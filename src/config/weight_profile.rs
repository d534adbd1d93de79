use crate::domain::params::ObjectiveWeights;
use serde::{Deserialize, Serialize};

/// 目标权重方案（持久化对象）
///
/// 存储位置：config_kv（scope_id='global'，key='weight_profile/{profile_id}'）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// 方案 ID（用于选择/引用）
    pub profile_id: String,

    /// 显示名称
    pub title: String,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 权重（缺省字段取默认权重）
    #[serde(default)]
    pub weights: ObjectiveWeights,
}

impl WeightProfile {
    pub fn new(profile_id: impl Into<String>, title: impl Into<String>, weights: ObjectiveWeights) -> Self {
        Self {
            profile_id: profile_id.into(),
            title: title.into(),
            description: None,
            weights,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.profile_id.trim().is_empty() {
            return Err("权重方案 ID 不能为空".to_string());
        }
        self.weights.validate()
    }
}
