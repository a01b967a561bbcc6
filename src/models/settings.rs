use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierThresholds {
    pub hours: f64,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub buffer_minutes: i64,
    pub overloaded: TierThresholds,
    pub high: TierThresholds,
    pub medium: TierThresholds,
    pub underutilized_hours: f64,
    pub low_enrollment_ratio: f64,
    pub critical_enrollment_ratio: f64,
    pub workload_reduction_per_finding: f64,
    pub balance_improvement_per_finding: f64,
    pub utilization_divisor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            buffer_minutes: 30,
            overloaded: TierThresholds {
                hours: 30.0,
                students: 50,
            },
            high: TierThresholds {
                hours: 20.0,
                students: 30,
            },
            medium: TierThresholds {
                hours: 10.0,
                students: 15,
            },
            underutilized_hours: 5.0,
            low_enrollment_ratio: 0.30,
            critical_enrollment_ratio: 0.20,
            workload_reduction_per_finding: 15.0,
            balance_improvement_per_finding: 20.0,
            utilization_divisor: 10.0,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateInput {
    #[serde(default)]
    pub buffer_minutes: Option<i64>,
    #[serde(default)]
    pub overloaded: Option<TierThresholds>,
    #[serde(default)]
    pub high: Option<TierThresholds>,
    #[serde(default)]
    pub medium: Option<TierThresholds>,
    #[serde(default)]
    pub underutilized_hours: Option<f64>,
    #[serde(default)]
    pub low_enrollment_ratio: Option<f64>,
    #[serde(default)]
    pub critical_enrollment_ratio: Option<f64>,
}
