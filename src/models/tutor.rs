use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TutorStatus {
    #[default]
    Active,
    Inactive,
}

impl TutorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TutorStatus::Active => "active",
            TutorStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for TutorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tutor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: TutorStatus,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl Tutor {
    pub fn is_active(&self) -> bool {
        self.status == TutorStatus::Active
    }
}
