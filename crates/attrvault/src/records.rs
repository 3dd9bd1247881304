//! Record kinds and their default role templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// The kinds of record a vault stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    HealthRecord,
    MedicineRecord,
    FinancialRecord,
    ResearchRecord,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::HealthRecord,
        RecordKind::MedicineRecord,
        RecordKind::FinancialRecord,
        RecordKind::ResearchRecord,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKind::HealthRecord => "health_record",
            RecordKind::MedicineRecord => "medicine_record",
            RecordKind::FinancialRecord => "financial_record",
            RecordKind::ResearchRecord => "research_record",
        }
    }

    /// Roles that may read this kind of record unless configured otherwise.
    pub const fn required_roles(&self) -> &'static [&'static str] {
        match self {
            RecordKind::HealthRecord => &["doctor", "nurse", "patient"],
            RecordKind::MedicineRecord => &["doctor", "pharmacist", "patient"],
            RecordKind::FinancialRecord => &["financial"],
            RecordKind::ResearchRecord => &["doctor", "researcher"],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| VaultError::UnknownRecordKind(s.to_string()))
    }
}
