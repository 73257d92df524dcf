//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use armas_core::workflow::ReportStatus as CoreReportStatus;

/// `report_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[sea_orm(string_value = "UPLOADED")]
    Uploaded,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "FINDINGS_SUBMITTED")]
    FindingsSubmitted,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl From<ReportStatus> for CoreReportStatus {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Uploaded => Self::Uploaded,
            ReportStatus::Assigned => Self::Assigned,
            ReportStatus::FindingsSubmitted => Self::FindingsSubmitted,
            ReportStatus::Approved => Self::Approved,
            ReportStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<CoreReportStatus> for ReportStatus {
    fn from(status: CoreReportStatus) -> Self {
        match status {
            CoreReportStatus::Uploaded => Self::Uploaded,
            CoreReportStatus::Assigned => Self::Assigned,
            CoreReportStatus::FindingsSubmitted => Self::FindingsSubmitted,
            CoreReportStatus::Approved => Self::Approved,
            CoreReportStatus::Rejected => Self::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_round_trips() {
        for core in CoreReportStatus::ALL {
            let db: ReportStatus = core.into();
            assert_eq!(CoreReportStatus::from(db), core);
            assert_eq!(db.to_value(), core.as_str());
        }
    }
}
