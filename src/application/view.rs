use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{CombinedFinancialData, FinancialData};

/// The couple's month: the merged ledger plus each partner's own ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyView {
    pub combined_data: CombinedFinancialData,
    /// Keyed by user ID. Only partners with a record for the month appear.
    pub individuals: BTreeMap<String, IndividualData>,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualData {
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub data: FinancialData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableMonths {
    /// "YYYY-MM", most recent first.
    pub available_months: Vec<String>,
}
