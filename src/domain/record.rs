use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FinancialData, UserId, YearMonth};

pub type RecordId = Uuid;

/// A stored monthly ledger. At most one exists per user and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub period: YearMonth,
    pub data: FinancialData,
    /// References to the screenshots the ledger was read from.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialRecord {
    pub fn new(user_id: UserId, period: YearMonth, data: FinancialData) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            period,
            data,
            image_urls: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_image_urls(mut self, image_urls: Vec<String>) -> Self {
        self.image_urls = image_urls;
        self
    }
}
