// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{TimeZone, Utc};
use duet::application::LedgerService;
use duet::domain::{
    CategoryAnalysisMap, CategoryData, DailyTransaction, DailyTransactionsMap, FinancialData,
    MonthlySummary, Won, YearMonth,
};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

pub fn period(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

/// Build a ledger from (day, income, expense) and (category, amount, percentage) rows
pub fn ledger(
    summary: (Won, Won, Won),
    days: &[(&str, Won, Won)],
    categories: &[(&str, Won, f64)],
) -> FinancialData {
    let daily_transactions: DailyTransactionsMap = days
        .iter()
        .map(|(day, income, expense)| (day.to_string(), DailyTransaction::new(*income, *expense)))
        .collect();
    let category_analysis: CategoryAnalysisMap = categories
        .iter()
        .map(|(name, amount, pct)| (name.to_string(), CategoryData::new(*amount, *pct)))
        .collect();

    FinancialData {
        summary: MonthlySummary::new(summary.0, summary.1, summary.2),
        daily_transactions,
        category_analysis,
        uploaded_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
        recognition_method: "gpt-vision".into(),
    }
}

/// Test fixture: two paired users
pub struct Couple;

impl Couple {
    /// Create "minji" and "junho" and pair them
    pub async fn create(service: &LedgerService) -> Result<()> {
        service.create_user("minji".into(), None).await?;
        service
            .create_user("junho".into(), Some("https://example.com/junho.png".into()))
            .await?;
        service.link_couple("minji", "junho").await?;
        Ok(())
    }

    /// January 2025 ledger for minji
    pub fn minji_january() -> FinancialData {
        ledger(
            (3000000, 1200000, 1800000),
            &[("1", 0, 15000), ("25", 3000000, 0)],
            &[("식비", 300000, 60.0), ("주거", 200000, 40.0)],
        )
    }

    /// January 2025 ledger for junho
    pub fn junho_january() -> FinancialData {
        ledger(
            (2500000, 900000, 1600000),
            &[("1", 0, 9000), ("2", 500000, 0)],
            &[("식비", 200000, 66.7), ("교통", 100000, 33.3)],
        )
    }
}
