use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{deserialize_won, Won};

/// Totals for one month of one ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    #[serde(default, deserialize_with = "deserialize_won")]
    pub total_income: Won,
    #[serde(default, deserialize_with = "deserialize_won")]
    pub total_expense: Won,
    #[serde(default, deserialize_with = "deserialize_won")]
    pub net_income: Won,
}

impl MonthlySummary {
    pub fn new(total_income: Won, total_expense: Won, net_income: Won) -> Self {
        Self {
            total_income,
            total_expense,
            net_income,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single line item read off a calendar cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(deserialize_with = "deserialize_won")]
    pub amount: Won,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Income and expense booked on one day of the month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTransaction {
    #[serde(default, deserialize_with = "deserialize_won")]
    pub income: Won,
    #[serde(default, deserialize_with = "deserialize_won")]
    pub expense: Won,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionItem>,
}

impl DailyTransaction {
    pub fn new(income: Won, expense: Won) -> Self {
        Self {
            income,
            expense,
            transactions: Vec::new(),
        }
    }
}

/// Day of month ("1".."31") to that day's totals.
pub type DailyTransactionsMap = BTreeMap<String, DailyTransaction>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(default, deserialize_with = "deserialize_won")]
    pub amount: Won,
    #[serde(default)]
    pub percentage: f64,
}

impl CategoryData {
    pub fn new(amount: Won, percentage: f64) -> Self {
        Self { amount, percentage }
    }
}

/// Spending category name to amount and share of the month's spending.
pub type CategoryAnalysisMap = BTreeMap<String, CategoryData>;

/// One user's ledger for one month, as produced by the recognition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    pub summary: MonthlySummary,
    #[serde(default)]
    pub daily_transactions: DailyTransactionsMap,
    #[serde(default)]
    pub category_analysis: CategoryAnalysisMap,
    pub uploaded_at: DateTime<Utc>,
    pub recognition_method: String,
}

/// The couple-level view of a month. Derived on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedFinancialData {
    pub summary: MonthlySummary,
    pub daily_transactions: DailyTransactionsMap,
    pub category_analysis: CategoryAnalysisMap,
}

/// Days in calendar order. Keys that are not day numbers sort last, by text.
pub fn days_in_order(daily: &DailyTransactionsMap) -> Vec<(&str, &DailyTransaction)> {
    let mut days: Vec<(&str, &DailyTransaction)> =
        daily.iter().map(|(day, tx)| (day.as_str(), tx)).collect();
    days.sort_by(|(a, _), (b, _)| {
        let key = |s: &str| s.trim().parse::<u32>().unwrap_or(u32::MAX);
        key(a).cmp(&key(b)).then_with(|| a.cmp(b))
    });
    days
}

/// Categories by amount, largest first; ties broken by name.
pub fn categories_by_amount(categories: &CategoryAnalysisMap) -> Vec<(&str, &CategoryData)> {
    let mut sorted: Vec<(&str, &CategoryData)> = categories
        .iter()
        .map(|(name, data)| (name.as_str(), data))
        .collect();
    sorted.sort_by(|(a_name, a), (b_name, b)| b.amount.cmp(&a.amount).then_with(|| a_name.cmp(b_name)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financial_data_reads_pipeline_json() {
        let json = r#"{
            "summary": { "totalIncome": 3000000, "totalExpense": 1200000, "netIncome": 1800000 },
            "dailyTransactions": {
                "1": { "income": 0, "expense": 15000 },
                "25": { "income": 3000000, "expense": 0,
                        "transactions": [{ "amount": 3000000, "type": "income", "memo": "급여" }] }
            },
            "categoryAnalysis": { "식비": { "amount": 300000, "percentage": 25.0 } },
            "uploadedAt": "2025-01-31T09:00:00Z",
            "recognitionMethod": "gpt-vision"
        }"#;

        let data: FinancialData = serde_json::from_str(json).unwrap();
        assert_eq!(data.summary.total_income, 3000000);
        assert_eq!(data.daily_transactions["1"], DailyTransaction::new(0, 15000));
        assert_eq!(data.daily_transactions["25"].transactions.len(), 1);
        assert_eq!(
            data.daily_transactions["25"].transactions[0].kind,
            TransactionKind::Income
        );
        assert_eq!(data.category_analysis["식비"].amount, 300000);
        assert_eq!(data.recognition_method, "gpt-vision");
    }

    #[test]
    fn test_missing_day_values_default_to_zero() {
        let day: DailyTransaction = serde_json::from_str(r#"{ "expense": 9000 }"#).unwrap();
        assert_eq!(day, DailyTransaction::new(0, 9000));
    }

    #[test]
    fn test_combined_serializes_camel_case() {
        let combined = CombinedFinancialData::default();
        let value = serde_json::to_value(&combined).unwrap();
        assert_eq!(value["summary"]["totalIncome"], 0);
        assert!(value["dailyTransactions"].as_object().unwrap().is_empty());
        assert!(value["categoryAnalysis"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_days_in_order_is_numeric() {
        let mut daily = DailyTransactionsMap::new();
        for day in ["10", "2", "1", "31"] {
            daily.insert(day.to_string(), DailyTransaction::new(0, 1));
        }
        let order: Vec<&str> = days_in_order(&daily).into_iter().map(|(d, _)| d).collect();
        assert_eq!(order, vec!["1", "2", "10", "31"]);
    }

    #[test]
    fn test_categories_by_amount() {
        let mut categories = CategoryAnalysisMap::new();
        categories.insert("교통".into(), CategoryData::new(100000, 0.0));
        categories.insert("식비".into(), CategoryData::new(500000, 0.0));
        categories.insert("문화".into(), CategoryData::new(100000, 0.0));

        let order: Vec<&str> = categories_by_amount(&categories)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(order, vec!["식비", "교통", "문화"]);
    }
}
