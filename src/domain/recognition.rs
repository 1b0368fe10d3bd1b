//! Turning screenshot-recognition output into a monthly ledger.
//!
//! The recognizer reads two kinds of banking-app screens: the monthly
//! calendar (daily totals and a summary) and the spending analysis (category
//! breakdown). Either may be missing. Both may or may not state the month
//! they show, so the caller can supply a fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    deserialize_won, CategoryAnalysisMap, DailyTransactionsMap, FinancialData, MonthlySummary,
    PeriodError, Won, YearMonth,
};

/// What the recognizer read off a calendar screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarImageResult {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    pub daily_transactions: DailyTransactionsMap,
    pub summary: MonthlySummary,
}

/// What the recognizer read off a spending-analysis screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisImageResult {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_won")]
    pub total_expense: Won,
    pub category_analysis: CategoryAnalysisMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    NoResults,
    MissingMonth { screen: &'static str },
    UnresolvedPeriod,
    InvalidPeriod(PeriodError),
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionError::NoResults => write!(f, "no recognition results given"),
            RecognitionError::MissingMonth { screen } => {
                write!(f, "{} result does not state a month", screen)
            }
            RecognitionError::UnresolvedPeriod => {
                write!(f, "could not determine the year and month of the screenshots")
            }
            RecognitionError::InvalidPeriod(e) => write!(f, "recognized {}", e),
        }
    }
}

impl std::error::Error for RecognitionError {}

/// Combine calendar and analysis results into one ledger for one month.
///
/// The period is taken from the calendar, then the analysis, then the
/// fallback, skipping zero values. Without a calendar the summary only knows
/// the analysis screen's total expense.
pub fn assemble_financial_data(
    calendar: Option<&CalendarImageResult>,
    analysis: Option<&AnalysisImageResult>,
    fallback_year: Option<i32>,
    fallback_month: Option<u32>,
    recognition_method: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<(YearMonth, FinancialData), RecognitionError> {
    if calendar.is_none() && analysis.is_none() {
        return Err(RecognitionError::NoResults);
    }
    if calendar.is_some_and(|c| !states_month(c.month)) {
        return Err(RecognitionError::MissingMonth { screen: "calendar" });
    }
    if analysis.is_some_and(|a| !states_month(a.month)) {
        return Err(RecognitionError::MissingMonth { screen: "analysis" });
    }

    let year = calendar
        .and_then(|c| c.year)
        .filter(|y| *y != 0)
        .or_else(|| analysis.and_then(|a| a.year).filter(|y| *y != 0))
        .or_else(|| fallback_year.filter(|y| *y != 0));
    let month = calendar
        .and_then(|c| c.month)
        .filter(|m| *m != 0)
        .or_else(|| analysis.and_then(|a| a.month).filter(|m| *m != 0))
        .or_else(|| fallback_month.filter(|m| *m != 0));

    let (Some(year), Some(month)) = (year, month) else {
        return Err(RecognitionError::UnresolvedPeriod);
    };
    let period = YearMonth::new(year, month).map_err(RecognitionError::InvalidPeriod)?;

    let summary = match (calendar, analysis) {
        (Some(c), _) => c.summary,
        (None, Some(a)) => MonthlySummary::new(0, a.total_expense, 0),
        (None, None) => MonthlySummary::default(),
    };

    let data = FinancialData {
        summary,
        daily_transactions: calendar
            .map(|c| c.daily_transactions.clone())
            .unwrap_or_default(),
        category_analysis: analysis
            .map(|a| a.category_analysis.clone())
            .unwrap_or_default(),
        uploaded_at,
        recognition_method: recognition_method.to_string(),
    };

    Ok((period, data))
}

fn states_month(month: Option<u32>) -> bool {
    month.is_some_and(|m| m != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryData, DailyTransaction};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap()
    }

    fn calendar(year: Option<i32>, month: Option<u32>) -> CalendarImageResult {
        let mut daily = DailyTransactionsMap::new();
        daily.insert("1".into(), DailyTransaction::new(0, 15000));
        daily.insert("25".into(), DailyTransaction::new(3000000, 0));
        CalendarImageResult {
            year,
            month,
            daily_transactions: daily,
            summary: MonthlySummary::new(3000000, 15000, 2985000),
        }
    }

    fn analysis(year: Option<i32>, month: Option<u32>) -> AnalysisImageResult {
        let mut categories = CategoryAnalysisMap::new();
        categories.insert("식비".into(), CategoryData::new(15000, 100.0));
        AnalysisImageResult {
            year,
            month,
            total_expense: 15000,
            category_analysis: categories,
        }
    }

    #[test]
    fn test_calendar_and_analysis_combined() {
        let cal = calendar(Some(2025), Some(1));
        let ana = analysis(Some(2025), Some(1));

        let (period, data) =
            assemble_financial_data(Some(&cal), Some(&ana), None, None, "gpt-vision", now())
                .unwrap();

        assert_eq!(period, YearMonth::new(2025, 1).unwrap());
        assert_eq!(data.summary, cal.summary);
        assert_eq!(data.daily_transactions, cal.daily_transactions);
        assert_eq!(data.category_analysis, ana.category_analysis);
        assert_eq!(data.uploaded_at, now());
        assert_eq!(data.recognition_method, "gpt-vision");
    }

    #[test]
    fn test_analysis_only_summary_uses_total_expense() {
        let ana = analysis(Some(2025), Some(3));

        let (_, data) =
            assemble_financial_data(None, Some(&ana), None, None, "gpt-vision", now()).unwrap();

        assert_eq!(data.summary, MonthlySummary::new(0, 15000, 0));
        assert!(data.daily_transactions.is_empty());
        assert_eq!(data.category_analysis.len(), 1);
    }

    #[test]
    fn test_year_falls_back_in_order() {
        let cal = calendar(None, Some(4));
        let ana = analysis(Some(2024), Some(4));

        let (period, _) =
            assemble_financial_data(Some(&cal), Some(&ana), Some(2023), None, "m", now()).unwrap();
        assert_eq!(period, YearMonth::new(2024, 4).unwrap());

        let cal = calendar(Some(0), Some(4));
        let (period, _) =
            assemble_financial_data(Some(&cal), None, Some(2023), None, "m", now()).unwrap();
        assert_eq!(period, YearMonth::new(2023, 4).unwrap());
    }

    #[test]
    fn test_recognized_month_wins_over_fallback() {
        let cal = calendar(Some(2025), Some(6));

        let (period, _) =
            assemble_financial_data(Some(&cal), None, Some(2020), Some(1), "m", now()).unwrap();

        assert_eq!(period, YearMonth::new(2025, 6).unwrap());
    }

    #[test]
    fn test_missing_month_rejected() {
        let cal = calendar(Some(2025), None);
        assert_eq!(
            assemble_financial_data(Some(&cal), None, Some(2025), Some(1), "m", now()),
            Err(RecognitionError::MissingMonth { screen: "calendar" })
        );

        let ana = analysis(Some(2025), Some(0));
        assert_eq!(
            assemble_financial_data(None, Some(&ana), Some(2025), Some(1), "m", now()),
            Err(RecognitionError::MissingMonth { screen: "analysis" })
        );
    }

    #[test]
    fn test_unresolved_year() {
        let cal = calendar(None, Some(5));
        assert_eq!(
            assemble_financial_data(Some(&cal), None, None, None, "m", now()),
            Err(RecognitionError::UnresolvedPeriod)
        );
    }

    #[test]
    fn test_nothing_to_assemble() {
        assert_eq!(
            assemble_financial_data(None, None, Some(2025), Some(1), "m", now()),
            Err(RecognitionError::NoResults)
        );
    }

    #[test]
    fn test_out_of_range_month() {
        let cal = calendar(Some(2025), Some(13));
        assert_eq!(
            assemble_financial_data(Some(&cal), None, None, None, "m", now()),
            Err(RecognitionError::InvalidPeriod(PeriodError::InvalidMonth(13)))
        );
    }

    #[test]
    fn test_reads_recognizer_json() {
        let json = r#"{
            "year": null,
            "month": 12,
            "totalExpense": 600000,
            "categoryAnalysis": {
                "식비": { "amount": 500000, "percentage": 83.3 },
                "교통": { "amount": 100000, "percentage": 16.7 }
            }
        }"#;

        let result: AnalysisImageResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.year, None);
        assert_eq!(result.month, Some(12));
        assert_eq!(result.category_analysis["교통"].amount, 100000);
    }
}
