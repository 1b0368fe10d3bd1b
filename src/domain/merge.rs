//! Combining two partners' monthly ledgers into the couple view.
//!
//! Everything here is pure: inputs are borrowed, outputs are freshly built,
//! and nothing is validated. Whatever the recognition pipeline wrote flows
//! through as-is.

use std::collections::BTreeSet;

use super::{
    CategoryAnalysisMap, CategoryData, CombinedFinancialData, DailyTransaction,
    DailyTransactionsMap, FinancialData, MonthlySummary, Won,
};

/// Sum two daily series over the union of their days.
/// A day missing on one side counts as zero income and zero expense.
pub fn merge_daily_transactions(
    a: &DailyTransactionsMap,
    b: &DailyTransactionsMap,
) -> DailyTransactionsMap {
    let days: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    days.into_iter()
        .map(|day| {
            let income = a
                .get(day)
                .map_or(0, |d| d.income)
                .saturating_add(b.get(day).map_or(0, |d| d.income));
            let expense = a
                .get(day)
                .map_or(0, |d| d.expense)
                .saturating_add(b.get(day).map_or(0, |d| d.expense));
            (day.clone(), DailyTransaction::new(income, expense))
        })
        .collect()
}

/// Sum two category breakdowns and recompute every share of the new total.
///
/// Shares are rounded to one decimal as `round(share * 1000) / 10`. When the
/// merged total is zero every share stays 0.
pub fn merge_category_analysis(
    a: &CategoryAnalysisMap,
    b: &CategoryAnalysisMap,
) -> CategoryAnalysisMap {
    let categories: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    let mut merged = CategoryAnalysisMap::new();
    let mut total_amount: Won = 0;
    for category in categories {
        let amount = a
            .get(category)
            .map_or(0, |c| c.amount)
            .saturating_add(b.get(category).map_or(0, |c| c.amount));
        merged.insert(category.clone(), CategoryData::new(amount, 0.0));
        total_amount = total_amount.saturating_add(amount);
    }

    if total_amount > 0 {
        for data in merged.values_mut() {
            data.percentage = percentage_of(data.amount, total_amount);
        }
    }

    merged
}

/// Field-wise sum. `net_income` is added, not derived from income and expense.
/// Sums saturate at the bounds of `Won`.
pub fn merge_summary(a: &MonthlySummary, b: &MonthlySummary) -> MonthlySummary {
    MonthlySummary {
        total_income: a.total_income.saturating_add(b.total_income),
        total_expense: a.total_expense.saturating_add(b.total_expense),
        net_income: a.net_income.saturating_add(b.net_income),
    }
}

/// Build the couple view from whichever partners have data for the month.
///
/// With a single partner present their ledger is passed through untouched,
/// so already-correct percentages are not re-rounded.
pub fn merge_couple_data(
    user1: Option<&FinancialData>,
    user2: Option<&FinancialData>,
) -> CombinedFinancialData {
    match (user1, user2) {
        (None, None) => CombinedFinancialData::default(),
        (None, Some(only)) | (Some(only), None) => CombinedFinancialData {
            summary: only.summary,
            daily_transactions: only.daily_transactions.clone(),
            category_analysis: only.category_analysis.clone(),
        },
        (Some(first), Some(second)) => CombinedFinancialData {
            summary: merge_summary(&first.summary, &second.summary),
            daily_transactions: merge_daily_transactions(
                &first.daily_transactions,
                &second.daily_transactions,
            ),
            category_analysis: merge_category_analysis(
                &first.category_analysis,
                &second.category_analysis,
            ),
        },
    }
}

/// Share of `total` in percent with one decimal. Halves round toward
/// positive infinity: 62.5 per mille is 6.3%, -62.5 per mille is -6.2%.
fn percentage_of(amount: Won, total: Won) -> f64 {
    let scaled = (amount as f64 / total as f64) * 1000.0;
    (scaled + 0.5).floor() / 10.0
}
