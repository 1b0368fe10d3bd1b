use anyhow::Result;
use std::io::Write;
use tracing::debug;

use crate::application::{LedgerService, MonthlyView};
use crate::domain::{categories_by_amount, days_in_order, CategoryAnalysisMap, DailyTransactionsMap};

/// Exporter for writing the couple's monthly view to files.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the combined daily series as CSV. Returns the number of days written.
    pub async fn export_daily_csv<W: Write>(
        &self,
        user: &str,
        year: i32,
        month: u32,
        writer: W,
    ) -> Result<usize> {
        let view = self.service.monthly_view(user, year, month).await?;
        write_daily_csv(&view.combined_data.daily_transactions, writer)
    }

    /// Export the combined category breakdown as CSV. Returns the number of categories written.
    pub async fn export_categories_csv<W: Write>(
        &self,
        user: &str,
        year: i32,
        month: u32,
        writer: W,
    ) -> Result<usize> {
        let view = self.service.monthly_view(user, year, month).await?;
        write_categories_csv(&view.combined_data.category_analysis, writer)
    }

    /// Export the whole monthly view, individuals included, as pretty JSON.
    pub async fn export_view_json<W: Write>(
        &self,
        user: &str,
        year: i32,
        month: u32,
        mut writer: W,
    ) -> Result<MonthlyView> {
        let view = self.service.monthly_view(user, year, month).await?;

        let json = serde_json::to_string_pretty(&view)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(view)
    }
}

/// Write `day,income,expense` rows in calendar order.
pub fn write_daily_csv<W: Write>(daily: &DailyTransactionsMap, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["day", "income", "expense"])?;

    let days = days_in_order(daily);
    for (day, tx) in &days {
        csv_writer.write_record([day.to_string(), tx.income.to_string(), tx.expense.to_string()])?;
    }

    csv_writer.flush()?;
    debug!(rows = days.len(), "wrote daily CSV");
    Ok(days.len())
}

/// Write `category,amount,percentage` rows, largest amount first.
pub fn write_categories_csv<W: Write>(categories: &CategoryAnalysisMap, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["category", "amount", "percentage"])?;

    let sorted = categories_by_amount(categories);
    for (name, data) in &sorted {
        csv_writer.write_record([
            name.to_string(),
            data.amount.to_string(),
            format!("{:.1}", data.percentage),
        ])?;
    }

    csv_writer.flush()?;
    debug!(rows = sorted.len(), "wrote categories CSV");
    Ok(sorted.len())
}
