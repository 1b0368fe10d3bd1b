use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use tracing::debug;

use crate::application::{LedgerService, RecognitionInput};
use crate::domain::{
    AnalysisImageResult, CalendarImageResult, FinancialData, FinancialRecord, YearMonth,
};

/// Importer for loading pipeline output into the ledger
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import a complete ledger file as a user's record for a month.
    pub async fn import_financial_data<R: Read>(
        &self,
        user: &str,
        period: YearMonth,
        reader: R,
        image_urls: Vec<String>,
    ) -> Result<FinancialRecord> {
        let data: FinancialData = read_json(reader).context("Invalid ledger file")?;
        Ok(self
            .service
            .save_record(user, period, data, image_urls)
            .await?)
    }

    /// Import recognizer output for one or both screens and store the
    /// assembled ledger.
    pub async fn import_recognition(
        &self,
        user: &str,
        calendar: Option<impl Read>,
        analysis: Option<impl Read>,
        mut input: RecognitionInput,
    ) -> Result<FinancialRecord> {
        if let Some(reader) = calendar {
            let result: CalendarImageResult =
                read_json(reader).context("Invalid calendar recognition file")?;
            input.calendar = Some(result);
        }
        if let Some(reader) = analysis {
            let result: AnalysisImageResult =
                read_json(reader).context("Invalid analysis recognition file")?;
            input.analysis = Some(result);
        }

        Ok(self.service.save_recognized_record(user, input).await?)
    }
}

/// Read a JSON document, tolerating text around it.
///
/// Recognizer responses sometimes wrap the object in prose or code fences,
/// so everything from the first `{` to the last `}` is taken.
pub fn read_json<T: DeserializeOwned, R: Read>(mut reader: R) -> Result<T> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("Failed to read input")?;

    let json = extract_json_object(&text).context("No JSON object found in input")?;
    debug!(bytes = json.len(), "parsing JSON input");
    serde_json::from_str(json).context("Failed to parse JSON")
}

/// The span from the first `{` to the last `}`, if there is one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(
            extract_json_object("Here is the result:\n```json\n{\"a\": {\"b\": 2}}\n```"),
            Some("{\"a\": {\"b\": 2}}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_read_json_calendar_in_prose() {
        let text = r#"Sure! ```json
        {
            "year": 2025,
            "month": 1,
            "dailyTransactions": { "3": { "income": 0, "expense": 12000 } },
            "summary": { "totalIncome": 0, "totalExpense": 12000, "netIncome": -12000 }
        }
        ```"#;

        let result: CalendarImageResult = read_json(text.as_bytes()).unwrap();
        assert_eq!(result.year, Some(2025));
        assert_eq!(result.summary.net_income, -12000);
        assert_eq!(result.daily_transactions["3"].expense, 12000);
    }

    #[test]
    fn test_read_json_rejects_missing_fields() {
        let text = r#"{ "month": 1 }"#;
        let result: Result<CalendarImageResult> = read_json(text.as_bytes());
        assert!(result.is_err());
    }
}
