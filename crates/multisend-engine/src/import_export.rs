//! # Import / Export
//!
//! CSV (`Address,Amount` header, one row per recipient) and JSON (array of
//! `{address, amount}` objects). Imported rows get their validity computed,
//! never assumed.

use crate::domain::{ImportError, Recipient, RecipientCandidate};
use serde_json::Value;
use tracing::debug;

/// CSV header row.
pub const CSV_HEADER: [&str; 2] = ["Address", "Amount"];

/// Serialises recipients to CSV with an `Address,Amount` header.
pub fn export_csv(recipients: &[Recipient]) -> Result<String, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for recipient in recipients {
        writer.write_record([recipient.address(), recipient.amount()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ImportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serialises recipients to a pretty-printed JSON array.
pub fn export_json(recipients: &[Recipient]) -> Result<String, ImportError> {
    let rows: Vec<RecipientCandidate> = recipients
        .iter()
        .map(|r| RecipientCandidate::new(r.address(), r.amount()))
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Reads recipients from CSV.
///
/// The first row is treated as a header when it mentions `address` (any
/// case). Rows missing an address or an amount are skipped; columns after
/// the second are ignored.
pub fn import_csv(text: &str) -> Result<Vec<Recipient>, ImportError> {
    let text = text.trim();
    let has_header = text
        .lines()
        .next()
        .is_some_and(|line| line.to_ascii_lowercase().contains("address"));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut recipients = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        match (record.get(0), record.get(1)) {
            (Some(address), Some(amount)) if !address.is_empty() && !amount.is_empty() => {
                recipients.push(Recipient::new(address, amount));
            }
            _ => debug!(row, "Skipping incomplete CSV row"),
        }
    }
    Ok(recipients)
}

/// Reads recipients from a JSON array of `{address, amount}` objects.
///
/// Missing or null fields become empty strings; numeric amounts are taken
/// as written.
pub fn import_json(text: &str) -> Result<Vec<Recipient>, ImportError> {
    let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
        return Err(ImportError::NotAnArray);
    };
    Ok(items
        .iter()
        .map(|item| Recipient::new(field(item, "address"), field(item, "amount")))
        .collect())
}

fn field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_A: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
    const ADDR_B: &str = "0xA574EC6E2B51B58eb339B7D5107598474BA14eC5";

    fn sample() -> Vec<Recipient> {
        vec![Recipient::new(ADDR_A, "1.5"), Recipient::new(ADDR_B, "2")]
    }

    #[test]
    fn test_export_csv_layout() {
        let csv = export_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Address,Amount");
        assert_eq!(lines[1], format!("{ADDR_A},1.5"));
        assert_eq!(lines[2], format!("{ADDR_B},2"));
    }

    #[test]
    fn test_csv_round_trip() {
        let imported = import_csv(&export_csv(&sample()).unwrap()).unwrap();
        let pairs: Vec<(&str, &str)> = imported.iter().map(|r| (r.address(), r.amount())).collect();
        assert_eq!(pairs, vec![(ADDR_A, "1.5"), (ADDR_B, "2")]);
        assert!(imported.iter().all(Recipient::is_valid));
    }

    #[test]
    fn test_import_csv_without_header() {
        let text = format!("{ADDR_A}, 1.5\n\n{ADDR_B},2.0,extra\n{ADDR_A},\n");
        let imported = import_csv(&text).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].amount(), "1.5");
        assert_eq!(imported[1].amount(), "2.0");
    }

    #[test]
    fn test_import_csv_computes_validity() {
        let imported = import_csv("address,amount\nnot-an-address,5").unwrap();
        assert_eq!(imported.len(), 1);
        assert!(!imported[0].is_valid());
    }

    #[test]
    fn test_json_round_trip() {
        let json = export_json(&sample()).unwrap();
        assert!(json.contains("\"address\""));
        let imported = import_json(&json).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].address(), ADDR_A);
        assert_eq!(imported[1].amount(), "2");
    }

    #[test]
    fn test_import_json_defaults_missing_fields() {
        let imported = import_json(&format!(r#"[{{"address": "{ADDR_A}"}}, {{"amount": 3}}]"#)).unwrap();
        assert_eq!(imported[0].amount(), "");
        assert!(imported[0].is_valid());
        assert_eq!(imported[1].address(), "");
        assert_eq!(imported[1].amount(), "3");
        assert!(!imported[1].is_valid());
    }

    #[test]
    fn test_import_json_requires_array() {
        assert!(matches!(
            import_json(r#"{"address": "x"}"#),
            Err(ImportError::NotAnArray)
        ));
        assert!(matches!(import_json("not json"), Err(ImportError::Json(_))));
    }
}
