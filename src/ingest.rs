//! Batch ingestion
//!
//! Turns raw bytes into `RawSubmission` records. This is the fail-fast
//! boundary of the system: malformed JSON or delimited input is an error
//! here, while everything downstream degrades to null instead of failing.
//!
//! Supported shapes: newline-delimited JSON objects, a JSON array of
//! objects, and simple delimited text (CSV/TSV) with a header row.

use serde_json::Value;

use crate::error::IngestError;
use crate::types::RawSubmission;

/// Parse newline-delimited JSON, one record per line (blank lines skipped)
pub fn parse_ndjson(input: &str) -> Result<Vec<RawSubmission>, IngestError> {
    let mut records = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)?;
        match value {
            Value::Object(map) => records.push(map),
            _ => return Err(IngestError::NotAnObject(line_no + 1)),
        }
    }
    Ok(records)
}

/// Parse a JSON array of record objects
pub fn parse_json(input: &str) -> Result<Vec<RawSubmission>, IngestError> {
    let value: Value = serde_json::from_str(input)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(IngestError::NotAnObject(1)),
    };
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            _ => return Err(IngestError::NotAnObject(index + 1)),
        }
    }
    Ok(records)
}

/// Parse simple delimited text with a header row.
///
/// Cells that parse as plain decimal numbers become JSON numbers; empty
/// cells become null; everything else stays a string. Quoting and escaping
/// follow standard CSV rules.
pub fn parse_delimited(input: &str, delimiter: u8) -> Result<Vec<RawSubmission>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = RawSubmission::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.clone(), cell_value(cell));
        }
        records.push(record);
    }
    Ok(records)
}

fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            if let Some(number) = serde_json::Number::from_f64(n) {
                return Value::Number(number);
            }
        }
    }
    Value::String(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ndjson_skips_blank_lines() {
        let input = "{\"B2\":\"yes\"}\n\n{\"B2\":\"no\"}\n";
        let records = parse_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("B2"), Some(&json!("yes")));
    }

    #[test]
    fn ndjson_rejects_non_objects() {
        let err = parse_ndjson("[1,2,3]").unwrap_err();
        assert!(matches!(err, IngestError::NotAnObject(1)));
        assert!(parse_ndjson("not json").is_err());
    }

    #[test]
    fn json_array_of_objects() {
        let records = parse_json(r#"[{"C1": 4}, {"C1": "Extremely"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("C1"), Some(&json!("Extremely")));
        assert!(parse_json(r#"{"C1": 4}"#).is_err());
    }

    #[test]
    fn csv_with_header_row() {
        let input = "Response ID,Motivation Score,B2\nr1,4.5,yes\nr2,,no\n";
        let records = parse_delimited(input, b',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Motivation Score"), Some(&json!(4.5)));
        assert_eq!(records[0].get("B2"), Some(&json!("yes")));
        assert_eq!(records[1].get("Motivation Score"), Some(&Value::Null));
    }

    #[test]
    fn csv_preserves_header_order_for_first_key_wins() {
        let input = "motivation score,Motivation-Score\n4,1\n";
        let records = parse_delimited(input, b',').unwrap();
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["motivation score", "Motivation-Score"]);
    }

    #[test]
    fn tsv_delimiter() {
        let input = "B2\tC1\nyes\t5\n";
        let records = parse_delimited(input, b'\t').unwrap();
        assert_eq!(records[0].get("C1"), Some(&json!(5.0)));
    }
}
