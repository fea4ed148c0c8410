//! CSV to record loader for the terminal host
use anyhow::{Context, Result};
use serde_json::{Number, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::data::record::Record;

/// Headers plus records, in file order
pub struct CsvData {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

pub struct CsvLoader;

impl CsvLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<CsvData> {
        let path = path.as_ref();
        info!("Loading CSV {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let data = Self::from_reader(file)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(
            "CSV load complete: {} rows, {} columns",
            data.records.len(),
            data.headers.len()
        );
        Ok(data)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CsvData> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            let mut record = Record::new();
            for (header, field) in headers.iter().zip(row.iter()) {
                record.insert(header.clone(), infer_value(field));
            }
            records.push(record);
        }

        Ok(CsvData { headers, records })
    }
}

/// Simple type inference: bool, integer, float, then string
fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        Value::Null
    } else if let Ok(b) = field.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = field.parse::<i64>() {
        Value::Number(i.into())
    } else if let Some(n) = field.parse::<f64>().ok().and_then(Number::from_f64) {
        Value::Number(n)
    } else {
        Value::String(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_type_inference() {
        let data = CsvLoader::from_reader("a,b,c,d\n1,2.5,true,hello\n,x,,\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["a", "b", "c", "d"]);
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.records[0]["a"], json!(1));
        assert_eq!(data.records[0]["b"], json!(2.5));
        assert_eq!(data.records[0]["c"], json!(true));
        assert_eq!(data.records[0]["d"], json!("hello"));
        assert_eq!(data.records[1]["a"], Value::Null);
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,qty").unwrap();
        writeln!(file, "widget,4").unwrap();
        let data = CsvLoader::load(file.path()).unwrap();
        assert_eq!(data.records[0]["name"], json!("widget"));
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvLoader::load("/definitely/not/here.csv").is_err());
    }
}
