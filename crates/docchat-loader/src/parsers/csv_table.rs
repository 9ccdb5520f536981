use crate::registry::DocumentParser;
use crate::table::render_table;
use docchat_core::{DocumentFormat, LoadError};

/// Comma-separated values with a header row, rendered as an indexed table.
pub struct CsvParser;

impl DocumentParser for CsvParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Csv
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let fail = |reason: String| LoadError::parse(DocumentFormat::Csv, reason);

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| fail(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(fail("no columns to parse".to_string()));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| fail(e.to_string()))?;
            if record.len() > headers.len() {
                return Err(fail(format!(
                    "row {} has {} fields, expected {}",
                    line + 2,
                    record.len(),
                    headers.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(render_table(&headers, &rows))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_two_rows_contain_every_cell() {
        let text = CsvParser
            .parse(b"item,amount\nwidgets,120\ngadgets,80\n")
            .unwrap();
        for cell in ["item", "amount", "widgets", "120", "gadgets", "80"] {
            assert!(text.contains(cell), "missing {cell} in {text}");
        }
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_header_only() {
        let text = CsvParser.parse(b"a,b\n").unwrap();
        assert!(text.starts_with("Empty DataFrame"));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(CsvParser.parse(b"").is_err());
    }

    #[test]
    fn test_extra_fields_fail() {
        let err = CsvParser.parse(b"a,b\n1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("row 2 has 3 fields"));
    }
}
