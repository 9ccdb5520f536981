use crate::registry::DocumentParser;
use docchat_core::{DocumentFormat, LoadError};
use serde_json::Value;

/// Call-detail records stored as `{"calls": [{caller_id, receiver_id, duration}]}`.
///
/// Each record becomes one line. A document without a `calls` key is valid
/// and empty.
pub struct CdrJsonParser;

fn field(record: &serde_json::Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

impl DocumentParser for CdrJsonParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::CdrJson
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let fail = |reason: String| LoadError::parse(DocumentFormat::CdrJson, reason);

        let data: Value = serde_json::from_slice(bytes).map_err(|e| fail(e.to_string()))?;
        let root = data
            .as_object()
            .ok_or_else(|| fail("expected a JSON object at the top level".to_string()))?;

        let calls = match root.get("calls") {
            None => return Ok(String::new()),
            Some(Value::Array(calls)) => calls,
            Some(_) => return Err(fail("'calls' must be an array".to_string())),
        };

        let mut text = String::new();
        for (i, call) in calls.iter().enumerate() {
            let record = call
                .as_object()
                .ok_or_else(|| fail(format!("call record {i} is not an object")))?;
            text.push_str(&format!(
                "Call Record: {} to {}, Duration: {} mins\n",
                field(record, "caller_id"),
                field(record, "receiver_id"),
                field(record, "duration"),
            ));
        }
        Ok(text)
    }
}
