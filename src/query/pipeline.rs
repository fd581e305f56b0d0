//! Wire format for the per-database query API.
//!
//! A pipeline request carries a batch of `execute` entries followed by a
//! `close`; each statement's arguments and result cells are typed values
//! (`{"type": "integer", "value": "42"}` style) so drivers on any
//! runtime agree on SQLite's type system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

// ── Request ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRequest {
    pub requests: Vec<PipelineEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineEntry {
    Execute { stmt: Stmt },
    Close,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stmt {
    pub sql: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<CellValue>,
}

impl Stmt {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(sql: impl Into<String>, args: Vec<CellValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

// ── Typed cells ────────────────────────────────────────────────

/// A single statement argument or result cell.
///
/// Integers travel as strings so 64-bit values survive JSON parsers
/// that only have doubles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellValue {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl CellValue {
    /// Encode a plain JSON argument into a typed cell. Booleans map to
    /// SQLite integers; arrays and objects are not bindable.
    pub fn from_json(v: &Value) -> Result<CellValue, AppError> {
        match v {
            Value::Null => Ok(CellValue::Null),
            Value::Bool(b) => Ok(CellValue::Integer {
                value: if *b { "1".into() } else { "0".into() },
            }),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(CellValue::Integer {
                        value: i.to_string(),
                    })
                } else {
                    Ok(CellValue::Float {
                        value: n.as_f64().unwrap_or(f64::NAN),
                    })
                }
            }
            Value::String(s) => Ok(CellValue::Text { value: s.clone() }),
            other => Err(anyhow::anyhow!(
                "unsupported statement argument: {} (only null, bool, number, string bind)",
                other
            )
            .into()),
        }
    }

    /// Decode a typed cell back into plain JSON for tool output.
    pub fn into_json(self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Integer { value } => match value.parse::<i64>() {
                Ok(i) => Value::from(i),
                Err(_) => Value::String(value),
            },
            CellValue::Float { value } => {
                serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
            }
            CellValue::Text { value } => Value::String(value),
            CellValue::Blob { base64 } => Value::String(base64),
        }
    }
}

// ── Response ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineResponse {
    pub results: Vec<PipelineResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineResult {
    Ok { response: EntryResponse },
    Error { error: PipelineErrorBody },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryResponse {
    #[serde(rename = "type")]
    pub kind: String,
    /// Present for `execute` responses, absent for `close`.
    #[serde(default)]
    pub result: Option<StmtResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StmtResult {
    #[serde(default)]
    pub cols: Vec<Col>,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub affected_row_count: u64,
    #[serde(default)]
    pub last_insert_rowid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Col {
    #[serde(default)]
    pub name: Option<String>,
}

impl StmtResult {
    /// Rows as JSON objects keyed by column name, for tool output.
    pub fn rows_as_json(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (i, cell) in row.iter().enumerate() {
                    let name = self
                        .cols
                        .get(i)
                        .and_then(|c| c.name.clone())
                        .unwrap_or_else(|| format!("column_{}", i));
                    obj.insert(name, cell.clone().into_json());
                }
                Value::Object(obj)
            })
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_encoding() {
        assert_eq!(CellValue::from_json(&json!(null)).unwrap(), CellValue::Null);
        assert_eq!(
            CellValue::from_json(&json!(true)).unwrap(),
            CellValue::Integer { value: "1".into() }
        );
        assert_eq!(
            CellValue::from_json(&json!(42)).unwrap(),
            CellValue::Integer {
                value: "42".into()
            }
        );
        assert_eq!(
            CellValue::from_json(&json!(1.5)).unwrap(),
            CellValue::Float { value: 1.5 }
        );
        assert_eq!(
            CellValue::from_json(&json!("hi")).unwrap(),
            CellValue::Text { value: "hi".into() }
        );
        assert!(CellValue::from_json(&json!([1, 2])).is_err());
        assert!(CellValue::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_cell_decoding() {
        assert_eq!(
            CellValue::Integer {
                value: "42".into()
            }
            .into_json(),
            json!(42)
        );
        assert_eq!(CellValue::Text { value: "x".into() }.into_json(), json!("x"));
        assert_eq!(CellValue::Null.into_json(), json!(null));
        // Integers wider than i64 stay as strings rather than losing precision.
        assert_eq!(
            CellValue::Integer {
                value: "99999999999999999999".into()
            }
            .into_json(),
            json!("99999999999999999999")
        );
    }

    #[test]
    fn test_request_serialization() {
        let req = PipelineRequest {
            requests: vec![
                PipelineEntry::Execute {
                    stmt: Stmt::with_args(
                        "SELECT * FROM t WHERE id = ?",
                        vec![CellValue::Integer { value: "7".into() }],
                    ),
                },
                PipelineEntry::Close,
            ],
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["requests"][0]["type"], "execute");
        assert_eq!(json["requests"][0]["stmt"]["sql"], "SELECT * FROM t WHERE id = ?");
        assert_eq!(json["requests"][0]["stmt"]["args"][0]["type"], "integer");
        assert_eq!(json["requests"][1]["type"], "close");
    }

    #[test]
    fn test_args_omitted_when_empty() {
        let json = serde_json::to_value(Stmt::new("SELECT 1")).unwrap();
        assert!(json.get("args").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let body = json!({
            "results": [
                {
                    "type": "ok",
                    "response": {
                        "type": "execute",
                        "result": {
                            "cols": [{ "name": "id" }, { "name": "title" }],
                            "rows": [
                                [
                                    { "type": "integer", "value": "1" },
                                    { "type": "text", "value": "first" }
                                ]
                            ],
                            "affected_row_count": 0
                        }
                    }
                },
                { "type": "ok", "response": { "type": "close" } }
            ]
        });

        let resp: PipelineResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.results.len(), 2);

        let rows = match &resp.results[0] {
            PipelineResult::Ok { response } => {
                response.result.as_ref().unwrap().rows_as_json()
            }
            PipelineResult::Error { .. } => panic!("expected ok result"),
        };
        assert_eq!(rows, vec![json!({ "id": 1, "title": "first" })]);
    }

    #[test]
    fn test_error_result_deserialization() {
        let body = json!({
            "results": [
                {
                    "type": "error",
                    "error": { "message": "no such table: missing", "code": "SQLITE_ERROR" }
                }
            ]
        });

        let resp: PipelineResponse = serde_json::from_value(body).unwrap();
        match &resp.results[0] {
            PipelineResult::Error { error } => {
                assert_eq!(error.message, "no such table: missing");
                assert_eq!(error.code.as_deref(), Some("SQLITE_ERROR"));
            }
            PipelineResult::Ok { .. } => panic!("expected error result"),
        }
    }
}
