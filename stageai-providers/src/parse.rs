use anyhow::Context;
use serde::Deserialize;
use stageai_core::types::OperationKind;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extracts the result field for `kind`.
///
/// `Ok(None)` means the body was valid JSON but did not carry a usable string
/// in the expected field.
pub fn parse_operation_result(kind: OperationKind, body: &[u8]) -> anyhow::Result<Option<String>> {
    let value: serde_json::Value =
        serde_json::from_slice(body).with_context(|| format!("decode {} JSON", kind.label()))?;

    let field = value
        .get(kind.result_field())
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(field)
}

/// Reads `{"error": "..."}` from a failed response, if present.
pub fn parse_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

pub fn parse_probe_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
