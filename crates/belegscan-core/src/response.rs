// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parsing of multimodal-model replies into JSON values.

use serde_json::{Value, json};

/// Error message stored when a reply is not valid JSON.
pub const INVALID_JSON_MESSAGE: &str = "The LLM's response was not valid JSON.";

/// Parse a model reply, tolerating a surrounding markdown code fence.
///
/// A reply that is not valid JSON yields `{"error": INVALID_JSON_MESSAGE}`
/// instead of an `Err`, so batch runs can record it like any other result.
pub fn parse_model_response(response: &str) -> Value {
    let body = strip_code_fence(response.trim());
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => json!({ "error": INVALID_JSON_MESSAGE }),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let inner = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_parses() {
        let value = parse_model_response(r#"{"total_amount": 12.5}"#);
        assert_eq!(value["total_amount"], 12.5);
    }

    #[test]
    fn json_fence_is_stripped() {
        let reply = "```json\n{\"merchant_name\": \"CAFE\"}\n```";
        assert_eq!(parse_model_response(reply)["merchant_name"], "CAFE");
    }

    #[test]
    fn bare_fence_is_stripped() {
        let reply = "  ```\n[1, 2, 3]\n```  ";
        assert_eq!(parse_model_response(reply), json!([1, 2, 3]));
    }

    #[test]
    fn unterminated_fence_still_parses() {
        let reply = "```json\n{\"a\": 1}";
        assert_eq!(parse_model_response(reply)["a"], 1);
    }

    #[test]
    fn invalid_json_becomes_error_object() {
        let value = parse_model_response("Sorry, I cannot read this receipt.");
        assert_eq!(value["error"], INVALID_JSON_MESSAGE);
    }
}
