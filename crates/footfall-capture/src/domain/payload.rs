//! Client payloads, as posted to the capture endpoint or sent as a frame on a
//! streaming session.

use footfall_core::event::Vars;
use serde::Deserialize;

/// `{"action": string, "vars": object}`. Both fields are optional; field
/// names are matched in lower or title case.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CapturePayload {
    /// Action name. Missing means empty.
    #[serde(default, alias = "Action")]
    pub action: String,
    /// Client-supplied vars. Missing or `null` means none.
    #[serde(default, alias = "Vars")]
    pub vars: Option<Vars>,
}

impl CapturePayload {
    /// Decodes a payload from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed or mistyped input.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let payload =
            CapturePayload::decode(br#"{"action":"click","vars":{"button":"buy"}}"#).unwrap();

        assert_eq!(payload.action, "click");
        assert_eq!(payload.vars.unwrap()["button"], "buy");
    }

    #[test]
    fn test_decode_empty_object_defaults_both_fields() {
        let payload = CapturePayload::decode(b"{}").unwrap();

        assert_eq!(payload, CapturePayload::default());
    }

    #[test]
    fn test_decode_accepts_title_case_and_null_vars() {
        let payload = CapturePayload::decode(br#"{"Action":"view","Vars":null}"#).unwrap();

        assert_eq!(payload.action, "view");
        assert!(payload.vars.is_none());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(CapturePayload::decode(b"{\"action\":").is_err());
        assert!(CapturePayload::decode(b"not json").is_err());
    }

    #[test]
    fn test_decode_rejects_non_object_vars() {
        assert!(CapturePayload::decode(br#"{"action":"x","vars":[1,2]}"#).is_err());
    }
}
