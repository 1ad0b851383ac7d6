//! Decode upstream lead payloads.

use serde::Deserialize;

use super::FetchError;
use crate::store::NewLead;

/// Upstream responses are either a bare array or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<NewLead>),
    Wrapped { results: Vec<NewLead> },
}

/// Parses a JSON body into lead records, keeping at most `limit`.
pub fn decode_leads(body: &[u8], limit: usize) -> Result<Vec<NewLead>, FetchError> {
    let payload: Payload =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let mut leads = match payload {
        Payload::List(leads) => leads,
        Payload::Wrapped { results } => results,
    };
    leads.truncate(limit);
    Ok(leads)
}
