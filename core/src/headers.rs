//! Per-call header merge.

use crate::config::AuthHeaderSet;

/// Starts from `Content-Type: application/json` and overlays every auth
/// header that has a value. Overlaying an existing name replaces its value
/// without moving it.
pub fn merge_headers(auth: &AuthHeaderSet) -> Vec<(String, String)> {
    let mut merged = vec![("Content-Type".to_string(), "application/json".to_string())];
    for (name, value) in auth.iter() {
        let Some(value) = value else {
            continue;
        };
        match merged.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => merged.push((name.to_string(), value.to_string())),
        }
    }
    merged
}
