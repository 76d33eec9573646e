//! Utility helpers for the presence module.

/// Current timestamp as epoch milliseconds, stringified.
///
/// Presence payloads only need an orderable marker for when the client
/// came online; epoch millis avoid pulling a datetime formatter into the
/// hot path.
pub(crate) fn epoch_millis() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_is_numeric() {
        let ts = epoch_millis();
        assert!(ts.parse::<u128>().is_ok());
    }
}
