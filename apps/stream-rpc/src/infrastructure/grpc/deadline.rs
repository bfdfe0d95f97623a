//! Deadline Propagation
//!
//! Callers send their deadline as the `grpc-timeout` header: at most eight
//! ASCII digits followed by one unit character (`H`, `M`, `S`, `m`, `u`,
//! `n`).

use std::time::Duration;

use tonic::metadata::MetadataMap;

use crate::domain::call::Deadline;

/// Header carrying the caller's remaining time budget.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

const MAX_DIGITS: usize = 8;

/// Parse a `grpc-timeout` header value.
#[must_use]
pub fn parse_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() {
        return None;
    }
    let split = value.len().checked_sub(1)?;
    let (digits, unit) = value.split_at(split);
    if digits.is_empty()
        || digits.len() > MAX_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

/// Deadline of an incoming call, if the caller set one.
#[must_use]
pub fn from_metadata(metadata: &MetadataMap) -> Option<Deadline> {
    let raw = metadata.get(GRPC_TIMEOUT_HEADER)?.to_str().ok()?;
    match parse_timeout(raw) {
        Some(timeout) => Some(Deadline::from_timeout(timeout)),
        None => {
            tracing::warn!(value = raw, "ignoring malformed grpc-timeout header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("1H", Some(Duration::from_secs(3600)))]
    #[test_case("2M", Some(Duration::from_secs(120)))]
    #[test_case("5S", Some(Duration::from_secs(5)))]
    #[test_case("1500m", Some(Duration::from_millis(1500)))]
    #[test_case("250u", Some(Duration::from_micros(250)))]
    #[test_case("99999999n", Some(Duration::from_nanos(99_999_999)))]
    #[test_case("", None)]
    #[test_case("S", None)]
    #[test_case("10", None)]
    #[test_case("10x", None)]
    #[test_case("123456789S", None)]
    #[test_case("-1S", None)]
    fn parses(value: &str, expected: Option<Duration>) {
        assert_eq!(parse_timeout(value), expected);
    }

    #[test]
    fn reads_header_from_metadata() {
        let mut metadata = MetadataMap::new();
        assert!(from_metadata(&metadata).is_none());

        metadata.insert(GRPC_TIMEOUT_HEADER, "30S".parse().unwrap());
        let deadline = from_metadata(&metadata).unwrap();
        assert!(deadline.remaining() > Duration::from_secs(29));
    }

    #[test]
    fn malformed_header_is_ignored() {
        let mut metadata = MetadataMap::new();
        metadata.insert(GRPC_TIMEOUT_HEADER, "soon".parse().unwrap());
        assert!(from_metadata(&metadata).is_none());
    }
}
