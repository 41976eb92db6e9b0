//! TTL Rules
//!
//! Every entry carries an absolute expiry timestamp computed when it is
//! written. Expired entries are removed in two places only:
//!
//! 1. **Lazy**: a `get` that finds an expired entry removes it and omits it
//!    from the result.
//! 2. **Startup sweep**: one pass over the whole map right after the
//!    snapshot is loaded.
//!
//! There is no background sweeper. Neither kind of removal is written to the
//! snapshot on its own; the next `put` or `delete` carries it to disk.

use crate::storage::error::StoreError;
use chrono::{DateTime, Duration, Utc};

/// Default TTL applied when a `put` does not specify one (30 days).
pub const DEFAULT_TTL_SECS: u64 = 86_400 * 30;

/// Parses a TTL parameter as received from a client.
///
/// - absent or empty → `Ok(None)`, the store's default TTL applies
/// - a non-negative base-10 integer → `Ok(Some(secs))`
/// - anything else → `BadRequest`
///
/// # Example
///
/// ```
/// use ttlkv::storage::parse_ttl;
///
/// assert_eq!(parse_ttl(None).unwrap(), None);
/// assert_eq!(parse_ttl(Some("60")).unwrap(), Some(60));
/// assert!(parse_ttl(Some("-1")).is_err());
/// assert!(parse_ttl(Some("soon")).is_err());
/// ```
pub fn parse_ttl(raw: Option<&str>) -> Result<Option<u64>, StoreError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    // u64's parser accepts a leading '+', which is not a valid TTL here
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_ttl(raw));
    }

    raw.parse::<u64>().map(Some).map_err(|_| invalid_ttl(raw))
}

fn invalid_ttl(raw: &str) -> StoreError {
    StoreError::bad_request(format!(
        "invalid ttl '{}': expected a non-negative number of seconds",
        raw
    ))
}

/// Computes the absolute expiry instant `now + ttl_secs`.
///
/// Returns `BadRequest` if the result cannot be represented.
pub fn expires_at(now: DateTime<Utc>, ttl_secs: u64) -> Result<DateTime<Utc>, StoreError> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| StoreError::bad_request(format!("ttl {} is out of range", ttl_secs)))
}

/// Returns true once `now` is strictly past `expires_at`.
#[inline]
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_ttl_absent_uses_default() {
        assert_eq!(parse_ttl(None).unwrap(), None);
        assert_eq!(parse_ttl(Some("")).unwrap(), None);
    }

    #[test]
    fn test_parse_ttl_valid() {
        assert_eq!(parse_ttl(Some("0")).unwrap(), Some(0));
        assert_eq!(parse_ttl(Some("3600")).unwrap(), Some(3600));
        assert_eq!(parse_ttl(Some(" 5 ")).unwrap(), Some(5));
    }

    #[test]
    fn test_parse_ttl_rejects_garbage() {
        for raw in ["-5", "+5", "1.5", "abc", "10s", "99999999999999999999999"] {
            let err = parse_ttl(Some(raw)).unwrap_err();
            assert!(err.is_bad_request(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_expires_at() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(expires_at(now, 0).unwrap(), now);
        assert_eq!(
            expires_at(now, DEFAULT_TTL_SECS).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
        );
        assert!(expires_at(now, u64::MAX).unwrap_err().is_bad_request());
    }

    #[test]
    fn test_is_expired_is_strict() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(!is_expired(at, at));
        assert!(!is_expired(at, at - Duration::seconds(1)));
        assert!(is_expired(at, at + Duration::milliseconds(1)));
    }
}
