use chrono::{DateTime, Duration, TimeZone, Utc};

/// Tokens are renewed this long before the service says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A session token issued by `GetToken`.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Whether the token is still usable at `now`, keeping a safety margin.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Parses a WCF date literal such as `/Date(1700000000000)/` or
/// `/Date(1700000000000+0000)/` into a UTC timestamp.
pub fn parse_wcf_date(raw: &str) -> Option<DateTime<Utc>> {
    let inner = raw.trim().strip_prefix("/Date(")?.strip_suffix(")/")?;
    // Any timezone suffix only describes the original offset; the millis are UTC.
    let millis_end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map_or(inner.len(), |(i, _)| i);
    let millis: i64 = inner[..millis_end].parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_offset_dates() {
        let plain = parse_wcf_date("/Date(1700000000000)/").unwrap();
        assert_eq!(plain.timestamp_millis(), 1_700_000_000_000);

        let offset = parse_wcf_date("/Date(1700000000000+0000)/").unwrap();
        assert_eq!(offset, plain);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_wcf_date("2025-01-01").is_none());
        assert!(parse_wcf_date("/Date(abc)/").is_none());
    }

    #[test]
    fn token_expires_with_margin() {
        let now = Utc::now();
        let token = Token {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(!token.is_valid_at(now));

        let fresh = Token {
            value: "t".to_string(),
            expires_at: now + Duration::hours(24),
        };
        assert!(fresh.is_valid_at(now));
    }
}
