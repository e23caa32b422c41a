pub mod note;
pub mod session;
pub mod user;

pub use note::{NewNote, TranslationNote};
pub use session::{NewSession, Session};
pub use user::{NewUser, PublicUser, User};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Timestamps are stored as RFC 3339 text. All of them are UTC ("Z"), so
/// they also compare lexicographically in expiry filters.
pub fn now_utc() -> String {
    format_utc(OffsetDateTime::now_utc())
}

pub fn format_utc(ts: OffsetDateTime) -> String {
    // Rfc3339 formatting of a UTC timestamp cannot fail
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

pub fn parse_utc(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_roundtrip() {
        let now = now_utc();
        assert!(parse_utc(&now).is_some());
    }

    #[test]
    fn utc_strings_order_lexicographically() {
        let earlier = format_utc(OffsetDateTime::now_utc() - time::Duration::days(1));
        let later = now_utc();
        assert!(earlier < later);
    }
}
