//! Session identity.

use uuid::Uuid;

/// Derive the conversation thread id for a sender address.
///
/// Name-based (v5) hashing into the DNS namespace: the same address always
/// lands on the same thread, across restarts, with no external state.
#[must_use]
pub fn session_key(sender_address: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, sender_address.as_bytes())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = session_key("whatsapp:+15551234567");
        let b = session_key("whatsapp:+15551234567");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_senders_get_distinct_keys() {
        assert_ne!(session_key("whatsapp:+15551234567"), session_key("whatsapp:+15551234568"));
        assert_ne!(session_key("a"), session_key("b"));
    }

    #[test]
    fn matches_rfc4122_v5() {
        let key = session_key("whatsapp:+15551234567");
        assert_eq!(key.get_version_num(), 5);
    }
}
