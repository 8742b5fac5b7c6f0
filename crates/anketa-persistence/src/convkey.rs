// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! String codec for composite conversation keys.
//!
//! A key `(chat_id, thread_id)` serializes as `"{chat_id}:{thread_id}"`,
//! with an empty second segment when the thread id is absent. The empty
//! segment is how "no thread" stays distinguishable from thread id `0`:
//! `(100, None)` encodes as `"100:"` while `(100, Some(0))` encodes as
//! `"100:0"`.

use thiserror::Error;

use anketa_core::ConversationKey;

/// A conversation-key string that does not round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed conversation key `{0}`")]
pub struct MalformedKey(pub String);

/// Encode a composite key into its row representation.
pub fn encode(key: ConversationKey) -> String {
    match key.thread_id {
        Some(thread_id) => format!("{}:{}", key.chat_id, thread_id),
        None => format!("{}:", key.chat_id),
    }
}

/// Decode a row representation back into a composite key.
///
/// A missing delimiter is accepted as a bare chat id (no thread); an empty
/// second segment decodes to `thread_id: None`.
pub fn decode(s: &str) -> Result<ConversationKey, MalformedKey> {
    let malformed = || MalformedKey(s.to_string());

    let (chat_str, thread_str) = match s.split_once(':') {
        Some(parts) => parts,
        None => (s, ""),
    };

    let chat_id: i64 = chat_str.parse().map_err(|_| malformed())?;
    let thread_id = if thread_str.is_empty() {
        None
    } else {
        Some(thread_str.parse().map_err(|_| malformed())?)
    };

    Ok(ConversationKey { chat_id, thread_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_thread_and_thread_zero_encode_differently() {
        assert_eq!(encode(ConversationKey::new(100, None)), "100:");
        assert_eq!(encode(ConversationKey::new(100, Some(0))), "100:0");
    }

    #[test]
    fn decode_round_trips_spec_cases() {
        for thread_id in [None, Some(0), Some(42)] {
            let key = ConversationKey::new(123, thread_id);
            assert_eq!(decode(&encode(key)), Ok(key));
        }
    }

    #[test]
    fn negative_chat_ids_round_trip() {
        // Group chats have negative ids.
        let key = ConversationKey::new(-1001234567890, Some(7));
        assert_eq!(decode(&encode(key)), Ok(key));
    }

    #[test]
    fn bare_chat_id_decodes_without_thread() {
        assert_eq!(decode("555"), Ok(ConversationKey::new(555, None)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode("").is_err());
        assert!(decode(":").is_err());
        assert!(decode("abc:1").is_err());
        assert!(decode("100:xyz").is_err());
        assert!(decode("100:1:2").is_err());
    }

    proptest! {
        #[test]
        fn encode_decode_round_trips(chat_id: i64, thread_id in proptest::option::of(any::<i64>())) {
            let key = ConversationKey::new(chat_id, thread_id);
            prop_assert_eq!(decode(&encode(key)), Ok(key));
        }
    }
}
