//! Conversation history windowing.
//!
//! The gateway hands back chat history in whatever order it feels like, with
//! media-only entries mixed in. Before anything reaches the model the raw
//! records are sorted, blank-filtered and trimmed to a bounded tail.

use crate::ai::{Message, MessageRole};
use crate::models::ConversationMessage;

/// Normalize raw chat records into model context.
///
/// Output is chronologically ordered, at most `limit` entries, and free of
/// blank bodies. Re-applying to its own output is a no-op.
pub fn window(raw: &[ConversationMessage], limit: usize) -> Vec<Message> {
    let mut kept: Vec<&ConversationMessage> = raw.iter().filter(|m| !m.is_blank()).collect();
    kept.sort_by_key(|m| m.timestamp);

    let skip = kept.len().saturating_sub(limit);
    kept[skip..]
        .iter()
        .map(|m| Message {
            role: if m.from_user {
                MessageRole::User
            } else {
                MessageRole::Assistant
            },
            content: m.body.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(timestamp: i64, body: &str, from_user: bool) -> ConversationMessage {
        ConversationMessage {
            timestamp,
            body: body.to_string(),
            from_user,
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(window(&[], 10).is_empty());
    }

    #[test]
    fn sorts_by_timestamp_ascending() {
        let raw = vec![msg(3, "c", true), msg(1, "a", true), msg(2, "b", false)];
        let out = window(&raw, 10);
        let bodies: Vec<&str> = out.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn drops_blank_bodies() {
        let raw = vec![msg(1, "hello", true), msg(2, "   ", true), msg(3, "", false)];
        let out = window(&raw, 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "hello");
    }

    #[test]
    fn keeps_only_the_last_limit_messages() {
        let raw: Vec<ConversationMessage> =
            (0..20).map(|i| msg(i, &format!("m{}", i), true)).collect();
        let out = window(&raw, 10);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].content, "m10");
        assert_eq!(out[9].content, "m19");
    }

    #[test]
    fn tags_roles_from_sender() {
        let raw = vec![msg(1, "hi", true), msg(2, "hello!", false)];
        let out = window(&raw, 10);
        assert_eq!(out[0].role, MessageRole::User);
        assert_eq!(out[1].role, MessageRole::Assistant);
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let raw = vec![
            msg(5, "e", false),
            msg(1, "a", true),
            msg(3, "", true),
            msg(2, "b", false),
            msg(4, "d", true),
        ];
        let once = window(&raw, 3);

        // Feed the windowed output back through as if it were raw history.
        let as_raw: Vec<ConversationMessage> = once
            .iter()
            .enumerate()
            .map(|(i, m)| msg(i as i64, &m.content, m.role == MessageRole::User))
            .collect();
        let twice = window(&as_raw, 3);

        let a: Vec<(&str, &MessageRole)> =
            once.iter().map(|m| (m.content.as_str(), &m.role)).collect();
        let b: Vec<(&str, &MessageRole)> =
            twice.iter().map(|m| (m.content.as_str(), &m.role)).collect();
        assert_eq!(a, b);
    }
}
