//! Comment content rules, two-level threading, and reaction toggling.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;

/// Maximum length for a comment's text content.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Maximum length of a reaction key (one emoji may span several code points).
pub const MAX_EMOJI_LENGTH: usize = 32;

/// Emoji → ids of the users who reacted with it.
pub type Reactions = BTreeMap<String, BTreeSet<String>>;

/// Validate comment text.
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if content.len() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate that a reply targets a root comment on the same request.
///
/// `parent_request_id` and `parent_parent_id` describe the comment being
/// replied to.
pub fn validate_reply_target(
    request_id: &str,
    parent_request_id: &str,
    parent_parent_id: Option<&str>,
) -> Result<(), CoreError> {
    if parent_request_id != request_id {
        return Err(CoreError::Validation(
            "Replies must stay on the same request as their parent".to_string(),
        ));
    }
    if parent_parent_id.is_some() {
        return Err(CoreError::Validation(
            "Replies can only target top-level comments".to_string(),
        ));
    }
    Ok(())
}

/// Validate a reaction key.
pub fn validate_emoji(emoji: &str) -> Result<(), CoreError> {
    if emoji.trim().is_empty() || emoji.len() > MAX_EMOJI_LENGTH {
        return Err(CoreError::Validation(format!(
            "Invalid reaction '{emoji}'"
        )));
    }
    Ok(())
}

/// Toggle `user_id`'s reaction with `emoji`.
///
/// Returns `true` if the reaction is now present. Emoji with no remaining
/// users are removed from the map.
pub fn toggle_reaction(reactions: &mut Reactions, emoji: &str, user_id: &str) -> bool {
    let users = reactions.entry(emoji.to_string()).or_default();
    let added = if users.remove(user_id) {
        false
    } else {
        users.insert(user_id.to_string());
        true
    };
    if users.is_empty() {
        reactions.remove(emoji);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_rejected() {
        assert!(validate_content("").is_err());
        assert!(validate_content("   \n").is_err());
        assert!(validate_content("Looks good").is_ok());
    }

    #[test]
    fn overlong_comment_rejected() {
        let text = "a".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(validate_content(&text).is_err());
    }

    #[test]
    fn reply_to_root_allowed() {
        assert!(validate_reply_target("req-1", "req-1", None).is_ok());
    }

    #[test]
    fn reply_to_reply_rejected() {
        let err = validate_reply_target("req-1", "req-1", Some("c-0")).unwrap_err();
        assert!(err.to_string().contains("top-level"));
    }

    #[test]
    fn reply_across_requests_rejected() {
        assert!(validate_reply_target("req-1", "req-2", None).is_err());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut reactions = Reactions::new();
        assert!(toggle_reaction(&mut reactions, "👍", "u1"));
        assert!(toggle_reaction(&mut reactions, "👍", "u2"));
        assert_eq!(reactions["👍"].len(), 2);

        assert!(!toggle_reaction(&mut reactions, "👍", "u1"));
        assert_eq!(reactions["👍"].len(), 1);

        assert!(!toggle_reaction(&mut reactions, "👍", "u2"));
        assert!(reactions.is_empty());
    }

    #[test]
    fn emoji_validation() {
        assert!(validate_emoji("🎉").is_ok());
        assert!(validate_emoji("").is_err());
        assert!(validate_emoji(&"x".repeat(MAX_EMOJI_LENGTH + 1)).is_err());
    }
}
