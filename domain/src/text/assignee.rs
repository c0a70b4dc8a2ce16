//! Assignee extraction from free-text action items.
//!
//! Each pattern is an independent matcher. They are tried in a fixed priority
//! order and the first capture wins. The order is a policy choice (an explicit
//! `@mention` beats a bracket, which beats an "Assigned to" marker, and so on);
//! tests pin it down.

use super::name::{collapse_whitespace, reformat_name};
use regex::Regex;
use std::sync::OnceLock;

/// Leading words that read like instructions or filler rather than a person's name.
const NON_NAME_WORDS: &[&str] = &[
    "action", "add", "agenda", "all", "ask", "book", "call", "check", "confirm", "create",
    "decision", "draft", "email", "everyone", "finalize", "follow", "follow-up", "fyi", "i",
    "important", "make", "next", "no", "note", "notes", "please", "prepare", "question", "re",
    "reminder", "review", "schedule", "send", "set", "share", "someone", "summary", "tbd",
    "team", "the", "they", "this", "todo", "update", "we",
];

/// Longest capture still treated as a name.
const MAX_NAME_WORDS: usize = 4;

/// The text patterns an assignee can be recognized from, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssigneePattern {
    /// `@Jane` or `@Jane Doe`
    Mention,
    /// `[Bob] to send the doc`
    Bracket,
    /// `Assigned to: Carol`, `Owner: Carol`; stops at the first punctuation mark
    Marker,
    /// `Dave: update the slide`
    LeadingColon,
    /// `Erin to book the room`, `Erin will book the room`
    LeadingAction,
}

impl AssigneePattern {
    pub const PRIORITY: [AssigneePattern; 5] = [
        AssigneePattern::Mention,
        AssigneePattern::Bracket,
        AssigneePattern::Marker,
        AssigneePattern::LeadingColon,
        AssigneePattern::LeadingAction,
    ];

    /// Runs this pattern alone against `text`, returning the raw capture.
    pub fn capture(&self, text: &str) -> Option<String> {
        let captured = match self {
            AssigneePattern::Mention => first_group(re_mention(), text),
            AssigneePattern::Bracket => {
                first_group(re_bracket(), text).filter(|name| starts_like_name(name))
            }
            AssigneePattern::Marker => first_group(re_marker(), text),
            AssigneePattern::LeadingColon => {
                first_group(re_leading_colon(), text).filter(|name| starts_like_name(name))
            }
            AssigneePattern::LeadingAction => {
                first_group(re_leading_action(), text).filter(|name| starts_like_name(name))
            }
        }?;

        let captured = collapse_whitespace(&captured);
        let words = captured.split_whitespace().count();
        (words > 0 && words <= MAX_NAME_WORDS).then_some(captured)
    }
}

fn re_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The `@` must not follow a word character, so email addresses are skipped.
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\w@])@(\w[\w'\-]*(?:[ \t]+\p{Lu}[\p{L}'\-]*)?)").unwrap()
    })
}

fn re_bracket() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only list markers and whitespace may precede the bracket.
    RE.get_or_init(|| {
        Regex::new(r"^[\s\-\*\x{2022}\d\.\)]*\[\s*(\p{Lu}[^\[\]\n]*?)\s*\]").unwrap()
    })
}

fn re_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?i:assigned[ \t]+to|assigned|assignee|owner)[ \t]*:?[ \t]*(\p{Lu}[\p{L}'\-]*(?:[ \t]+\p{Lu}[\p{L}'\-]*){0,2})",
        )
        .unwrap()
    })
}

fn re_leading_colon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\p{Lu}[\p{L}'\-]*(?:[ \t]+\p{Lu}[\p{L}'\-]*)?)[ \t]*:").unwrap()
    })
}

fn re_leading_action() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(\p{Lu}[\p{L}'\-]*(?:[ \t]+\p{Lu}[\p{L}'\-]*)?)[ \t]+(?:to|will|should|needs[ \t]+to|must)[ \t]+\p{L}",
        )
        .unwrap()
    })
}

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn starts_like_name(candidate: &str) -> bool {
    candidate
        .split_whitespace()
        .next()
        .map(|first| !NON_NAME_WORDS.contains(&first.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Finds the assignee named in an action item, along with the pattern that matched.
pub fn extract_assignee_with_pattern(text: &str) -> Option<(AssigneePattern, String)> {
    AssigneePattern::PRIORITY.iter().find_map(|pattern| {
        pattern
            .capture(text)
            .map(|name| (*pattern, reformat_name(&name)))
            .filter(|(_, name)| !name.is_empty())
    })
}

/// Finds the assignee named in an action item.
///
/// Returns `None` when no pattern matches; that is the normal outcome for
/// unassigned items, not an error.
pub fn extract_assignee(text: &str) -> Option<String> {
    extract_assignee_with_pattern(text).map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention() {
        assert_eq!(
            extract_assignee("@Jane please review"),
            Some("Jane".to_string())
        );
        assert_eq!(
            extract_assignee("Please review the deck @Jane Doe."),
            Some("Jane Doe".to_string())
        );
    }

    #[test]
    fn test_bracket() {
        assert_eq!(
            extract_assignee("[Bob] to send the doc"),
            Some("Bob".to_string())
        );
        assert_eq!(
            extract_assignee("- [Doe, Jane] circulate notes"),
            Some("Jane Doe".to_string())
        );
    }

    #[test]
    fn test_bracket_rejects_labels() {
        assert_eq!(extract_assignee("[TODO] follow up"), None);
        assert_eq!(extract_assignee("[Action] Send deck"), None);
        assert_eq!(
            AssigneePattern::Bracket.capture("[Action] Send deck"),
            None
        );
    }

    #[test]
    fn test_bracket_must_be_near_start() {
        assert_eq!(extract_assignee("send the doc [Bob]"), None);
    }

    #[test]
    fn test_marker() {
        assert_eq!(
            extract_assignee("Assigned to: Carol"),
            Some("Carol".to_string())
        );
        assert_eq!(
            extract_assignee("Ship the release notes, assigned to Carol Smith."),
            Some("Carol Smith".to_string())
        );
        assert_eq!(extract_assignee("owner: Dana"), Some("Dana".to_string()));
    }

    #[test]
    fn test_marker_stops_at_comma() {
        assert_eq!(
            extract_assignee("Assigned to: Carol, Dave"),
            Some("Carol".to_string())
        );
        assert_eq!(
            extract_assignee("Owner: Carol Smith; Dave to review"),
            Some("Carol Smith".to_string())
        );
    }

    #[test]
    fn test_leading_colon() {
        assert_eq!(
            extract_assignee("Dave: update the slide"),
            Some("Dave".to_string())
        );
    }

    #[test]
    fn test_leading_colon_rejects_instruction_words() {
        assert_eq!(extract_assignee("Review: the Q3 deck"), None);
        assert_eq!(extract_assignee("Next Steps: circulate notes"), None);
        assert_eq!(extract_assignee("FYI: budget moved"), None);
        assert_eq!(extract_assignee("Re: budget"), None);
    }

    #[test]
    fn test_leading_action() {
        assert_eq!(
            extract_assignee("Erin to book the room"),
            Some("Erin".to_string())
        );
        assert_eq!(
            extract_assignee("Erin Lee will follow up with legal"),
            Some("Erin Lee".to_string())
        );
        assert_eq!(extract_assignee("Team to regroup next week"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_assignee("No owner mentioned here"), None);
        assert_eq!(extract_assignee(""), None);
        assert_eq!(extract_assignee("   "), None);
        assert_eq!(extract_assignee("[]@@::"), None);
    }

    #[test]
    fn test_email_address_is_not_a_mention() {
        assert_eq!(
            extract_assignee("forward the invite to ops@example.com"),
            None
        );
    }

    // Priority between overlapping patterns is policy, not derived behavior.
    #[test]
    fn test_mention_wins_over_marker() {
        assert_eq!(
            extract_assignee_with_pattern("Assigned to: Carol, cc @Jane"),
            Some((AssigneePattern::Mention, "Jane".to_string()))
        );
    }

    #[test]
    fn test_bracket_wins_over_leading_colon() {
        assert_eq!(
            extract_assignee_with_pattern("[Bob] Dave: sync on pricing"),
            Some((AssigneePattern::Bracket, "Bob".to_string()))
        );
    }

    #[test]
    fn test_marker_wins_over_leading_action() {
        assert_eq!(
            extract_assignee_with_pattern("Dave to draft the plan, owner Carol"),
            Some((AssigneePattern::Marker, "Carol".to_string()))
        );
    }

    #[test]
    fn test_each_pattern_runs_independently() {
        assert_eq!(
            AssigneePattern::LeadingColon.capture("Dave: update the slide"),
            Some("Dave".to_string())
        );
        assert_eq!(AssigneePattern::Mention.capture("Dave: update the slide"), None);
    }
}
