//! Keyword responder
//!
//! Maps `(subject, message)` to a canned answer by scanning the subject's
//! rules in order and taking the first rule with a keyword that occurs in
//! the message. Matching is plain substring search on the trimmed,
//! lower-cased message, so `"hi"` also matches `"history"`.

#[cfg(test)]
mod proptests;

use crate::knowledge::RuleTable;

/// Reply when no rule in the subject matches
pub const FALLBACK_MESSAGE: &str = "I'm sorry, I don't understand that yet.";

/// Reply when the subject is not in the rule table
pub const NO_DATA_MESSAGE: &str = "Sorry, I don't have data for this topic yet.";

/// Outcome of matching one message against the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match<'a> {
    /// A rule matched. `rule` is its index within the subject.
    Answer { rule: usize, keyword: &'a str, answer: &'a str },
    NoMatch,
    UnknownSubject,
}

impl<'a> Match<'a> {
    /// The text sent back to the user
    #[must_use]
    pub fn reply(&self) -> &'a str {
        match *self {
            Match::Answer { answer, .. } => answer,
            Match::NoMatch => FALLBACK_MESSAGE,
            Match::UnknownSubject => NO_DATA_MESSAGE,
        }
    }
}

/// Normalize a message the way rules are authored: trimmed, lowercase
#[must_use]
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

/// Find the first rule in `subject` with a keyword contained in `message`
#[must_use]
pub fn find_match<'a>(table: &'a RuleTable, subject: &str, message: &str) -> Match<'a> {
    let Some(rules) = table.rules(subject) else {
        return Match::UnknownSubject;
    };

    let normalized = normalize(message);
    for (index, rule) in rules.iter().enumerate() {
        if let Some(keyword) = rule
            .keywords
            .iter()
            .find(|keyword| normalized.contains(keyword.as_str()))
        {
            return Match::Answer {
                rule: index,
                keyword,
                answer: &rule.answer,
            };
        }
    }

    Match::NoMatch
}

/// Reply text for `message` in `subject`
#[must_use]
pub fn respond(table: &RuleTable, subject: &str, message: &str) -> String {
    find_match(table, subject, message).reply().to_string()
}
