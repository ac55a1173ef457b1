//! Property-based tests for the responder
//!
//! These tests verify that the fixed replies and first-match ordering hold
//! for arbitrary tables and messages.

use super::*;
use crate::knowledge::RuleEntry;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_keyword() -> impl Strategy<Value = String> {
    "[a-z]{2,8}( [a-z]{2,6})?"
}

fn arb_rule() -> impl Strategy<Value = RuleEntry> {
    (
        prop::collection::vec(arb_keyword(), 1..4),
        "[A-Z][a-z ]{5,30}\\.",
    )
        .prop_map(|(keywords, answer)| RuleEntry { keywords, answer })
}

fn arb_table() -> impl Strategy<Value = (String, RuleTable)> {
    ("[a-z_]{3,20}", prop::collection::vec(arb_rule(), 0..6))
        .prop_map(|(subject, rules)| (subject.clone(), RuleTable::new().with_subject(subject, rules)))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn unknown_subject_always_no_data(
        (subject, table) in arb_table(),
        message in ".{0,40}",
    ) {
        let other = format!("{subject}_missing");
        prop_assert_eq!(respond(&table, &other, &message), NO_DATA_MESSAGE);
    }

    #[test]
    fn digits_only_message_never_matches(
        (subject, table) in arb_table(),
        message in "[0-9 ]{0,20}",
    ) {
        // Keywords are lowercase letters, so a digit message contains none
        prop_assert_eq!(respond(&table, &subject, &message), FALLBACK_MESSAGE);
    }

    #[test]
    fn embedded_keyword_returns_an_answer(
        (subject, table) in arb_table(),
        prefix in "[0-9 ]{0,5}",
        suffix in "[0-9 ]{0,5}",
        pick in any::<prop::sample::Index>(),
    ) {
        let rules = table.rules(&subject).unwrap();
        prop_assume!(!rules.is_empty());
        let rule = &rules[pick.index(rules.len())];
        let keyword = &rule.keywords[0];

        let message = format!("{prefix}{}{suffix}", keyword.to_uppercase());
        let found = find_match(&table, &subject, &message);

        match found {
            Match::Answer { rule: index, answer, .. } => {
                // Earlier rules may also match; never a later one
                prop_assert!(index <= rules.iter().position(|r| std::ptr::eq(r, rule)).unwrap());
                prop_assert_eq!(answer, rules[index].answer.as_str());
            }
            other => prop_assert!(false, "expected an answer, got {:?}", other),
        }
    }

    #[test]
    fn first_matching_rule_wins(
        (subject, table) in arb_table(),
        message in "[a-z ]{0,40}",
    ) {
        let rules = table.rules(&subject).unwrap();
        let normalized = normalize(&message);
        let expected = rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k.as_str())))
            .map_or(FALLBACK_MESSAGE, |rule| rule.answer.as_str());
        prop_assert_eq!(respond(&table, &subject, &message), expected);
    }

    #[test]
    fn respond_is_idempotent(
        (subject, table) in arb_table(),
        message in ".{0,40}",
    ) {
        let first = respond(&table, &subject, &message);
        let second = respond(&table, &subject, &message);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn surrounding_whitespace_is_ignored(
        (subject, table) in arb_table(),
        message in "[a-z ]{0,30}",
        pad in "[ \t\n]{0,4}",
    ) {
        let padded = format!("{pad}{message}{pad}");
        prop_assert_eq!(
            respond(&table, &subject, &padded),
            respond(&table, &subject, &message)
        );
    }
}
