//! Compliance rules gating stage locks.
//!
//! Rules are declarative predicates over a stage's draft text. A lock
//! attempt runs every applicable rule and reports the full list of
//! violations at once, never just the first.

use crate::catalogue::StageDefinition;
use crate::errors::RulePatternError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const BOLDED_SPAN_PATTERN: &str = r"\*\*[^*\n]+\*\*";
const VERBATIM_QUOTE_PATTERN: &str = r#""[^"\n]+""#;
const BARE_LINK_PATTERN: &str = r"https?://\S+|\[[^\]]*\]\([^)]+\)";
const STAR_HEADING_PATTERN: &str = r"(?m)^\s*(?:#{1,6}\s+|\*\*)(Situation|Task|Action|Result)\b";

/// The STAR subheadings, in the order an expanded story presents them.
const STAR_SECTIONS: [&str; 4] = ["Situation", "Task", "Action", "Result"];

/// A declarative compliance rule attached to a stage definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The draft must contain at least one non-whitespace character.
    NonEmptyDraft,
    /// The draft must contain at least one bolded span (e.g. a bolded metric).
    BoldedSpan,
    /// The draft must quote a verbatim excerpt (a quotation-delimited substring).
    VerbatimQuote,
    /// The draft must not contain bare hyperlink syntax. Applied globally.
    NoBareLinks,
    /// The draft must contain the Situation/Task/Action/Result subheadings.
    StarSubheadings,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEmptyDraft => write!(f, "non_empty_draft"),
            Self::BoldedSpan => write!(f, "bolded_span"),
            Self::VerbatimQuote => write!(f, "verbatim_quote"),
            Self::NoBareLinks => write!(f, "no_bare_links"),
            Self::StarSubheadings => write!(f, "star_subheadings"),
        }
    }
}

/// A single failed rule with a human-readable reason.
///
/// Reasons are surfaced verbatim to the operator, so they name exactly
/// what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// The rule that failed.
    pub rule: Rule,
    /// Why it failed.
    pub reason: String,
}

impl RuleViolation {
    /// Creates a new rule violation.
    #[must_use]
    pub fn new(rule: Rule, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

/// Checks stage drafts against their compliance rules.
///
/// Patterns are compiled once at construction; compilation failures are
/// propagated as [`RulePatternError`] rather than panicking.
#[derive(Debug)]
pub struct RuleEngine {
    bolded_span: Regex,
    verbatim_quote: Regex,
    bare_link: Regex,
    star_heading: Regex,
}

impl RuleEngine {
    /// Creates a rule engine with all patterns compiled.
    ///
    /// # Errors
    ///
    /// Returns [`RulePatternError`] if any built-in pattern fails to compile.
    pub fn new() -> Result<Self, RulePatternError> {
        Ok(Self {
            bolded_span: compile(BOLDED_SPAN_PATTERN)?,
            verbatim_quote: compile(VERBATIM_QUOTE_PATTERN)?,
            bare_link: compile(BARE_LINK_PATTERN)?,
            star_heading: compile(STAR_HEADING_PATTERN)?,
        })
    }

    /// Checks a draft against the global rules plus the stage's own rules.
    ///
    /// Returns every violation found; an empty vector means the draft is
    /// compliant. `NonEmptyDraft` and `NoBareLinks` apply to every stage
    /// whether or not the definition lists them.
    #[must_use]
    pub fn check(&self, definition: &StageDefinition, content: &str) -> Vec<RuleViolation> {
        let mut rules = vec![Rule::NonEmptyDraft, Rule::NoBareLinks];
        for rule in &definition.rules {
            if !rules.contains(rule) {
                rules.push(*rule);
            }
        }

        rules
            .into_iter()
            .filter_map(|rule| self.check_rule(rule, content))
            .collect()
    }

    /// Checks a single rule against a draft.
    #[must_use]
    pub fn check_rule(&self, rule: Rule, content: &str) -> Option<RuleViolation> {
        match rule {
            Rule::NonEmptyDraft => {
                if content.trim().is_empty() {
                    return Some(RuleViolation::new(rule, "draft content is empty"));
                }
            }
            Rule::BoldedSpan => {
                if !self.bolded_span.is_match(content) {
                    return Some(RuleViolation::new(
                        rule,
                        "no bolded span found; at least one **bolded** metric or phrase is required",
                    ));
                }
            }
            Rule::VerbatimQuote => {
                if !self.verbatim_quote.is_match(content) {
                    return Some(RuleViolation::new(
                        rule,
                        "no verbatim quote found; a \"quoted excerpt\" is required",
                    ));
                }
            }
            Rule::NoBareLinks => {
                if let Some(m) = self.bare_link.find(content) {
                    return Some(RuleViolation::new(
                        rule,
                        format!("hyperlink syntax is not allowed: '{}'", m.as_str()),
                    ));
                }
            }
            Rule::StarSubheadings => {
                let found: Vec<&str> = self
                    .star_heading
                    .captures_iter(content)
                    .filter_map(|c| c.get(1).map(|m| m.as_str()))
                    .collect();
                let missing: Vec<&str> = STAR_SECTIONS
                    .iter()
                    .filter(|section| !found.contains(*section))
                    .copied()
                    .collect();
                if !missing.is_empty() {
                    return Some(RuleViolation::new(
                        rule,
                        format!("missing STAR subheading(s): {}", missing.join(", ")),
                    ));
                }
            }
        }
        None
    }
}

fn compile(pattern: &str) -> Result<Regex, RulePatternError> {
    Regex::new(pattern).map_err(|source| RulePatternError::new(pattern, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::StageDefinition;

    fn engine() -> RuleEngine {
        RuleEngine::new().unwrap()
    }

    fn definition(rules: Vec<Rule>) -> StageDefinition {
        StageDefinition::new("stage1", "Test Stage")
            .carried_forward(true)
            .with_rules(rules)
    }

    #[test]
    fn test_bolded_span_passes() {
        let violation = engine().check_rule(Rule::BoldedSpan, "cut latency by **40%**");
        assert!(violation.is_none());
    }

    #[test]
    fn test_bolded_span_fails_without_bold() {
        let violation = engine().check_rule(Rule::BoldedSpan, "cut latency by 40%");
        assert!(violation.is_some());
        assert_eq!(violation.unwrap().rule, Rule::BoldedSpan);
    }

    #[test]
    fn test_bolded_span_rejects_unclosed_delimiter() {
        let violation = engine().check_rule(Rule::BoldedSpan, "a ** dangling delimiter");
        assert!(violation.is_some());
    }

    #[test]
    fn test_verbatim_quote() {
        let ok = engine().check_rule(Rule::VerbatimQuote, r#"the spec says "5+ years of Rust""#);
        assert!(ok.is_none());

        let bad = engine().check_rule(Rule::VerbatimQuote, "the spec asks for Rust experience");
        assert!(bad.is_some());
    }

    #[test]
    fn test_no_bare_links_flags_url() {
        let violation = engine().check_rule(Rule::NoBareLinks, "see https://example.com for more");
        assert!(violation.is_some());
        assert!(violation.unwrap().reason.contains("https://example.com"));
    }

    #[test]
    fn test_no_bare_links_flags_markdown_link() {
        let violation = engine().check_rule(Rule::NoBareLinks, "see [my site](example.com)");
        assert!(violation.is_some());
    }

    #[test]
    fn test_no_bare_links_allows_plain_text() {
        let violation = engine().check_rule(Rule::NoBareLinks, "no links in here at all");
        assert!(violation.is_none());
    }

    #[test]
    fn test_star_subheadings_complete() {
        let content = "\
## Situation\nTeam was behind.\n\
## Task\nShip the migration.\n\
## Action\nLed the rewrite.\n\
## Result\nShipped early.\n";
        assert!(engine().check_rule(Rule::StarSubheadings, content).is_none());
    }

    #[test]
    fn test_star_subheadings_bold_labels_accepted() {
        let content = "**Situation**: x\n**Task**: y\n**Action**: z\n**Result**: w\n";
        assert!(engine().check_rule(Rule::StarSubheadings, content).is_none());
    }

    #[test]
    fn test_star_subheadings_names_missing_sections() {
        let content = "## Situation\nx\n## Task\ny\n";
        let violation = engine().check_rule(Rule::StarSubheadings, content).unwrap();
        assert!(violation.reason.contains("Action"));
        assert!(violation.reason.contains("Result"));
        assert!(!violation.reason.contains("Situation"));
    }

    #[test]
    fn test_check_reports_all_violations_at_once() {
        let def = definition(vec![Rule::BoldedSpan, Rule::VerbatimQuote]);
        let violations = engine().check(&def, "plain text with https://a.link");
        let rules: Vec<Rule> = violations.iter().map(|v| v.rule).collect();
        assert!(rules.contains(&Rule::NoBareLinks));
        assert!(rules.contains(&Rule::BoldedSpan));
        assert!(rules.contains(&Rule::VerbatimQuote));
    }

    #[test]
    fn test_check_empty_draft() {
        let def = definition(vec![]);
        let violations = engine().check(&def, "   \n  ");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::NonEmptyDraft);
    }

    #[test]
    fn test_check_compliant_draft() {
        let def = definition(vec![Rule::BoldedSpan]);
        let violations = engine().check(&def, "- **Systems Architect**: cut costs **40%**");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_rule_serializes_snake_case() {
        let json = serde_json::to_string(&Rule::StarSubheadings).unwrap();
        assert_eq!(json, r#""star_subheadings""#);
    }
}
