//! Query routing: expansion, back-reference resolution, entity naming.
//!
//! The router turns a raw user query plus the user's memory record into a
//! `RouterDecision`. It prefers cheap local heuristics and calls the
//! `Resolver` at most once; any resolver failure degrades to passing the
//! query through untouched, so routing never fails a request.

use ragline_core::memory::{MemoryRecord, UserId};
use ragline_core::resolver::{Resolver, RouterDecision};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pronouns and phrases that mark a query as a back-reference.
const BACK_REFERENCE_PRONOUNS: &[&str] = &[
    "he", "she", "him", "her", "his", "hers", "they", "them", "their", "theirs", "it", "its",
];

const BACK_REFERENCE_PHRASES: &[&str] = &["what about", "how about", "and the same"];

/// Pronouns that read as possessive when followed by another word.
const POSSESSIVE_PRONOUNS: &[&str] = &["his", "hers", "their", "theirs", "its"];

/// Capitalized words that are never part of a person's name.
const NAME_STOPWORDS: &[&str] = &[
    "Who", "What", "When", "Where", "Why", "How", "Which", "Tell", "Give", "Show", "Is", "Are",
    "Was", "Were", "Does", "Do", "Did", "Can", "Could", "Should", "Would", "Will", "Please",
    "The", "A", "An", "And", "Or", "But", "About", "For", "From", "With", "In", "On", "At", "To",
    "I", "He", "She", "It", "They", "We", "You", "His", "Her", "Their", "Its", "This", "That",
    "These", "Those", "If", "Not", "No", "Yes", "As", "By", "Of", "So", "Also", "However",
];

const ROUTE_INSTRUCTIONS: &str = "\
You decide whether a follow-up question needs rewriting to stand on its own. \
Given the previous question and the follow-up, reply with JSON only, no prose, \
in this exact shape: {\"expanded_query\": string, \"should_rewrite\": boolean, \
\"resolved_entity\": string or null, \"reason\": string}. \
Set resolved_entity only when the previous question clearly names who or what \
the follow-up refers to; never invent one.";

const EXTRACT_INSTRUCTIONS: &str = "\
Name the single person the following text is chiefly about. \
Reply with just that person's name and nothing else. \
If no specific person is clearly the subject, reply with exactly NONE.";

/// Resolver replies for routing are parsed leniently into this shape.
#[derive(Debug, Deserialize)]
struct RawRouteReply {
    expanded_query: Option<String>,
    #[serde(default)]
    should_rewrite: bool,
    #[serde(default)]
    resolved_entity: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

pub struct QueryRouter {
    resolver: Arc<dyn Resolver>,
}

impl QueryRouter {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Decide how to treat `query` for `user`, given what memory holds.
    ///
    /// Precedence: an explicit name in the query wins over everything;
    /// then a pronoun rewritten from the remembered entity; then one
    /// resolver call seeded with the remembered query; then pass-through.
    pub async fn route(&self, query: &str, record: &MemoryRecord, user: &UserId) -> RouterDecision {
        if let Some(name) = find_person_name(query) {
            debug!(user = %user, entity = %name, "explicit entity in query");
            return RouterDecision {
                expanded_query: query.to_string(),
                should_rewrite: false,
                resolved_entity: Some(name),
                reason: "query names its subject explicitly".into(),
            };
        }

        if !is_back_reference(query) {
            return RouterDecision::passthrough(query, "self-contained query");
        }

        if let Some(entity) = record.last_entity.as_deref() {
            let expanded = substitute_entity(query, entity);
            debug!(user = %user, entity = %entity, expanded = %expanded, "back-reference resolved from memory");
            return RouterDecision {
                expanded_query: expanded,
                should_rewrite: true,
                resolved_entity: Some(entity.to_string()),
                reason: "pronoun resolved from remembered entity".into(),
            };
        }

        let Some(last_query) = record.last_query.as_deref() else {
            return RouterDecision::passthrough(query, "back-reference with no prior context");
        };

        let input = format!("Previous question: {last_query}\nFollow-up question: {query}");
        match self.resolver.resolve(ROUTE_INSTRUCTIONS, &input).await {
            Ok(reply) => match parse_route_reply(&reply) {
                Some(decision) if !decision.expanded_query.trim().is_empty() => {
                    debug!(user = %user, expanded = %decision.expanded_query, "resolver expanded query");
                    decision
                }
                _ => {
                    warn!(user = %user, "resolver reply unusable, passing query through");
                    RouterDecision::passthrough(query, "resolver reply unusable")
                }
            },
            Err(err) => {
                warn!(user = %user, error = %err, "resolver call failed, passing query through");
                RouterDecision::passthrough(query, "resolver unavailable")
            }
        }
    }

    /// Name the person a finished answer was about, if any.
    ///
    /// Tries the capitalized-name scan first; only when that finds
    /// nothing does it spend a resolver call. Failures of either path
    /// read as "no entity" — this must never take a request down.
    pub async fn extract_entity_name(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.len() < 4 {
            return None;
        }

        if let Some(name) = find_person_name(trimmed) {
            return Some(name);
        }

        match self.resolver.resolve(EXTRACT_INSTRUCTIONS, trimmed).await {
            Ok(reply) => parse_entity_reply(&reply),
            Err(err) => {
                debug!(error = %err, "entity extraction call failed");
                None
            }
        }
    }
}

fn parse_route_reply(reply: &str) -> Option<RouterDecision> {
    let cleaned = strip_code_fences(reply);
    let raw: RawRouteReply = serde_json::from_str(cleaned).ok()?;
    let expanded_query = raw.expanded_query?;
    let resolved_entity = raw.resolved_entity.filter(|e| !e.trim().is_empty());
    Some(RouterDecision {
        expanded_query,
        should_rewrite: raw.should_rewrite,
        resolved_entity,
        reason: raw
            .reason
            .unwrap_or_else(|| "resolver-expanded follow-up".into()),
    })
}

fn parse_entity_reply(reply: &str) -> Option<String> {
    let name = strip_code_fences(reply).trim().trim_matches('"').trim();
    if name.is_empty() || name.eq_ignore_ascii_case("none") {
        return None;
    }
    // A name is one short line; anything else is the model rambling.
    if name.len() > 80 || name.contains('\n') {
        return None;
    }
    Some(name.to_string())
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn bare_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Does the query lean on an unnamed antecedent?
pub fn is_back_reference(query: &str) -> bool {
    let lower = query.to_lowercase();
    if BACK_REFERENCE_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    lower
        .split_whitespace()
        .map(bare_word)
        .any(|w| BACK_REFERENCE_PRONOUNS.contains(&w))
}

/// Find the first run of two or more capitalized words that reads like a
/// person's name. Single capitalized words are too ambiguous to trust.
pub fn find_person_name(text: &str) -> Option<String> {
    let mut run: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        let bare = bare_word(word);
        if is_name_word(bare) {
            run.push(bare);
            // Punctuation after the word ends the run either way.
            if word.ends_with(|c: char| !c.is_alphanumeric()) {
                if run.len() >= 2 {
                    return Some(run.join(" "));
                }
                run.clear();
            }
        } else {
            if run.len() >= 2 {
                return Some(run.join(" "));
            }
            run.clear();
        }
    }
    if run.len() >= 2 {
        return Some(run.join(" "));
    }
    None
}

fn is_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_uppercase()
        && chars.clone().count() >= 1
        && chars.all(|c| c.is_lowercase())
        && !NAME_STOPWORDS.contains(&word)
}

/// Rewrite a pronoun-bearing query around a known entity.
///
/// Replaces the first back-reference pronoun with the entity (possessive
/// where the grammar calls for it); if no token substitutes cleanly, the
/// entity is appended as a parenthetical instead.
fn substitute_entity(query: &str, entity: &str) -> String {
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut replaced = false;

    for (i, word) in words.iter().enumerate() {
        let bare = bare_word(word);
        let lower = bare.to_lowercase();
        if !replaced && BACK_REFERENCE_PRONOUNS.contains(&lower.as_str()) {
            let trailing: String = word
                .chars()
                .rev()
                .take_while(|c| !c.is_alphanumeric())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let possessive = POSSESSIVE_PRONOUNS.contains(&lower.as_str())
                || (lower == "her" && i + 1 < words.len());
            if possessive {
                out.push(format!("{entity}'s{trailing}"));
            } else {
                out.push(format!("{entity}{trailing}"));
            }
            replaced = true;
        } else {
            out.push((*word).to_string());
        }
    }

    if replaced {
        out.join(" ")
    } else {
        format!("{query} ({entity})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingResolver, ScriptedResolver};

    fn record(last_query: Option<&str>, last_entity: Option<&str>) -> MemoryRecord {
        MemoryRecord {
            last_query: last_query.map(String::from),
            last_entity: last_entity.map(String::from),
        }
    }

    #[test]
    fn finds_two_word_names() {
        assert_eq!(
            find_person_name("Tell me about Maria Lopez"),
            Some("Maria Lopez".into())
        );
        assert_eq!(
            find_person_name("Who is John Smith?"),
            Some("John Smith".into())
        );
        assert_eq!(
            find_person_name("Maria Lopez leads finance at the company."),
            Some("Maria Lopez".into())
        );
    }

    #[test]
    fn single_capitalized_words_are_not_names() {
        assert_eq!(find_person_name("What is Kubernetes?"), None);
        assert_eq!(find_person_name("tell me about pricing"), None);
        assert_eq!(find_person_name("How does The Product work"), None);
    }

    #[test]
    fn stopwords_do_not_join_names() {
        // "Who Is" must not read as a name even though both are capitalized.
        assert_eq!(find_person_name("Who Is responsible here"), None);
    }

    #[test]
    fn back_reference_detection() {
        assert!(is_back_reference("what does she do?"));
        assert!(is_back_reference("what about him"));
        assert!(is_back_reference("What is their role?"));
        assert!(!is_back_reference("what is the refund policy?"));
        // "hers" inside another word must not match.
        assert!(!is_back_reference("show me the others"));
    }

    #[test]
    fn substitution_replaces_pronoun_in_place() {
        assert_eq!(
            substitute_entity("what does she do?", "Maria Lopez"),
            "what does Maria Lopez do?"
        );
        assert_eq!(
            substitute_entity("what about him?", "John Smith"),
            "what about John Smith?"
        );
    }

    #[test]
    fn substitution_handles_possessives() {
        assert_eq!(
            substitute_entity("what is his role?", "John Smith"),
            "what is John Smith's role?"
        );
        assert_eq!(
            substitute_entity("what does her team do", "Maria Lopez"),
            "what does Maria Lopez's team do"
        );
        // Objective "her" at the end of the query is not possessive.
        assert_eq!(
            substitute_entity("what about her?", "Maria Lopez"),
            "what about Maria Lopez?"
        );
    }

    #[tokio::test]
    async fn explicit_name_wins_over_memory() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let decision = router
            .route(
                "Tell me about John Smith",
                &record(Some("old query"), Some("Maria Lopez")),
                &UserId::anonymous(),
            )
            .await;
        assert!(!decision.should_rewrite);
        assert_eq!(decision.resolved_entity.as_deref(), Some("John Smith"));
        assert_eq!(decision.expanded_query, "Tell me about John Smith");
    }

    #[tokio::test]
    async fn pronoun_rewritten_from_remembered_entity() {
        // Resolver must not be consulted when memory already has the entity.
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let decision = router
            .route(
                "what does she do?",
                &record(Some("Who is the CFO?"), Some("Maria Lopez")),
                &UserId::from("u1"),
            )
            .await;
        assert!(decision.should_rewrite);
        assert_eq!(decision.expanded_query, "what does Maria Lopez do?");
        assert_eq!(decision.resolved_entity.as_deref(), Some("Maria Lopez"));
    }

    #[tokio::test]
    async fn resolver_consulted_when_only_query_remembered() {
        let reply = r#"{"expanded_query":"What does the CFO of Acme do?","should_rewrite":true,"resolved_entity":null,"reason":"expanded from prior question"}"#;
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying(reply)));
        let decision = router
            .route(
                "what about them?",
                &record(Some("Who runs Acme?"), None),
                &UserId::from("u1"),
            )
            .await;
        assert!(decision.should_rewrite);
        assert_eq!(decision.expanded_query, "What does the CFO of Acme do?");
    }

    #[tokio::test]
    async fn resolver_reply_in_code_fences_still_parses() {
        let reply = "```json\n{\"expanded_query\":\"expanded\",\"should_rewrite\":true}\n```";
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying(reply)));
        let decision = router
            .route(
                "what about it?",
                &record(Some("prior"), None),
                &UserId::from("u1"),
            )
            .await;
        assert_eq!(decision.expanded_query, "expanded");
    }

    #[tokio::test]
    async fn resolver_failure_degrades_to_passthrough() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let decision = router
            .route(
                "what about them?",
                &record(Some("Who runs Acme?"), None),
                &UserId::from("u1"),
            )
            .await;
        assert!(!decision.should_rewrite);
        assert_eq!(decision.expanded_query, "what about them?");
        assert!(decision.resolved_entity.is_none());
    }

    #[tokio::test]
    async fn garbled_resolver_reply_degrades_to_passthrough() {
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying("not json at all")));
        let decision = router
            .route(
                "what about them?",
                &record(Some("Who runs Acme?"), None),
                &UserId::from("u1"),
            )
            .await;
        assert_eq!(decision.expanded_query, "what about them?");
        assert!(!decision.should_rewrite);
    }

    #[tokio::test]
    async fn self_contained_query_passes_through_without_calls() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let decision = router
            .route(
                "what is the refund policy?",
                &record(Some("prior"), Some("Maria Lopez")),
                &UserId::from("u1"),
            )
            .await;
        assert!(!decision.should_rewrite);
        assert!(decision.resolved_entity.is_none());
        assert_eq!(decision.expanded_query, "what is the refund policy?");
    }

    #[tokio::test]
    async fn back_reference_with_empty_memory_passes_through() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let decision = router
            .route("what about her?", &MemoryRecord::default(), &UserId::anonymous())
            .await;
        assert!(!decision.should_rewrite);
        assert_eq!(decision.expanded_query, "what about her?");
    }

    #[tokio::test]
    async fn extraction_prefers_heuristic_over_resolver() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        let name = router
            .extract_entity_name("Maria Lopez leads the finance organization.")
            .await;
        assert_eq!(name.as_deref(), Some("Maria Lopez"));
    }

    #[tokio::test]
    async fn extraction_falls_back_to_resolver() {
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying("Maria Lopez")));
        let name = router
            .extract_entity_name("the person leading finance joined in 2019 and...")
            .await;
        assert_eq!(name.as_deref(), Some("Maria Lopez"));
    }

    #[tokio::test]
    async fn extraction_handles_none_reply() {
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying("NONE")));
        let name = router
            .extract_entity_name("our refund policy allows returns within thirty days")
            .await;
        assert!(name.is_none());
    }

    #[tokio::test]
    async fn extraction_is_safe_on_short_text() {
        let router = QueryRouter::new(Arc::new(FailingResolver));
        assert!(router.extract_entity_name("").await.is_none());
        assert!(router.extract_entity_name("ok").await.is_none());
        assert!(router.extract_entity_name("   ").await.is_none());
    }

    #[tokio::test]
    async fn extraction_rejects_rambling_replies() {
        let reply = "The text appears to be about\nMaria Lopez, who leads finance.";
        let router = QueryRouter::new(Arc::new(ScriptedResolver::replying(reply)));
        let name = router
            .extract_entity_name("the person leading finance joined in 2019 and...")
            .await;
        assert!(name.is_none());
    }
}
