// src/chat/classifier.rs

//! Keyword classifier for free-text customer messages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{fill, SupportConfig};

/// Prefix of the glossary command, e.g. `/define chargeback`.
pub const DEFINE_COMMAND: &str = "/define";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    HighRisk,
    Emotional,
    Normal,
}

/// Reply produced by the normal (non-escalating) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub content: String,
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    high_risk: Vec<String>,
    emotional: Vec<String>,
    canned_replies: HashMap<String, String>,
    glossary: HashMap<String, String>,
    generic_reply: String,
    glossary_hint: String,
    glossary_missing: String,
    glossary_index: String,
}

impl KeywordClassifier {
    pub fn from_config(config: &SupportConfig) -> Self {
        Self {
            high_risk: config.keywords.high_risk.clone(),
            emotional: config.keywords.emotional.clone(),
            canned_replies: config.canned_replies.clone(),
            glossary: config.glossary.clone(),
            generic_reply: config.scripts.generic_reply.clone(),
            glossary_hint: config.scripts.glossary_hint.clone(),
            glossary_missing: config.scripts.glossary_missing.clone(),
            glossary_index: config.scripts.glossary_index.clone(),
        }
    }

    /// High-risk keywords win over emotional ones.
    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        if self.high_risk.iter().any(|kw| lower.contains(kw.as_str())) {
            Classification::HighRisk
        } else if self.emotional.iter().any(|kw| lower.contains(kw.as_str())) {
            Classification::Emotional
        } else {
            Classification::Normal
        }
    }

    /// Canned reply on an exact phrase match, generic acknowledgement otherwise.
    pub fn normal_reply(&self, text: &str) -> BotReply {
        let key = text.trim().to_lowercase();
        let content = self
            .canned_replies
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.generic_reply.clone());

        BotReply {
            content,
            follow_up: self
                .mentioned_term(&key)
                .map(|term| fill(&self.glossary_hint, &[("term", term)])),
        }
    }

    pub fn define(&self, term: &str) -> Option<&str> {
        self.glossary
            .get(&term.trim().to_lowercase())
            .map(|s| s.as_str())
    }

    /// Parses `/define <term>`; `None` when the text is not a glossary command.
    pub fn glossary_command<'a>(&self, text: &'a str) -> Option<&'a str> {
        let trimmed = text.trim();
        let head = trimmed.get(..DEFINE_COMMAND.len())?;
        if !head.eq_ignore_ascii_case(DEFINE_COMMAND) {
            return None;
        }
        let rest = &trimmed[DEFINE_COMMAND.len()..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(rest.trim())
    }

    pub fn definition_reply(&self, term: &str) -> String {
        if term.trim().is_empty() {
            return fill(&self.glossary_index, &[("terms", self.terms().join(", ").as_str())]);
        }
        match self.define(term) {
            Some(definition) => format!("{}: {}", term.trim(), definition),
            None => fill(&self.glossary_missing, &[("term", term.trim())]),
        }
    }

    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.glossary.keys().map(|s| s.as_str()).collect();
        terms.sort_unstable();
        terms
    }

    /// Longest glossary term contained in `lower`, so "card freeze" beats "card".
    fn mentioned_term(&self, lower: &str) -> Option<&str> {
        self.glossary
            .keys()
            .filter(|term| contains_word(lower, term))
            .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|s| s.as_str())
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
