//! Output sanitizer and input content filter.
//!
//! Model output first has a list of case-insensitive word replacements
//! applied.  If the result still matches any banned pattern the whole reply
//! is swapped for a fixed refusal; partial redaction is never attempted.
//! Finally the text is trimmed and capped to the chat platform's message
//! limit.

use regex::{NoExpand, Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Default cap on reply length, just under Discord's 2000-character limit.
pub const DEFAULT_MAX_CHARS: usize = 1900;

/// Reply used when output matches a banned pattern.
pub const DEFAULT_REFUSAL: &str = "Yeah, I'm not saying that one. Try something else.";

/// Built-in (pattern, replacement) pairs that soften profanity.
const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    (r"\bf+u+c+k+", "fudge"),
    (r"\bs+h+i+t+", "shoot"),
    (r"\bbitch", "witch"),
    (r"\bdamn", "dang"),
];

/// Built-in banned patterns.
const DEFAULT_BANNED: &[&str] = &[
    r"\bkill\s+yourself\b",
    r"\bkys\b",
    r"\bhow\s+to\s+(make|build)\s+(a\s+)?(bomb|explosive)s?\b",
    r"\bcommit\s+suicide\b",
];

/// One replacement rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub pattern: String,
    pub replacement: String,
}

/// Declarative sanitizer settings, compiled by [`Sanitizer::from_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub replacements: Vec<Replacement>,
    pub banned: Vec<String>,
    pub refusal: String,
    pub max_chars: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            replacements: DEFAULT_REPLACEMENTS
                .iter()
                .map(|(pattern, replacement)| Replacement {
                    pattern: (*pattern).to_owned(),
                    replacement: (*replacement).to_owned(),
                })
                .collect(),
            banned: DEFAULT_BANNED.iter().map(|p| (*p).to_owned()).collect(),
            refusal: DEFAULT_REFUSAL.to_owned(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Compiled sanitizer.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    replacements: Vec<(Regex, String)>,
    banned: RegexSet,
    refusal: String,
    max_chars: usize,
}

impl Sanitizer {
    /// Compile a sanitizer.  Every pattern is case-insensitive.
    pub fn from_config(config: &SanitizerConfig) -> Result<Self> {
        let replacements = config
            .replacements
            .iter()
            .map(|r| {
                RegexBuilder::new(&r.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, r.replacement.clone()))
                    .map_err(|e| AgentError::ConfigError {
                        reason: format!("invalid replacement pattern `{}`: {e}", r.pattern),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let banned = RegexSetBuilder::new(&config.banned)
            .case_insensitive(true)
            .build()
            .map_err(|e| AgentError::ConfigError {
                reason: format!("invalid banned pattern: {e}"),
            })?;

        if config.max_chars == 0 {
            return Err(AgentError::ConfigError {
                reason: "sanitizer max_chars must be positive".into(),
            });
        }

        Ok(Self {
            replacements,
            banned,
            refusal: config.refusal.clone(),
            max_chars: config.max_chars,
        })
    }

    /// Sanitize model output for display.
    pub fn sanitize(&self, text: &str) -> String {
        let mut out = text.to_owned();
        for (pattern, replacement) in &self.replacements {
            out = pattern
                .replace_all(&out, NoExpand(replacement.as_str()))
                .into_owned();
        }

        if self.banned.is_match(&out) {
            tracing::info!("model output matched banned pattern, replacing with refusal");
            return self.refusal.clone();
        }

        truncate_chars(out.trim(), self.max_chars)
            .trim_end()
            .to_owned()
    }

    /// `false` only when `text` matches a banned pattern.
    pub fn is_clean(&self, text: &str) -> bool {
        !self.banned.is_match(text)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// First `max_chars` characters of `text` (UTF-8 safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}
