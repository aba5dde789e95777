//! Placeholder pattern matching over flattened paragraph text.
//!
//! Two syntaxes are recognized:
//!
//! - image directives: `{{image:<name>|width:<digits>|height:<digits>}}`
//! - text placeholders: a configurable regex, `{{name}}` by default
//!
//! Image directives are matched first and the text regex only sees the gaps
//! between them, so a directive is never reported as a text placeholder.
//! Spans always refer to byte offsets in the original string.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::EngineError;

/// Default text placeholder syntax: `{{name}}`.
pub const DEFAULT_PATTERN: &str = r"\{\{([^}]+)\}\}";

const IMAGE_PATTERN: &str = r"\{\{image:([^|}]+)\|width:([0-9]+)\|height:([0-9]+)\}\}";

/// Upper bound for the compiled size of a user pattern.
const SIZE_LIMIT: usize = 1 << 20;

/// Compilation flags for placeholder patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    pub case_insensitive: bool,
}

/// Placeholder flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Text,
    Image,
}

impl std::fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Properties captured from an image directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageProps {
    pub name: String,
    pub max_width: u32,
    pub max_height: u32,
}

/// A single match in a flat string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub kind: PlaceholderKind,
    /// Trimmed placeholder name.
    pub name: String,
    /// Byte span in the searched string.
    pub span: Range<usize>,
    /// Present for [`PlaceholderKind::Image`] only.
    pub image: Option<ImageProps>,
}

/// Compiled placeholder pattern.
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    source: String,
    text: Regex,
    image: Regex,
}

impl PlaceholderPattern {
    /// Compile a text placeholder pattern.
    ///
    /// Rejects empty patterns, patterns that do not compile or exceed the size
    /// limit, and patterns that match the empty string.
    pub fn new(pattern: &str, options: PatternOptions) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty".to_owned()));
        }

        let text = RegexBuilder::new(pattern)
            .case_insensitive(options.case_insensitive)
            .size_limit(SIZE_LIMIT)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        if text.is_match("") {
            return Err(invalid("pattern matches the empty string".to_owned()));
        }

        let image = RegexBuilder::new(IMAGE_PATTERN)
            .case_insensitive(options.case_insensitive)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: pattern.to_owned(),
            text,
            image,
        })
    }

    /// Pattern source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Find all placeholders in `text`, ordered by position.
    pub fn find_all(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();
        let mut cursor = 0;

        for caps in self.image.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            // Oversized dimensions leave the directive to the text matcher.
            let (Some(width), Some(height)) = (parse_dimension(&caps, 2), parse_dimension(&caps, 3))
            else {
                continue;
            };
            let name = caps.get(1).map_or("", |m| m.as_str()).trim();
            if name.is_empty() {
                continue;
            }

            self.find_text(text, cursor..whole.start(), &mut matches);
            matches.push(PatternMatch {
                kind: PlaceholderKind::Image,
                name: name.to_owned(),
                span: whole.range(),
                image: Some(ImageProps {
                    name: name.to_owned(),
                    max_width: width,
                    max_height: height,
                }),
            });
            cursor = whole.end();
        }

        self.find_text(text, cursor..text.len(), &mut matches);
        matches
    }

    fn find_text(&self, text: &str, segment: Range<usize>, out: &mut Vec<PatternMatch>) {
        if segment.is_empty() {
            return;
        }
        let offset = segment.start;
        for caps in self.text.captures_iter(&text[segment]) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = caps.get(1).unwrap_or(whole).as_str().trim();
            if name.is_empty() {
                continue;
            }
            out.push(PatternMatch {
                kind: PlaceholderKind::Text,
                name: name.to_owned(),
                span: whole.start() + offset..whole.end() + offset,
                image: None,
            });
        }
    }
}

impl Default for PlaceholderPattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN, PatternOptions::default())
            .expect("default placeholder pattern is valid")
    }
}

fn parse_dimension(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

/// Check that `pattern` is usable as a text placeholder pattern.
pub fn validate_pattern(pattern: &str, options: PatternOptions) -> Result<(), EngineError> {
    PlaceholderPattern::new(pattern, options).map(|_| ())
}
