//! Cross-file placeholder aggregation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::file_name;
use crate::pattern::PlaceholderKind;
use crate::resolver::PlaceholderOccurrence;

/// Where a placeholder was found: one entry per (file, section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderLocation {
    pub file_name: String,
    pub file_path: PathBuf,
    pub occurrences: usize,
    /// Snippet around the first occurrence in this section.
    pub context: String,
    pub section: String,
}

/// A placeholder aggregated across all scanned files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
    /// Source of the pattern that found it.
    pub pattern: String,
    pub locations: Vec<PlaceholderLocation>,
    pub total_occurrences: usize,
}

impl Placeholder {
    fn new(name: &str, kind: PlaceholderKind, pattern: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            pattern: pattern.to_owned(),
            locations: Vec::new(),
            total_occurrences: 0,
        }
    }

    fn record(&mut self, file: &Path, section: &str, context: String) {
        if let Some(location) = self
            .locations
            .iter_mut()
            .find(|l| l.file_path == file && l.section == section)
        {
            location.occurrences += 1;
        } else {
            self.locations.push(PlaceholderLocation {
                file_name: file_name(file),
                file_path: file.to_path_buf(),
                occurrences: 1,
                context,
                section: section.to_owned(),
            });
        }
        self.total_occurrences += 1;
    }

    fn absorb(&mut self, other: Self) {
        self.locations.extend(other.locations);
        self.total_occurrences = self.locations.iter().map(|l| l.occurrences).sum();
    }
}

/// Owned per-file (or per-pass) accumulator, merged after tasks join.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    entries: BTreeMap<(String, PlaceholderKind), Placeholder>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence found in `file` under `section`.
    pub fn record(
        &mut self,
        occurrence: &PlaceholderOccurrence,
        pattern: &str,
        file: &Path,
        section: &str,
        context: impl FnOnce() -> String,
    ) {
        let key = (occurrence.name.clone(), occurrence.kind);
        let placeholder = self
            .entries
            .entry(key)
            .or_insert_with(|| Placeholder::new(&occurrence.name, occurrence.kind, pattern));
        let known = placeholder
            .locations
            .iter()
            .any(|l| l.file_path == file && l.section == section);
        let context = if known { String::new() } else { context() };
        placeholder.record(file, section, context);
    }

    /// Fold `other` into `self`, concatenating locations per placeholder.
    pub fn merge(&mut self, other: Self) {
        for (key, placeholder) in other.entries {
            match self.entries.get_mut(&key) {
                Some(existing) => existing.absorb(placeholder),
                None => {
                    self.entries.insert(key, placeholder);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholders sorted by name, then kind.
    pub fn into_placeholders(self) -> Vec<Placeholder> {
        self.entries.into_values().collect()
    }
}

/// Merge placeholder lists from separate passes, keeping name/kind order.
pub(crate) fn merge_placeholders(left: Vec<Placeholder>, right: Vec<Placeholder>) -> Vec<Placeholder> {
    let mut accumulator = Accumulator::new();
    for placeholders in [left, right] {
        let mut pass = Accumulator::new();
        for placeholder in placeholders {
            pass.entries
                .insert((placeholder.name.clone(), placeholder.kind), placeholder);
        }
        accumulator.merge(pass);
    }
    accumulator.into_placeholders()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pattern::{DEFAULT_PATTERN, PlaceholderPattern};
    use crate::resolver::resolve;

    fn occurrences(text: &str) -> Vec<PlaceholderOccurrence> {
        resolve(&PlaceholderPattern::default(), &[text]).occurrences
    }

    #[test]
    fn test_same_section_increments() {
        let mut acc = Accumulator::new();
        let file = Path::new("/docs/a.docx");
        for occurrence in occurrences("{{x}} and {{x}}") {
            acc.record(&occurrence, DEFAULT_PATTERN, file, "Body", || "ctx".to_owned());
        }
        for occurrence in occurrences("{{x}}") {
            acc.record(&occurrence, DEFAULT_PATTERN, file, "Footer0", || "f".to_owned());
        }

        let placeholders = acc.into_placeholders();
        assert_eq!(placeholders.len(), 1);
        let x = &placeholders[0];
        assert_eq!(x.total_occurrences, 3);
        assert_eq!(x.locations.len(), 2);
        assert_eq!(x.locations[0].occurrences, 2);
        assert_eq!(x.locations[0].context, "ctx");
        assert_eq!(x.locations[0].file_name, "a.docx");
        assert_eq!(x.locations[1].section, "Footer0");
    }

    #[test]
    fn test_image_and_text_kept_apart() {
        let mut acc = Accumulator::new();
        let file = Path::new("a.docx");
        for occurrence in occurrences("{{logo}} {{image:logo|width:10|height:10}}") {
            acc.record(&occurrence, DEFAULT_PATTERN, file, "Body", String::new);
        }

        let kinds: Vec<PlaceholderKind> = acc.into_placeholders().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PlaceholderKind::Text, PlaceholderKind::Image]);
    }

    #[test]
    fn test_merge_concatenates_locations() {
        let mut first = Accumulator::new();
        let mut second = Accumulator::new();
        for occurrence in occurrences("{{b}} {{a}}") {
            first.record(&occurrence, DEFAULT_PATTERN, Path::new("1.docx"), "Body", String::new);
        }
        for occurrence in occurrences("{{a}}") {
            second.record(&occurrence, DEFAULT_PATTERN, Path::new("2.docx"), "Body", String::new);
        }

        first.merge(second);
        let placeholders = first.into_placeholders();

        let names: Vec<&str> = placeholders.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(placeholders[0].total_occurrences, 2);
        let files: Vec<&str> = placeholders[0]
            .locations
            .iter()
            .map(|l| l.file_name.as_str())
            .collect();
        assert_eq!(files, vec!["1.docx", "2.docx"]);
    }
}
