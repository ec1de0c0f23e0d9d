//! Fact extraction from free-text product descriptions
//!
//! Descriptions are written as a run of labeled sections, e.g.
//! `Fabric: 100% Cotton Model Measurements: Height 1.78 ...`. Every label
//! occurrence marks a cut position; a fact's value is the text between the
//! end of its label and the next cut.

use regex::Regex;
use tracing::debug;

use super::html_cleaner::clean_html;
use super::{ParsingError, ParsingResult};
use crate::domain::product::DescriptionFacts;
use crate::infrastructure::config::DescriptionLabels;

/// The labeled facts a description can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    Fabric,
    ModelMeasurements,
    ProductMeasurements,
    ProductInfo,
    ModelOnBody,
}

impl FactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::ModelMeasurements => "model_measurements",
            Self::ProductMeasurements => "product_measurements",
            Self::ProductInfo => "product_info",
            Self::ModelOnBody => "model_on_body",
        }
    }
}

/// A label found in the text: `start..end` covers the label and its colon
#[derive(Debug, Clone, Copy)]
struct LabelMatch {
    kind: FactKind,
    start: usize,
    end: usize,
}

pub struct DescriptionParser {
    patterns: Vec<(FactKind, Regex)>,
}

impl DescriptionParser {
    /// Parser with the built-in English/Turkish label set
    pub fn new() -> ParsingResult<Self> {
        Self::with_labels(&DescriptionLabels::default())
    }

    pub fn with_labels(labels: &DescriptionLabels) -> ParsingResult<Self> {
        let groups = [
            (FactKind::Fabric, &labels.fabric),
            (FactKind::ModelMeasurements, &labels.model_measurements),
            (FactKind::ProductMeasurements, &labels.product_measurements),
            (FactKind::ProductInfo, &labels.product_info),
            (FactKind::ModelOnBody, &labels.model_on_body),
        ];

        let mut patterns = Vec::with_capacity(groups.len());
        for (kind, aliases) in groups {
            patterns.push((kind, Self::compile_label_pattern(kind, aliases)?));
        }

        Ok(Self { patterns })
    }

    /// One case-insensitive alternation per fact. Longer aliases come first
    /// so "Mankenin Üzerindeki Beden" beats its own prefix.
    fn compile_label_pattern(kind: FactKind, aliases: &[String]) -> ParsingResult<Regex> {
        let mut aliases: Vec<&str> = aliases
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();

        if aliases.is_empty() {
            return Err(ParsingError::configuration(
                kind.as_str(),
                "at least one description label is required",
            ));
        }
        aliases.sort_by_key(|a| std::cmp::Reverse(a.chars().count()));

        let alternation = aliases
            .iter()
            .map(|alias| {
                alias
                    .split_whitespace()
                    .map(|word| dotted_i_insensitive(&regex::escape(word)))
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(r"(?i)\b(?:{alternation})\s*:");
        Regex::new(&pattern).map_err(|e| ParsingError::configuration(kind.as_str(), e.to_string()))
    }

    /// Extract facts from an HTML description
    pub fn extract_from_html(&self, html: &str) -> DescriptionFacts {
        self.extract(&clean_html(html))
    }

    /// Extract facts from already cleaned text
    pub fn extract(&self, text: &str) -> DescriptionFacts {
        let labels = self.find_labels(text);
        let mut facts = DescriptionFacts::default();

        for (i, label) in labels.iter().enumerate() {
            let value_end = labels.get(i + 1).map_or(text.len(), |next| next.start);
            let Some(value) = text.get(label.end..value_end).and_then(clean_value) else {
                continue;
            };

            let slot = match label.kind {
                FactKind::Fabric => &mut facts.fabric,
                FactKind::ModelMeasurements => &mut facts.model_measurements,
                FactKind::ProductMeasurements => &mut facts.product_measurements,
                FactKind::ProductInfo => &mut facts.product_info,
                FactKind::ModelOnBody => &mut facts.model_on_body,
            };
            // First occurrence wins
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        debug!("Extracted {} labeled sections from description", labels.len());
        facts
    }

    /// All label occurrences ordered by position, with labels nested inside
    /// an earlier, longer label dropped ("Measurements:" inside
    /// "Model Measurements:").
    fn find_labels(&self, text: &str) -> Vec<LabelMatch> {
        let mut matches: Vec<LabelMatch> = self
            .patterns
            .iter()
            .flat_map(|(kind, regex)| {
                regex.find_iter(text).map(move |m| LabelMatch {
                    kind: *kind,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();

        matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut accepted: Vec<LabelMatch> = Vec::with_capacity(matches.len());
        for candidate in matches {
            if accepted.last().is_none_or(|last| candidate.start >= last.end) {
                accepted.push(candidate);
            }
        }
        accepted
    }
}

/// Simple case folding does not pair Turkish `İ`/`ı` with `i`/`I`, so every
/// i-variant in a label matches all four
fn dotted_i_insensitive(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        match c {
            'i' | 'I' | 'İ' | 'ı' => out.push_str("[iIİı]"),
            other => out.push(other),
        }
    }
    out
}

/// Collapse whitespace and trim the separators that surround a value
fn clean_value(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | ',' | ';' | '|' | '•'));

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
