//! Detection layers.
//!
//! Every layer implements the [`Layer`] trait: a pure function from a parsed
//! [`Document`] to a list of findings. Layers never mutate shared state, so
//! [`analyze`](crate::analyze) runs them in parallel and merges their output
//! in [`LayerKind`] order.
//!
//! | Layer | Module | Looks for |
//! |-------|--------|-----------|
//! | `unicode` | [`unicode`] | Bidi controls, invisible characters, mixed-script homoglyphs |
//! | `structure` | [`structure`] | Frontmatter completeness, section naming, link safety |
//! | `injection` | [`injection`] | Prompt-injection phrasing, destructive commands, hidden text |
//! | `coherence` | [`coherence`] | Declared purpose vs. actual instructions |
//!
//! Use [`all_layers`] to obtain the registered layers and [`all_rules`] to
//! list every rule they define.

pub mod coherence;
pub mod confusables;
pub mod injection;
pub mod structure;
pub mod unicode;

use crate::config::Config;
use crate::document::Document;
use crate::finding::{Finding, LayerKind, Severity};

/// A detection layer.
///
/// Implementers must be [`Send`] + [`Sync`] because layers run in parallel
/// via [rayon] over the same immutable document.
pub trait Layer: Send + Sync {
    fn kind(&self) -> LayerKind;

    /// Short, human-readable description of the layer.
    fn description(&self) -> &'static str;

    /// Scans the document and returns findings in emission order.
    fn scan(&self, doc: &Document, config: &Config) -> Vec<Finding>;
}

/// Returns every registered layer, in merge order.
pub fn all_layers() -> Vec<Box<dyn Layer>> {
    vec![
        Box::new(unicode::UnicodeLayer),
        Box::new(structure::StructureLayer),
        Box::new(injection::InjectionLayer),
        Box::new(coherence::CoherenceLayer),
    ]
}

/// Metadata for a single rule, used by the `list-rules` and `explain`
/// commands. Each layer module exposes a `rules()` function.
pub struct RuleInfo {
    /// Stable rule identifier (e.g., `"bidi-control"`).
    pub id: &'static str,
    /// Base severity. Some injection rules are adjusted by context.
    pub severity: Severity,
    pub layer: LayerKind,
    pub message: &'static str,
    pub remediation: &'static str,
}

/// Aggregates [`RuleInfo`] from every layer, in layer order.
pub fn all_rules() -> Vec<RuleInfo> {
    let mut rules = Vec::new();
    rules.extend(unicode::rules());
    rules.extend(structure::rules());
    rules.extend(injection::rules());
    rules.extend(coherence::rules());
    rules
}

/// Looks up a rule by id.
pub fn find_rule(id: &str) -> Option<RuleInfo> {
    all_rules().into_iter().find(|r| r.id == id)
}
