//! Compiled visibility rule set
use std::collections::HashSet;
use std::fmt;

use d7460n_config::manifest::{GateKind, Manifest, RuleSpec};
use d7460n_css3::selector::CssSelector;
use d7460n_css3::{matches, parse_selector};
use d7460n_html5::document::Document;
use d7460n_shared::node::NodeId;
use log::debug;

use crate::errors::Error;

/// The condition a region must meet to be shown
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// Shown only while the region has content (whitespace does not count)
    Emptiness,
    /// Shown only while the region also matches the selector
    Toggle(CssSelector),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Emptiness => write!(f, "emptiness"),
            Gate::Toggle(when) => write!(f, "toggle when {when}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityRule {
    pub region: CssSelector,
    pub gate: Gate,
}

impl VisibilityRule {
    pub fn applies_to(&self, doc: &Document, node_id: NodeId) -> bool {
        matches(doc, node_id, &self.region)
    }

    /// Evaluates the gate for a node the rule applies to
    pub fn passes(&self, doc: &Document, node_id: NodeId) -> bool {
        match &self.gate {
            Gate::Emptiness => !doc.is_empty_region(node_id),
            Gate::Toggle(when) => matches(doc, node_id, when),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<VisibilityRule>,
}

impl RuleSet {
    /// Compiles the rules of a manifest. Any defect rejects the whole set.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, Error> {
        Self::compile(&manifest.rules)
    }

    pub fn compile(specs: &[RuleSpec]) -> Result<Self, Error> {
        let mut seen: HashSet<(String, GateKind)> = HashSet::new();
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            let region = compile_selector(&spec.region)?;

            if !seen.insert((region.to_string(), spec.gate)) {
                return Err(Error::AuthoringDefect(format!(
                    "conflicting rules: region '{region}' has more than one {:?} gate",
                    spec.gate
                )));
            }

            let gate = match (spec.gate, spec.when.as_deref()) {
                (GateKind::Emptiness, None) => Gate::Emptiness,
                (GateKind::Emptiness, Some(_)) => {
                    return Err(Error::AuthoringDefect(format!(
                        "emptiness rule for '{region}' cannot have a 'when' condition"
                    )));
                }
                (GateKind::Toggle, Some(when)) => Gate::Toggle(compile_selector(when)?),
                (GateKind::Toggle, None) => {
                    return Err(Error::AuthoringDefect(format!(
                        "toggle rule for '{region}' needs a 'when' selector"
                    )));
                }
            };

            debug!("deriver: compiled rule '{region}' ({gate})");
            rules.push(VisibilityRule { region, gate });
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[VisibilityRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules whose region matches the node
    pub fn gates_for<'a>(&'a self, doc: &'a Document, node_id: NodeId) -> impl Iterator<Item = &'a VisibilityRule> + 'a {
        self.rules.iter().filter(move |rule| rule.applies_to(doc, node_id))
    }
}

fn compile_selector(source: &str) -> Result<CssSelector, Error> {
    let selector = parse_selector(source).map_err(|err| Error::Selector {
        selector: source.to_string(),
        source: err,
    })?;

    if selector.uses_class_or_id() {
        return Err(Error::AuthoringDefect(format!(
            "selector '{source}' uses a class or id, state must be derived from structure"
        )));
    }

    Ok(selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn rule(region: &str, gate: GateKind, when: Option<&str>) -> RuleSpec {
        RuleSpec {
            region: region.into(),
            gate,
            when: when.map(str::to_string),
        }
    }

    #[test]
    fn builtin_manifest_compiles() {
        let manifest = Manifest::builtin().unwrap();
        let rules = RuleSet::from_manifest(&manifest).unwrap();

        assert_eq!(rules.rules().len(), manifest.rules.len());
        assert_eq!(rules.rules()[0].gate, Gate::Emptiness);
    }

    #[test]
    fn different_gates_on_one_region_are_fine() {
        let rules = RuleSet::compile(&[
            rule("nav", GateKind::Emptiness, None),
            rule("nav", GateKind::Toggle, Some(":checked + nav")),
        ])
        .unwrap();
        assert_eq!(rules.rules().len(), 2);
    }

    #[test_case(vec![rule("aside", GateKind::Emptiness, None), rule("ASIDE", GateKind::Emptiness, None)]; "conflicting rules")]
    #[test_case(vec![rule("aside.panel", GateKind::Emptiness, None)]; "class in region")]
    #[test_case(vec![rule("nav", GateKind::Toggle, Some("#menu:checked + nav"))]; "id in condition")]
    #[test_case(vec![rule("nav", GateKind::Toggle, None)]; "toggle without condition")]
    #[test_case(vec![rule("aside", GateKind::Emptiness, Some("aside"))]; "emptiness with condition")]
    fn authoring_defects(specs: Vec<RuleSpec>) {
        assert!(matches!(RuleSet::compile(&specs), Err(Error::AuthoringDefect(_))));
    }

    #[test]
    fn unparsable_selector() {
        let err = RuleSet::compile(&[rule("main >", GateKind::Emptiness, None)]).unwrap_err();
        assert!(matches!(err, Error::Selector { ref selector, .. } if selector == "main >"));
    }
}
