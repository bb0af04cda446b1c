use cow_utils::CowUtils;
use d7460n_html5::document::Document;
use d7460n_shared::node::NodeId;

use crate::selector::{AttributeSelector, Combinator, CssSelector, CssSelectorPart, MatcherType, PseudoClass};

// Matches a selector list against the given node(id). Only elements can match.
pub fn match_selector(doc: &Document, node_id: NodeId, selector: &CssSelector) -> bool {
    if doc.element(node_id).is_none() {
        return false;
    }

    selector
        .parts
        .iter()
        .any(|complex| match_complex(doc, node_id, complex, None))
}

/// Matches a complex selector right to left. `scope` is the element a relative selector (the
/// argument of `:has()`) is anchored to; its complex selectors start with a combinator.
fn match_complex(doc: &Document, node_id: NodeId, parts: &[CssSelectorPart], scope: Option<NodeId>) -> bool {
    let split = parts
        .iter()
        .rposition(|part| matches!(part, CssSelectorPart::Combinator(_)));
    let (rest, compound) = match split {
        Some(idx) => (&parts[..idx], &parts[idx + 1..]),
        None => (&parts[..0], parts),
    };

    if !compound.iter().all(|part| match_selector_part(doc, node_id, part)) {
        return false;
    }

    let Some(idx) = split else {
        return scope.is_none();
    };
    let CssSelectorPart::Combinator(combinator) = &parts[idx] else {
        return false;
    };

    if rest.is_empty() {
        // leading combinator of a relative selector
        return scope.is_some_and(|scope| relates(doc, node_id, *combinator, scope));
    }

    // We have matched this compound, so we move along the combinator
    match combinator {
        Combinator::Descendant => doc
            .ancestors(node_id)
            .into_iter()
            .filter(|ancestor| doc.element(*ancestor).is_some())
            .any(|ancestor| match_complex(doc, ancestor, rest, scope)),
        Combinator::Child => doc
            .parent(node_id)
            .is_some_and(|parent| match_complex(doc, parent, rest, scope)),
        Combinator::NextSibling => doc
            .previous_element_sibling(node_id)
            .is_some_and(|prev| match_complex(doc, prev, rest, scope)),
        Combinator::SubsequentSibling => doc
            .preceding_element_siblings(node_id)
            .into_iter()
            .any(|sibling| match_complex(doc, sibling, rest, scope)),
    }
}

/// Returns true when `node_id` is related to `scope` by the combinator
fn relates(doc: &Document, node_id: NodeId, combinator: Combinator, scope: NodeId) -> bool {
    match combinator {
        Combinator::Descendant => doc.ancestors(node_id).contains(&scope),
        Combinator::Child => doc.parent(node_id) == Some(scope),
        Combinator::NextSibling => doc.previous_element_sibling(node_id) == Some(scope),
        Combinator::SubsequentSibling => doc.preceding_element_siblings(node_id).contains(&scope),
    }
}

fn match_selector_part(doc: &Document, node_id: NodeId, part: &CssSelectorPart) -> bool {
    let Some(element_data) = doc.element(node_id) else {
        return false;
    };

    match part {
        CssSelectorPart::Universal => {
            // '*' always matches any element
            true
        }
        CssSelectorPart::Type(name) => *name == element_data.name(),
        // the snapshot carries no classes or identifiers
        CssSelectorPart::Class(_) | CssSelectorPart::Id(_) => false,
        CssSelectorPart::Attribute(attr) => match element_data.attribute(&attr.name) {
            Some(got_attr_value) => match_attribute(attr, got_attr_value),
            None => false,
        },
        CssSelectorPart::PseudoClass(pseudo) => match_pseudo_class(doc, node_id, pseudo),
        CssSelectorPart::Combinator(_) => false,
    }
}

fn match_attribute(attr: &AttributeSelector, got_attr_value: &str) -> bool {
    // If we need to match case-insensitive, just convert everything to lowercase for comparison
    let (wanted, got) = if attr.case_insensitive {
        (attr.value.cow_to_lowercase(), got_attr_value.cow_to_lowercase())
    } else {
        (attr.value.as_str().into(), got_attr_value.into())
    };

    match attr.matcher {
        // Just the presence of the attribute is enough
        MatcherType::None => true,
        MatcherType::Equals => wanted == got,
        // Whitespace separated list containing the word
        MatcherType::Includes => !wanted.is_empty() && got.split_whitespace().any(|word| word == wanted),
        // Exact value or value followed by a hyphen
        MatcherType::DashMatch => got == wanted || got.starts_with(&format!("{wanted}-")),
        MatcherType::PrefixMatch => !wanted.is_empty() && got.starts_with(&*wanted),
        MatcherType::SuffixMatch => !wanted.is_empty() && got.ends_with(&*wanted),
        MatcherType::SubstringMatch => !wanted.is_empty() && got.contains(&*wanted),
    }
}

fn match_pseudo_class(doc: &Document, node_id: NodeId, pseudo: &PseudoClass) -> bool {
    let is_control = doc.is_form_control(node_id);

    match pseudo {
        PseudoClass::Root => doc.parent(node_id) == Some(doc.root()),
        PseudoClass::Empty => doc.is_empty_region(node_id),
        PseudoClass::FirstChild => doc.previous_element_sibling(node_id).is_none(),
        PseudoClass::LastChild => doc.next_element_sibling(node_id).is_none(),
        PseudoClass::OnlyChild => {
            doc.previous_element_sibling(node_id).is_none() && doc.next_element_sibling(node_id).is_none()
        }
        PseudoClass::Checked => doc.is_checked(node_id),
        PseudoClass::Indeterminate => is_indeterminate(doc, node_id),
        PseudoClass::Disabled => doc.is_disabled(node_id),
        PseudoClass::Enabled => can_be_disabled(doc, node_id) && !doc.is_disabled(node_id),
        PseudoClass::Required => is_control && doc.has_attribute(node_id, "required"),
        PseudoClass::Optional => is_control && !doc.has_attribute(node_id, "required"),
        PseudoClass::Valid => is_valid_target(doc, node_id) && validity_holds(doc, node_id),
        PseudoClass::Invalid => is_valid_target(doc, node_id) && !validity_holds(doc, node_id),
        PseudoClass::UserValid => {
            doc.will_validate(node_id) && doc.user_interacted(node_id) && doc.validity(node_id).valid()
        }
        PseudoClass::UserInvalid => {
            doc.will_validate(node_id) && doc.user_interacted(node_id) && !doc.validity(node_id).valid()
        }
        PseudoClass::Open => {
            (doc.is_element_named(node_id, "details") || doc.is_element_named(node_id, "dialog"))
                && doc.has_attribute(node_id, "open")
        }
        PseudoClass::Not(selector) => !match_selector(doc, node_id, selector),
        PseudoClass::Is(selector) => match_selector(doc, node_id, selector),
        PseudoClass::Has(selector) => match_relative(doc, node_id, selector),
    }
}

fn can_be_disabled(doc: &Document, node_id: NodeId) -> bool {
    doc.element(node_id).is_some_and(|data| {
        matches!(
            data.name(),
            "button" | "input" | "select" | "textarea" | "fieldset" | "option" | "optgroup"
        )
    })
}

/// Form controls take :valid/:invalid, and so do forms and fieldsets as an aggregate
fn is_valid_target(doc: &Document, node_id: NodeId) -> bool {
    doc.is_form_control(node_id) || doc.is_element_named(node_id, "form") || doc.is_element_named(node_id, "fieldset")
}

fn validity_holds(doc: &Document, node_id: NodeId) -> bool {
    if doc.is_form_control(node_id) {
        return doc.validity(node_id).valid();
    }

    doc.descendants(node_id)
        .into_iter()
        .filter(|descendant| doc.is_form_control(*descendant))
        .all(|control| doc.validity(control).valid())
}

/// Radios whose group has nothing checked, and progress bars without a value
fn is_indeterminate(doc: &Document, node_id: NodeId) -> bool {
    let Some(data) = doc.element(node_id) else {
        return false;
    };

    match data.name() {
        "input" if data.control_type() == "radio" => {
            !doc.radio_group(node_id).into_iter().any(|radio| doc.is_checked(radio))
        }
        "progress" => !data.has_attribute("value"),
        _ => false,
    }
}

/// `:has()`: some element in scope matches one of the relative selectors anchored at `node_id`
fn match_relative(doc: &Document, node_id: NodeId, selector: &CssSelector) -> bool {
    let looks_at_siblings = selector.parts.iter().any(|complex| {
        matches!(
            complex.first(),
            Some(CssSelectorPart::Combinator(Combinator::NextSibling | Combinator::SubsequentSibling))
        )
    });

    let search_root = match (looks_at_siblings, doc.parent(node_id)) {
        (true, Some(parent)) => parent,
        _ => node_id,
    };

    doc.descendants(search_root)
        .into_iter()
        .filter(|candidate| doc.element(*candidate).is_some())
        .any(|candidate| {
            selector
                .parts
                .iter()
                .any(|complex| match_complex(doc, candidate, complex, Some(node_id)))
        })
}
