//! Element tables and the attribute policy of the structural snapshot.

/// Elements that never have children nor an end tag
pub const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose content is read verbatim until the matching end tag
pub const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "textarea"];

/// Elements that carry a value the user can edit
pub const FORM_CONTROL_ELEMENTS: [&str; 3] = ["input", "select", "textarea"];

/// Input types that never take part in constraint validation
pub const BARRED_INPUT_TYPES: [&str; 5] = ["hidden", "button", "submit", "reset", "image"];

/// Input types whose value is a free form text
pub const TEXT_INPUT_TYPES: [&str; 7] = ["text", "search", "url", "tel", "email", "password", "number"];

/// Start tags that implicitly close an open element of the same list
pub const SELF_CLOSING_SIBLINGS: [&[&str]; 6] = [
    &["li"],
    &["dt", "dd"],
    &["tr"],
    &["td", "th"],
    &["option"],
    &["p"],
];

/// Open elements that stop the search for an implicitly closed sibling
pub const SIBLING_SCOPE_BOUNDARIES: [&str; 10] = [
    "ul", "ol", "dl", "table", "tbody", "thead", "tfoot", "select", "datalist", "optgroup",
];

#[must_use]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[must_use]
pub fn is_form_control(name: &str) -> bool {
    FORM_CONTROL_ELEMENTS.contains(&name)
}

/// Returns the reason when an attribute name may not appear in the snapshot. State must be
/// derivable from tag identity, native attributes and structure alone, so classes, identifiers
/// and free-form data attributes are refused.
#[must_use]
pub fn forbidden_attribute(name: &str) -> Option<String> {
    let name = name.to_ascii_lowercase();

    if name == "class" {
        return Some("class attributes are not allowed, derive state from structure".into());
    }
    if name == "id" {
        return Some("id attributes are not allowed, derive state from structure".into());
    }
    if name.starts_with("data-") {
        return Some(format!("free-form data attribute '{name}' is not allowed"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("class", true)]
    #[test_case("ID", true)]
    #[test_case("data-row", true)]
    #[test_case("hidden", false)]
    #[test_case("aria-expanded", false)]
    #[test_case("name", false)]
    fn attribute_policy(name: &str, forbidden: bool) {
        assert_eq!(forbidden_attribute(name).is_some(), forbidden);
    }

    #[test]
    fn void_and_controls() {
        assert!(is_void("input"));
        assert!(!is_void("div"));
        assert!(is_form_control("select"));
        assert!(!is_form_control("button"));
    }
}
