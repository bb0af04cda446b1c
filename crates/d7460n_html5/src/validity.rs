//! Native constraint validation. Everything here is computed from the constraint attributes and
//! the current value of a control; there is no stored validity flag anywhere.
use crate::document::Document;
use crate::node::elements::{BARRED_INPUT_TYPES, TEXT_INPUT_TYPES};
use d7460n_shared::node::NodeId;
use log::debug;
use regex::Regex;
use std::fmt;

/// Tolerance used when checking whether a number lands on a step
const STEP_EPSILON: f64 = 1e-9;

/// A single native constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    ValueMissing,
    TypeMismatch,
    PatternMismatch,
    TooLong,
    TooShort,
    RangeUnderflow,
    RangeOverflow,
    StepMismatch,
    BadInput,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Constraint::ValueMissing => "valueMissing",
            Constraint::TypeMismatch => "typeMismatch",
            Constraint::PatternMismatch => "patternMismatch",
            Constraint::TooLong => "tooLong",
            Constraint::TooShort => "tooShort",
            Constraint::RangeUnderflow => "rangeUnderflow",
            Constraint::RangeOverflow => "rangeOverflow",
            Constraint::StepMismatch => "stepMismatch",
            Constraint::BadInput => "badInput",
        };
        write!(f, "{name}")
    }
}

/// Result of evaluating every constraint of one control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityState {
    pub value_missing: bool,
    pub type_mismatch: bool,
    pub pattern_mismatch: bool,
    pub too_long: bool,
    pub too_short: bool,
    pub range_underflow: bool,
    pub range_overflow: bool,
    pub step_mismatch: bool,
    pub bad_input: bool,
}

impl ValidityState {
    pub fn valid(&self) -> bool {
        self.violations().is_empty()
    }

    /// Failed constraints, most fundamental first
    pub fn violations(&self) -> Vec<Constraint> {
        [
            (self.value_missing, Constraint::ValueMissing),
            (self.bad_input, Constraint::BadInput),
            (self.type_mismatch, Constraint::TypeMismatch),
            (self.pattern_mismatch, Constraint::PatternMismatch),
            (self.too_long, Constraint::TooLong),
            (self.too_short, Constraint::TooShort),
            (self.range_underflow, Constraint::RangeUnderflow),
            (self.range_overflow, Constraint::RangeOverflow),
            (self.step_mismatch, Constraint::StepMismatch),
        ]
        .into_iter()
        .filter(|(failed, _)| *failed)
        .map(|(_, constraint)| constraint)
        .collect()
    }

    pub fn first_violation(&self) -> Option<Constraint> {
        self.violations().first().copied()
    }
}

impl Document {
    /// True for input, select and textarea elements
    pub fn is_form_control(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|data| data.is_form_control())
    }

    /// Returns the nearest form ancestor of the control
    pub fn form_owner(&self, node_id: NodeId) -> Option<NodeId> {
        self.ancestors(node_id)
            .into_iter()
            .find(|ancestor| self.is_element_named(*ancestor, "form"))
    }

    /// A control is disabled by its own `disabled` attribute or by a disabled fieldset ancestor,
    /// unless it sits inside that fieldset's first legend.
    pub fn is_disabled(&self, node_id: NodeId) -> bool {
        let Some(data) = self.element(node_id) else {
            return false;
        };

        let can_be_disabled = matches!(
            data.name(),
            "button" | "input" | "select" | "textarea" | "fieldset" | "option" | "optgroup"
        );
        if !can_be_disabled {
            return false;
        }
        if data.has_attribute("disabled") {
            return true;
        }

        let mut child = node_id;
        for ancestor in self.ancestors(node_id) {
            if self.is_element_named(ancestor, "fieldset") && self.has_attribute(ancestor, "disabled") {
                let first_legend = self
                    .element_children(ancestor)
                    .into_iter()
                    .find(|candidate| self.is_element_named(*candidate, "legend"));
                if first_legend != Some(child) {
                    return true;
                }
            }
            if self.is_element_named(node_id, "option") && self.is_element_named(ancestor, "optgroup") && self.has_attribute(ancestor, "disabled") {
                return true;
            }
            child = ancestor;
        }

        false
    }

    /// Whether the user edited or toggled the control
    pub fn user_interacted(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|data| data.control.interacted)
    }

    /// Checkedness of a checkbox/radio (live state first, `checked` attribute otherwise) or
    /// selectedness of an option.
    pub fn is_checked(&self, node_id: NodeId) -> bool {
        let Some(data) = self.element(node_id) else {
            return false;
        };

        if data.is_checkable() {
            return data.control.checked.unwrap_or_else(|| data.has_attribute("checked"));
        }
        if data.name() == "option" {
            return self.selected_option(self.closest_select(node_id)) == Some(node_id);
        }

        false
    }

    fn closest_select(&self, option: NodeId) -> Option<NodeId> {
        self.ancestors(option)
            .into_iter()
            .find(|ancestor| self.is_element_named(*ancestor, "select"))
    }

    /// All option elements of a select in tree order
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|node| self.is_element_named(*node, "option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attribute(option, "value") {
            Some(value) => value.to_owned(),
            None => self.text_content(option).split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    /// The option a select currently shows: the one matching the live value, the last one with a
    /// `selected` attribute, or the first option.
    fn selected_option(&self, select: Option<NodeId>) -> Option<NodeId> {
        let select = select?;
        let options = self.options(select);

        if let Some(live) = self.element(select).and_then(|data| data.control.value.as_ref()) {
            return options.into_iter().find(|option| self.option_value(*option) == *live);
        }

        options
            .iter()
            .rev()
            .find(|option| self.has_attribute(**option, "selected"))
            .or_else(|| options.first())
            .copied()
    }

    /// Current value of a control
    pub fn control_value(&self, node_id: NodeId) -> String {
        let Some(data) = self.element(node_id) else {
            return String::new();
        };

        if let Some(live) = &data.control.value {
            if data.name() != "select" {
                return live.clone();
            }
        }

        match data.name() {
            "input" => data.attribute("value").unwrap_or_default().to_owned(),
            "textarea" => self.text_content(node_id),
            "select" => self
                .selected_option(Some(node_id))
                .map(|option| self.option_value(option))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Whether the author gave the control a value before any interaction
    pub fn has_default_value(&self, node_id: NodeId) -> bool {
        let Some(data) = self.element(node_id) else {
            return false;
        };

        match data.name() {
            "input" if data.is_checkable() => data.has_attribute("checked"),
            "input" => data.attribute("value").is_some_and(|value| !value.is_empty()),
            "textarea" => !self.text_content(node_id).is_empty(),
            "select" => self
                .options(node_id)
                .iter()
                .any(|option| self.has_attribute(*option, "selected")),
            _ => false,
        }
    }

    /// Whether the control takes part in constraint validation at all
    pub fn will_validate(&self, node_id: NodeId) -> bool {
        let Some(data) = self.element(node_id) else {
            return false;
        };
        if !data.is_form_control() || self.is_disabled(node_id) {
            return false;
        }
        if data.name() == "input" && BARRED_INPUT_TYPES.contains(&data.control_type().as_str()) {
            return false;
        }
        if matches!(data.name(), "input" | "textarea") && data.has_attribute("readonly") {
            return false;
        }

        !self
            .ancestors(node_id)
            .into_iter()
            .any(|ancestor| self.is_element_named(ancestor, "datalist"))
    }

    /// Radios sharing the name and form owner of the given radio (including itself)
    pub fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.attribute(radio, "name").filter(|name| !name.is_empty()) else {
            return vec![radio];
        };
        let owner = self.form_owner(radio);

        self.tree_iterator()
            .filter(|candidate| {
                self.element(*candidate).is_some_and(|data| {
                    data.name() == "input" && data.control_type() == "radio" && data.attribute("name") == Some(name)
                })
            })
            .filter(|candidate| self.form_owner(*candidate) == owner)
            .collect()
    }

    /// Evaluates every native constraint of the control. Controls that do not take part in
    /// validation are always valid.
    pub fn validity(&self, node_id: NodeId) -> ValidityState {
        let mut state = ValidityState::default();
        if !self.will_validate(node_id) {
            return state;
        }
        let Some(data) = self.element(node_id) else {
            return state;
        };

        let kind = data.control_type();
        let value = self.control_value(node_id);
        let required = data.has_attribute("required");

        match (data.name(), kind.as_str()) {
            ("input", "checkbox") => {
                state.value_missing = required && !self.is_checked(node_id);
            }
            ("input", "radio") => {
                let group = self.radio_group(node_id);
                let group_required = group.iter().any(|radio| self.has_attribute(*radio, "required"));
                state.value_missing = group_required && !group.iter().any(|radio| self.is_checked(*radio));
            }
            ("input", "range" | "color") => {}
            ("input", "number") => {
                state.value_missing = required && value.is_empty();
                if !value.is_empty() {
                    match parse_number(&value) {
                        Some(number) => self.check_numeric_range(node_id, number, &mut state),
                        None => state.bad_input = true,
                    }
                }
            }
            ("input", "date") => {
                state.value_missing = required && value.is_empty();
                if !value.is_empty() {
                    match parse_date(&value) {
                        Some(date) => self.check_date_range(node_id, date, &mut state),
                        None => state.bad_input = true,
                    }
                }
            }
            ("input", _) | ("textarea", _) => {
                state.value_missing = required && value.is_empty();
                if !value.is_empty() {
                    if data.name() == "input" {
                        state.type_mismatch = type_mismatch(&kind, &value, data.has_attribute("multiple"));
                        if TEXT_INPUT_TYPES.contains(&kind.as_str()) {
                            state.pattern_mismatch = pattern_mismatch(data.attribute("pattern"), &value);
                        }
                    }
                    let length = value.chars().count();
                    state.too_long = parse_length(data.attribute("maxlength")).is_some_and(|max| length > max);
                    state.too_short = parse_length(data.attribute("minlength")).is_some_and(|min| length < min);
                }
            }
            ("select", _) => {
                state.value_missing = required && value.is_empty();
            }
            _ => {}
        }

        state
    }

    fn check_numeric_range(&self, node_id: NodeId, number: f64, state: &mut ValidityState) {
        let min = self.attribute(node_id, "min").and_then(parse_number);
        let max = self.attribute(node_id, "max").and_then(parse_number);

        state.range_underflow = min.is_some_and(|min| number < min);
        state.range_overflow = max.is_some_and(|max| number > max);

        let step = match self.attribute(node_id, "step") {
            Some(step) if step.trim().eq_ignore_ascii_case("any") => None,
            Some(step) => parse_number(step).filter(|step| *step > 0.0).or(Some(1.0)),
            None => Some(1.0),
        };
        if let Some(step) = step {
            let base = min
                .or_else(|| self.attribute(node_id, "value").and_then(parse_number))
                .unwrap_or(0.0);
            let steps = (number - base) / step;
            state.step_mismatch = (steps - steps.round()).abs() > STEP_EPSILON;
        }
    }

    fn check_date_range(&self, node_id: NodeId, value: Date, state: &mut ValidityState) {
        let min = self.attribute(node_id, "min").and_then(parse_date);
        let max = self.attribute(node_id, "max").and_then(parse_date);

        state.range_underflow = min.is_some_and(|min| value < min);
        state.range_overflow = max.is_some_and(|max| value > max);
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|number| number.is_finite())
}

fn parse_length(value: Option<&str>) -> Option<usize> {
    value.and_then(|value| value.trim().parse::<usize>().ok())
}

fn pattern_mismatch(pattern: Option<&str>, value: &str) -> bool {
    let Some(pattern) = pattern else {
        return false;
    };

    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => !re.is_match(value),
        Err(err) => {
            debug!("ignoring invalid pattern '{pattern}': {err}");
            false
        }
    }
}

fn type_mismatch(kind: &str, value: &str, multiple: bool) -> bool {
    match kind {
        "email" if multiple => value.split(',').any(|part| !is_valid_email(part.trim())),
        "email" => !is_valid_email(value),
        "url" => url::Url::parse(value).is_err(),
        _ => false,
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(ch));

    let domain_ok = !domain.is_empty()
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        });

    local_ok && domain_ok
}

/// (year, month, day); orders chronologically whatever the number of year digits
type Date = (u64, u32, u32);

/// YYYY-MM-DD (four or more year digits) with a plausible month and day
fn parse_date(value: &str) -> Option<Date> {
    let parts: Vec<&str> = value.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return None;
    };
    if year.len() < 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    if ![year, month, day].iter().all(|part| part.chars().all(|ch| ch.is_ascii_digit())) {
        return None;
    }

    let date: Date = (year.parse().ok()?, month.parse().ok()?, day.parse().ok()?);
    ((1..=12).contains(&date.1) && (1..=31).contains(&date.2)).then_some(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Html5Parser;
    use test_case::test_case;

    fn first(doc: &Document, name: &str) -> NodeId {
        doc.elements_named(name)[0]
    }

    fn validity_of(html: &str) -> ValidityState {
        let doc = Html5Parser::parse_document(html).unwrap();
        let control = doc
            .tree_iterator()
            .find(|node| doc.is_form_control(*node))
            .unwrap();
        doc.validity(control)
    }

    #[test_case(r#"<input required>"#, Some(Constraint::ValueMissing); "required empty")]
    #[test_case(r#"<input required value="x">"#, None; "required filled")]
    #[test_case(r#"<input type="email" value="nope">"#, Some(Constraint::TypeMismatch); "bad email")]
    #[test_case(r#"<input type="email" value="a@example.com">"#, None; "good email")]
    #[test_case(r#"<input type="url" value="example.com">"#, Some(Constraint::TypeMismatch); "relative url")]
    #[test_case(r#"<input type="url" value="https://example.com">"#, None; "absolute url")]
    #[test_case(r#"<input pattern="[0-9]{3}" value="12a">"#, Some(Constraint::PatternMismatch); "pattern mismatch")]
    #[test_case(r#"<input pattern="[0-9]{3}" value="123">"#, None; "pattern match")]
    #[test_case(r#"<input pattern="[0-9]{3}">"#, None; "empty value passes pattern")]
    #[test_case(r#"<input type="number" min="5" value="3">"#, Some(Constraint::RangeUnderflow); "underflow")]
    #[test_case(r#"<input type="number" max="5" value="9">"#, Some(Constraint::RangeOverflow); "overflow")]
    #[test_case(r#"<input type="number" step="0.5" value="1.25">"#, Some(Constraint::StepMismatch); "step")]
    #[test_case(r#"<input type="number" step="any" value="1.25">"#, None; "step any")]
    #[test_case(r#"<input type="number" min="1" step="2" value="5">"#, None; "step from min")]
    #[test_case(r#"<input type="number" value="abc">"#, Some(Constraint::BadInput); "bad number")]
    #[test_case(r#"<input type="date" min="2024-01-01" value="2023-12-31">"#, Some(Constraint::RangeUnderflow); "early date")]
    #[test_case(r#"<input type="date" max="2024-12-31" value="10000-01-01">"#, Some(Constraint::RangeOverflow); "five digit year after max")]
    #[test_case(r#"<input type="date" min="9999-12-31" value="10000-01-01">"#, None; "five digit year after min")]
    #[test_case(r#"<input type="date" value="2024-13-01">"#, Some(Constraint::BadInput); "bad date")]
    #[test_case(r#"<input maxlength="3" value="abcd">"#, Some(Constraint::TooLong); "too long")]
    #[test_case(r#"<input minlength="3" value="ab">"#, Some(Constraint::TooShort); "too short")]
    #[test_case(r#"<textarea required>  </textarea>"#, None; "textarea whitespace is a value")]
    #[test_case(r#"<textarea required></textarea>"#, Some(Constraint::ValueMissing); "textarea empty")]
    #[test_case(r#"<input type="checkbox" required>"#, Some(Constraint::ValueMissing); "checkbox unchecked")]
    #[test_case(r#"<input type="checkbox" required checked>"#, None; "checkbox checked")]
    #[test_case(r#"<select required><option value="">Pick</option><option>A</option></select>"#, Some(Constraint::ValueMissing); "select placeholder")]
    #[test_case(r#"<select required><option value="">Pick</option><option selected>A</option></select>"#, None; "select chosen")]
    #[test_case(r#"<input type="hidden" required>"#, None; "hidden is barred")]
    #[test_case(r#"<input required disabled>"#, None; "disabled is barred")]
    #[test_case(r#"<input required readonly>"#, None; "readonly is barred")]
    fn constraints(html: &str, expected: Option<Constraint>) {
        assert_eq!(validity_of(html).first_violation(), expected);
    }

    #[test]
    fn disabled_fieldset_spares_its_first_legend() {
        let doc = Html5Parser::parse_document(
            "<fieldset disabled><legend><input></legend><input><fieldset><input></fieldset></fieldset>",
        )
        .unwrap();
        let inputs = doc.elements_named("input");

        assert!(!doc.is_disabled(inputs[0]));
        assert!(doc.is_disabled(inputs[1]));
        assert!(doc.is_disabled(inputs[2]));
        assert!(doc.is_disabled(first(&doc, "fieldset")));
    }

    #[test]
    fn radio_group_requirement() {
        let doc = Html5Parser::parse_document(
            r#"<form><input type="radio" name="size" value="s" required><input type="radio" name="size" value="m"></form>
               <form><input type="radio" name="size" value="l" checked></form>"#,
        )
        .unwrap();
        let radios = doc.elements_named("input");

        assert_eq!(doc.radio_group(radios[0]), vec![radios[0], radios[1]]);
        assert!(doc.validity(radios[1]).value_missing);
        assert!(doc.validity(radios[2]).valid());
    }

    #[test]
    fn control_values() {
        let doc = Html5Parser::parse_document(
            r#"<input value="a"><textarea>b c</textarea><select><option>x</option><option selected value="y">Y</option></select>"#,
        )
        .unwrap();

        assert_eq!(doc.control_value(first(&doc, "input")), "a");
        assert_eq!(doc.control_value(first(&doc, "textarea")), "b c");
        assert_eq!(doc.control_value(first(&doc, "select")), "y");
        assert!(doc.has_default_value(first(&doc, "select")));
        assert!(doc.is_checked(doc.elements_named("option")[1]));
    }

    #[test_case("2024-02-29", true)]
    #[test_case("24-02-29", false)]
    #[test_case("2024-2-29", false)]
    #[test_case("2024-00-10", false)]
    #[test_case("10000-01-01", true)]
    fn dates(value: &str, valid: bool) {
        assert_eq!(parse_date(value).is_some(), valid);
    }

    #[test_case("user@example.com", true)]
    #[test_case("user@localhost", true)]
    #[test_case("user@-bad.com", false)]
    #[test_case("@example.com", false)]
    #[test_case("user example@x.com", false)]
    fn emails(value: &str, valid: bool) {
        assert_eq!(is_valid_email(value), valid);
    }
}
