//! Inline constraint messages, one per invalid field
use d7460n_html5::document::Document;
use d7460n_html5::validity::Constraint;
use d7460n_shared::node::NodeId;

/// Message for the given failed constraint of a control
pub fn constraint_message(doc: &Document, control: NodeId, constraint: Constraint) -> String {
    let kind = doc.element(control).map(|data| data.control_type()).unwrap_or_default();
    let name = doc.element(control).map(|data| data.name().to_owned()).unwrap_or_default();
    let attr = |attr_name: &str| doc.attribute(control, attr_name).unwrap_or_default().trim().to_owned();
    let length = doc.control_value(control).chars().count();

    match constraint {
        Constraint::ValueMissing => match (name.as_str(), kind.as_str()) {
            ("input", "checkbox") => "Please check this box if you want to proceed.".into(),
            ("input", "radio") => "Please select one of these options.".into(),
            ("select", _) => "Please select an item in the list.".into(),
            _ => "Please fill out this field.".into(),
        },
        Constraint::TypeMismatch => match kind.as_str() {
            "email" => "Please enter an email address.".into(),
            "url" => "Please enter a URL.".into(),
            _ => "Please enter a valid value.".into(),
        },
        Constraint::PatternMismatch => match doc.attribute(control, "title").map(str::trim) {
            Some(title) if !title.is_empty() => format!("Please match the requested format: {title}."),
            _ => "Please match the requested format.".into(),
        },
        Constraint::TooLong => format!(
            "Please shorten this text to {} characters or less (you are currently using {length} characters).",
            attr("maxlength")
        ),
        Constraint::TooShort => format!(
            "Please lengthen this text to {} characters or more (you are currently using {length} characters).",
            attr("minlength")
        ),
        Constraint::RangeUnderflow => format!("Value must be greater than or equal to {}.", attr("min")),
        Constraint::RangeOverflow => format!("Value must be less than or equal to {}.", attr("max")),
        Constraint::StepMismatch => "Please enter a valid value.".into(),
        Constraint::BadInput => match kind.as_str() {
            "date" => "Please enter a valid date.".into(),
            _ => "Please enter a number.".into(),
        },
    }
}
