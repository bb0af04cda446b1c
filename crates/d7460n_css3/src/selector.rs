use core::fmt::Debug;
use itertools::Itertools;
use std::fmt::Display;

/// A selector list (`a, b > c`). Every entry of `parts` is one complex selector: compound parts
/// separated by combinator parts, written left to right.
#[derive(PartialEq, Clone)]
pub struct CssSelector {
    // List of parts that make up this selector
    pub parts: Vec<Vec<CssSelectorPart>>,
}

impl CssSelector {
    /// True when any part, including the arguments of functional pseudo-classes, is a class or id
    /// selector. Those never match in a snapshot without classes and identifiers.
    pub fn uses_class_or_id(&self) -> bool {
        self.parts.iter().flatten().any(|part| match part {
            CssSelectorPart::Class(_) | CssSelectorPart::Id(_) => true,
            CssSelectorPart::PseudoClass(pseudo) => pseudo.argument().is_some_and(CssSelector::uses_class_or_id),
            _ => false,
        })
    }
}

/// Represents a CSS selector part, which has a type and value (e.g. type=Attribute, name="hidden")
#[derive(PartialEq, Clone, Default)]
pub enum CssSelectorPart {
    #[default]
    Universal,
    Attribute(Box<AttributeSelector>),
    Class(String),
    Id(String),
    PseudoClass(PseudoClass),
    Combinator(Combinator),
    Type(String),
}

#[derive(PartialEq, Clone, Default, Debug)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: MatcherType,
    pub value: String,
    pub case_insensitive: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

impl Display for Combinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, ">"),
            Combinator::NextSibling => write!(f, "+"),
            Combinator::SubsequentSibling => write!(f, "~"),
        }
    }
}

/// Pseudo-classes that can be answered from structure, native attributes and control state
#[derive(Debug, PartialEq, Clone)]
pub enum PseudoClass {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    Checked,
    Indeterminate,
    Disabled,
    Enabled,
    Required,
    Optional,
    Valid,
    Invalid,
    UserValid,
    UserInvalid,
    Open,
    Not(Box<CssSelector>),
    Is(Box<CssSelector>),
    /// Relative selector list; each complex selector starts with its combinator
    Has(Box<CssSelector>),
}

impl PseudoClass {
    /// Looks up a pseudo-class without arguments by its (lowercase) name
    pub fn from_name(name: &str) -> Option<Self> {
        let pseudo = match name {
            "root" => PseudoClass::Root,
            "empty" => PseudoClass::Empty,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "checked" => PseudoClass::Checked,
            "indeterminate" => PseudoClass::Indeterminate,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "required" => PseudoClass::Required,
            "optional" => PseudoClass::Optional,
            "valid" => PseudoClass::Valid,
            "invalid" => PseudoClass::Invalid,
            "user-valid" => PseudoClass::UserValid,
            "user-invalid" => PseudoClass::UserInvalid,
            "open" => PseudoClass::Open,
            _ => return None,
        };
        Some(pseudo)
    }

    pub fn argument(&self) -> Option<&CssSelector> {
        match self {
            PseudoClass::Not(arg) | PseudoClass::Is(arg) | PseudoClass::Has(arg) => Some(arg),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PseudoClass::Root => "root",
            PseudoClass::Empty => "empty",
            PseudoClass::FirstChild => "first-child",
            PseudoClass::LastChild => "last-child",
            PseudoClass::OnlyChild => "only-child",
            PseudoClass::Checked => "checked",
            PseudoClass::Indeterminate => "indeterminate",
            PseudoClass::Disabled => "disabled",
            PseudoClass::Enabled => "enabled",
            PseudoClass::Required => "required",
            PseudoClass::Optional => "optional",
            PseudoClass::Valid => "valid",
            PseudoClass::Invalid => "invalid",
            PseudoClass::UserValid => "user-valid",
            PseudoClass::UserInvalid => "user-invalid",
            PseudoClass::Open => "open",
            PseudoClass::Not(_) => "not",
            PseudoClass::Is(_) => "is",
            PseudoClass::Has(_) => "has",
        }
    }
}

/// Represents which type of matcher is used (in case of an attribute selector type)
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug)]
pub enum MatcherType {
    #[default]
    None, // No matcher
    Equals,         // Equals
    Includes,       // Must include
    DashMatch,      // Must start with
    PrefixMatch,    // Must begin with
    SuffixMatch,    // Must ends with
    SubstringMatch, // Must contain
}

impl Display for MatcherType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatcherType::None => write!(f, ""),
            MatcherType::Equals => write!(f, "="),
            MatcherType::Includes => write!(f, "~="),
            MatcherType::DashMatch => write!(f, "|="),
            MatcherType::PrefixMatch => write!(f, "^="),
            MatcherType::SuffixMatch => write!(f, "$="),
            MatcherType::SubstringMatch => write!(f, "*="),
        }
    }
}

impl Debug for CssSelectorPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl Display for CssSelectorPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CssSelectorPart::Universal => write!(f, "*"),
            CssSelectorPart::Attribute(selector) => {
                write!(f, "[{}", selector.name)?;
                if selector.matcher != MatcherType::None {
                    write!(f, "{}\"{}\"", selector.matcher, selector.value)?;
                    if selector.case_insensitive {
                        write!(f, " i")?;
                    }
                }
                write!(f, "]")
            }
            CssSelectorPart::Class(name) => write!(f, ".{name}"),
            CssSelectorPart::Id(name) => write!(f, "#{name}"),
            CssSelectorPart::PseudoClass(pseudo) => match pseudo.argument() {
                Some(argument) => write!(f, ":{}({argument})", pseudo.name()),
                None => write!(f, ":{}", pseudo.name()),
            },
            CssSelectorPart::Combinator(Combinator::Descendant) => write!(f, " "),
            CssSelectorPart::Combinator(combinator) => write!(f, " {combinator} "),
            CssSelectorPart::Type(name) => write!(f, "{name}"),
        }
    }
}

impl Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = self
            .parts
            .iter()
            .map(|complex| complex.iter().map(ToString::to_string).join("").trim().to_string())
            .join(", ");
        write!(f, "{list}")
    }
}

impl Debug for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CssSelector({self})")
    }
}
