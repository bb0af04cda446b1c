use crate::errors::Error;
use crate::selector::{AttributeSelector, Combinator, CssSelector, CssSelectorPart, MatcherType, PseudoClass};
use d7460n_shared::location::Location;

/// Recursive descent parser for selector lists
pub struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    /// Parses the complete input as a selector list
    pub fn parse(mut self) -> Result<CssSelector, Error> {
        let selector = self.parse_selector_list(false)?;
        self.consume_whitespace();
        if let Some(c) = self.current() {
            return Err(self.error(format!("unexpected '{c}'")));
        }

        Ok(selector)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        Some(c)
    }

    fn consume_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.current().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn consume_delim(&mut self, delim: char) -> Result<(), Error> {
        match self.consume_char() {
            Some(c) if c == delim => Ok(()),
            Some(c) => Err(self.error(format!("expected '{delim}', got '{c}'"))),
            None => Err(self.error(format!("expected '{delim}', got end of input"))),
        }
    }

    fn error(&self, message: String) -> Error {
        let offset: usize = self.chars.iter().take(self.pos).map(|c| c.len_utf8()).sum();
        Error::Parse(message, Location::from_offset(self.source, offset))
    }

    fn parse_selector_list(&mut self, relative: bool) -> Result<CssSelector, Error> {
        log::trace!("parse_selector_list");

        let mut parts = Vec::new();
        loop {
            self.consume_whitespace();
            parts.push(self.parse_complex_selector(relative)?);
            self.consume_whitespace();

            if self.current() == Some(',') {
                self.pos += 1;
                continue;
            }
            break;
        }

        Ok(CssSelector { parts })
    }

    fn parse_complex_selector(&mut self, relative: bool) -> Result<Vec<CssSelectorPart>, Error> {
        log::trace!("parse_complex_selector");

        let mut parts = Vec::new();

        if relative {
            let combinator = self.parse_combinator().unwrap_or(Combinator::Descendant);
            parts.push(CssSelectorPart::Combinator(combinator));
            self.consume_whitespace();
        }

        parts.extend(self.parse_compound_selector()?);

        loop {
            let had_whitespace = self.consume_whitespace();
            let combinator = match self.parse_combinator() {
                Some(combinator) => combinator,
                None if had_whitespace && self.starts_compound() => Combinator::Descendant,
                None => break,
            };
            self.consume_whitespace();

            parts.push(CssSelectorPart::Combinator(combinator));
            parts.extend(self.parse_compound_selector()?);
        }

        Ok(parts)
    }

    fn parse_combinator(&mut self) -> Option<Combinator> {
        let combinator = match self.current()? {
            '>' => Combinator::Child,
            '+' => Combinator::NextSibling,
            '~' => Combinator::SubsequentSibling,
            _ => return None,
        };
        self.pos += 1;
        Some(combinator)
    }

    fn starts_compound(&self) -> bool {
        self.current()
            .is_some_and(|c| matches!(c, '*' | '[' | '.' | '#' | ':') || is_ident_start(c))
    }

    fn parse_compound_selector(&mut self) -> Result<Vec<CssSelectorPart>, Error> {
        log::trace!("parse_compound_selector");

        let mut parts = Vec::new();

        match self.current() {
            Some('*') => {
                self.pos += 1;
                parts.push(CssSelectorPart::Universal);
            }
            Some(c) if is_ident_start(c) => {
                let name = self.consume_ident()?;
                parts.push(CssSelectorPart::Type(name.to_ascii_lowercase()));
            }
            _ => {}
        }

        loop {
            match self.current() {
                Some('[') => parts.push(self.parse_attribute_selector()?),
                Some('.') => {
                    self.pos += 1;
                    parts.push(CssSelectorPart::Class(self.consume_ident()?));
                }
                Some('#') => {
                    self.pos += 1;
                    parts.push(CssSelectorPart::Id(self.consume_ident()?));
                }
                Some(':') => parts.push(self.parse_pseudo_class()?),
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(match self.current() {
                Some(c) => self.error(format!("expected a selector, got '{c}'")),
                None => self.error("expected a selector, got end of input".into()),
            });
        }

        Ok(parts)
    }

    fn parse_attribute_selector(&mut self) -> Result<CssSelectorPart, Error> {
        log::trace!("parse_attribute_selector");

        self.consume_delim('[')?;
        self.consume_whitespace();
        let name = self.consume_ident()?.to_ascii_lowercase();
        self.consume_whitespace();

        let mut selector = AttributeSelector {
            name,
            ..AttributeSelector::default()
        };

        if self.current() != Some(']') {
            selector.matcher = self.parse_attribute_operator()?;
            self.consume_whitespace();

            selector.value = match self.current() {
                Some(quote @ ('"' | '\'')) => self.consume_string(quote)?,
                _ => self.consume_ident()?,
            };
            self.consume_whitespace();

            match self.current() {
                Some('i' | 'I') => {
                    self.pos += 1;
                    selector.case_insensitive = true;
                }
                Some('s' | 'S') => {
                    self.pos += 1;
                }
                _ => {}
            }
            self.consume_whitespace();
        }

        self.consume_delim(']')?;
        Ok(CssSelectorPart::Attribute(Box::new(selector)))
    }

    fn parse_attribute_operator(&mut self) -> Result<MatcherType, Error> {
        let matcher = match self.consume_char() {
            Some('=') => return Ok(MatcherType::Equals),
            Some('~') => MatcherType::Includes,
            Some('|') => MatcherType::DashMatch,
            Some('^') => MatcherType::PrefixMatch,
            Some('$') => MatcherType::SuffixMatch,
            Some('*') => MatcherType::SubstringMatch,
            Some(c) => return Err(self.error(format!("expected attribute operator, got '{c}'"))),
            None => return Err(self.error("expected attribute operator, got end of input".into())),
        };
        self.consume_delim('=')?;

        Ok(matcher)
    }

    fn parse_pseudo_class(&mut self) -> Result<CssSelectorPart, Error> {
        log::trace!("parse_pseudo_class");

        self.consume_delim(':')?;
        if self.current() == Some(':') {
            return Err(Error::Unsupported("pseudo-elements never match structure".into()));
        }
        let name = self.consume_ident()?.to_ascii_lowercase();

        if self.current() != Some('(') {
            return PseudoClass::from_name(&name)
                .map(CssSelectorPart::PseudoClass)
                .ok_or_else(|| Error::Unsupported(format!(":{name}")));
        }

        self.pos += 1;
        let pseudo = match name.as_str() {
            "not" => PseudoClass::Not(Box::new(self.parse_selector_list(false)?)),
            "is" | "where" => PseudoClass::Is(Box::new(self.parse_selector_list(false)?)),
            "has" => PseudoClass::Has(Box::new(self.parse_selector_list(true)?)),
            _ => return Err(Error::Unsupported(format!(":{name}()"))),
        };
        self.consume_whitespace();
        self.consume_delim(')')?;

        Ok(CssSelectorPart::PseudoClass(pseudo))
    }

    fn consume_ident(&mut self) -> Result<String, Error> {
        let mut value = String::new();
        while let Some(c) = self.current() {
            if c == '\\' {
                self.pos += 1;
                match self.consume_char() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated escape".into())),
                }
                continue;
            }
            if !is_ident_char(c) {
                break;
            }
            value.push(c);
            self.pos += 1;
        }

        if value.is_empty() {
            return Err(match self.current() {
                Some(c) => self.error(format!("expected an identifier, got '{c}'")),
                None => self.error("expected an identifier, got end of input".into()),
            });
        }

        Ok(value)
    }

    fn consume_string(&mut self, quote: char) -> Result<String, Error> {
        self.consume_delim(quote)?;

        let mut value = String::new();
        loop {
            match self.consume_char() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.consume_char() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated string".into())),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string".into())),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(source: &str) -> Result<CssSelector, Error> {
        SelectorParser::new(source).parse()
    }

    #[test_case("main > aside", "main > aside")]
    #[test_case("MAIN   ASIDE", "main aside")]
    #[test_case("table:has(tbody > tr)", "table:has(tbody > tr)")]
    #[test_case("table:has(> tbody)", "table:has(> tbody)")]
    #[test_case("input[type=checkbox]:checked + nav", "input[type=\"checkbox\"]:checked + nav")]
    #[test_case("a ~ b,c", "a ~ b, c")]
    #[test_case("[ lang |= 'en' i ]", "[lang|=\"en\" i]")]
    #[test_case("li:not(:first-child, :last-child)", "li:not(:first-child, :last-child)")]
    #[test_case("*:where(nav)", "*:is(nav)")]
    fn round_trips(source: &str, expected: &str) {
        assert_eq!(parse(source).unwrap().to_string(), expected);
    }

    #[test]
    fn structure() {
        let selector = parse("form fieldset > input[required]").unwrap();
        assert_eq!(selector.parts.len(), 1);
        assert_eq!(
            selector.parts[0],
            vec![
                CssSelectorPart::Type("form".into()),
                CssSelectorPart::Combinator(Combinator::Descendant),
                CssSelectorPart::Type("fieldset".into()),
                CssSelectorPart::Combinator(Combinator::Child),
                CssSelectorPart::Type("input".into()),
                CssSelectorPart::Attribute(Box::new(AttributeSelector {
                    name: "required".into(),
                    ..AttributeSelector::default()
                })),
            ]
        );
    }

    #[test]
    fn class_and_id_are_parsed_but_flagged() {
        assert!(parse("aside.empty").unwrap().uses_class_or_id());
        assert!(parse("main:has(#detail)").unwrap().uses_class_or_id());
        assert!(!parse("main:has(aside)").unwrap().uses_class_or_id());
    }

    #[test_case(""; "empty")]
    #[test_case("main >"; "dangling combinator")]
    #[test_case("a,"; "dangling comma")]
    #[test_case("[type=]"; "missing value")]
    #[test_case("[type='x"; "unterminated string")]
    #[test_case("a:not(b"; "unclosed argument")]
    #[test_case("a)"; "trailing garbage")]
    fn parse_errors(source: &str) {
        assert!(matches!(parse(source), Err(Error::Parse(..))));
    }

    #[test_case("a:hover")]
    #[test_case("p::before")]
    #[test_case("li:nth-child(2)")]
    fn unsupported(source: &str) {
        assert!(matches!(parse(source), Err(Error::Unsupported(_))));
    }

    #[test]
    fn error_location() {
        let Err(Error::Parse(_, location)) = parse("main >") else {
            panic!("expected a parse error");
        };
        assert_eq!(location.column, 7);
    }
}
