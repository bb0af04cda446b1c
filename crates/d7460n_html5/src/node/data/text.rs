/// Data structure for text nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextData {
    /// Actual text
    pub value: String,
}

impl TextData {
    #[must_use]
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Whitespace-only text carries no meaningful content
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}
