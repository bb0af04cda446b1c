/// Data structure for comment nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentData {
    pub value: String,
}

impl CommentData {
    #[must_use]
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}
