use serde::{Deserialize, Serialize};

/// One element pulled out of the rendered ticket page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementRecord {
    pub tag_name: String,
    pub text: String,
    /// `href` of anchor elements; always `None` for other tags.
    pub link: Option<String>,
    pub raw_markup: String,
}

impl ElementRecord {
    pub fn new(tag_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            text: text.into(),
            link: None,
            raw_markup: String::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_markup(mut self, raw_markup: impl Into<String>) -> Self {
        self.raw_markup = raw_markup.into();
        self
    }
}
