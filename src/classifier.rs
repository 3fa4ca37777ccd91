use crate::models::{ClassificationResult, ElementRecord};

/// Phrase the ticket page shows on a sold-out performance.
pub const SOLD_OUT_MARKER: &str = "完売しました";

/// Decides sold-out status from the elements of one page snapshot.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    marker: String,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusClassifier {
    pub fn new() -> Self {
        Self {
            marker: SOLD_OUT_MARKER.to_string(),
        }
    }

    /// A single element containing the marker is enough to call the page
    /// sold out. An empty slice is "no evidence", not an error; telling it
    /// apart from a failed fetch is up to the caller.
    pub fn classify(&self, elements: &[ElementRecord]) -> ClassificationResult {
        let mut matching_elements = Vec::new();
        let mut all_texts = Vec::with_capacity(elements.len());

        for element in elements {
            all_texts.push(element.text.clone());

            if element.text.contains(self.marker.as_str()) {
                matching_elements.push(element.clone());
            }
        }

        ClassificationResult {
            is_sold_out: !matching_elements.is_empty(),
            matching_elements,
            all_texts,
            total_element_count: elements.len(),
        }
    }
}
