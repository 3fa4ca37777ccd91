use serde::{Deserialize, Serialize};

use super::ElementRecord;

/// Evidence gathered from one page snapshot.
///
/// `is_sold_out` is true exactly when `matching_elements` is non-empty. Build
/// it with [`StatusClassifier::classify`](crate::classifier::StatusClassifier::classify)
/// so that invariant holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub is_sold_out: bool,
    pub matching_elements: Vec<ElementRecord>,
    pub all_texts: Vec<String>,
    pub total_element_count: usize,
}

impl ClassificationResult {
    pub fn sold_out_count(&self) -> usize {
        self.matching_elements.len()
    }

    pub fn summary(&self) -> String {
        if self.is_sold_out {
            format!("sold out: yes ({} matching elements)", self.sold_out_count())
        } else {
            "sold out: no".to_string()
        }
    }
}

/// Result of one fetch-and-classify pass.
///
/// A failed check never carries a classification and a successful one
/// always does. Fields are private so the constructors (and a validating
/// `Deserialize`) are the only way to build one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawCheckOutcome")]
pub struct CheckOutcome {
    success: bool,
    classification: Option<ClassificationResult>,
    message: String,
}

#[derive(Deserialize)]
struct RawCheckOutcome {
    success: bool,
    classification: Option<ClassificationResult>,
    message: String,
}

impl TryFrom<RawCheckOutcome> for CheckOutcome {
    type Error = String;

    fn try_from(raw: RawCheckOutcome) -> Result<Self, Self::Error> {
        if raw.success != raw.classification.is_some() {
            return Err(format!(
                "check outcome with success={} must {}carry a classification",
                raw.success,
                if raw.success { "" } else { "not " }
            ));
        }

        Ok(Self {
            success: raw.success,
            classification: raw.classification,
            message: raw.message,
        })
    }
}

impl CheckOutcome {
    pub fn checked(classification: ClassificationResult) -> Self {
        Self {
            success: true,
            message: classification.summary(),
            classification: Some(classification),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            classification: None,
            message: message.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_sold_out(&self) -> bool {
        self.classification
            .as_ref()
            .map(|c| c.is_sold_out)
            .unwrap_or(false)
    }
}
