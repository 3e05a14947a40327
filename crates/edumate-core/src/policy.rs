use serde::{Deserialize, Serialize};

pub const NO_EXPLANATION: &str = "No explanation was returned.";
pub const NO_CODE: &str = "# No code was generated.";
pub const NO_NARRATION: &str = "No narration was generated.";

/// How missing `code`/`narration` fields are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Substitute fixed placeholder text for blank or missing fields
    #[default]
    Placeholders,
    /// Show exactly what the backend sent, empty when missing
    Verbatim,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackPolicy::Placeholders => "placeholders",
            FallbackPolicy::Verbatim => "verbatim",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "placeholders" => Some(FallbackPolicy::Placeholders),
            "verbatim" => Some(FallbackPolicy::Verbatim),
            _ => None,
        }
    }

    /// Resolve a response field to the text that gets displayed
    pub fn apply(&self, value: Option<String>, placeholder: &str) -> String {
        match (self, value) {
            (FallbackPolicy::Placeholders, Some(v)) if v.trim().is_empty() => placeholder.to_string(),
            (FallbackPolicy::Placeholders, None) => placeholder.to_string(),
            (_, Some(v)) => v,
            (FallbackPolicy::Verbatim, None) => String::new(),
        }
    }
}

/// Output presentation policy applied when a response is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPolicy {
    pub fallbacks: FallbackPolicy,
    pub show_video: bool,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            fallbacks: FallbackPolicy::Placeholders,
            show_video: true,
        }
    }
}
