//! Defaults applied when building new questions

use crate::card::DEFAULT_DISPLAY;
use serde::{Deserialize, Serialize};

/// Settings for questions created from scratch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefaults {
    /// Display for freshly created questions
    pub display: String,
}

impl Default for QuestionDefaults {
    fn default() -> Self {
        Self {
            display: DEFAULT_DISPLAY.to_string(),
        }
    }
}

impl QuestionDefaults {
    /// Defaults with `LENS_DEFAULT_DISPLAY` applied when set
    pub fn from_env() -> Self {
        Self {
            display: std::env::var("LENS_DEFAULT_DISPLAY")
                .ok()
                .filter(|display| !display.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DISPLAY.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(QuestionDefaults::default().display, "table");
    }
}
