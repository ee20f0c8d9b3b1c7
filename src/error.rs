//! Structured error types for the layout engine.
//!
//! Construction-time variants (`ContentType`, `Image`) are recovered per
//! item by the caller that normalizes content. Everything raised while
//! laying out or paginating is fatal to the document build.

use thiserror::Error;

/// The unified error type returned by all public quire API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A content item had a shape that cannot be turned into a section.
    #[error("unrecognized content: {0}")]
    ContentType(String),

    /// An image source could not be resolved.
    #[error("image error: {0}")]
    Image(String),

    /// A height or split query was made before the width pass ran.
    #[error("{0} queried before width layout")]
    NotLaidOut(&'static str),

    /// An indivisible unit is larger than a full fresh page.
    #[error("{what} ({width:.1}x{height:.1}) does not fit a fresh page ({page_width:.1}x{page_height:.1})")]
    ContentTooLarge {
        what: &'static str,
        width: f64,
        height: f64,
        page_width: f64,
        page_height: f64,
    },

    /// A split fragment came out taller than the space it was granted.
    #[error("split fragment height {height:.3} exceeds granted space {available:.3}")]
    InternalConsistency { height: f64, available: f64 },

    /// Pagination could not make progress on a top-level item.
    #[error("not enough space to place item {item} on a fresh page")]
    InsufficientSpace { item: usize },

    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err: LayoutError = serde_json::from_str::<serde_json::Value>("{,}")
            .unwrap_err()
            .into();
        let text = err.to_string();
        assert!(text.starts_with("failed to parse document"));
        assert!(text.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn too_large_names_the_unit() {
        let err = LayoutError::ContentTooLarge {
            what: "image",
            width: 100.0,
            height: 900.0,
            page_width: 612.0,
            page_height: 700.0,
        };
        assert!(err.to_string().contains("image (100.0x900.0)"));
    }
}
