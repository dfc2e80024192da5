//! Markup sanitization: removal of configured tag blocks and literal fragments
//!
//! Tag blocks are matched with `(?i)<tag.*>[\s\S]*?</tag>`. The opening tag
//! runs to the last `>` on its line and the body stops at the first closing
//! tag, so nested elements of the same name leave their outer tail behind,
//! and `<tag` also matches longer tag names sharing the prefix.

use regex::Regex;

use crate::error::{Error, Result};

/// Removes tag blocks, then literal fragments, in configured order
#[derive(Debug, Clone, Default)]
pub struct MarkupSanitizer {
    tag_patterns: Vec<Regex>,
    literals: Vec<String>,
}

impl MarkupSanitizer {
    /// Compile a sanitizer for the given tag names and literal fragments
    pub fn new(strip_tags: &[String], strip_content: &[String]) -> Result<Self> {
        let tag_patterns = strip_tags
            .iter()
            .map(|tag| {
                let escaped = regex::escape(tag.trim());
                Regex::new(&format!(r"(?i)<{escaped}.*>[\s\S]*?</{escaped}>"))
                    .map_err(|e| Error::Config(format!("strip tag '{}': {}", tag, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let literals = strip_content
            .iter()
            .filter(|literal| !literal.is_empty())
            .cloned()
            .collect();

        Ok(Self {
            tag_patterns,
            literals,
        })
    }

    /// Strip configured tag blocks and literal fragments from `html`
    pub fn sanitize(&self, html: &str) -> String {
        let mut clean = html.to_string();

        for pattern in &self.tag_patterns {
            clean = pattern.replace_all(&clean, "").into_owned();
        }

        for literal in &self.literals {
            if clean.contains(literal.as_str()) {
                clean = clean.replace(literal.as_str(), "");
            }
        }

        clean
    }
}
