//! Frontmatter extraction and parsing.

use serde::Deserialize;

/// Parsed frontmatter of a documentation page.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Page description for SEO
    #[serde(default)]
    pub description: Option<String>,

    /// Order in navigation (lower = first)
    #[serde(default)]
    pub order: Option<i32>,

    /// Whether to show in navigation
    #[serde(default = "default_true")]
    pub nav: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            order: None,
            nav: true,
        }
    }
}

/// A frontmatter block and the exact text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterBlock<'a> {
    /// Everything up to and including the closing `---` line.
    pub raw: &'a str,
    pub data: Frontmatter,
}

/// Split frontmatter from the rest of a document.
///
/// The body is returned untouched so the document can be written back
/// byte for byte.
pub fn extract_frontmatter(
    source: &str,
) -> Result<(Option<FrontmatterBlock<'_>>, &str), FrontmatterError> {
    let lead = source.len() - source.trim_start().len();
    let trimmed = &source[lead..];

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();

    // Consume the rest of the closing line.
    let close_end = lead + 3 + close_pos + 4;
    let end = source[close_end..]
        .find('\n')
        .map_or(source.len(), |i| close_end + i + 1);

    let data = if yaml_content.is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    Ok((
        Some(FrontmatterBlock {
            raw: &source[..end],
            data,
        }),
        &source[end..],
    ))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_valid_frontmatter() {
        let source = r#"---
title: Debug
description: Generates a toString method
order: 1
---

# Debug
"#;

        let (fm, content) = extract_frontmatter(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.data.title.as_deref(), Some("Debug"));
        assert_eq!(
            fm.data.description.as_deref(),
            Some("Generates a toString method")
        );
        assert_eq!(fm.data.order, Some(1));
        assert!(fm.data.nav);
        assert_eq!(content, "\n# Debug\n");
        assert_eq!(format!("{}{}", fm.raw, content), source);
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter here.";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn handles_empty_frontmatter() {
        let (fm, content) = extract_frontmatter("---\n---\nbody").unwrap();

        assert_eq!(fm.unwrap().data, Frontmatter::default());
        assert_eq!(content, "body");
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let source = "---\ntitle: Test\n# No closing";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let source = "---\ntitle: [invalid yaml\n---\n";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }
}
