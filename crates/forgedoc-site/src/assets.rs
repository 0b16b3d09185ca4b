//! The stylesheet for highlighted code.
//!
//! Highlighted fragments carry both theme colors as custom properties; these
//! rules pick the light pair by default and the dark pair under `.dark` or a
//! dark color-scheme preference.

use forgedoc_highlight::{BLOCK_CLASS, INLINE_CLASS};

/// Generate the highlight stylesheet.
pub fn highlight_css() -> String {
    format!(
        r#"/* forgedoc dual-theme highlighting */
.{block} {{
  background-color: var(--fd-light-bg);
  color: var(--fd-light-fg);
  overflow-x: auto;
  padding: 1rem;
  border-radius: 0.5rem;
  font-size: 0.875rem;
  line-height: 1.6;
}}

.{block} code {{
  display: grid;
  font-family: var(--font-mono, ui-monospace, SFMono-Regular, Menlo, monospace);
}}

.{block} .line {{
  min-height: 1em;
}}

.{inline} {{
  padding: 0.125rem 0.25rem;
  border-radius: 0.25rem;
  font-family: var(--font-mono, ui-monospace, SFMono-Regular, Menlo, monospace);
}}

.{block} span,
.{inline} span {{
  color: var(--fd-light);
}}

.dark .{block} {{
  background-color: var(--fd-dark-bg);
  color: var(--fd-dark-fg);
}}

.dark .{block} span,
.dark .{inline} span {{
  color: var(--fd-dark);
}}

@media (prefers-color-scheme: dark) {{
  :root:not(.light) .{block} {{
    background-color: var(--fd-dark-bg);
    color: var(--fd-dark-fg);
  }}

  :root:not(.light) .{block} span,
  :root:not(.light) .{inline} span {{
    color: var(--fd-dark);
  }}
}}
"#,
        block = BLOCK_CLASS,
        inline = INLINE_CLASS,
    )
}

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, String> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| format!("CSS parse error: {}", e))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| format!("CSS minify error: {}", e))?;

    Ok(minified.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_both_themes() {
        let css = highlight_css();

        assert!(css.contains(".forgedoc span"));
        assert!(css.contains(".forgedoc-inline span"));
        assert!(css.contains("var(--fd-light)"));
        assert!(css.contains("var(--fd-dark)"));
        assert!(css.contains("prefers-color-scheme: dark"));
    }

    #[test]
    fn minifies() {
        let css = highlight_css();
        let minified = minify_css(&css).unwrap();

        assert!(minified.len() < css.len());
        assert!(!minified.contains("/* forgedoc"));
        assert!(minified.contains("--fd-dark"));
    }
}
