//! Dual-theme HTML rendering on top of syntect.
//!
//! Code is parsed once; every token run is looked up in both the light and
//! the dark theme and emitted as a `<span>` carrying the two colors as CSS
//! custom properties. A stylesheet picks one of them, so switching themes
//! never requires highlighting again.

use std::fmt::Write as _;

use syntect::easy::ScopeRangeIterator;
use syntect::highlighting::{Color, Highlighter as ThemeHighlighter, Theme, ThemeSet};
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::lang::Lang;

/// CSS class on every highlighted `<pre>` block.
pub const BLOCK_CLASS: &str = "forgedoc";

/// CSS class on every highlighted inline `<code>` element.
pub const INLINE_CLASS: &str = "forgedoc-inline";

/// Theme pair used for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Theme name for light mode
    pub light_theme: String,
    /// Theme name for dark mode
    pub dark_theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            light_theme: "InspiredGitHub".to_string(),
            dark_theme: "base16-ocean.dark".to_string(),
        }
    }
}

/// Errors that can occur while highlighting.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HighlightError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Failed to parse {lang} source: {message}")]
    Parse { lang: Lang, message: String },
}

/// A configured dual-theme colorizer.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    light: Theme,
    dark: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("light", &self.light.name)
            .field("dark", &self.dark.name)
            .finish()
    }
}

impl Highlighter {
    /// Load the bundled grammars and the configured themes.
    ///
    /// This is the slow part of highlighting; callers normally go through
    /// [`crate::HighlighterCache`] so it happens once per process.
    pub fn new(config: &HighlightConfig) -> Result<Self, HighlightError> {
        let mut themes = ThemeSet::load_defaults().themes;

        let light = themes
            .remove(&config.light_theme)
            .ok_or_else(|| HighlightError::UnknownTheme(config.light_theme.clone()))?;
        let dark = themes
            .remove(&config.dark_theme)
            .ok_or_else(|| HighlightError::UnknownTheme(config.dark_theme.clone()))?;

        let syntaxes = SyntaxSet::load_defaults_newlines();

        tracing::debug!(
            "Loaded {} grammars with themes {} / {}",
            syntaxes.syntaxes().len(),
            config.light_theme,
            config.dark_theme
        );

        Ok(Self {
            syntaxes,
            light,
            dark,
        })
    }

    /// Whether `tag` names one of the supported languages.
    pub fn supports(&self, tag: &str) -> bool {
        Lang::from_tag(tag).is_some()
    }

    /// Highlight a code block, returning a `<pre>` fragment.
    ///
    /// The code is trimmed and unsupported languages fall back to plain text.
    pub fn highlight(&self, code: &str, tag: &str) -> Result<String, HighlightError> {
        let lang = Lang::resolve(tag);
        let lines = self.render_lines(code.trim(), lang)?;

        Ok(format!(
            r#"<pre class="{BLOCK_CLASS}" data-lang="{lang}" style="{}"><code>{lines}</code></pre>"#,
            self.background_vars()
        ))
    }

    /// Highlight inline code, returning a `<code>` fragment without `<pre>`.
    pub fn highlight_inline(&self, code: &str, tag: &str) -> Result<String, HighlightError> {
        let lang = Lang::resolve(tag);
        let lines = self.render_lines(code.trim(), lang)?;

        Ok(format!(r#"<code class="{INLINE_CLASS}">{lines}</code>"#))
    }

    fn syntax_for(&self, lang: Lang) -> &SyntaxReference {
        lang.grammar_tokens()
            .iter()
            .find_map(|token| self.syntaxes.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    /// Render trimmed code to `<span class="line">` rows joined by newlines.
    fn render_lines(&self, code: &str, lang: Lang) -> Result<String, HighlightError> {
        let syntax = self.syntax_for(lang);
        let light = ThemeHighlighter::new(&self.light);
        let dark = ThemeHighlighter::new(&self.dark);

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut rows = Vec::new();

        let parse_error = |message: String| HighlightError::Parse { lang, message };

        for line in LinesWithEndings::from(code) {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .map_err(|e| parse_error(e.to_string()))?;

            let mut row = String::from(r#"<span class="line">"#);
            let mut run = Run::default();

            for (range, op) in ScopeRangeIterator::new(&ops, line) {
                stack
                    .apply(op)
                    .map_err(|e| parse_error(format!("{:?}", e)))?;

                let text = line[range].trim_end_matches(['\n', '\r']);
                if text.is_empty() {
                    continue;
                }

                let colors = (
                    light.style_for_stack(stack.as_slice()).foreground,
                    dark.style_for_stack(stack.as_slice()).foreground,
                );
                run.push(&mut row, colors, text);
            }

            run.flush(&mut row);
            row.push_str("</span>");
            rows.push(row);
        }

        Ok(rows.join("\n"))
    }

    /// Background/foreground variables for both themes.
    fn background_vars(&self) -> String {
        let mut vars = String::new();
        let pairs = [
            ("--fd-light-bg", self.light.settings.background),
            ("--fd-dark-bg", self.dark.settings.background),
            ("--fd-light-fg", self.light.settings.foreground),
            ("--fd-dark-fg", self.dark.settings.foreground),
        ];
        for (name, color) in pairs {
            if let Some(color) = color {
                let _ = write!(vars, "{}:{};", name, hex(color));
            }
        }
        vars
    }
}

/// A run of adjacent text sharing the same color pair.
#[derive(Default)]
struct Run {
    colors: Option<(Color, Color)>,
    text: String,
}

impl Run {
    fn push(&mut self, out: &mut String, colors: (Color, Color), text: &str) {
        if self.colors != Some(colors) {
            self.flush(out);
            self.colors = Some(colors);
        }
        self.text.push_str(text);
    }

    fn flush(&mut self, out: &mut String) {
        if let Some((light, dark)) = self.colors.take() {
            let _ = write!(
                out,
                r#"<span style="--fd-light:{};--fd-dark:{}">{}</span>"#,
                hex(light),
                hex(dark),
                escape_html(&self.text)
            );
        }
        self.text.clear();
    }
}

fn hex(color: Color) -> String {
    if color.a == 0xff {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace `{` and `}` with HTML entities.
///
/// Svelte reads braces in markup as expression delimiters, so highlighted
/// fragments must not contain them literally.
pub fn escape_template_braces(html: &str) -> String {
    html.replace('{', "&#123;").replace('}', "&#125;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> Highlighter {
        Highlighter::new(&HighlightConfig::default()).unwrap()
    }

    #[test]
    fn highlights_rust_with_token_spans() {
        let html = highlighter().highlight("fn main() {}", "rust").unwrap();

        assert!(html.starts_with(r#"<pre class="forgedoc" data-lang="rust""#));
        assert!(html.contains("<span"));
        assert!(html.contains("--fd-light:"));
        assert!(html.contains("--fd-dark:"));
        assert!(html.contains("main"));
    }

    #[test]
    fn unsupported_language_falls_back_to_text() {
        let html = highlighter().highlight("IDENTIFICATION DIVISION.", "cobol").unwrap();

        assert!(html.contains(r#"data-lang="text""#));
        assert!(html.contains("IDENTIFICATION DIVISION."));
    }

    #[test]
    fn trims_and_splits_lines() {
        let html = highlighter()
            .highlight("\n\nlet a = 1;\nlet b = 2;\n\n", "ts")
            .unwrap();

        assert_eq!(html.matches(r#"<span class="line">"#).count(), 2);
    }

    #[test]
    fn escapes_markup_in_code() {
        let html = highlighter().highlight("a < b && c > d", "text").unwrap();

        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
    }

    #[test]
    fn inline_has_no_pre_wrapper() {
        let html = highlighter().highlight_inline("Vec<u8>", "rust").unwrap();

        assert!(html.starts_with(r#"<code class="forgedoc-inline">"#));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn rejects_unknown_theme() {
        let config = HighlightConfig {
            light_theme: "nope".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            Highlighter::new(&config),
            Err(HighlightError::UnknownTheme(name)) if name == "nope"
        ));
    }

    #[test]
    fn escapes_braces() {
        assert_eq!(escape_template_braces("{a}"), "&#123;a&#125;");
    }
}
