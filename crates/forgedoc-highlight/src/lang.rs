//! The fixed set of languages the highlighter is configured for.

/// A language the highlighter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lang {
    #[default]
    TypeScript,
    JavaScript,
    Rust,
    Bash,
    Shell,
    Json,
    Toml,
    Html,
    Css,
    Svelte,
    Markdown,
    /// Plain-text pseudo-language used for anything unsupported.
    Text,
}

impl Lang {
    /// Every supported language, in configuration order.
    pub const ALL: [Lang; 12] = [
        Lang::TypeScript,
        Lang::JavaScript,
        Lang::Rust,
        Lang::Bash,
        Lang::Shell,
        Lang::Json,
        Lang::Toml,
        Lang::Html,
        Lang::Css,
        Lang::Svelte,
        Lang::Markdown,
        Lang::Text,
    ];

    /// Look up a language by name or common alias.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = match tag.trim().to_lowercase().as_str() {
            "typescript" | "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "javascript" | "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "rust" | "rs" => Self::Rust,
            "bash" | "sh" => Self::Bash,
            "shell" | "shellscript" | "zsh" | "console" => Self::Shell,
            "json" | "jsonc" => Self::Json,
            "toml" => Self::Toml,
            "html" | "htm" => Self::Html,
            "css" => Self::Css,
            "svelte" => Self::Svelte,
            "markdown" | "md" => Self::Markdown,
            "text" | "txt" | "plaintext" | "plain" => Self::Text,
            _ => return None,
        };
        Some(lang)
    }

    /// Effective language for a tag: unsupported tags become [`Lang::Text`].
    pub fn resolve(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or(Self::Text)
    }

    /// Canonical name, as written into `data-lang` attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Rust => "rust",
            Self::Bash => "bash",
            Self::Shell => "shell",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Html => "html",
            Self::Css => "css",
            Self::Svelte => "svelte",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }

    /// Grammar tokens to try, best match first.
    ///
    /// TypeScript and Svelte borrow the JavaScript and HTML grammars when no
    /// dedicated grammar is bundled.
    pub(crate) fn grammar_tokens(self) -> &'static [&'static str] {
        match self {
            Self::TypeScript => &["ts", "typescript", "js"],
            Self::JavaScript => &["js"],
            Self::Rust => &["rs"],
            Self::Bash | Self::Shell => &["bash", "sh"],
            Self::Json => &["json"],
            Self::Toml => &["toml"],
            Self::Html => &["html"],
            Self::Css => &["css"],
            Self::Svelte => &["svelte", "html"],
            Self::Markdown => &["md"],
            Self::Text => &[],
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
