//! Language guessing for bare inline code.

use std::sync::LazyLock;

use forgedoc_highlight::Lang;
use regex::Regex;

static CLI_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(npm|pnpm|yarn|cargo|npx|macroforge)\s").expect("Invalid CLI prefix regex")
});

static RUST_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(impl|fn|struct|enum|trait|pub|use|mod|let|mut)\b")
        .expect("Invalid Rust keyword regex")
});

static RUST_MACRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+!$").expect("Invalid Rust macro regex"));

static DECORATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\w+").expect("Invalid decorator regex"));

static SIGNATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[():]|=>|<[A-Z]").expect("Invalid signature regex"));

static TS_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(string|number|boolean|void|any|null|undefined)\b")
        .expect("Invalid type name regex")
});

const EXTENSIONS: &[(&[&str], Lang)] = &[
    (&[".ts", ".tsx"], Lang::TypeScript),
    (&[".js", ".jsx"], Lang::JavaScript),
    (&[".json"], Lang::Json),
    (&[".toml"], Lang::Toml),
    (&[".svelte"], Lang::Svelte),
    (&[".rs"], Lang::Rust),
    (&[".sh", ".bash"], Lang::Bash),
];

/// Guess the language of an inline code span.
///
/// Checks run in order and the first hit wins: file-name suffix, CLI
/// command, Rust keyword or macro call, then TypeScript-looking
/// punctuation. Anything else is TypeScript as well, the language most
/// inline snippets on the site are written in.
pub fn detect_inline_language(code: &str) -> Lang {
    let code = code.trim();

    for (suffixes, lang) in EXTENSIONS {
        if suffixes.iter().any(|suffix| code.ends_with(suffix)) {
            return *lang;
        }
    }

    if CLI_PREFIX_RE.is_match(code) {
        return Lang::Bash;
    }

    if RUST_KEYWORD_RE.is_match(code) || RUST_MACRO_RE.is_match(code) {
        return Lang::Rust;
    }

    if DECORATOR_RE.is_match(code) || SIGNATURE_RE.is_match(code) || TS_TYPE_RE.is_match(code) {
        return Lang::TypeScript;
    }

    Lang::TypeScript
}
