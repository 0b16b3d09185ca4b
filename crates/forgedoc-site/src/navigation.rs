//! The documentation sidebar.
//!
//! Sections are a fixed table; their order is the reading order used for
//! previous/next links.

use serde::Serialize;

/// A sidebar link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
}

/// A titled group of sidebar links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub title: &'static str,
    pub items: &'static [NavItem],
}

/// Errors from navigation lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("Unknown route: {0}")]
    UnknownRoute(String),
}

const fn item(title: &'static str, href: &'static str) -> NavItem {
    NavItem { title, href }
}

/// The sidebar, in reading order.
pub static NAVIGATION: &[NavSection] = &[
    NavSection {
        title: "Getting Started",
        items: &[
            item("Installation", "/docs/getting-started"),
            item("First Macro", "/docs/getting-started/first-macro"),
        ],
    },
    NavSection {
        title: "Core Concepts",
        items: &[
            item("How Macros Work", "/docs/concepts"),
            item("The Derive System", "/docs/concepts/derive-system"),
            item("Architecture", "/docs/concepts/architecture"),
        ],
    },
    NavSection {
        title: "Built-in Macros",
        items: &[
            item("Overview", "/docs/builtin-macros"),
            item("Debug", "/docs/builtin-macros/debug"),
            item("Clone", "/docs/builtin-macros/clone"),
            item("Default", "/docs/builtin-macros/default"),
            item("Hash", "/docs/builtin-macros/hash"),
            item("Ord", "/docs/builtin-macros/ord"),
            item("PartialEq", "/docs/builtin-macros/partial-eq"),
            item("PartialOrd", "/docs/builtin-macros/partial-ord"),
            item("Serialize", "/docs/builtin-macros/serialize"),
            item("Deserialize", "/docs/builtin-macros/deserialize"),
        ],
    },
    NavSection {
        title: "Custom Macros",
        items: &[
            item("Overview", "/docs/custom-macros"),
            item("Rust Setup", "/docs/custom-macros/rust-setup"),
            item("#[ts_macro_derive]", "/docs/custom-macros/ts-macro-derive"),
            item("Template Syntax", "/docs/custom-macros/ts-quote"),
        ],
    },
    NavSection {
        title: "Integration",
        items: &[
            item("Overview", "/docs/integration"),
            item("CLI", "/docs/integration/cli"),
            item("TypeScript Plugin", "/docs/integration/typescript-plugin"),
            item("Vite Plugin", "/docs/integration/vite-plugin"),
            item("Svelte Preprocessor", "/docs/integration/svelte-preprocessor"),
            item("MCP Server", "/docs/integration/mcp-server"),
            item("Configuration", "/docs/integration/configuration"),
        ],
    },
    NavSection {
        title: "Language Servers",
        items: &[
            item("Overview", "/docs/language-servers"),
            item("Svelte", "/docs/language-servers/svelte"),
            item("Zed Extensions", "/docs/language-servers/zed"),
        ],
    },
    NavSection {
        title: "API Reference",
        items: &[
            item("Overview", "/docs/api"),
            item("expandSync()", "/docs/api/expand-sync"),
            item("transformSync()", "/docs/api/transform-sync"),
            item("NativePlugin", "/docs/api/native-plugin"),
            item("PositionMapper", "/docs/api/position-mapper"),
        ],
    },
    NavSection {
        title: "Roadmap",
        items: &[item("Roadmap", "/docs/roadmap")],
    },
];

/// Every sidebar link in reading order.
pub fn flat() -> impl Iterator<Item = &'static NavItem> {
    NAVIGATION.iter().flat_map(|section| section.items.iter())
}

/// Find the link for `path`.
pub fn find(path: &str) -> Option<&'static NavItem> {
    let path = normalize(path);
    flat().find(|item| item.href == path)
}

/// Neighbouring pages of `path` in reading order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrevNext {
    pub prev: Option<&'static NavItem>,
    pub next: Option<&'static NavItem>,
}

/// Previous and next links for `path`. Paths outside the sidebar have neither.
pub fn prev_next(path: &str) -> PrevNext {
    let path = normalize(path);
    let items: Vec<_> = flat().collect();

    let Some(index) = items.iter().position(|item| item.href == path) else {
        return PrevNext::default();
    };

    PrevNext {
        prev: index.checked_sub(1).map(|i| items[i]),
        next: items.get(index + 1).copied(),
    }
}

/// Prefix a known route with the deployment base path.
///
/// `/` and every sidebar link resolve; anything else is an error.
pub fn resolve(path: &str, base: &str) -> Result<String, NavError> {
    let normalized = normalize(path);
    if normalized != "/" && find(normalized).is_none() {
        return Err(NavError::UnknownRoute(path.to_string()));
    }

    let base = base.trim_end_matches('/');
    if normalized == "/" {
        Ok(format!("{}/", base))
    } else {
        Ok(format!("{}{}", base, normalized))
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
