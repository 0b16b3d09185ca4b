//! Site-wide metadata.

use serde::{Deserialize, Serialize};

/// Outbound links shown in the site header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLinks {
    pub github: String,
    pub npm: String,
}

impl Default for SiteLinks {
    fn default() -> Self {
        Self {
            github: "https://github.com/jakoblochinski/macroforge-ts".to_string(),
            npm: "https://www.npmjs.com/package/macroforge".to_string(),
        }
    }
}

/// Metadata used for page titles and social previews.
///
/// Every field can be overridden from the `[site]` table of `forgedoc.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteMeta {
    pub name: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(alias = "og_image")]
    pub og_image: String,
    pub links: SiteLinks,
    pub author: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            name: "Macroforge".to_string(),
            title: "Macroforge - TypeScript Macros Powered by Rust".to_string(),
            description: "TypeScript macro expansion engine powered by Rust and SWC. \
                          Compile-time code generation with a Rust-like derive system."
                .to_string(),
            url: "https://macroforge.dev".to_string(),
            og_image: "/og-image.png".to_string(),
            links: SiteLinks::default(),
            author: "Jakob Lochinski".to_string(),
        }
    }
}

impl SiteMeta {
    /// Absolute URL of `path` on the deployed site.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overrides_keep_defaults() {
        let meta: SiteMeta = toml::from_str("name = \"Forge\"\nog_image = \"/x.png\"").unwrap();

        assert_eq!(meta.name, "Forge");
        assert_eq!(meta.og_image, "/x.png");
        assert_eq!(meta.url, "https://macroforge.dev");
        assert_eq!(meta.links, SiteLinks::default());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SiteMeta::default()).unwrap();
        assert_eq!(json["ogImage"], "/og-image.png");
    }

    #[test]
    fn builds_absolute_urls() {
        let meta = SiteMeta::default();
        assert_eq!(meta.absolute_url("/docs/api"), "https://macroforge.dev/docs/api");
    }
}
