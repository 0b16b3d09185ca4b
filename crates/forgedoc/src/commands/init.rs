//! Initialize forgedoc in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing forgedoc...");

    let written = write_starter_files(config_path, Path::new("."), yes)?;
    for path in &written {
        tracing::info!("Created {}", path);
    }

    if written.is_empty() {
        tracing::warn!("Nothing to do; existing files were kept. Use --yes to overwrite.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'forgedoc dev' to start the development server.");

    Ok(())
}

/// Write the starter files under `root`, returning the ones written.
///
/// Existing files are kept unless `overwrite` is set.
fn write_starter_files(config_path: &Path, root: &Path, overwrite: bool) -> Result<Vec<String>> {
    let example_dir = root.join("src/routes/docs/example");
    let files = [
        (root.join(config_path), DEFAULT_CONFIG),
        (root.join("routes.toml"), DEFAULT_ROUTES),
        (example_dir.join("+page.svx"), DEFAULT_PAGE),
        (example_dir.join("basic.ts"), DEFAULT_EXAMPLE),
    ];

    let mut written = Vec::new();
    for (path, content) in files {
        if path.exists() && !overwrite {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path.display().to_string());
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# forgedoc configuration

[site]
name = "Macroforge"
url = "https://macroforge.dev"

[content]
# Svelte, mdsvex and Markdown sources
dir = "src"
# Where processed sources and page data are written
output = "build/content"
# Pre-generated API documentation
api_data = "static/api-data"
# Route manifest
routes = "routes.toml"

[highlight]
light_theme = "InspiredGitHub"
dark_theme = "base16-ocean.dark"

[engine]
program = "macroforge"
args = ["expand", "--stdin", "--json", "--filename", "{filename}"]

[formatter]
enabled = true
program = "npx"
args = ["biome", "format", "--stdin-file-path={filename}"]

[build]
# "production" turns formatter failures into build errors
mode = "development"
minify = true
"#;

const DEFAULT_ROUTES: &str = r#"# Page data for each route is written to <output>/data/<route>.json

[[route]]
path = "/docs/api"
version = "macroforge_ts"
stats = "macroforge_ts"

[[route]]
path = "/docs/builtin-macros/debug"
builtin_macro = "debug"

[route.examples]
basic = "routes/docs/example/basic.ts"
"#;

const DEFAULT_EXAMPLE: &str = r#"import { Debug } from "macroforge";

/** @derive(Debug) */
class User {
  name: string;
  age: number;
}
"#;

const DEFAULT_PAGE: &str = r#"---
title: Example
---

# Example

A `before` fence followed by an `after` fence becomes one side-by-side example:

```ts before
/** @derive(Debug) */
class User {
  name: string;
}
```

```ts after
class User {
  name: string;

  toString(): string {
    return `User { name: ${this.name} }`;
  }
}
```

An `interactive` fence is expanded by the macro engine at build time:

```ts interactive
/** @derive(Debug, Clone) */
class Point {
  x: number;
  y: number;
}
```

Inline code like <code>@derive(Debug)</code> is highlighted too.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::config::ConfigFile;
    use forgedoc_site::RouteManifest;

    #[test]
    fn writes_starter_files() {
        let temp = tempdir().unwrap();

        let written = write_starter_files(Path::new("forgedoc.toml"), temp.path(), false).unwrap();

        assert_eq!(written.len(), 4);
        assert!(temp.path().join("src/routes/docs/example/+page.svx").exists());
    }

    #[test]
    fn keeps_existing_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("routes.toml"), "# mine").unwrap();

        let written = write_starter_files(Path::new("forgedoc.toml"), temp.path(), false).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(temp.path().join("routes.toml")).unwrap(), "# mine");
    }

    #[test]
    fn starter_files_parse() {
        let config = ConfigFile::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.site.name, "Macroforge");

        let manifest = RouteManifest::parse(DEFAULT_ROUTES).unwrap();
        assert_eq!(manifest.routes.len(), 2);
    }
}
