// src/scaffold/mod.rs

//! Source-file generators for `sitebuild new`.
//!
//! Writes a page template or a stylesheet partial at the conventional
//! path, dash-casing the supplied name. Existing files are never
//! overwritten.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use deunicode::deunicode;
use tracing::info;

use crate::errors::{BuildError, Result};
use crate::pipeline::BuildContext;

const PAGE_TEMPLATE: &str = "<!doctype html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>{{title}}</title>\n  <link rel=\"stylesheet\" href=\"css/main.css\">\n</head>\n<body>\n@@include(\"header.html\")\n  <main>\n    <h1>{{title}}</h1>\n  </main>\n@@include(\"footer.html\")\n</body>\n</html>\n";

const COMPONENT_TEMPLATE: &str = ".{{name}} {\n}\n";

/// Create a new page source under the pages directory.
///
/// Returns the path of the created file.
pub fn create_page(ctx: &BuildContext, name: &str) -> Result<PathBuf> {
    let slug = dash_case(name);
    if slug.is_empty() {
        return Err(BuildError::Config("page name is required".to_string()));
    }

    let path = ctx
        .source_root()
        .join(&ctx.cfg.pages.pages_dir)
        .join(format!("{slug}.html"));
    write_new(&path, &PAGE_TEMPLATE.replace("{{title}}", name))?;

    info!(?path, "created page");
    Ok(path)
}

/// Create a new stylesheet partial under `styles/components/`.
///
/// The file gets the conventional leading underscore; the class selector
/// inside uses the dash-cased name.
pub fn create_component(ctx: &BuildContext, name: &str) -> Result<PathBuf> {
    let slug = dash_case(name);
    if slug.is_empty() {
        return Err(BuildError::Config("component name is required".to_string()));
    }

    let path = ctx
        .source_root()
        .join("styles")
        .join("components")
        .join(format!("_{slug}.css"));
    write_new(&path, &COMPONENT_TEMPLATE.replace("{{name}}", &slug))?;

    info!(?path, "created component");
    Ok(path)
}

fn write_new(path: &PathBuf, contents: &str) -> Result<()> {
    if path.exists() {
        return Err(BuildError::Config(format!(
            "refusing to overwrite existing file {:?}",
            path
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

/// Dash-case a human-supplied name: ASCII-fold, split on case changes and
/// separators, join with dashes.
pub fn dash_case(name: &str) -> String {
    let folded = deunicode(name);
    let mut out = String::with_capacity(folded.len());
    let mut prev_lower_or_digit = false;

    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower_or_digit {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            prev_lower_or_digit = false;
        }
    }

    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{ConfigFile, Mode};

    #[test]
    fn dash_case_handles_spaces_camel_case_and_unicode() {
        assert_eq!(dash_case("About Us"), "about-us");
        assert_eq!(dash_case("pricingTable"), "pricing-table");
        assert_eq!(dash_case("  landing   page "), "landing-page");
        assert_eq!(dash_case("Café Menü"), "cafe-menu");
        assert_eq!(dash_case("v2 Release"), "v2-release");
    }

    #[test]
    fn page_is_created_once_and_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(
            dir.path(),
            Arc::new(ConfigFile::default()),
            Mode::Development,
        );

        let path = create_page(&ctx, "About Us").unwrap();
        assert!(path.ends_with("app/pages/about-us.html"));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<title>About Us</title>"));

        let err = create_page(&ctx, "About Us").unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn component_partial_gets_leading_underscore() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(
            dir.path(),
            Arc::new(ConfigFile::default()),
            Mode::Development,
        );

        let path = create_component(&ctx, "Hero Banner").unwrap();
        assert!(path.ends_with("app/styles/components/_hero-banner.css"));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(".hero-banner {"));
    }
}
