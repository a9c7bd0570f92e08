// src/config/model.rs

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Build mode for one process invocation.
///
/// Resolved once at startup from the `--production` flag or the
/// `SITEBUILD_ENV` environment variable, then passed explicitly to every
/// component that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Resolve the mode from the CLI flag and `SITEBUILD_ENV`.
    pub fn resolve(production_flag: bool) -> Self {
        if production_flag {
            return Mode::Production;
        }
        match std::env::var("SITEBUILD_ENV") {
            Ok(v) if v.trim().eq_ignore_ascii_case("production") => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

/// Behaviour for style-only changes under a production-mode watch session.
///
/// - `inject`: hot-swap stylesheets without a full page reload (default).
/// - `full`: always reload the whole page, even for style-only changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleReload {
    #[default]
    Inject,
    Full,
}

impl FromStr for StyleReload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inject" => Ok(StyleReload::Inject),
            "full" => Ok(StyleReload::Full),
            other => Err(format!(
                "invalid production_style_reload: {other} (expected \"inject\" or \"full\")"
            )),
        }
    }
}

/// Top-level configuration as read from `Sitebuild.toml`.
///
/// All sections are optional and default to the conventional starter-kit
/// layout:
///
/// ```toml
/// [paths]
/// source = "app"
/// dev_out = ".tmp"
/// prod_out = "dist"
///
/// [watch]
/// debounce_ms = 50
///
/// [styles]
/// watch = ["styles/**/*.css"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub fonts: FontsSection,

    #[serde(default)]
    pub pages: PagesSection,

    #[serde(default)]
    pub copy: CopySection,
}

/// `[paths]` section: source tree root and the two output roots.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Source root, relative to the project root.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Development (temporary) output root.
    #[serde(default = "default_dev_out")]
    pub dev_out: PathBuf,

    /// Production (final) output root.
    #[serde(default = "default_prod_out")]
    pub prod_out: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("app")
}

fn default_dev_out() -> PathBuf {
    PathBuf::from(".tmp")
}

fn default_prod_out() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            dev_out: default_dev_out(),
            prod_out: default_prod_out(),
        }
    }
}

impl PathsSection {
    /// Output root for a task, given the build mode and the task's
    /// final-artifact flag. Production-flagged tasks always target the
    /// final output root; staged tasks target the temporary root during
    /// development.
    pub fn out_root(&self, mode: Mode, production_task: bool) -> &Path {
        if production_task || mode.is_production() {
            &self.prod_out
        } else {
            &self.dev_out
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiet period after the last detected change before a rebuild fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Reload policy for style-only changes under production mode.
    #[serde(default)]
    pub production_style_reload: StyleReload,
}

fn default_debounce_ms() -> u64 {
    50
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            production_style_reload: StyleReload::default(),
        }
    }
}

/// `[serve]` section: local dev server and live-reload socket.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// HTTP port for the static dev server.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Base port for the live-reload WebSocket server.
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
}

fn default_http_port() -> u16 {
    9000
}

fn default_ws_port() -> u16 {
    35729
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            ws_port: default_ws_port(),
        }
    }
}

/// `[styles]` section. Patterns are relative to the source root.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_styles_watch")]
    pub watch: Vec<String>,

    /// Destination subdirectory inside the output root.
    #[serde(default = "default_styles_dest")]
    pub dest: PathBuf,
}

fn default_styles_watch() -> Vec<String> {
    vec!["styles/**/*.css".to_string()]
}

fn default_styles_dest() -> PathBuf {
    PathBuf::from("css")
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            watch: default_styles_watch(),
            dest: default_styles_dest(),
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_scripts_watch")]
    pub watch: Vec<String>,

    /// Name of the concatenated bundle.
    #[serde(default = "default_scripts_bundle")]
    pub bundle: String,

    #[serde(default = "default_scripts_dest")]
    pub dest: PathBuf,
}

fn default_scripts_watch() -> Vec<String> {
    vec!["scripts/**/*.js".to_string()]
}

fn default_scripts_bundle() -> String {
    "main.js".to_string()
}

fn default_scripts_dest() -> PathBuf {
    PathBuf::from("js")
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            watch: default_scripts_watch(),
            bundle: default_scripts_bundle(),
            dest: default_scripts_dest(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_images_watch")]
    pub watch: Vec<String>,

    #[serde(default = "default_images_dest")]
    pub dest: PathBuf,

    /// JPEG re-encode quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_images_watch() -> Vec<String> {
    vec!["images/**/*".to_string()]
}

fn default_images_dest() -> PathBuf {
    PathBuf::from("images")
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            watch: default_images_watch(),
            dest: default_images_dest(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// `[fonts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FontsSection {
    #[serde(default = "default_fonts_watch")]
    pub watch: Vec<String>,

    #[serde(default = "default_fonts_dest")]
    pub dest: PathBuf,
}

fn default_fonts_watch() -> Vec<String> {
    vec!["fonts/**/*.{eot,svg,ttf,woff,woff2}".to_string()]
}

fn default_fonts_dest() -> PathBuf {
    PathBuf::from("fonts")
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            watch: default_fonts_watch(),
            dest: default_fonts_dest(),
        }
    }
}

/// `[pages]` section: include-expanded HTML pages and their partials.
#[derive(Debug, Clone, Deserialize)]
pub struct PagesSection {
    /// Patterns that should trigger a page rebuild.
    #[serde(default = "default_pages_watch")]
    pub watch: Vec<String>,

    /// Directory holding page sources, relative to the source root.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: PathBuf,

    /// Directory holding partials referenced from `@@include(...)`.
    #[serde(default = "default_partials_dir")]
    pub partials_dir: PathBuf,
}

fn default_pages_watch() -> Vec<String> {
    vec![
        "pages/**/*.html".to_string(),
        "partials/**/*.html".to_string(),
    ]
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("pages")
}

fn default_partials_dir() -> PathBuf {
    PathBuf::from("partials")
}

impl Default for PagesSection {
    fn default() -> Self {
        Self {
            watch: default_pages_watch(),
            pages_dir: default_pages_dir(),
            partials_dir: default_partials_dir(),
        }
    }
}

/// `[copy]` section: loose files copied through unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct CopySection {
    #[serde(default = "default_copy_watch")]
    pub watch: Vec<String>,

    /// Patterns excluded from the copy (page sources are rendered, not
    /// copied).
    #[serde(default = "default_copy_exclude")]
    pub exclude: Vec<String>,
}

fn default_copy_watch() -> Vec<String> {
    vec!["*.*".to_string()]
}

fn default_copy_exclude() -> Vec<String> {
    vec!["*.html".to_string()]
}

impl Default for CopySection {
    fn default() -> Self {
        Self {
            watch: default_copy_watch(),
            exclude: default_copy_exclude(),
        }
    }
}
