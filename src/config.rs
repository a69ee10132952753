//! Layered TOML settings.
//!
//! Later layers win, field by field:
//! 1. built-in defaults (the getters below)
//! 2. `<config_dir>/hgrid/config.toml`
//! 3. `.hgrid.toml` in the working directory
//! 4. the file named by `$HGRID_CONFIG`
//! 5. the file passed with `--config`
//! 6. command line flags

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tree::SortSpec;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LATENCY_MS: u64 = 0;
const DEFAULT_SCHEME: &str = "dark";

// ── Sections ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Ask before deleting a node.
    pub confirm_delete: Option<bool>,
    pub mouse: Option<bool>,
}

/// `[tree]`: ordering, paging and glyphs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// "name", "kind", or any attribute key. Unset keeps listing order.
    pub sort_by: Option<String>,
    pub descending: Option<bool>,
    /// Projects, components and folders before files.
    pub folders_first: Option<bool>,
    /// Children per container before a "load more" row. 0 turns paging off.
    pub page_size: Option<usize>,
    /// Nerd font glyphs instead of `[D]`/`[F]` tags.
    pub use_icons: Option<bool>,
}

/// `[remote]`: how edits get confirmed.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RemoteConfig {
    pub read_only: Option<bool>,
    /// Simulated round trip before an edit is accepted.
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as "hgrid=debug". `RUST_LOG` beats it.
    pub level: Option<String>,
    /// Without a file nothing is logged while the browser owns the terminal.
    pub file: Option<String>,
}

/// Hex overrides for the `custom` scheme. Unset entries keep the dark palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_container_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub tree_guide_fg: Option<String>,
    pub pending_fg: Option<String>,
    pub marked_fg: Option<String>,
    pub match_fg: Option<String>,
    pub crumb_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// "dark", "light" or "custom".
    pub scheme: Option<String>,
    pub custom: Option<ThemeColorsConfig>,
}

/// Every setting is optional so a layer only carries what it sets.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

// ── Layering ─────────────────────────────────────────────────────────────────

impl GeneralConfig {
    fn overlay(self, top: &Self) -> Self {
        Self {
            confirm_delete: top.confirm_delete.or(self.confirm_delete),
            mouse: top.mouse.or(self.mouse),
        }
    }
}

impl TreeConfig {
    fn overlay(self, top: &Self) -> Self {
        Self {
            sort_by: top.sort_by.clone().or(self.sort_by),
            descending: top.descending.or(self.descending),
            folders_first: top.folders_first.or(self.folders_first),
            page_size: top.page_size.or(self.page_size),
            use_icons: top.use_icons.or(self.use_icons),
        }
    }
}

impl RemoteConfig {
    fn overlay(self, top: &Self) -> Self {
        Self {
            read_only: top.read_only.or(self.read_only),
            latency_ms: top.latency_ms.or(self.latency_ms),
        }
    }
}

impl LoggingConfig {
    fn overlay(self, top: &Self) -> Self {
        Self {
            level: top.level.clone().or(self.level),
            file: top.file.clone().or(self.file),
        }
    }
}

impl ThemeConfig {
    /// A custom palette replaces the lower one whole, not color by color.
    fn overlay(self, top: &Self) -> Self {
        Self {
            scheme: top.scheme.clone().or(self.scheme),
            custom: top.custom.clone().or(self.custom),
        }
    }
}

/// Config files in ascending priority. `--config` is not among them.
fn layer_paths() -> Vec<PathBuf> {
    let user = dirs::config_dir().map(|dir| dir.join("hgrid").join("config.toml"));
    let local = std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".hgrid.toml"));
    let env = std::env::var_os("HGRID_CONFIG").map(PathBuf::from);
    [user, local, env].into_iter().flatten().collect()
}

/// Parse one config file. Missing files are skipped quietly, broken ones
/// with a warning on stderr since the logger is not up yet.
fn read_layer(path: &Path) -> Option<AppConfig> {
    let text = std::fs::read_to_string(path).ok()?;
    toml::from_str(&text)
        .map_err(|e| eprintln!("hgrid: ignoring {}: {}", path.display(), e))
        .ok()
}

impl AppConfig {
    /// `top` wins wherever it sets a value.
    pub fn merge(self, top: &AppConfig) -> AppConfig {
        AppConfig {
            general: self.general.overlay(&top.general),
            tree: self.tree.overlay(&top.tree),
            remote: self.remote.overlay(&top.remote),
            logging: self.logging.overlay(&top.logging),
            theme: self.theme.overlay(&top.theme),
        }
    }

    /// Stack every file layer, then the explicit `--config` file, then the flags.
    pub fn load(explicit: Option<&Path>, flags: Option<&AppConfig>) -> AppConfig {
        let files = layer_paths()
            .into_iter()
            .chain(explicit.map(Path::to_path_buf))
            .filter_map(|path| read_layer(&path));

        let config = files.fold(AppConfig::default(), |acc, layer| acc.merge(&layer));
        match flags {
            Some(flags) => config.merge(flags),
            None => config,
        }
    }

    // ── Resolved values ──────────────────────────────────────────────────────

    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Sort to apply at start-up. `None` keeps listing order.
    pub fn sort_spec(&self) -> Option<SortSpec> {
        let key = self.tree.sort_by.as_deref()?;
        Some(
            SortSpec::new(key)
                .descending(self.tree.descending.unwrap_or(false))
                .folders_first(self.folders_first()),
        )
    }

    pub fn folders_first(&self) -> bool {
        self.tree.folders_first.unwrap_or(true)
    }

    /// `None` when paging is off.
    pub fn page_size(&self) -> Option<usize> {
        self.tree.page_size.filter(|n| *n > 0)
    }

    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    pub fn read_only(&self) -> bool {
        self.remote.read_only.unwrap_or(false)
    }

    pub fn latency_ms(&self) -> u64 {
        self.remote.latency_ms.unwrap_or(DEFAULT_LATENCY_MS)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.logging.file.as_deref().map(Path::new)
    }

    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or(DEFAULT_SCHEME)
    }
}
