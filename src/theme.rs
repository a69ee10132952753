//! Palettes for the browser.
//!
//! `[theme] scheme` picks a built-in palette. The `custom` scheme starts
//! from the dark one and patches it with hex colors from `[theme.custom]`.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// Resolved colors handed to every widget.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    /// Projects, components and folders.
    pub tree_container_fg: Color,
    pub tree_file_fg: Color,
    pub tree_guide_fg: Color,

    /// Rows waiting on the remote.
    pub pending_fg: Color,
    /// Node marked for a move.
    pub marked_fg: Color,
    /// Rows shown because they match the filter.
    pub match_fg: Color,

    pub crumb_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub border_fg: Color,
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Fixed per palette, not overridable.
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

/// Which palette `[theme] scheme` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Dark,
    Light,
    Custom,
}

impl Scheme {
    /// Unknown names fall back to dark.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Scheme::Light,
            "custom" => Scheme::Custom,
            _ => Scheme::Dark,
        }
    }
}

/// Catppuccin Mocha.
pub fn dark_theme() -> ThemeColors {
    let text = Color::Rgb(205, 214, 244);
    let blue = Color::Rgb(137, 180, 250);
    let yellow = Color::Rgb(249, 226, 175);
    let surface2 = Color::Rgb(88, 91, 112);
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: text,
        tree_selected_bg: Color::Rgb(69, 71, 90),
        tree_selected_fg: text,
        tree_container_fg: blue,
        tree_file_fg: text,
        tree_guide_fg: surface2,
        pending_fg: yellow,
        marked_fg: Color::Rgb(203, 166, 247),
        match_fg: Color::Rgb(250, 179, 135),
        crumb_fg: Color::Rgb(148, 226, 213),
        status_bg: Color::Rgb(30, 30, 46),
        status_fg: text,
        border_fg: surface2,
        dialog_bg: Color::Rgb(49, 50, 68),
        dialog_border_fg: blue,
        error_fg: Color::Rgb(243, 139, 168),
        warning_fg: yellow,
        success_fg: Color::Rgb(166, 227, 161),
        info_fg: blue,
        dim_fg: Color::Rgb(108, 112, 134),
    }
}

/// Catppuccin Latte.
pub fn light_theme() -> ThemeColors {
    let text = Color::Rgb(76, 79, 105);
    let blue = Color::Rgb(30, 102, 245);
    let yellow = Color::Rgb(223, 142, 29);
    let surface2 = Color::Rgb(172, 176, 190);
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: text,
        tree_selected_bg: Color::Rgb(204, 208, 218),
        tree_selected_fg: text,
        tree_container_fg: blue,
        tree_file_fg: text,
        tree_guide_fg: surface2,
        pending_fg: yellow,
        marked_fg: Color::Rgb(136, 57, 239),
        match_fg: Color::Rgb(254, 100, 11),
        crumb_fg: Color::Rgb(23, 146, 153),
        status_bg: Color::Rgb(239, 241, 245),
        status_fg: text,
        border_fg: surface2,
        dialog_bg: Color::Rgb(230, 233, 239),
        dialog_border_fg: blue,
        error_fg: Color::Rgb(210, 15, 57),
        warning_fg: yellow,
        success_fg: Color::Rgb(64, 160, 43),
        info_fg: blue,
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// `"#rrggbb"` or `"rrggbb"`. Anything else is `None`.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(digits, 16).ok()?;
    let [_, r, g, b] = rgb.to_be_bytes();
    Some(Color::Rgb(r, g, b))
}

pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    let scheme = config
        .scheme
        .as_deref()
        .map_or(Scheme::Dark, Scheme::from_name);
    match (scheme, &config.custom) {
        (Scheme::Light, _) => light_theme(),
        (Scheme::Custom, Some(custom)) => patched(dark_theme(), custom),
        _ => dark_theme(),
    }
}

/// Overwrite every slot the config sets with a valid color.
fn patched(mut theme: ThemeColors, custom: &ThemeColorsConfig) -> ThemeColors {
    let slots: [(&Option<String>, &mut Color); 16] = [
        (&custom.tree_bg, &mut theme.tree_bg),
        (&custom.tree_fg, &mut theme.tree_fg),
        (&custom.tree_selected_bg, &mut theme.tree_selected_bg),
        (&custom.tree_selected_fg, &mut theme.tree_selected_fg),
        (&custom.tree_container_fg, &mut theme.tree_container_fg),
        (&custom.tree_file_fg, &mut theme.tree_file_fg),
        (&custom.tree_guide_fg, &mut theme.tree_guide_fg),
        (&custom.pending_fg, &mut theme.pending_fg),
        (&custom.marked_fg, &mut theme.marked_fg),
        (&custom.match_fg, &mut theme.match_fg),
        (&custom.crumb_fg, &mut theme.crumb_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
        (&custom.dialog_bg, &mut theme.dialog_bg),
        (&custom.dialog_border_fg, &mut theme.dialog_border_fg),
    ];
    for (hex, slot) in slots {
        if let Some(color) = hex.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
    theme
}
