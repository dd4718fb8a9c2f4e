use dui_parser::{Density, ThemeProfile};
use indexmap::IndexMap;

type TokenTable = &'static [(&'static str, &'static str)];

const DEFAULT_TOKENS: TokenTable = &[
    ("bg", "#f3edf7"),
    ("surface", "#fffbfe"),
    ("surface_container", "#f7f2fa"),
    ("text", "#1d1b20"),
    ("muted", "#49454f"),
    ("accent", "#6750a4"),
    ("accent_container", "#eaddff"),
    ("outline", "#79747e"),
    ("radius", "16px"),
    (
        "shadow",
        "0 1px 2px rgba(0, 0, 0, 0.3), 0 2px 6px rgba(0, 0, 0, 0.14)",
    ),
    ("font", "'Roboto', sans-serif"),
];

const MINIMAL_TOKENS: TokenTable = &[
    ("bg", "#f8fafc"),
    ("surface", "#ffffff"),
    ("surface_container", "#f1f5f9"),
    ("text", "#0f172a"),
    ("muted", "#475569"),
    ("accent", "#0f172a"),
    ("accent_container", "#e2e8f0"),
    ("outline", "#94a3b8"),
    ("radius", "12px"),
    ("shadow", "0 1px 2px rgba(15, 23, 42, 0.08)"),
    ("font", "'Roboto', sans-serif"),
];

const LIQUID_GLASS_TOKENS: TokenTable = &[
    ("bg", "#dbeafe"),
    ("surface", "rgba(255, 255, 255, 0.66)"),
    ("surface_container", "rgba(255, 255, 255, 0.5)"),
    ("text", "#0f172a"),
    ("muted", "#334155"),
    ("accent", "#0369a1"),
    ("accent_container", "rgba(186, 230, 253, 0.65)"),
    ("outline", "rgba(255, 255, 255, 0.6)"),
    ("radius", "20px"),
    ("shadow", "0 10px 32px rgba(15, 23, 42, 0.22)"),
    ("font", "'Roboto', sans-serif"),
];

const COMFORTABLE_TOKENS: TokenTable = &[("gap", "16px"), ("padding", "16px"), ("row_height", "44px")];

const COMPACT_TOKENS: TokenTable = &[("gap", "10px"), ("padding", "10px"), ("row_height", "36px")];

pub fn profile_tokens(profile: ThemeProfile) -> TokenTable {
    match profile {
        ThemeProfile::Default => DEFAULT_TOKENS,
        ThemeProfile::Minimal => MINIMAL_TOKENS,
        ThemeProfile::LiquidGlass => LIQUID_GLASS_TOKENS,
    }
}

pub fn density_tokens(density: Density) -> TokenTable {
    match density {
        Density::Comfortable => COMFORTABLE_TOKENS,
        Density::Compact => COMPACT_TOKENS,
    }
}

/// Base token set for a profile/density pair: profile tokens, then density tokens.
pub fn tokens_for(profile: ThemeProfile, density: Density) -> IndexMap<String, String> {
    profile_tokens(profile)
        .iter()
        .chain(density_tokens(density))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Every overridable token key: the profile keys plus the density keys.
pub const THEME_TOKEN_KEYS: &[&str] = &[
    "bg",
    "surface",
    "surface_container",
    "text",
    "muted",
    "accent",
    "accent_container",
    "outline",
    "radius",
    "shadow",
    "font",
    "gap",
    "padding",
    "row_height",
];

pub fn is_theme_token(key: &str) -> bool {
    THEME_TOKEN_KEYS.contains(&key)
}

/// Every overridable token key, in table order.
pub fn theme_token_keys() -> impl Iterator<Item = &'static str> {
    DEFAULT_TOKENS.iter().chain(COMFORTABLE_TOKENS).map(|(k, _)| *k)
}
