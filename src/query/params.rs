//! Typed search parameters and their documented defaults.

use serde::Serialize;

pub const CATEGORIES: &[&str] = &[
    "general",
    "images",
    "videos",
    "news",
    "map",
    "music",
    "it",
    "science",
    "files",
    "social_media",
];

/// Plugins enabled when the caller does not say otherwise.
pub const DEFAULT_ENABLED_PLUGINS: &[&str] = &[
    "Hash_plugin",
    "Self_Information",
    "Tracker_URL_remover",
    "Ahmia_blacklist",
];

/// Plugins disabled when the caller does not say otherwise.
pub const DEFAULT_DISABLED_PLUGINS: &[&str] = &[
    "Hostnames_plugin",
    "Open_Access_DOI_rewrite",
    "Vim-like_hotkeys",
    "Tor_check_plugin",
];

pub const PLUGINS: &[&str] = &[
    "Hash_plugin",
    "Self_Information",
    "Tracker_URL_remover",
    "Ahmia_blacklist",
    "Hostnames_plugin",
    "Open_Access_DOI_rewrite",
    "Vim-like_hotkeys",
    "Tor_check_plugin",
    "Basic_Calculator",
    "Unit_converter",
    "Infinite_scroll",
    "Search_on_category_select",
];

pub const TIME_RANGES: &[&str] = &["day", "month", "year"];

pub const FORMATS: &[&str] = &["json", "csv", "rss", "html"];

pub const AUTOCOMPLETE: &[&str] = &[
    "google",
    "dbpedia",
    "duckduckgo",
    "mwmbl",
    "startpage",
    "wikipedia",
    "stract",
    "swisscows",
    "qwant",
];

pub const DEFAULT_LANGUAGE: &str = "all";
pub const DEFAULT_THEME: &str = "simple";
pub const DEFAULT_FORMAT: &str = "json";
pub const MIN_PAGENO: u32 = 1;
pub const MAX_SAFESEARCH: u8 = 2;

/// Validated search request options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub q: String,
    pub categories: Vec<String>,
    pub engines: Vec<String>,
    pub language: String,
    pub pageno: u32,
    pub time_range: Option<String>,
    pub format: String,
    pub results_on_new_tab: bool,
    pub image_proxy: bool,
    pub autocomplete: Option<String>,
    pub safesearch: u8,
    pub theme: String,
    pub enabled_plugins: Vec<String>,
    pub disabled_plugins: Vec<String>,
    pub enabled_engines: Vec<String>,
    pub disabled_engines: Vec<String>,
}

impl SearchParams {
    /// Parameters for `q` with every other field at its default.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            categories: Vec::new(),
            engines: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            pageno: MIN_PAGENO,
            time_range: None,
            format: DEFAULT_FORMAT.to_string(),
            results_on_new_tab: false,
            image_proxy: false,
            autocomplete: None,
            safesearch: 0,
            theme: DEFAULT_THEME.to_string(),
            enabled_plugins: owned(DEFAULT_ENABLED_PLUGINS),
            disabled_plugins: owned(DEFAULT_DISABLED_PLUGINS),
            enabled_engines: Vec::new(),
            disabled_engines: Vec::new(),
        }
    }
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Wire shape of a field, used to describe the API.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    /// Comma-separated list; `None` vocabulary accepts any token.
    List(Option<&'static [&'static str]>),
    Integer { min: i64, max: Option<i64> },
    Choice(&'static [&'static str]),
    Boolean,
    Locale,
}

/// Documentation for one wire field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "q",
        kind: FieldKind::Text,
        required: true,
        default: None,
        description: "The search query.",
    },
    FieldSpec {
        name: "categories",
        kind: FieldKind::List(Some(CATEGORIES)),
        required: false,
        default: None,
        description: "Comma separated list of active search categories.",
    },
    FieldSpec {
        name: "engines",
        kind: FieldKind::List(None),
        required: false,
        default: None,
        description: "Comma separated list of active search engines.",
    },
    FieldSpec {
        name: "language",
        kind: FieldKind::Locale,
        required: false,
        default: Some(DEFAULT_LANGUAGE),
        description: "Code of the language (`all`, `auto`, `de`, `en-US`, ...).",
    },
    FieldSpec {
        name: "pageno",
        kind: FieldKind::Integer { min: 1, max: None },
        required: false,
        default: Some("1"),
        description: "Search page number.",
    },
    FieldSpec {
        name: "time_range",
        kind: FieldKind::Choice(TIME_RANGES),
        required: false,
        default: None,
        description: "Time range of search for engines which support it.",
    },
    FieldSpec {
        name: "format",
        kind: FieldKind::Choice(FORMATS),
        required: false,
        default: Some(DEFAULT_FORMAT),
        description: "Output format of results.",
    },
    FieldSpec {
        name: "results_on_new_tab",
        kind: FieldKind::Integer { min: 0, max: Some(1) },
        required: false,
        default: Some("0"),
        description: "Open search results on new tab.",
    },
    FieldSpec {
        name: "image_proxy",
        kind: FieldKind::Boolean,
        required: false,
        default: Some("false"),
        description: "Proxy image results through the search service.",
    },
    FieldSpec {
        name: "autocomplete",
        kind: FieldKind::Choice(AUTOCOMPLETE),
        required: false,
        default: None,
        description: "Service which completes words as you type.",
    },
    FieldSpec {
        name: "safesearch",
        kind: FieldKind::Integer { min: 0, max: Some(2) },
        required: false,
        default: Some("0"),
        description: "Filter search results of engines which support safe search.",
    },
    FieldSpec {
        name: "theme",
        kind: FieldKind::Text,
        required: false,
        default: Some(DEFAULT_THEME),
        description: "Theme of instance.",
    },
    FieldSpec {
        name: "enabled_plugins",
        kind: FieldKind::List(Some(PLUGINS)),
        required: false,
        default: Some("Hash_plugin,Self_Information,Tracker_URL_remover,Ahmia_blacklist"),
        description: "List of enabled plugins.",
    },
    FieldSpec {
        name: "disabled_plugins",
        kind: FieldKind::List(Some(PLUGINS)),
        required: false,
        default: Some("Hostnames_plugin,Open_Access_DOI_rewrite,Vim-like_hotkeys,Tor_check_plugin"),
        description: "List of disabled plugins.",
    },
    FieldSpec {
        name: "enabled_engines",
        kind: FieldKind::List(None),
        required: false,
        default: None,
        description: "List of enabled engines.",
    },
    FieldSpec {
        name: "disabled_engines",
        kind: FieldKind::List(None),
        required: false,
        default: None,
        description: "List of disabled engines.",
    },
];
