use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ratatui::style::Color;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::channel::ChannelOptions;
use crate::view_model::DEFAULT_CPU_FALLBACK_MAX_GHZ;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Action enum: all bindable actions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    ToggleTheme,
    Help,
    CloseHelp,
}

impl Action {
    pub fn description(&self) -> &'static str {
        match self {
            Action::Quit => "Quit",
            Action::ToggleTheme => "Toggle light / dark theme",
            Action::Help => "This help",
            Action::CloseHelp => "Close help",
        }
    }
}

fn action_name_map() -> HashMap<&'static str, Action> {
    let mut m = HashMap::new();
    m.insert("quit", Action::Quit);
    m.insert("toggle_theme", Action::ToggleTheme);
    m.insert("help", Action::Help);
    m.insert("close_help", Action::CloseHelp);
    m
}

// ---------------------------------------------------------------------------
// Theme: one palette per display preference
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub navbar_bg: Color,
    pub navbar_fg: Color,
    pub card_bg: Color,
    pub card_fg: Color,
    pub dim: Color,
    pub connected: Color,
    pub disconnected: Color,
    pub active: Color,
    pub sun: Color,
    pub moon: Color,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub light: Palette,
    pub dark: Palette,
}

const NAVY_BLUE: Color = Color::Rgb(0x00, 0x2f, 0x5d);
const DARK_BLUE: Color = Color::Rgb(0x01, 0x44, 0x75);

impl Default for Theme {
    fn default() -> Self {
        Self {
            light: Palette {
                bg: Color::Rgb(0xff, 0xff, 0xff),
                fg: Color::Black,
                navbar_bg: DARK_BLUE,
                navbar_fg: Color::White,
                card_bg: DARK_BLUE,
                card_fg: Color::White,
                dim: Color::DarkGray,
                connected: Color::Rgb(0x22, 0xc5, 0x5e),
                disconnected: Color::Rgb(0xef, 0x44, 0x44),
                active: Color::Rgb(0x22, 0xc5, 0x5e),
                sun: Color::Rgb(0xff, 0xde, 0x59),
                moon: Color::White,
            },
            dark: Palette {
                bg: NAVY_BLUE,
                fg: Color::White,
                navbar_bg: DARK_BLUE,
                navbar_fg: Color::White,
                card_bg: DARK_BLUE,
                card_fg: Color::White,
                dim: Color::Gray,
                connected: Color::Rgb(0x22, 0xc5, 0x5e),
                disconnected: Color::Rgb(0xef, 0x44, 0x44),
                active: Color::Rgb(0x22, 0xc5, 0x5e),
                sun: Color::White,
                moon: Color::Black,
            },
        }
    }
}

impl Theme {
    pub fn palette(&self, dark: bool) -> &Palette {
        if dark {
            &self.dark
        } else {
            &self.light
        }
    }
}

// ---------------------------------------------------------------------------
// Connection / display / domains
// ---------------------------------------------------------------------------

pub const DEFAULT_URL: &str = "https://systemstatus.iqbalfaris.my.id";

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionConfig {
    pub url: String,
    pub namespace: String,
    pub reconnect: bool,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let channel = ChannelOptions::default();
        Self {
            url: DEFAULT_URL.to_string(),
            namespace: channel.namespace,
            reconnect: channel.reconnect,
            reconnect_initial_ms: channel.reconnect_initial_ms,
            reconnect_max_ms: channel.reconnect_max_ms,
        }
    }
}

impl ConnectionConfig {
    pub fn channel_options(&self) -> ChannelOptions {
        ChannelOptions {
            url: self.url.clone(),
            namespace: self.namespace.clone(),
            reconnect: self.reconnect,
            reconnect_initial_ms: self.reconnect_initial_ms,
            reconnect_max_ms: self.reconnect_max_ms,
            ..ChannelOptions::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub cpu_fallback_max_ghz: f64,
    pub tick_rate_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cpu_fallback_max_ghz: DEFAULT_CPU_FALLBACK_MAX_GHZ,
            tick_rate_ms: 250,
        }
    }
}

/// A monitored site: its host name and the `log_status` key of its counter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Domain {
    pub host: String,
    pub log_key: String,
}

impl Domain {
    fn new(host: &str, log_key: &str) -> Self {
        Self {
            host: host.to_string(),
            log_key: log_key.to_string(),
        }
    }

    fn defaults() -> Vec<Self> {
        vec![
            Domain::new("iqbalfaris.my.id", "portfolio"),
            Domain::new("ipcreative.iqbalfaris.my.id", "ipcreative"),
            Domain::new("pemilihansupplier.iqbalfaris.my.id", "pemilihanSupplier"),
            Domain::new("dashboardsystem.iqbalfaris.my.id", "dashboardSystem"),
        ]
    }
}

// ---------------------------------------------------------------------------
// KeyMap
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct KeyMap {
    map: HashMap<KeyEvent, Action>,
}

impl KeyMap {
    pub fn from_defaults() -> Self {
        let mut map = HashMap::new();

        let defaults: Vec<(&str, Action)> = vec![
            ("q", Action::Quit),
            ("ctrl+c", Action::Quit),
            ("t", Action::ToggleTheme),
            ("?", Action::Help),
            ("esc", Action::CloseHelp),
        ];

        for (key_str, action) in defaults {
            if let Some(key) = parse_key(key_str) {
                map.insert(key, action);
            }
        }

        Self { map }
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<&Action> {
        self.map.get(&normalize_key(*key))
    }

    /// Bindings grouped per action, keys sorted by their display form.
    pub fn bindings(&self) -> Vec<(Action, Vec<String>)> {
        let mut grouped: HashMap<Action, Vec<String>> = HashMap::new();
        for (key, action) in &self.map {
            grouped.entry(action.clone()).or_default().push(format_key(key));
        }
        let order = [
            Action::ToggleTheme,
            Action::Help,
            Action::CloseHelp,
            Action::Quit,
        ];
        order
            .into_iter()
            .filter_map(|action| {
                let mut keys = grouped.remove(&action)?;
                keys.sort();
                Some((action, keys))
            })
            .collect()
    }

    /// Apply user overrides: for each (name, key_str), parse both, drop the
    /// old bindings of that action, and insert the new one.
    pub fn merge(&mut self, raw: &HashMap<String, String>) {
        let name_to_action = action_name_map();

        for (name, key_str) in raw {
            let Some(action) = name_to_action.get(name.as_str()).cloned() else {
                warn!(action = %name, "unknown action in [keys]");
                continue;
            };
            let Some(new_key) = parse_key(key_str) else {
                warn!(key = %key_str, "unparseable key in [keys]");
                continue;
            };

            self.map.retain(|_, v| *v != action);
            self.map.insert(new_key, action);
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub display: DisplayConfig,
    pub theme: Theme,
    pub keys: KeyMap,
    pub domains: Vec<Domain>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            display: DisplayConfig::default(),
            theme: Theme::default(),
            keys: KeyMap::from_defaults(),
            domains: Domain::defaults(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("statusdash").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("statusdash.toml"))
}

impl Config {
    /// Load from `path`. A missing file means defaults; an unreadable or
    /// invalid one also means defaults, with a warning in the log.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(error = %err, "using default config");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(Self::from_raw(raw)))
    }

    pub fn example_toml() -> &'static str {
        r##"# statusdash configuration; every key is optional.

[connection]
url = "https://systemstatus.iqbalfaris.my.id"
namespace = "/"
reconnect = true
reconnect_initial_ms = 500
reconnect_max_ms = 5000

[display]
# Divisor for the CPU gauge when the agent sends no max frequency.
cpu_fallback_max_ghz = 2.0
tick_rate_ms = 250

[theme.dark]
bg = "#002F5D"
card_bg = "#014475"

[theme.light]
bg = "#ffffff"
fg = "black"

# Each entry replaces every default binding of that action.
[keys]
toggle_theme = "t"
help = "?"

[[domains]]
host = "iqbalfaris.my.id"
log_key = "portfolio"

[[domains]]
host = "ipcreative.iqbalfaris.my.id"
log_key = "ipcreative"

[[domains]]
host = "pemilihansupplier.iqbalfaris.my.id"
log_key = "pemilihanSupplier"

[[domains]]
host = "dashboardsystem.iqbalfaris.my.id"
log_key = "dashboardSystem"
"##
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut config = Self::default();

        // Connection
        if let Some(c) = raw.connection {
            if let Some(v) = c.url {
                config.connection.url = v;
            }
            if let Some(v) = c.namespace {
                config.connection.namespace = v;
            }
            if let Some(v) = c.reconnect {
                config.connection.reconnect = v;
            }
            if let Some(v) = c.reconnect_initial_ms {
                config.connection.reconnect_initial_ms = v;
            }
            if let Some(v) = c.reconnect_max_ms {
                config.connection.reconnect_max_ms = v;
            }
        }

        // Display
        if let Some(d) = raw.display {
            if let Some(v) = d.cpu_fallback_max_ghz {
                config.display.cpu_fallback_max_ghz = v;
            }
            if let Some(v) = d.tick_rate_ms {
                config.display.tick_rate_ms = v.max(16);
            }
        }

        // Theme
        if let Some(t) = raw.theme {
            if let Some(p) = t.light {
                apply_palette(&mut config.theme.light, p);
            }
            if let Some(p) = t.dark {
                apply_palette(&mut config.theme.dark, p);
            }
        }

        // Keys
        if let Some(keys) = raw.keys {
            config.keys.merge(&keys);
        }

        // User-provided domains replace the defaults
        if let Some(domains) = raw.domains {
            config.domains = domains;
        }

        config
    }
}

fn apply_palette(palette: &mut Palette, raw: RawPalette) {
    let slots: [(&mut Color, Option<String>); 12] = [
        (&mut palette.bg, raw.bg),
        (&mut palette.fg, raw.fg),
        (&mut palette.navbar_bg, raw.navbar_bg),
        (&mut palette.navbar_fg, raw.navbar_fg),
        (&mut palette.card_bg, raw.card_bg),
        (&mut palette.card_fg, raw.card_fg),
        (&mut palette.dim, raw.dim),
        (&mut palette.connected, raw.connected),
        (&mut palette.disconnected, raw.disconnected),
        (&mut palette.active, raw.active),
        (&mut palette.sun, raw.sun),
        (&mut palette.moon, raw.moon),
    ];
    for (slot, value) in slots {
        let Some(s) = value else { continue };
        match parse_color(&s) {
            Some(c) => *slot = c,
            None => warn!(color = %s, "unparseable color in [theme]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw TOML structs (all-optional for merge)
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct RawConfig {
    connection: Option<RawConnection>,
    display: Option<RawDisplay>,
    theme: Option<RawTheme>,
    keys: Option<HashMap<String, String>>,
    domains: Option<Vec<Domain>>,
}

#[derive(Deserialize, Default)]
struct RawConnection {
    url: Option<String>,
    namespace: Option<String>,
    reconnect: Option<bool>,
    reconnect_initial_ms: Option<u64>,
    reconnect_max_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct RawDisplay {
    cpu_fallback_max_ghz: Option<f64>,
    tick_rate_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct RawTheme {
    light: Option<RawPalette>,
    dark: Option<RawPalette>,
}

#[derive(Deserialize, Default)]
struct RawPalette {
    bg: Option<String>,
    fg: Option<String>,
    navbar_bg: Option<String>,
    navbar_fg: Option<String>,
    card_bg: Option<String>,
    card_fg: Option<String>,
    dim: Option<String>,
    connected: Option<String>,
    disconnected: Option<String>,
    active: Option<String>,
    sun: Option<String>,
    moon: Option<String>,
}

// ---------------------------------------------------------------------------
// parse_key: "ctrl+c" → crossterm KeyEvent
// ---------------------------------------------------------------------------

pub fn parse_key(s: &str) -> Option<KeyEvent> {
    let s = s.trim().to_lowercase();
    let parts: Vec<&str> = s.split('+').collect();

    let mut mods = KeyModifiers::NONE;
    let mut key_part = "";

    for part in &parts {
        match *part {
            "ctrl" | "control" => mods |= KeyModifiers::CONTROL,
            "alt" | "option" => mods |= KeyModifiers::ALT,
            "shift" => mods |= KeyModifiers::SHIFT,
            _ => key_part = part,
        }
    }

    let code = match key_part {
        "tab" => KeyCode::Tab,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        s if s.starts_with('f') && s.len() >= 2 => match s[1..].parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
            _ => return None,
        },
        s if s.chars().count() == 1 => {
            let ch = s.chars().next()?;
            if mods.contains(KeyModifiers::SHIFT) && ch.is_ascii_alphabetic() {
                mods -= KeyModifiers::SHIFT;
                KeyCode::Char(ch.to_ascii_uppercase())
            } else {
                KeyCode::Char(ch)
            }
        }
        _ => return None,
    };

    Some(KeyEvent {
        code,
        modifiers: mods,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    })
}

/// Strip kind/state and the implicit SHIFT on symbols/uppercase so terminal
/// events match the parsed bindings.
pub fn normalize_key(key: KeyEvent) -> KeyEvent {
    let mut modifiers = key.modifiers;
    if let KeyCode::Char(c) = key.code {
        if !c.is_ascii_lowercase() {
            modifiers -= KeyModifiers::SHIFT;
        }
    }
    KeyEvent {
        code: key.code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

/// Display form of a key for the help overlay, e.g. `ctrl+c`.
pub fn format_key(key: &KeyEvent) -> String {
    let mut parts: Vec<String> = Vec::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("ctrl".into());
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("alt".into());
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("shift".into());
    }
    parts.push(match key.code {
        KeyCode::Char(' ') => "space".into(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Tab => "tab".into(),
        KeyCode::Enter => "enter".into(),
        KeyCode::Esc => "esc".into(),
        KeyCode::Backspace => "backspace".into(),
        KeyCode::F(n) => format!("f{}", n),
        other => format!("{:?}", other).to_lowercase(),
    });
    parts.join("+")
}

// ---------------------------------------------------------------------------
// parse_color: "cyan", "dark_gray", "#ff0000", "#f00", "reset"
// ---------------------------------------------------------------------------

pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        return match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::Rgb(r, g, b))
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Color::Rgb(r, g, b))
            }
            _ => None,
        };
    }

    match s.as_str() {
        "reset" => Some(Color::Reset),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "white" => Some(Color::White),
        "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "light_red" | "lightred" => Some(Color::LightRed),
        "light_green" | "lightgreen" => Some(Color::LightGreen),
        "light_blue" | "lightblue" => Some(Color::LightBlue),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn from_str(toml_src: &str) -> Config {
        Config::from_raw(toml::from_str(toml_src).unwrap())
    }

    // --- parse_key ---

    #[test]
    fn test_parse_key_plain_and_ctrl() {
        assert_eq!(
            parse_key("q"),
            Some(make_key(KeyCode::Char('q'), KeyModifiers::NONE))
        );
        assert_eq!(
            parse_key("Ctrl+C"),
            Some(make_key(KeyCode::Char('c'), KeyModifiers::CONTROL))
        );
    }

    #[test]
    fn test_parse_key_shift_letter_is_uppercase() {
        assert_eq!(
            parse_key("shift+t"),
            Some(make_key(KeyCode::Char('T'), KeyModifiers::NONE))
        );
    }

    #[test]
    fn test_parse_key_named_and_function_keys() {
        assert_eq!(parse_key("esc"), Some(make_key(KeyCode::Esc, KeyModifiers::NONE)));
        assert_eq!(parse_key("f5"), Some(make_key(KeyCode::F(5), KeyModifiers::NONE)));
        assert_eq!(parse_key("f13"), None);
    }

    #[test]
    fn test_parse_key_invalid() {
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("ctrl+"), None);
        assert_eq!(parse_key("pageup"), None);
    }

    #[test]
    fn test_normalize_key_drops_implicit_shift() {
        // Terminals report '?' as shift+'?'
        let key = make_key(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(
            normalize_key(key),
            make_key(KeyCode::Char('?'), KeyModifiers::NONE)
        );
        let lower = make_key(KeyCode::Char('t'), KeyModifiers::CONTROL);
        assert_eq!(normalize_key(lower), lower);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(&parse_key("ctrl+c").unwrap()), "ctrl+c");
        assert_eq!(format_key(&parse_key("esc").unwrap()), "esc");
        assert_eq!(format_key(&parse_key("?").unwrap()), "?");
    }

    // --- parse_color ---

    #[test]
    fn test_parse_color_named() {
        assert_eq!(parse_color("white"), Some(Color::White));
        assert_eq!(parse_color("dark_grey"), Some(Color::DarkGray));
        assert_eq!(parse_color("reset"), Some(Color::Reset));
    }

    #[test]
    fn test_parse_color_hex() {
        assert_eq!(parse_color("#002F5D"), Some(NAVY_BLUE));
        assert_eq!(parse_color("#fff"), Some(Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_color_invalid() {
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("chartreuse"), None);
        assert_eq!(parse_color("#aé"), None);
        assert_eq!(parse_color("#ééé"), None);
    }

    // --- keymap ---

    #[test]
    fn test_keymap_defaults() {
        let keys = KeyMap::from_defaults();
        let t = make_key(KeyCode::Char('t'), KeyModifiers::NONE);
        assert_eq!(keys.lookup(&t), Some(&Action::ToggleTheme));
        let help = make_key(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(keys.lookup(&help), Some(&Action::Help));
        let ctrl_c = make_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(keys.lookup(&ctrl_c), Some(&Action::Quit));
    }

    #[test]
    fn test_keymap_merge_override() {
        let mut keys = KeyMap::from_defaults();
        let mut raw = HashMap::new();
        raw.insert("toggle_theme".to_string(), "d".to_string());
        raw.insert("no_such_action".to_string(), "x".to_string());
        raw.insert("help".to_string(), "ctrl+".to_string());
        keys.merge(&raw);

        let d = make_key(KeyCode::Char('d'), KeyModifiers::NONE);
        let t = make_key(KeyCode::Char('t'), KeyModifiers::NONE);
        assert_eq!(keys.lookup(&d), Some(&Action::ToggleTheme));
        assert_eq!(keys.lookup(&t), None);
        // Bad key string leaves the default binding alone
        let help = make_key(KeyCode::Char('?'), KeyModifiers::NONE);
        assert_eq!(keys.lookup(&help), Some(&Action::Help));
    }

    #[test]
    fn test_keymap_bindings_groups_quit_keys() {
        let bindings = KeyMap::from_defaults().bindings();
        let quit = bindings
            .iter()
            .find(|(a, _)| *a == Action::Quit)
            .map(|(_, k)| k.clone())
            .unwrap();
        assert_eq!(quit, vec!["ctrl+c".to_string(), "q".to_string()]);
        assert_eq!(bindings[0].0, Action::ToggleTheme);
    }

    // --- config ---

    #[test]
    fn test_config_from_empty_raw() {
        let config = from_str("");
        assert_eq!(config.connection.url, DEFAULT_URL);
        assert_eq!(config.display.cpu_fallback_max_ghz, 2.0);
        assert_eq!(config.domains.len(), 4);
        assert_eq!(config.domains[2].log_key, "pemilihanSupplier");
        assert_eq!(config.theme.dark.bg, NAVY_BLUE);
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config = from_str(
            r##"
[connection]
url = "http://127.0.0.1:5000"
reconnect = false

[display]
cpu_fallback_max_ghz = 3.5
tick_rate_ms = 1

[theme.dark]
bg = "#000000"
fg = "not-a-color"

[[domains]]
host = "example.com"
log_key = "example"
"##,
        );
        assert_eq!(config.connection.url, "http://127.0.0.1:5000");
        assert!(!config.connection.reconnect);
        assert_eq!(config.connection.reconnect_max_ms, 5000);
        assert_eq!(config.display.cpu_fallback_max_ghz, 3.5);
        assert_eq!(config.display.tick_rate_ms, 16);
        assert_eq!(config.theme.dark.bg, Color::Rgb(0, 0, 0));
        assert_eq!(config.theme.dark.fg, Color::White);
        assert_eq!(config.domains, vec![Domain::new("example.com", "example")]);
    }

    #[test]
    fn test_channel_options_follow_connection() {
        let config = from_str("[connection]\nurl = \"https://a.example\"\nreconnect_initial_ms = 100");
        let opts = config.connection.channel_options();
        assert_eq!(opts.url, "https://a.example");
        assert_eq!(opts.reconnect_initial_ms, 100);
        assert_eq!(opts.namespace, "/");
    }

    #[test]
    fn test_example_toml_parses() {
        let config = from_str(Config::example_toml());
        assert_eq!(config.domains, Domain::defaults());
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml"));
        assert_eq!(config.connection, ConnectionConfig::default());
    }

    #[test]
    fn test_load_invalid_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection\nurl = ").unwrap();
        assert!(matches!(Config::read(&path), Err(ConfigError::Parse { .. })));
        let config = Config::load(&path);
        assert_eq!(config.connection.url, DEFAULT_URL);
    }

    #[test]
    fn test_load_non_ascii_color_keeps_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[theme.dark]\nbg = \"#aé\"\ncard_bg = \"#000\"\n").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.theme.dark.bg, NAVY_BLUE);
        assert_eq!(config.theme.dark.card_bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[keys]\nquit = \"x\"\n").unwrap();
        let config = Config::load(&path);
        let x = make_key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(config.keys.lookup(&x), Some(&Action::Quit));
    }
}
