//! Engine configuration.
//!
//! Everything here has a sensible default so the engine runs with no
//! file or environment present. Overrides are layered: an optional
//! `rollcall.toml` in the working directory, then `ROLLCALL_`-prefixed
//! environment variables (double underscore as section separator, e.g.
//! `ROLLCALL_REMINDER__TITLE`).

use serde::Deserialize;

use crate::models::StatusColor;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub palette: PaletteConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default)]
    pub urgent: UrgentConfig,

    #[serde(default)]
    pub schedule: ScheduleDefaults,
}

/// Dashboard color palette, hex per status.
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteConfig {
    #[serde(default = "default_grey")]
    pub grey: String,

    #[serde(default = "default_admin_green")]
    pub dark_green: String,

    #[serde(default = "default_light_green")]
    pub light_green: String,

    #[serde(default = "default_light_yellow")]
    pub light_yellow: String,

    #[serde(default = "default_light_red")]
    pub light_red: String,
}

impl PaletteConfig {
    /// Hex rendering for a status color.
    pub fn hex(&self, color: StatusColor) -> &str {
        match color {
            StatusColor::Grey => &self.grey,
            StatusColor::DarkGreen => &self.dark_green,
            StatusColor::LightGreen => &self.light_green,
            StatusColor::LightYellow => &self.light_yellow,
            StatusColor::LightRed => &self.light_red,
        }
    }
}

/// Template for scheduled reminder pushes.
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminder_title")]
    pub title: String,

    /// Body template; `{group}` is replaced with the group name.
    #[serde(default = "default_reminder_body")]
    pub body_template: String,
}

impl ReminderConfig {
    pub fn body_for(&self, group_name: &str) -> String {
        self.body_template.replace("{group}", group_name)
    }
}

/// Urgent session maintenance knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct UrgentConfig {
    /// Cadence of the expired-session sweep, in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

/// Schedule evaluation defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDefaults {
    /// Zone used for groups without an explicit time zone.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl ScheduleDefaults {
    /// The configured default zone, falling back to UTC when the name
    /// does not resolve.
    pub fn default_tz(&self) -> chrono_tz::Tz {
        self.default_timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(
                timezone = %self.default_timezone,
                "Unknown default timezone, falling back to UTC"
            );
            chrono_tz::Tz::UTC
        })
    }
}

impl EngineConfig {
    /// Load configuration from the optional layered sources.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("rollcall").required(false))
            .add_source(config::Environment::with_prefix("ROLLCALL").separator("__"))
            .build()?
            .try_deserialize()
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            grey: default_grey(),
            dark_green: default_admin_green(),
            light_green: default_light_green(),
            light_yellow: default_light_yellow(),
            light_red: default_light_red(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            title: default_reminder_title(),
            body_template: default_reminder_body(),
        }
    }
}

impl Default for UrgentConfig {
    fn default() -> Self {
        Self {
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

fn default_grey() -> String {
    "#E0E0E0".to_string()
}

fn default_admin_green() -> String {
    "#006400".to_string()
}

fn default_light_green() -> String {
    "#C8E6C9".to_string()
}

fn default_light_yellow() -> String {
    "#FFF59D".to_string()
}

fn default_light_red() -> String {
    "#FFCDD2".to_string()
}

fn default_reminder_title() -> String {
    "Time to report!".to_string()
}

fn default_reminder_body() -> String {
    "{group} - send in your report".to_string()
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_timezone() -> String {
    "Europe/Kyiv".to_string()
}
