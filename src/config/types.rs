use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Linkreach
///
/// Every field has a default, so an empty (or absent) configuration file
/// resolves to a usable set of settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Root address of the site, e.g. `https://www.linkedin.com/`
    #[serde(rename = "main-address")]
    pub main_address: String,

    /// Directory holding the cached session artifact
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Affordance label text used for relationship-state detection
    #[serde(rename = "button-labels")]
    pub button_labels: ButtonLabels,

    /// Pacing bounds applied between automated actions (seconds)
    pub cooldown: Cooldown,

    /// How long a login checkpoint is polled before giving up (seconds)
    #[serde(rename = "checkpoint-timeout-seconds")]
    pub checkpoint_timeout_seconds: u64,

    /// Delay applied before a failed login is reported (seconds)
    #[serde(rename = "failure-grace-seconds")]
    pub failure_grace_seconds: u64,

    /// Upper bound for waiting on a single page element (seconds)
    #[serde(rename = "element-timeout-seconds")]
    pub element_timeout_seconds: u64,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Scroll routine used when visiting profiles
    pub scroll: ScrollSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            main_address: "https://www.linkedin.com/".to_string(),
            cache_dir: PathBuf::from("./cache/"),
            button_labels: ButtonLabels::default(),
            cooldown: Cooldown::default(),
            checkpoint_timeout_seconds: 60,
            failure_grace_seconds: 30,
            element_timeout_seconds: 10,
            headless: true,
            scroll: ScrollSettings::default(),
        }
    }
}

impl Settings {
    /// Joins a site-relative path onto the main address
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.main_address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of the authenticated landing page
    pub fn feed_url(&self) -> String {
        self.endpoint("feed/")
    }

    /// URL of the credential login form
    pub fn login_url(&self) -> String {
        self.endpoint("login")
    }

    /// Canonical profile URL for a profile id
    pub fn profile_url(&self, profile_id: &str) -> String {
        self.endpoint(&format!("in/{}/", profile_id))
    }

    /// Location of the session cache file
    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join("session.json")
    }

    pub fn checkpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.checkpoint_timeout_seconds)
    }

    pub fn failure_grace(&self) -> Duration {
        Duration::from_secs(self.failure_grace_seconds)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_seconds)
    }
}

/// Visible texts of a profile's primary action button
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ButtonLabels {
    /// Shown when the profile is already a connection
    pub message: String,

    /// Shown when a connection request can be sent directly
    pub connect: String,

    /// Shown when connecting is hidden behind the overflow menu
    pub follow: String,

    /// Expands truncated sections on a profile page
    #[serde(rename = "show-more")]
    pub show_more: String,
}

impl Default for ButtonLabels {
    fn default() -> Self {
        Self {
            message: "Message".to_string(),
            connect: "Connect".to_string(),
            follow: "Follow".to_string(),
            show_more: "Show more".to_string(),
        }
    }
}

/// Inclusive range of a randomized pacing delay, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Cooldown {
    pub min: f64,
    pub max: f64,
}

impl Cooldown {
    /// Creates a range, swapping the bounds if they are inverted
    pub fn new(min: f64, max: f64) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// A range that always yields exactly `seconds`
    pub fn fixed(seconds: f64) -> Self {
        Self {
            min: seconds,
            max: seconds,
        }
    }

    /// Same range with inverted bounds swapped and negatives clamped to zero
    pub fn normalized(self) -> Self {
        let lo = if self.min.is_finite() { self.min.max(0.0) } else { 0.0 };
        let hi = if self.max.is_finite() { self.max.max(0.0) } else { lo };
        Self::new(lo, hi)
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 20.0,
        }
    }
}

/// Bounded scroll-to-bottom routine for lazy-loaded profile content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Total wall-clock budget for scrolling
    #[serde(rename = "budget-seconds")]
    pub budget_seconds: u64,

    /// Pause between two scroll steps
    #[serde(rename = "step-millis")]
    pub step_millis: u64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            budget_seconds: 5,
            step_millis: 500,
        }
    }
}

impl ScrollSettings {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_millis)
    }

    /// Number of scroll steps that fit inside the budget
    pub fn steps(&self) -> u64 {
        if self.step_millis == 0 {
            return 0;
        }
        (self.budget_seconds * 1000) / self.step_millis
    }
}
