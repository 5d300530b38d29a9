use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8505;
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";

/// Runtime configuration, resolved from environment variables.
///
/// Defaults mirror the launcher behavior: fixed port 8505, browser
/// auto-open on (headless off), usage telemetry off.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// `FACEMARK_HEADLESS`: suppress opening the browser on startup.
    pub headless: bool,
    /// `FACEMARK_TELEMETRY`: opt into anonymous usage counters in the log.
    pub telemetry: bool,
    /// `FACEMARK_CAMERA`: camera device path for live mode.
    pub camera_device: String,
    /// `FACEMARK_MODEL_DIR`: directory with pre-downloaded model files.
    pub model_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            headless: false,
            telemetry: false,
            camera_device: DEFAULT_CAMERA_DEVICE.to_string(),
            model_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: get("FACEMARK_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            headless: get("FACEMARK_HEADLESS").map(|v| parse_bool(&v)).unwrap_or(false),
            telemetry: get("FACEMARK_TELEMETRY").map(|v| parse_bool(&v)).unwrap_or(false),
            camera_device: get("FACEMARK_CAMERA").unwrap_or(defaults.camera_device),
            model_dir: get("FACEMARK_MODEL_DIR").map(PathBuf::from),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
