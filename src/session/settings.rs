use crate::foundation::core::Canvas;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Shortest accepted per-image hold, in seconds.
pub const HOLD_SECONDS_MIN: f64 = 1.0;
/// Longest accepted per-image hold, in seconds.
pub const HOLD_SECONDS_MAX: f64 = 10.0;

/// Output frame size. Only the two broadcast sizes are supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// 1280x720.
    Hd720,
    /// 1920x1080.
    #[default]
    Hd1080,
}

impl Resolution {
    /// Pixel size of the output canvas.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Hd720 => Canvas {
                width: 1280,
                height: 720,
            },
            Self::Hd1080 => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }

    /// Parse `720p`, `1080p`, `1280x720` or `1920x1080` (case-insensitive).
    pub fn parse(s: &str) -> KenBurnsResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "720p" | "1280x720" => Ok(Self::Hd720),
            "1080p" | "1920x1080" => Ok(Self::Hd1080),
            other => Err(KenBurnsError::validation(format!(
                "unsupported resolution '{other}' (expected 1280x720 or 1920x1080)"
            ))),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.canvas();
        write!(f, "{}x{}", c.width, c.height)
    }
}

impl std::str::FromStr for Resolution {
    type Err = KenBurnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Resolution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// User-facing render settings. Immutable for the duration of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Seconds each image is held (with pan/zoom) before the next transition.
    pub hold_seconds: f64,
    /// Output frame size.
    pub resolution: Resolution,
    /// Mix in the looping music track instead of silence.
    pub add_music: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hold_seconds: 3.0,
            resolution: Resolution::Hd1080,
            add_music: false,
        }
    }
}

impl Settings {
    /// Reject settings outside the supported ranges.
    pub fn validate(&self) -> KenBurnsResult<()> {
        if !self.hold_seconds.is_finite()
            || !(HOLD_SECONDS_MIN..=HOLD_SECONDS_MAX).contains(&self.hold_seconds)
        {
            return Err(KenBurnsError::validation(format!(
                "hold_seconds must be in [{HOLD_SECONDS_MIN}, {HOLD_SECONDS_MAX}], got {}",
                self.hold_seconds
            )));
        }
        Ok(())
    }

    /// Output canvas for these settings.
    pub fn canvas(&self) -> Canvas {
        self.resolution.canvas()
    }

    /// Parse and validate settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> KenBurnsResult<Self> {
        let settings: Self = serde_json::from_str(s)
            .map_err(|e| KenBurnsError::validation(format!("parse settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate settings from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> KenBurnsResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KenBurnsError::validation(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            KenBurnsError::validation(format!("parse settings JSON '{}': {e}", path.display()))
        })?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/settings.rs"]
mod tests;
