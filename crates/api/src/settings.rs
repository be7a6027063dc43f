//! Server settings
//!
//! Defaults, then an optional `drowsiness.toml`, then `DROWSY__*` environment
//! variables (`DROWSY__SERVER__ADDR=127.0.0.1:9000`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::ApiError;

/// Optional settings file in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "drowsiness.toml";

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub detector: DetectorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorSettings {
    /// Directory with the face and eye cascade XML files
    pub cascade_dir: PathBuf,
    /// JPEG quality of processed frames
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Maximum level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Settings {
    /// Load from the default file and the environment
    pub fn load() -> Result<Self, ApiError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path` (may be missing) and the environment
    pub fn load_from(path: &Path) -> Result<Self, ApiError> {
        let settings = Config::builder()
            .set_default("server.addr", "0.0.0.0:8080")?
            .set_default("detector.cascade_dir", "data/haarcascades")?
            .set_default("detector.jpeg_quality", i64::from(camera_capture::DEFAULT_JPEG_QUALITY))?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("DROWSY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    const QUALITY_VAR: &str = "DROWSY__DETECTOR__JPEG_QUALITY";
    const ADDR_VAR: &str = "DROWSY__SERVER__ADDR";

    // Settings read the process environment; tests touching it run one at a time
    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes the variables it set, even when the test panics
    struct EnvGuard(&'static [&'static str]);

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(settings.detector.cascade_dir, PathBuf::from("data/haarcascades"));
        assert_eq!(settings.detector.jpeg_quality, 80);
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drowsiness.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[detector]\ncascade_dir = \"/opt/cascades\"\n\n[logging]\nlevel = \"debug\"\njson = true"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.detector.cascade_dir, PathBuf::from("/opt/cascades"));
        assert_eq!(settings.detector.jpeg_quality, 80);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drowsiness.toml");
        std::fs::write(&path, "[server]\naddr = \"0.0.0.0:7000\"\n").unwrap();

        let _guard = EnvGuard(&[QUALITY_VAR, ADDR_VAR]);
        std::env::set_var(QUALITY_VAR, "90");
        std::env::set_var(ADDR_VAR, "127.0.0.1:9000");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.detector.jpeg_quality, 90);
        assert_eq!(settings.server.addr, "127.0.0.1:9000");
        assert_eq!(settings.detector.cascade_dir, PathBuf::from("data/haarcascades"));
    }
}
