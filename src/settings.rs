/// persisted run settings for canvas-evolve.
/// the command line overrides whatever is loaded here.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::mutation_config::EvolutionConfig;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// image to approximate
    pub target: Option<PathBuf>,
    /// where snapshots and the final image go
    pub output_dir: PathBuf,

    // evolution parameters
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// fixed seed for reproducible runs (None = fresh entropy each run)
    pub seed: Option<u64>,

    // reporting
    /// publish a snapshot every N generations (the last one is always published)
    pub report_interval: usize,

    // pre-processing
    /// downscale the target so its larger side is at most this many pixels
    pub max_dimension: u32,
    /// apply `max_dimension` at all
    pub compress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let evolution = EvolutionConfig::default();
        Self {
            target: None,
            output_dir: PathBuf::from("output"),
            population_size: evolution.population_size,
            generations: evolution.generations,
            mutation_rate: evolution.mutation_rate,
            tournament_size: evolution.tournament_size,
            seed: evolution.seed,
            report_interval: 100,
            max_dimension: 540,
            compress: true,
        }
    }
}

impl Settings {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// read settings from `path`, falling back to defaults when the file is
    /// missing or does not parse. fields absent from the file take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                // missing file is the normal first-run case
                tracing::debug!(path = %path.display(), error = %e, "no settings file, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_evolution_config(&self) -> EvolutionConfig {
        EvolutionConfig {
            population_size: self.population_size,
            generations: self.generations,
            mutation_rate: self.mutation_rate,
            tournament_size: self.tournament_size,
            seed: self.seed,
        }
    }

    /// dimension cap to resize to, if compression is on
    pub fn resize_limit(&self) -> Option<u32> {
        self.compress.then_some(self.max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.population_size, 500);
        assert_eq!(s.generations, 10_000);
        assert_eq!(s.mutation_rate, 0.05);
        assert_eq!(s.tournament_size, 6);
        assert_eq!(s.report_interval, 100);
        assert_eq!(s.max_dimension, 540);
        assert!(s.compress);
        assert!(s.to_evolution_config().validate().is_ok());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            target: Some(PathBuf::from("cat.png")),
            population_size: 64,
            seed: Some(7),
            compress: false,
            ..Settings::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path().join("nope.json")), Settings::default());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Settings::load(&broken), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "generations": 25, "mutation_rate": 0.2 }"#).unwrap();

        let s = Settings::load(&path);
        assert_eq!(s.generations, 25);
        assert_eq!(s.mutation_rate, 0.2);
        assert_eq!(s.population_size, 500);
    }

    #[test]
    fn resize_limit_follows_compress_flag() {
        let mut s = Settings::default();
        assert_eq!(s.resize_limit(), Some(540));
        s.compress = false;
        assert_eq!(s.resize_limit(), None);
    }
}
