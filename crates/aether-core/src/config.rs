//! Configuration loading and typed config structures for the Aether
//! environment simulation.
//!
//! The canonical configuration lives in `aether-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads the file. Every field has a
//! default, so an empty file (or a missing section) yields a working
//! simulation. Semantic validation happens when components are constructed.
//!
//! | Section      | Struct                     | Consumer                  |
//! |--------------|----------------------------|---------------------------|
//! | `world`      | [`WorldConfig`]            | `Simulation::new`         |
//! | `time`       | [`TimeConfig`]             | `TimeClock::new`          |
//! | `weather`    | [`WeatherConfig`]          | `WeatherEngine::new`      |
//! | `sky`        | [`SkyConfig`]              | `EnvironmentAggregator`   |
//! | `simulation` | [`SimulationBoundsConfig`] | `run_simulation`          |
//! | `logging`    | [`LoggingConfig`]          | engine binary             |

use std::path::Path;

use aether_types::AdvanceMode;
use aether_weather::WeatherConfig;
use glam::Vec3;
use serde::Deserialize;

use crate::curve::{Interpolation, Keyframe};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `aether-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seeding of the random source and the starting hour.
    #[serde(default)]
    pub world: WorldConfig,

    /// Time clock settings and lighting curves.
    #[serde(default)]
    pub time: TimeConfig,

    /// Weather engine settings.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Aggregator modulation constants and sky palette.
    #[serde(default)]
    pub sky: SkyConfig,

    /// Run loop bounds.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Seed for every random choice. Absent means operating system entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Hour the clock starts at. Absent means the wall-clock hour.
    #[serde(default)]
    pub start_hour: Option<f32>,
}

/// Time clock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Advance mode at startup.
    #[serde(default)]
    pub mode: AdvanceMode,

    /// Hour the dawn period begins.
    #[serde(default = "default_dawn_start")]
    pub dawn_start: f32,

    /// Hour the dawn period ends and the day begins.
    #[serde(default = "default_dawn_end")]
    pub dawn_end: f32,

    /// Hour the day ends and the dusk period begins.
    #[serde(default = "default_dusk_start")]
    pub dusk_start: f32,

    /// Hour the dusk period ends and the night begins.
    #[serde(default = "default_dusk_end")]
    pub dusk_end: f32,

    /// Real seconds for one full simulated day at `time_scale` 1.
    #[serde(default = "default_day_length_seconds")]
    pub day_length_seconds: f32,

    /// Speed multiplier for accelerated simulation.
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// Minimum accumulated delta before the clock recomputes.
    #[serde(default = "default_min_update_interval")]
    pub min_update_interval_seconds: f32,

    /// Fixed UTC offset for real-time sync. Absent means local time.
    #[serde(default)]
    pub utc_offset_hours: Option<f32>,

    /// Lighting curves over the hour of day.
    #[serde(default)]
    pub curves: TimeCurveConfig,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            mode: AdvanceMode::default(),
            dawn_start: default_dawn_start(),
            dawn_end: default_dawn_end(),
            dusk_start: default_dusk_start(),
            dusk_end: default_dusk_end(),
            day_length_seconds: default_day_length_seconds(),
            time_scale: default_time_scale(),
            min_update_interval_seconds: default_min_update_interval(),
            utc_offset_hours: None,
            curves: TimeCurveConfig::default(),
        }
    }
}

/// Keyframe tables for the clock's lighting curves, keyed by hour.
///
/// Each table needs keys at hour 0 and hour 24 with equal values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeCurveConfig {
    /// Interpolation used by every time curve.
    #[serde(default)]
    pub interpolation: Interpolation,

    /// Directional sun intensity.
    #[serde(default = "default_sun_intensity_curve")]
    pub sun_intensity: Vec<Keyframe<f32>>,

    /// Moon intensity.
    #[serde(default = "default_moon_intensity_curve")]
    pub moon_intensity: Vec<Keyframe<f32>>,

    /// Ambient light color.
    #[serde(default = "default_ambient_color_curve")]
    pub ambient_color: Vec<Keyframe<Vec3>>,

    /// Base fog density.
    #[serde(default = "default_fog_density_curve")]
    pub fog_density: Vec<Keyframe<f32>>,

    /// Star visibility alpha.
    #[serde(default = "default_star_visibility_curve")]
    pub star_visibility: Vec<Keyframe<f32>>,
}

impl Default for TimeCurveConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Linear,
            sun_intensity: default_sun_intensity_curve(),
            moon_intensity: default_moon_intensity_curve(),
            ambient_color: default_ambient_color_curve(),
            fog_density: default_fog_density_curve(),
            star_visibility: default_star_visibility_curve(),
        }
    }
}

/// Aggregator modulation constants.
///
/// The cloud and visibility multipliers are empirical; they are exposed here
/// so scenes can tune them without code changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkyConfig {
    /// Fraction of sun intensity removed at full cloud coverage.
    #[serde(default = "default_sun_cloud_dimming")]
    pub sun_cloud_dimming: f32,

    /// Fraction of moon intensity removed at full cloud coverage.
    #[serde(default = "default_moon_cloud_dimming")]
    pub moon_cloud_dimming: f32,

    /// Fraction of ambient light removed at full cloud coverage.
    #[serde(default = "default_ambient_cloud_darkening")]
    pub ambient_cloud_darkening: f32,

    /// Fraction of star visibility removed at full cloud coverage.
    #[serde(default = "default_star_cloud_occlusion")]
    pub star_cloud_occlusion: f32,

    /// Cloud coverage above which sky colors turn toward overcast grey.
    #[serde(default = "default_overcast_threshold")]
    pub overcast_threshold: f32,

    /// Strength of the overcast tint at full coverage.
    #[serde(default = "default_overcast_blend")]
    pub overcast_blend: f32,

    /// Strength of the blend toward fog color at zero visibility.
    #[serde(default = "default_fog_sky_blend")]
    pub fog_sky_blend: f32,

    /// Floor applied to visibility before scaling fog density.
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,

    /// Ceiling on the published fog density.
    #[serde(default = "default_max_fog_density")]
    pub max_fog_density: f32,

    /// Cloud coverage present regardless of weather.
    #[serde(default)]
    pub base_cloud_coverage: f32,

    /// Ambient light added at full lightning flash.
    #[serde(default = "default_lightning_ambient_boost")]
    pub lightning_ambient_boost: f32,

    /// Minimum seconds between published snapshots. Zero publishes on
    /// every update.
    #[serde(default)]
    pub update_interval_seconds: f32,

    /// Sky color curves over normalized time.
    #[serde(default)]
    pub palette: PaletteConfig,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            sun_cloud_dimming: default_sun_cloud_dimming(),
            moon_cloud_dimming: default_moon_cloud_dimming(),
            ambient_cloud_darkening: default_ambient_cloud_darkening(),
            star_cloud_occlusion: default_star_cloud_occlusion(),
            overcast_threshold: default_overcast_threshold(),
            overcast_blend: default_overcast_blend(),
            fog_sky_blend: default_fog_sky_blend(),
            min_visibility: default_min_visibility(),
            max_fog_density: default_max_fog_density(),
            base_cloud_coverage: 0.0,
            lightning_ambient_boost: default_lightning_ambient_boost(),
            update_interval_seconds: 0.0,
            palette: PaletteConfig::default(),
        }
    }
}

/// Sky color keyframes over normalized time of day (`0` and `1` are
/// midnight).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaletteConfig {
    /// Interpolation used by every palette curve.
    #[serde(default = "default_palette_interpolation")]
    pub interpolation: Interpolation,

    /// Sky color straight up.
    #[serde(default = "default_zenith_palette")]
    pub zenith: Vec<Keyframe<Vec3>>,

    /// Sky color at the horizon.
    #[serde(default = "default_horizon_palette")]
    pub horizon: Vec<Keyframe<Vec3>>,

    /// Sun light color.
    #[serde(default = "default_sun_color_palette")]
    pub sun_color: Vec<Keyframe<Vec3>>,

    /// Moon light color.
    #[serde(default = "default_moon_color_palette")]
    pub moon_color: Vec<Keyframe<Vec3>>,

    /// Fog color.
    #[serde(default = "default_fog_color_palette")]
    pub fog_color: Vec<Keyframe<Vec3>>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            interpolation: default_palette_interpolation(),
            zenith: default_zenith_palette(),
            horizon: default_horizon_palette(),
            sun_color: default_sun_color_palette(),
            moon_color: default_moon_color_palette(),
            fog_color: default_fog_color_palette(),
        }
    }
}

/// Run loop bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Real-time milliseconds slept between steps.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated seconds passed to each step.
    #[serde(default = "default_step_seconds")]
    pub step_seconds: f32,

    /// Maximum number of steps (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            step_seconds: default_step_seconds(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Steps between environment progress reports (0 = never).
    #[serde(default = "default_report_every_steps")]
    pub report_every_steps: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            report_every_steps: default_report_every_steps(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_dawn_start() -> f32 {
    5.0
}

const fn default_dawn_end() -> f32 {
    7.0
}

const fn default_dusk_start() -> f32 {
    17.0
}

const fn default_dusk_end() -> f32 {
    19.0
}

const fn default_day_length_seconds() -> f32 {
    1440.0
}

const fn default_time_scale() -> f32 {
    1.0
}

const fn default_min_update_interval() -> f32 {
    0.5
}

fn keyframes<T: Copy>(pairs: &[(f32, T)]) -> Vec<Keyframe<T>> {
    pairs
        .iter()
        .map(|&(key, value)| Keyframe::new(key, value))
        .collect()
}

/// Sun intensity peaks late morning and falls steadily until dusk ends.
fn default_sun_intensity_curve() -> Vec<Keyframe<f32>> {
    keyframes(&[
        (0.0, 0.0),
        (5.0, 0.0),
        (6.0, 0.25),
        (7.0, 0.6),
        (9.0, 0.9),
        (11.5, 1.0),
        (14.0, 0.95),
        (16.0, 0.8),
        (17.0, 0.6),
        (18.0, 0.25),
        (19.0, 0.05),
        (20.0, 0.0),
        (24.0, 0.0),
    ])
}

fn default_moon_intensity_curve() -> Vec<Keyframe<f32>> {
    keyframes(&[
        (0.0, 0.35),
        (5.0, 0.3),
        (6.0, 0.1),
        (7.0, 0.0),
        (18.0, 0.0),
        (19.0, 0.1),
        (20.0, 0.3),
        (24.0, 0.35),
    ])
}

fn default_ambient_color_curve() -> Vec<Keyframe<Vec3>> {
    let night = Vec3::new(0.1, 0.1, 0.2);
    let sunrise = Vec3::new(0.9, 0.6, 0.4);
    let day = Vec3::new(0.7, 0.8, 1.0);
    let sunset = Vec3::new(0.8, 0.5, 0.4);
    keyframes(&[
        (0.0, night),
        (5.0, night),
        (6.5, sunrise),
        (9.0, day),
        (16.0, day),
        (18.0, sunset),
        (19.5, night),
        (24.0, night),
    ])
}

fn default_fog_density_curve() -> Vec<Keyframe<f32>> {
    keyframes(&[
        (0.0, 0.03),
        (5.0, 0.04),
        (6.5, 0.06),
        (9.0, 0.015),
        (17.0, 0.015),
        (19.0, 0.03),
        (24.0, 0.03),
    ])
}

fn default_star_visibility_curve() -> Vec<Keyframe<f32>> {
    keyframes(&[
        (0.0, 1.0),
        (4.5, 1.0),
        (6.5, 0.0),
        (18.0, 0.0),
        (20.0, 1.0),
        (24.0, 1.0),
    ])
}

const fn default_palette_interpolation() -> Interpolation {
    Interpolation::Smooth
}

/// Normalized keys shared by the palette curves: midnight, pre-dawn,
/// sunrise, morning, noon, afternoon, sunset, late dusk, midnight.
const PALETTE_KEYS: [f32; 9] = [0.0, 0.2, 0.25, 0.3, 0.5, 0.7, 0.75, 0.8, 1.0];

fn palette(colors: [Vec3; 9]) -> Vec<Keyframe<Vec3>> {
    PALETTE_KEYS
        .into_iter()
        .zip(colors)
        .map(|(key, value)| Keyframe::new(key, value))
        .collect()
}

fn default_zenith_palette() -> Vec<Keyframe<Vec3>> {
    let night = Vec3::new(0.02, 0.02, 0.08);
    let twilight = Vec3::new(0.4, 0.3, 0.6);
    let day = Vec3::new(0.3, 0.5, 0.9);
    palette([
        night,
        Vec3::new(0.06, 0.05, 0.16),
        twilight,
        Vec3::new(0.32, 0.45, 0.8),
        day,
        day,
        twilight,
        Vec3::new(0.08, 0.06, 0.2),
        night,
    ])
}

fn default_horizon_palette() -> Vec<Keyframe<Vec3>> {
    let night = Vec3::new(0.05, 0.05, 0.15);
    let sunrise = Vec3::new(1.0, 0.6, 0.2);
    let day = Vec3::new(0.7, 0.8, 0.9);
    palette([
        night,
        Vec3::new(0.25, 0.15, 0.2),
        sunrise,
        Vec3::new(0.8, 0.75, 0.7),
        day,
        day,
        Vec3::new(1.0, 0.5, 0.2),
        Vec3::new(0.2, 0.1, 0.2),
        night,
    ])
}

fn default_sun_color_palette() -> Vec<Keyframe<Vec3>> {
    let low = Vec3::new(1.0, 0.5, 0.3);
    let sunrise = Vec3::new(1.0, 0.7, 0.4);
    let day = Vec3::new(1.0, 0.95, 0.8);
    palette([
        low,
        low,
        sunrise,
        Vec3::new(1.0, 0.85, 0.65),
        day,
        day,
        low,
        low,
        low,
    ])
}

fn default_moon_color_palette() -> Vec<Keyframe<Vec3>> {
    let moon = Vec3::new(0.7, 0.7, 0.9);
    let pale = Vec3::new(0.8, 0.8, 0.85);
    palette([moon, moon, pale, pale, pale, pale, pale, moon, moon])
}

fn default_fog_color_palette() -> Vec<Keyframe<Vec3>> {
    let night = Vec3::new(0.04, 0.05, 0.1);
    let day = Vec3::new(0.75, 0.8, 0.85);
    palette([
        night,
        Vec3::new(0.2, 0.18, 0.22),
        Vec3::new(0.7, 0.55, 0.45),
        Vec3::new(0.72, 0.7, 0.7),
        day,
        day,
        Vec3::new(0.65, 0.45, 0.4),
        Vec3::new(0.15, 0.1, 0.15),
        night,
    ])
}

const fn default_sun_cloud_dimming() -> f32 {
    0.7
}

const fn default_moon_cloud_dimming() -> f32 {
    0.9
}

const fn default_ambient_cloud_darkening() -> f32 {
    0.4
}

const fn default_star_cloud_occlusion() -> f32 {
    1.0
}

const fn default_overcast_threshold() -> f32 {
    0.5
}

const fn default_overcast_blend() -> f32 {
    0.8
}

const fn default_fog_sky_blend() -> f32 {
    0.6
}

const fn default_min_visibility() -> f32 {
    0.05
}

const fn default_max_fog_density() -> f32 {
    1.0
}

const fn default_lightning_ambient_boost() -> f32 {
    0.8
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_step_seconds() -> f32 {
    0.1
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_report_every_steps() -> u64 {
    600
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use aether_types::WeatherType;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.time.mode, AdvanceMode::AcceleratedSimulation);
        assert_eq!(config.time.day_length_seconds, 1440.0);
        assert_eq!(config.time.min_update_interval_seconds, 0.5);
        assert_eq!(config.sky.sun_cloud_dimming, 0.7);
        assert_eq!(config.sky.moon_cloud_dimming, 0.9);
        assert_eq!(config.sky.ambient_cloud_darkening, 0.4);
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.logging.level, "info");
        assert!(config.world.seed.is_none());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        assert_eq!(SimulationConfig::parse("").unwrap(), SimulationConfig::default());
        assert_eq!(SimulationConfig::parse("{}").unwrap(), SimulationConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  seed: 7
  start_hour: 11.5

time:
  mode: manual_override
  dawn_start: 4.5
  dawn_end: 6.5
  dusk_start: 18.0
  dusk_end: 20.0
  day_length_seconds: 600
  time_scale: 2.0
  min_update_interval_seconds: 0.0
  utc_offset_hours: -5
  curves:
    interpolation: smooth
    sun_intensity:
      - { key: 0.0, value: 0.0 }
      - { key: 12.0, value: 1.0 }
      - { key: 24.0, value: 0.0 }

weather:
  initial: rain
  auto_change: false
  transition_duration_seconds: 12

sky:
  sun_cloud_dimming: 0.5
  update_interval_seconds: 0.25
  palette:
    zenith:
      - { key: 0.0, value: [0.0, 0.0, 0.1] }
      - { key: 1.0, value: [0.0, 0.0, 0.1] }

simulation:
  tick_interval_ms: 50
  step_seconds: 0.05
  max_ticks: 1000
  max_real_time_seconds: 60

logging:
  level: debug
  json: true
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.world.start_hour, Some(11.5));
        assert_eq!(config.time.mode, AdvanceMode::ManualOverride);
        assert_eq!(config.time.dawn_start, 4.5);
        assert_eq!(config.time.utc_offset_hours, Some(-5.0));
        assert_eq!(config.time.curves.interpolation, Interpolation::Smooth);
        assert_eq!(config.time.curves.sun_intensity.len(), 3);
        assert_eq!(config.time.curves.moon_intensity, default_moon_intensity_curve());
        assert_eq!(config.weather.initial, WeatherType::Rain);
        assert!(!config.weather.auto_change);
        assert_eq!(config.sky.sun_cloud_dimming, 0.5);
        assert_eq!(config.sky.moon_cloud_dimming, 0.9);
        assert_eq!(config.sky.palette.zenith.len(), 2);
        assert_eq!(config.sky.palette.interpolation, Interpolation::Smooth);
        assert_eq!(config.simulation.max_ticks, 1000);
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SimulationConfig::parse("time:\n  time_scale: 4.0\n").unwrap();
        assert_eq!(config.time.time_scale, 4.0);
        assert_eq!(config.time.dusk_start, 17.0);
        assert_eq!(config.weather, WeatherConfig::default());
        assert_eq!(config.sky, SkyConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SimulationConfig::parse("time: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/aether-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn default_tables_close_the_loop() {
        let curves = TimeCurveConfig::default();
        for table in [
            &curves.sun_intensity,
            &curves.moon_intensity,
            &curves.fog_density,
            &curves.star_visibility,
        ] {
            let first = table.first().unwrap();
            let last = table.last().unwrap();
            assert_eq!(first.key, 0.0);
            assert_eq!(last.key, 24.0);
            assert_eq!(first.value, last.value);
        }
        let palette = PaletteConfig::default();
        assert_eq!(palette.zenith.first().unwrap().value, palette.zenith.last().unwrap().value);
        assert_eq!(palette.fog_color.last().unwrap().key, 1.0);
    }
}
