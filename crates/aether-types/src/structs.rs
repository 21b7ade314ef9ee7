//! Core value structs: weather conditions, evaluated lighting, and the
//! published environment snapshot.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::{Period, WeatherIntensity, WeatherType};

/// Immutable description of the weather at one moment.
///
/// Canonical conditions come from the weather catalog. Blended conditions
/// are produced while a transition is in progress and carry the categorical
/// fields of whichever endpoint is closer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    /// Categorical weather type.
    pub kind: WeatherType,
    /// Severity tier.
    pub intensity: WeatherIntensity,
    /// Fraction of the sky covered by clouds, `[0, 1]`.
    pub cloud_coverage: f32,
    /// Precipitation strength, `[0, 1]`.
    pub precipitation: f32,
    /// Normalized wind speed, `[0, 1]`.
    pub wind_speed: f32,
    /// Wind direction in degrees, `[0, 360)`.
    pub wind_direction: f32,
    /// Normalized visibility, `[0, 1]` (1 is unobstructed).
    pub visibility: f32,
    /// Air temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, `[0, 1]`.
    pub humidity: f32,
}

/// Lighting quantities evaluated from the time clock's curves for the
/// current hour, before any weather modulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeLighting {
    /// Directional sun light intensity.
    pub sun_intensity: f32,
    /// Secondary moon light intensity.
    pub moon_intensity: f32,
    /// Ambient light color.
    pub ambient_color: Vec3,
    /// Base fog density.
    pub fog_density: f32,
    /// Star visibility alpha, `[0, 1]`.
    pub star_visibility: f32,
}

/// Every derived rendering parameter for one aggregation tick.
///
/// Snapshots are recomputed wholesale and published as a unit; no field is
/// ever updated in place after publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Monotonic publication counter (0 for the initial snapshot).
    pub sequence: u64,
    /// Hour of day the snapshot was computed for.
    pub hour: f32,
    /// Normalized time of day, `hour / 24`.
    pub normalized_time: f32,
    /// Day period at `hour`.
    pub period: Period,
    /// Categorical weather type of the blended condition.
    pub weather: WeatherType,

    /// Sky color straight up.
    pub sky_zenith_color: Vec3,
    /// Sky color at the horizon.
    pub sky_horizon_color: Vec3,

    /// Sun angle in degrees, `(t - 0.25) * 360`.
    pub sun_angle: f32,
    /// Unit vector pointing from the scene toward the sun.
    pub sun_direction: Vec3,
    /// Sun light color.
    pub sun_color: Vec3,
    /// Sun light intensity after weather modulation.
    pub sun_intensity: f32,

    /// Moon angle in degrees, always opposite the sun.
    pub moon_angle: f32,
    /// Unit vector pointing from the scene toward the moon.
    pub moon_direction: Vec3,
    /// Moon light color.
    pub moon_color: Vec3,
    /// Moon light intensity after weather modulation.
    pub moon_intensity: f32,

    /// Fog color.
    pub fog_color: Vec3,
    /// Fog density after visibility scaling.
    pub fog_density: f32,

    /// Ambient light color after cloud darkening and lightning.
    pub ambient_color: Vec3,

    /// Cloud coverage actually rendered, `[0, 1]`.
    pub cloud_coverage: f32,
    /// Star alpha after cloud occlusion, `[0, 1]`.
    pub star_visibility: f32,

    /// Camera exposure multiplier.
    pub exposure: f32,
    /// Atmosphere thickness scalar for the sky shader.
    pub atmosphere_thickness: f32,

    /// Precipitation strength of the blended condition.
    pub precipitation: f32,
    /// Wind speed of the blended condition.
    pub wind_speed: f32,
    /// Wind direction of the blended condition, degrees.
    pub wind_direction: f32,
    /// Current lightning flash intensity, `[0, 1]`.
    pub lightning_flash: f32,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            sequence: 0,
            hour: 0.0,
            normalized_time: 0.0,
            period: Period::Night,
            weather: WeatherType::Clear,
            sky_zenith_color: Vec3::ZERO,
            sky_horizon_color: Vec3::ZERO,
            sun_angle: -90.0,
            sun_direction: Vec3::NEG_Y,
            sun_color: Vec3::ONE,
            sun_intensity: 0.0,
            moon_angle: 90.0,
            moon_direction: Vec3::Y,
            moon_color: Vec3::ONE,
            moon_intensity: 0.0,
            fog_color: Vec3::ZERO,
            fog_density: 0.0,
            ambient_color: Vec3::ZERO,
            cloud_coverage: 0.0,
            star_visibility: 0.0,
            exposure: 1.0,
            atmosphere_thickness: 1.0,
            precipitation: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            lightning_flash: 0.0,
        }
    }
}
