//! Derived rendering parameters.
//!
//! The aggregator reads the clock's evaluated lighting and the weather
//! engine's blended condition and recomputes a complete
//! [`EnvironmentSnapshot`] from them. It holds no simulation state of its
//! own beyond its configuration, an optional cloud coverage override, and
//! the publication counter.
//!
//! # Computation
//!
//! 1. Sky, sun, moon, and fog colors from the [`SkyPalette`] at normalized
//!    time `t`.
//! 2. Sun angle `(t - 0.25) * 360` and the moon exactly opposite.
//! 3. Weather modulation:
//!    - cloud coverage is `max(base, weather)` unless overridden
//!    - sun and moon intensity scale by `1 - cloud * k`
//!    - fog density scales by `1 / visibility`
//!    - ambient light darkens with cloud and brightens with lightning
//!    - sky colors turn toward grey above the overcast threshold, then
//!      toward the fog color as visibility drops
//! 4. One atomic publish, then `EnvironmentEvent::Updated`.

use std::sync::Arc;

use aether_events::{EventBus, EventSink, SubscriptionId};
use aether_types::{
    EnvironmentEvent, EnvironmentSnapshot, HOURS_PER_DAY, Period, TimeLighting, WeatherCondition,
};
use aether_weather::WeatherEngine;
use glam::Vec3;
use tracing::{debug, info};

use crate::clock::TimeClock;
use crate::config::SkyConfig;
use crate::curve::CurveError;
use crate::palette::SkyPalette;
use crate::snapshot::{SnapshotCell, SnapshotReader};

/// Rec. 601 luma weights used to desaturate sky colors.
const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);

/// Share of the horizon haze applied to the zenith.
const ZENITH_HAZE_SHARE: f32 = 0.5;

/// Exposure at full daylight.
const DAY_EXPOSURE: f32 = 1.0;

/// Exposure with no sunlight.
const NIGHT_EXPOSURE: f32 = 1.6;

/// Extra atmosphere thickness at full cloud coverage.
const CLOUD_THICKNESS: f32 = 0.5;

/// Errors raised when the sky configuration is inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkyError {
    /// A modulation constant is out of range.
    #[error("invalid sky configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A palette table failed validation.
    #[error("invalid {name} palette: {source}")]
    Palette {
        /// Which palette table was rejected.
        name: &'static str,
        /// The underlying curve error.
        source: CurveError,
    },
}

/// Everything the aggregator reads for one computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentInputs {
    /// Hour of day, `[0, 24)`.
    pub hour: f32,
    /// Period at `hour`.
    pub period: Period,
    /// Lighting evaluated from the clock's curves.
    pub lighting: TimeLighting,
    /// Blended weather condition.
    pub weather: WeatherCondition,
    /// Current lightning flash intensity.
    pub lightning_flash: f32,
}

impl EnvironmentInputs {
    /// Read the current inputs from the clock and the weather engine.
    pub fn gather(clock: &TimeClock, weather: &WeatherEngine) -> Self {
        Self {
            hour: clock.hour(),
            period: clock.current_period(),
            lighting: clock.lighting(),
            weather: *weather.current(),
            lightning_flash: weather.lightning_flash(),
        }
    }
}

/// Computes and publishes environment snapshots.
#[derive(Debug)]
pub struct EnvironmentAggregator {
    sky: SkyConfig,
    palette: SkyPalette,
    cloud_override: Option<f32>,
    since_publish: f32,
    sequence: u64,
    cell: SnapshotCell,
    events: EventBus<EnvironmentEvent>,
}

impl EnvironmentAggregator {
    /// Create an aggregator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SkyError::InvalidConfig`] for out-of-range constants or
    /// [`SkyError::Palette`] for an invalid color table.
    pub fn new(config: &SkyConfig) -> Result<Self, SkyError> {
        validate(config)?;
        let palette = SkyPalette::from_config(&config.palette)
            .map_err(|(name, source)| SkyError::Palette { name, source })?;
        Ok(Self {
            sky: config.clone(),
            palette,
            cloud_override: None,
            since_publish: 0.0,
            sequence: 0,
            cell: SnapshotCell::default(),
            events: EventBus::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Recompute and publish if the update interval has elapsed.
    ///
    /// The first call always publishes. Returns the new snapshot, or `None`
    /// when throttled.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        clock: &TimeClock,
        weather: &WeatherEngine,
    ) -> Option<Arc<EnvironmentSnapshot>> {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.since_publish += delta_seconds;
        }
        if self.sequence > 0 && self.since_publish < self.sky.update_interval_seconds {
            return None;
        }
        Some(self.force_update(clock, weather))
    }

    /// Recompute and publish now, ignoring the update interval.
    pub fn force_update(
        &mut self,
        clock: &TimeClock,
        weather: &WeatherEngine,
    ) -> Arc<EnvironmentSnapshot> {
        self.publish(&EnvironmentInputs::gather(clock, weather))
    }

    /// Compute a snapshot from explicit inputs and publish it.
    pub fn publish(&mut self, inputs: &EnvironmentInputs) -> Arc<EnvironmentSnapshot> {
        self.events.begin_tick();
        self.sequence = self.sequence.saturating_add(1);
        self.since_publish = 0.0;
        let snapshot = self.cell.publish(self.compute(inputs, self.sequence));
        debug!(
            sequence = snapshot.sequence,
            hour = snapshot.hour,
            cloud_coverage = snapshot.cloud_coverage,
            "Environment snapshot published"
        );
        self.events
            .emit(&EnvironmentEvent::Updated(Arc::clone(&snapshot)));
        self.events.end_tick();
        snapshot
    }

    /// Force the rendered cloud coverage, or restore weather-driven coverage
    /// with `None`. Values are clamped to `[0, 1]`; NaN clears the override.
    pub fn set_cloud_coverage_override(&mut self, coverage: Option<f32>) {
        self.cloud_override = coverage
            .filter(|value| !value.is_nan())
            .map(|value| value.clamp(0.0, 1.0));
        info!(coverage = ?self.cloud_override, "Cloud coverage override set");
    }

    /// Register a sink for environment events.
    pub fn subscribe(
        &mut self,
        sink: impl EventSink<EnvironmentEvent> + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(sink)
    }

    /// Remove a previously registered sink.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Computation
    // -----------------------------------------------------------------------

    /// Build the snapshot for `inputs` without publishing it.
    pub fn compute(&self, inputs: &EnvironmentInputs, sequence: u64) -> EnvironmentSnapshot {
        let sky = &self.sky;
        let t = (inputs.hour / HOURS_PER_DAY).clamp(0.0, 1.0);
        let colors = self.palette.sample(t);
        let lighting = &inputs.lighting;
        let weather = &inputs.weather;

        let sun_angle = (t - 0.25) * 360.0;
        let moon_angle = ((t + 0.5).rem_euclid(1.0) - 0.25) * 360.0;
        let sun_direction = direction(sun_angle);

        let cloud = self.effective_cloud_coverage(weather);
        let visibility = weather.visibility.clamp(sky.min_visibility, 1.0);
        let flash = inputs.lightning_flash.clamp(0.0, 1.0);

        let sun_intensity = lighting.sun_intensity * dimming(cloud, sky.sun_cloud_dimming);
        let moon_intensity = lighting.moon_intensity * dimming(cloud, sky.moon_cloud_dimming);
        let fog_density = (lighting.fog_density / visibility).min(sky.max_fog_density);
        let ambient_color = lighting.ambient_color
            * dimming(cloud, sky.ambient_cloud_darkening)
            + Vec3::splat(flash * sky.lightning_ambient_boost);
        let star_visibility =
            (lighting.star_visibility * dimming(cloud, sky.star_cloud_occlusion)).clamp(0.0, 1.0);

        let overcast = self.overcast_amount(cloud);
        let haze = (1.0 - visibility) * sky.fog_sky_blend;
        let sky_zenith_color = desaturate(colors.zenith, overcast)
            .lerp(colors.fog_color, haze * ZENITH_HAZE_SHARE);
        let sky_horizon_color = desaturate(colors.horizon, overcast).lerp(colors.fog_color, haze);

        let daylight = sun_intensity.clamp(0.0, 1.0);
        let exposure = (DAY_EXPOSURE - NIGHT_EXPOSURE).mul_add(daylight, NIGHT_EXPOSURE);
        let atmosphere_thickness = CLOUD_THICKNESS.mul_add(cloud, 2.0 - visibility);

        EnvironmentSnapshot {
            sequence,
            hour: inputs.hour,
            normalized_time: t,
            period: inputs.period,
            weather: weather.kind,
            sky_zenith_color,
            sky_horizon_color,
            sun_angle,
            sun_direction,
            sun_color: colors.sun_color,
            sun_intensity,
            moon_angle,
            moon_direction: -sun_direction,
            moon_color: colors.moon_color,
            moon_intensity,
            fog_color: colors.fog_color,
            fog_density,
            ambient_color,
            cloud_coverage: cloud,
            star_visibility,
            exposure,
            atmosphere_thickness,
            precipitation: weather.precipitation,
            wind_speed: weather.wind_speed,
            wind_direction: weather.wind_direction,
            lightning_flash: flash,
        }
    }

    fn effective_cloud_coverage(&self, weather: &WeatherCondition) -> f32 {
        self.cloud_override
            .unwrap_or_else(|| self.sky.base_cloud_coverage.max(weather.cloud_coverage))
            .clamp(0.0, 1.0)
    }

    fn overcast_amount(&self, cloud: f32) -> f32 {
        let threshold = self.sky.overcast_threshold;
        if cloud <= threshold {
            return 0.0;
        }
        ((cloud - threshold) / (1.0 - threshold)).clamp(0.0, 1.0) * self.sky.overcast_blend
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The most recently published snapshot.
    pub fn current_snapshot(&self) -> Arc<EnvironmentSnapshot> {
        self.cell.load()
    }

    /// A cloneable read handle on the published snapshot.
    pub fn reader(&self) -> SnapshotReader {
        self.cell.reader()
    }

    /// Number of snapshots published so far.
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The active cloud coverage override, if any.
    pub const fn cloud_coverage_override(&self) -> Option<f32> {
        self.cloud_override
    }

    /// The modulation constants in use.
    pub const fn sky(&self) -> &SkyConfig {
        &self.sky
    }
}

/// Unit vector toward a light at `angle` degrees above the eastern horizon.
fn direction(angle: f32) -> Vec3 {
    let (sin, cos) = angle.to_radians().sin_cos();
    Vec3::new(cos, sin, 0.0)
}

fn dimming(cloud: f32, k: f32) -> f32 {
    cloud.mul_add(-k, 1.0).max(0.0)
}

fn desaturate(color: Vec3, amount: f32) -> Vec3 {
    color.lerp(Vec3::splat(color.dot(LUMA)), amount)
}

fn validate(config: &SkyConfig) -> Result<(), SkyError> {
    let fractions = [
        ("sun_cloud_dimming", config.sun_cloud_dimming),
        ("moon_cloud_dimming", config.moon_cloud_dimming),
        ("ambient_cloud_darkening", config.ambient_cloud_darkening),
        ("star_cloud_occlusion", config.star_cloud_occlusion),
        ("overcast_blend", config.overcast_blend),
        ("fog_sky_blend", config.fog_sky_blend),
        ("base_cloud_coverage", config.base_cloud_coverage),
    ];
    for (name, value) in fractions {
        if !(0.0..=1.0).contains(&value) {
            return Err(SkyError::InvalidConfig {
                reason: format!("{name} must be in [0, 1], got {value}"),
            });
        }
    }
    if !(0.0..1.0).contains(&config.overcast_threshold) {
        return Err(SkyError::InvalidConfig {
            reason: format!(
                "overcast_threshold must be in [0, 1), got {}",
                config.overcast_threshold
            ),
        });
    }
    if !(config.min_visibility > 0.0 && config.min_visibility <= 1.0) {
        return Err(SkyError::InvalidConfig {
            reason: format!("min_visibility must be in (0, 1], got {}", config.min_visibility),
        });
    }
    let non_negative = [
        ("max_fog_density", config.max_fog_density),
        ("lightning_ambient_boost", config.lightning_ambient_boost),
        ("update_interval_seconds", config.update_interval_seconds),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(SkyError::InvalidConfig {
                reason: format!("{name} must be finite and >= 0, got {value}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use aether_events::EventRecorder;
    use aether_types::{WeatherIntensity, WeatherType};
    use aether_weather::WeatherConfig;

    use super::*;
    use crate::config::TimeConfig;
    use crate::time_source::ManualTimeSource;

    fn aggregator() -> EnvironmentAggregator {
        EnvironmentAggregator::new(&SkyConfig::default()).unwrap()
    }

    fn weather(cloud_coverage: f32, visibility: f32) -> WeatherCondition {
        WeatherCondition {
            kind: WeatherType::Clear,
            intensity: WeatherIntensity::None,
            cloud_coverage,
            precipitation: 0.0,
            wind_speed: 0.2,
            wind_direction: 90.0,
            visibility,
            temperature: 20.0,
            humidity: 0.5,
        }
    }

    fn inputs(hour: f32, condition: WeatherCondition) -> EnvironmentInputs {
        EnvironmentInputs {
            hour,
            period: Period::Day,
            lighting: TimeLighting {
                sun_intensity: 1.0,
                moon_intensity: 0.5,
                ambient_color: Vec3::splat(0.5),
                fog_density: 0.02,
                star_visibility: 0.8,
            },
            weather: condition,
            lightning_flash: 0.0,
        }
    }

    #[test]
    fn sun_and_moon_are_always_opposite() {
        let agg = aggregator();
        for step in 0..96_u8 {
            let hour = f32::from(step) / 4.0;
            let snapshot = agg.compute(&inputs(hour, weather(0.0, 1.0)), 1);
            let diff = (snapshot.sun_angle - snapshot.moon_angle).rem_euclid(360.0);
            assert!((diff - 180.0).abs() < 1e-3, "hour {hour}: diff {diff}");
            assert_eq!(snapshot.sun_direction, -snapshot.moon_direction);
        }
    }

    #[test]
    fn sun_angle_follows_normalized_time() {
        let agg = aggregator();
        let dawn = agg.compute(&inputs(6.0, weather(0.0, 1.0)), 1);
        let noon = agg.compute(&inputs(12.0, weather(0.0, 1.0)), 1);
        assert!(dawn.sun_angle.abs() < 1e-4);
        assert!((noon.sun_angle - 90.0).abs() < 1e-4);
        assert!(noon.sun_direction.y > 0.999);
        assert!((noon.moon_angle + 90.0).abs() < 1e-4);
    }

    #[test]
    fn clouds_dim_lights_and_hide_stars() {
        let agg = aggregator();
        let clear = agg.compute(&inputs(12.0, weather(0.0, 1.0)), 1);
        let cloudy = agg.compute(&inputs(12.0, weather(1.0, 1.0)), 1);

        assert_eq!(clear.sun_intensity, 1.0);
        assert!((cloudy.sun_intensity - 0.3).abs() < 1e-6);
        assert!((cloudy.moon_intensity - 0.05).abs() < 1e-6);
        assert!((cloudy.ambient_color.x - 0.3).abs() < 1e-6);
        assert_eq!(cloudy.star_visibility, 0.0);
        assert_eq!(clear.star_visibility, 0.8);
    }

    #[test]
    fn fog_scales_with_inverse_visibility() {
        let agg = aggregator();
        let clear = agg.compute(&inputs(12.0, weather(0.0, 1.0)), 1);
        let foggy = agg.compute(&inputs(12.0, weather(0.0, 0.2)), 1);
        assert!((clear.fog_density - 0.02).abs() < 1e-6);
        assert!((foggy.fog_density - 0.1).abs() < 1e-6);

        let opaque = agg.compute(&inputs(12.0, weather(0.0, 0.0)), 1);
        assert!((opaque.fog_density - 0.4).abs() < 1e-6);
    }

    #[test]
    fn overcast_tint_only_above_threshold() {
        let agg = aggregator();
        let palette = SkyPalette::from_config(&SkyConfig::default().palette).unwrap();
        let expected = palette.sample(0.5);

        let light = agg.compute(&inputs(12.0, weather(0.5, 1.0)), 1);
        assert!((light.sky_zenith_color - expected.zenith).abs().max_element() < 1e-6);

        let heavy = agg.compute(&inputs(12.0, weather(1.0, 1.0)), 1);
        let spread = |c: Vec3| c.max_element() - c.min_element();
        assert!(spread(heavy.sky_zenith_color) < spread(expected.zenith));
    }

    #[test]
    fn low_visibility_pulls_horizon_toward_fog() {
        let agg = aggregator();
        let clear = agg.compute(&inputs(12.0, weather(0.0, 1.0)), 1);
        let hazy = agg.compute(&inputs(12.0, weather(0.0, 0.1)), 1);
        let to_fog = |c: Vec3| (c - clear.fog_color).length();
        assert!(to_fog(hazy.sky_horizon_color) < to_fog(clear.sky_horizon_color));
    }

    #[test]
    fn override_replaces_weather_coverage() {
        let mut agg = aggregator();
        agg.set_cloud_coverage_override(Some(0.9));
        let forced = agg.compute(&inputs(12.0, weather(0.1, 1.0)), 1);
        assert_eq!(forced.cloud_coverage, 0.9);

        agg.set_cloud_coverage_override(Some(3.0));
        assert_eq!(agg.cloud_coverage_override(), Some(1.0));

        agg.set_cloud_coverage_override(None);
        let restored = agg.compute(&inputs(12.0, weather(0.1, 1.0)), 1);
        assert_eq!(restored.cloud_coverage, 0.1);
    }

    #[test]
    fn base_coverage_is_a_floor() {
        let config = SkyConfig {
            base_cloud_coverage: 0.3,
            ..SkyConfig::default()
        };
        let agg = EnvironmentAggregator::new(&config).unwrap();
        assert_eq!(agg.compute(&inputs(12.0, weather(0.1, 1.0)), 1).cloud_coverage, 0.3);
        assert_eq!(agg.compute(&inputs(12.0, weather(0.6, 1.0)), 1).cloud_coverage, 0.6);
    }

    #[test]
    fn lightning_brightens_ambient() {
        let agg = aggregator();
        let mut lit = inputs(23.0, weather(1.0, 0.3));
        let dark = agg.compute(&lit, 1);
        lit.lightning_flash = 1.0;
        let flash = agg.compute(&lit, 1);
        assert!(flash.ambient_color.x > dark.ambient_color.x + 0.5);
        assert_eq!(flash.lightning_flash, 1.0);
    }

    #[test]
    fn update_publishes_and_notifies() {
        let clock = TimeClock::new(&TimeConfig::default(), Box::new(ManualTimeSource::new(9.0)))
            .unwrap();
        let engine = WeatherEngine::new(
            &WeatherConfig {
                auto_change: false,
                ..WeatherConfig::default()
            },
            Some(1),
        )
        .unwrap();
        let config = SkyConfig {
            update_interval_seconds: 1.0,
            ..SkyConfig::default()
        };
        let mut agg = EnvironmentAggregator::new(&config).unwrap();
        let recorder = EventRecorder::new();
        agg.subscribe(recorder.sink());
        let reader = agg.reader();

        let first = agg.update(0.1, &clock, &engine).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.hour, 9.0);
        assert!(agg.update(0.5, &clock, &engine).is_none());
        assert!(agg.update(0.5, &clock, &engine).is_some());

        assert_eq!(reader.sequence(), 2);
        assert_eq!(recorder.len(), 2);
        assert!(Arc::ptr_eq(&agg.current_snapshot(), &reader.load()));
    }

    #[test]
    fn invalid_constants_are_rejected() {
        let config = SkyConfig {
            sun_cloud_dimming: 1.5,
            ..SkyConfig::default()
        };
        assert!(matches!(
            EnvironmentAggregator::new(&config),
            Err(SkyError::InvalidConfig { .. })
        ));
        let config = SkyConfig {
            min_visibility: 0.0,
            ..SkyConfig::default()
        };
        assert!(EnvironmentAggregator::new(&config).is_err());
        let config = SkyConfig {
            overcast_threshold: 1.0,
            ..SkyConfig::default()
        };
        assert!(EnvironmentAggregator::new(&config).is_err());
    }
}
