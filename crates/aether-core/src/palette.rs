//! Sky color curves over normalized time of day.
//!
//! The palette walks night, dawn, day, dusk, and back to night. Colors are
//! keyed on normalized time (`hour / 24`) and blended with smoothstep by
//! default, so the sky eases through sunrise and sunset instead of ramping
//! linearly.

use glam::Vec3;

use crate::config::PaletteConfig;
use crate::curve::{CurveError, Keyframe, KeyframeCurve};

/// Colors evaluated from the palette at one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteSample {
    /// Sky color straight up.
    pub zenith: Vec3,
    /// Sky color at the horizon.
    pub horizon: Vec3,
    /// Sun light color.
    pub sun_color: Vec3,
    /// Moon light color.
    pub moon_color: Vec3,
    /// Fog color.
    pub fog_color: Vec3,
}

/// Validated sky color curves.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPalette {
    zenith: KeyframeCurve<Vec3>,
    horizon: KeyframeCurve<Vec3>,
    sun_color: KeyframeCurve<Vec3>,
    moon_color: KeyframeCurve<Vec3>,
    fog_color: KeyframeCurve<Vec3>,
}

impl SkyPalette {
    /// Build the palette from configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`CurveError`] of the first invalid table together with
    /// its name.
    pub fn from_config(config: &PaletteConfig) -> Result<Self, (&'static str, CurveError)> {
        let curve = |name: &'static str, keys: &[Keyframe<Vec3>]| {
            KeyframeCurve::new(keys.to_vec(), 1.0, config.interpolation).map_err(|e| (name, e))
        };
        Ok(Self {
            zenith: curve("zenith", &config.zenith)?,
            horizon: curve("horizon", &config.horizon)?,
            sun_color: curve("sun_color", &config.sun_color)?,
            moon_color: curve("moon_color", &config.moon_color)?,
            fog_color: curve("fog_color", &config.fog_color)?,
        })
    }

    /// Evaluate every color at normalized time `t`.
    pub fn sample(&self, t: f32) -> PaletteSample {
        PaletteSample {
            zenith: self.zenith.evaluate(t),
            horizon: self.horizon.evaluate(t),
            sun_color: self.sun_color.evaluate(t),
            moon_color: self.moon_color.evaluate(t),
            fog_color: self.fog_color.evaluate(t),
        }
    }
}
