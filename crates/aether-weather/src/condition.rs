//! Blending between weather conditions.

use aether_types::WeatherCondition;

/// Progress at which a blend switches to the target's categorical fields.
pub const CATEGORY_SWITCH_PROGRESS: f32 = 0.5;

/// Interpolate every continuous field of two conditions.
///
/// `t` is clamped to `[0, 1]`. Wind direction takes the shortest way around
/// the compass. The categorical type and intensity tier are the previous
/// condition's below [`CATEGORY_SWITCH_PROGRESS`] and the target's from it.
pub fn blend(from: &WeatherCondition, to: &WeatherCondition, t: f32) -> WeatherCondition {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (kind, intensity) = if t >= CATEGORY_SWITCH_PROGRESS {
        (to.kind, to.intensity)
    } else {
        (from.kind, from.intensity)
    };

    WeatherCondition {
        kind,
        intensity,
        cloud_coverage: lerp(from.cloud_coverage, to.cloud_coverage, t),
        precipitation: lerp(from.precipitation, to.precipitation, t),
        wind_speed: lerp(from.wind_speed, to.wind_speed, t),
        wind_direction: lerp_angle(from.wind_direction, to.wind_direction, t),
        visibility: lerp(from.visibility, to.visibility, t),
        temperature: lerp(from.temperature, to.temperature, t),
        humidity: lerp(from.humidity, to.humidity, t),
    }
}

/// Interpolate between two compass angles in degrees along the shorter arc.
///
/// The result is normalized to `[0, 360)`.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = (to - from + 540.0).rem_euclid(360.0) - 180.0;
    normalize_degrees(from + delta * t)
}

fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use aether_types::WeatherType;

    use super::*;
    use crate::catalog::canonical;

    fn between(value: f32, a: f32, b: f32) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        value >= lo - 1e-5 && value <= hi + 1e-5
    }

    #[test]
    fn endpoints_reproduce_inputs() {
        let clear = canonical(WeatherType::Clear);
        let rain = canonical(WeatherType::Rain);
        assert_eq!(blend(&clear, &rain, 0.0), clear);
        let end = blend(&clear, &rain, 1.0);
        assert_eq!(end.kind, WeatherType::Rain);
        assert!((end.cloud_coverage - rain.cloud_coverage).abs() < 1e-6);
        assert!((end.wind_direction - rain.wind_direction).abs() < 1e-4);
    }

    #[test]
    fn midpoint_fields_lie_between_endpoints() {
        let from = canonical(WeatherType::Clear);
        let to = canonical(WeatherType::Blizzard);
        let mid = blend(&from, &to, 0.5);

        assert!(between(mid.cloud_coverage, from.cloud_coverage, to.cloud_coverage));
        assert!(between(mid.precipitation, from.precipitation, to.precipitation));
        assert!(between(mid.wind_speed, from.wind_speed, to.wind_speed));
        assert!(between(mid.visibility, from.visibility, to.visibility));
        assert!(between(mid.temperature, from.temperature, to.temperature));
        assert!(between(mid.humidity, from.humidity, to.humidity));
    }

    #[test]
    fn category_switches_at_half_progress() {
        let clear = canonical(WeatherType::Clear);
        let storm = canonical(WeatherType::Thunderstorm);
        assert_eq!(blend(&clear, &storm, 0.49).kind, WeatherType::Clear);
        assert_eq!(blend(&clear, &storm, 0.5).kind, WeatherType::Thunderstorm);
        assert_eq!(
            blend(&clear, &storm, 0.5).intensity,
            storm.intensity
        );
    }

    #[test]
    fn angle_takes_shortest_arc_across_north() {
        let mid = lerp_angle(350.0, 10.0, 0.5);
        assert!(mid.abs() < 1e-4 || (mid - 360.0).abs() < 1e-4, "got {mid}");

        let quarter = lerp_angle(10.0, 350.0, 0.25);
        assert!((quarter - 5.0).abs() < 1e-4, "got {quarter}");
    }

    #[test]
    fn angle_result_is_normalized() {
        for t in [0.0, 0.3, 0.7, 1.0] {
            let angle = lerp_angle(300.0, 60.0, t);
            assert!((0.0..360.0).contains(&angle), "got {angle}");
        }
    }

    #[test]
    fn progress_is_clamped() {
        let clear = canonical(WeatherType::Clear);
        let fog = canonical(WeatherType::Foggy);
        assert_eq!(blend(&clear, &fog, -1.0), clear);
        assert_eq!(blend(&clear, &fog, 2.0).kind, WeatherType::Foggy);
        assert_eq!(blend(&clear, &fog, f32::NAN), clear);
    }
}
