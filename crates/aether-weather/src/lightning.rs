//! Lightning strikes and delayed thunder.
//!
//! While the current weather type has lightning, strikes are scheduled at
//! `now + uniform(min, max)` and re-armed after each strike. Each strike
//! plays a fixed flash sequence and queues a thunder cue at
//! `uniform(thunder_min, thunder_max)` seconds after the flash, modeling
//! the distance to the strike.

use rand::Rng;

/// Flash sequence as `(offset_seconds, intensity)` steps. Each intensity
/// holds until the next step's offset.
const FLASH_SEQUENCE: [(f32, f32); 5] = [
    (0.00, 1.00),
    (0.06, 0.25),
    (0.12, 0.85),
    (0.20, 0.40),
    (0.28, 0.00),
];

/// Total length of a flash.
pub const FLASH_DURATION_SECONDS: f32 = 0.35;

/// Brightest intensity reached by a flash.
pub const FLASH_PEAK_INTENSITY: f32 = 1.0;

/// Strike and thunder timing, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningTiming {
    /// Minimum delay between strikes.
    pub min_interval: f32,
    /// Maximum delay between strikes.
    pub max_interval: f32,
    /// Minimum delay from flash to thunder.
    pub thunder_min_delay: f32,
    /// Maximum delay from flash to thunder.
    pub thunder_max_delay: f32,
}

/// What happened during one lightning update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightningUpdate {
    /// A new strike started.
    pub struck: bool,
    /// A thunder cue came due, with its flash-to-thunder delay.
    pub thunder: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingThunder {
    due_at: f64,
    delay: f32,
}

/// Lightning sub-state of the weather engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lightning {
    next_strike_at: Option<f64>,
    flash_elapsed: Option<f32>,
    pending_thunder: Vec<PendingThunder>,
}

impl Lightning {
    /// Create an idle, unarmed lightning state.
    pub const fn new() -> Self {
        Self {
            next_strike_at: None,
            flash_elapsed: None,
            pending_thunder: Vec::new(),
        }
    }

    /// Advance by `delta` seconds to engine time `now`.
    ///
    /// `active` is whether the current weather allows lightning. Leaving an
    /// active type disarms the strike schedule, but thunder already queued
    /// still plays out. At most one thunder cue is released per update.
    pub fn update(
        &mut self,
        now: f64,
        delta: f32,
        active: bool,
        timing: &LightningTiming,
        rng: &mut impl Rng,
    ) -> LightningUpdate {
        let mut update = LightningUpdate::default();

        self.flash_elapsed = self
            .flash_elapsed
            .map(|elapsed| elapsed + delta)
            .filter(|elapsed| *elapsed < FLASH_DURATION_SECONDS);

        if active {
            match self.next_strike_at {
                None => {
                    self.next_strike_at =
                        Some(now + sample(rng, timing.min_interval, timing.max_interval));
                }
                Some(at) if now >= at => {
                    self.flash_elapsed = Some(0.0);
                    let delay =
                        sample_f32(rng, timing.thunder_min_delay, timing.thunder_max_delay);
                    self.pending_thunder.push(PendingThunder {
                        due_at: now + f64::from(delay),
                        delay,
                    });
                    self.next_strike_at =
                        Some(now + sample(rng, timing.min_interval, timing.max_interval));
                    update.struck = true;
                }
                Some(_) => {}
            }
        } else {
            self.next_strike_at = None;
        }

        update.thunder = self.release_thunder(now);
        update
    }

    /// Current flash intensity, `[0, 1]`. Zero when no flash is playing.
    pub fn flash_intensity(&self) -> f32 {
        self.flash_elapsed.map_or(0.0, flash_intensity_at)
    }

    /// Engine time of the next scheduled strike, if armed.
    pub const fn next_strike_at(&self) -> Option<f64> {
        self.next_strike_at
    }

    /// Number of thunder cues waiting to play.
    pub fn pending_thunder(&self) -> usize {
        self.pending_thunder.len()
    }

    fn release_thunder(&mut self, now: f64) -> Option<f32> {
        let (idx, _) = self
            .pending_thunder
            .iter()
            .enumerate()
            .filter(|(_, cue)| cue.due_at <= now)
            .min_by(|(_, a), (_, b)| a.due_at.total_cmp(&b.due_at))?;
        Some(self.pending_thunder.swap_remove(idx).delay)
    }
}

/// Intensity of the flash sequence `elapsed` seconds after the strike.
pub fn flash_intensity_at(elapsed: f32) -> f32 {
    if !(0.0..FLASH_DURATION_SECONDS).contains(&elapsed) {
        return 0.0;
    }
    FLASH_SEQUENCE
        .iter()
        .take_while(|(offset, _)| *offset <= elapsed)
        .last()
        .map_or(0.0, |&(_, intensity)| intensity)
}

fn sample(rng: &mut impl Rng, min: f32, max: f32) -> f64 {
    f64::from(sample_f32(rng, min, max))
}

fn sample_f32(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min { rng.random_range(min..=max) } else { min }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    const TIMING: LightningTiming = LightningTiming {
        min_interval: 5.0,
        max_interval: 20.0,
        thunder_min_delay: 0.5,
        thunder_max_delay: 3.0,
    };

    /// Step a lightning state at a fixed rate, collecting updates.
    fn run(
        lightning: &mut Lightning,
        start: f64,
        steps: u32,
        dt: f32,
        active: bool,
        rng: &mut SmallRng,
    ) -> Vec<(f64, LightningUpdate)> {
        let mut out = Vec::new();
        let mut now = start;
        for _ in 0..steps {
            now += f64::from(dt);
            out.push((now, lightning.update(now, dt, active, &TIMING, rng)));
        }
        out
    }

    #[test]
    fn flash_sequence_shape() {
        assert_eq!(flash_intensity_at(0.0), 1.0);
        assert_eq!(flash_intensity_at(0.07), 0.25);
        assert_eq!(flash_intensity_at(0.15), 0.85);
        assert_eq!(flash_intensity_at(0.3), 0.0);
        assert_eq!(flash_intensity_at(FLASH_DURATION_SECONDS), 0.0);
        assert_eq!(flash_intensity_at(-0.1), 0.0);
    }

    #[test]
    fn inactive_weather_never_strikes() {
        let mut lightning = Lightning::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let updates = run(&mut lightning, 0.0, 1_000, 0.1, false, &mut rng);
        assert!(updates.iter().all(|(_, u)| !u.struck && u.thunder.is_none()));
        assert_eq!(lightning.next_strike_at(), None);
    }

    #[test]
    fn strikes_are_spaced_within_configured_interval() {
        let mut lightning = Lightning::new();
        let mut rng = SmallRng::seed_from_u64(2);
        let updates = run(&mut lightning, 0.0, 3_000, 0.1, true, &mut rng);

        let strikes: Vec<f64> = updates
            .iter()
            .filter(|(_, u)| u.struck)
            .map(|(t, _)| *t)
            .collect();
        assert!(strikes.len() >= 10, "only {} strikes", strikes.len());
        for pair in strikes.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= 5.0 - 1e-6 && gap <= 20.0 + 0.1 + 1e-6, "gap {gap}");
        }
    }

    #[test]
    fn every_strike_is_followed_by_thunder_within_delay_bounds() {
        let mut lightning = Lightning::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let updates = run(&mut lightning, 0.0, 3_000, 0.05, true, &mut rng);

        let strikes = updates.iter().filter(|(_, u)| u.struck).count();
        let thunders: Vec<f32> = updates.iter().filter_map(|(_, u)| u.thunder).collect();
        assert!(strikes > 0);
        // The final strike's cue may still be pending.
        assert!(thunders.len() + lightning.pending_thunder() == strikes);
        for delay in thunders {
            assert!((0.5..=3.0).contains(&delay), "delay {delay}");
        }
    }

    #[test]
    fn strike_starts_flash() {
        let mut lightning = Lightning::new();
        let mut rng = SmallRng::seed_from_u64(4);
        let updates = run(&mut lightning, 0.0, 500, 0.01, true, &mut rng);
        let struck_at_last_step = updates.last().is_some_and(|(_, u)| u.struck);
        if !struck_at_last_step {
            // Force a strike by jumping past the armed time.
            let at = lightning.next_strike_at().unwrap();
            let update = lightning.update(at, 0.0, true, &TIMING, &mut rng);
            assert!(update.struck);
        }
        assert_eq!(lightning.flash_intensity(), FLASH_PEAK_INTENSITY);
    }

    #[test]
    fn leaving_storm_disarms_but_keeps_queued_thunder() {
        let mut lightning = Lightning::new();
        let mut rng = SmallRng::seed_from_u64(5);
        lightning.update(0.0, 0.0, true, &TIMING, &mut rng);
        let at = lightning.next_strike_at().unwrap();
        assert!(lightning.update(at, 0.0, true, &TIMING, &mut rng).struck);
        assert_eq!(lightning.pending_thunder(), 1);

        let update = lightning.update(at + 0.1, 0.1, false, &TIMING, &mut rng);
        assert!(!update.struck);
        assert_eq!(lightning.next_strike_at(), None);

        let late = lightning.update(at + 5.0, 0.1, false, &TIMING, &mut rng);
        assert!(late.thunder.is_some());
        assert_eq!(lightning.pending_thunder(), 0);
    }
}
