//! Step callback that reports progress to the log.
//!
//! Every `report_every` steps the callback logs the published snapshot at
//! info level. Between reports it stays quiet, since clock and weather
//! events are already logged by the sinks in [`crate::log_sinks`].

use aether_core::{Simulation, StepCallback, StepSummary};
use tracing::{debug, info};

/// Periodic progress reporter.
#[derive(Debug)]
pub struct StatusCallback {
    report_every: u64,
    reports: u64,
}

impl StatusCallback {
    /// Report once every `report_every` steps. Zero disables reports.
    pub const fn new(report_every: u64) -> Self {
        Self {
            report_every,
            reports: 0,
        }
    }

    /// Number of reports written so far.
    pub const fn reports(&self) -> u64 {
        self.reports
    }
}

impl StepCallback for StatusCallback {
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
        if summary.step.checked_rem(self.report_every) != Some(0) {
            return;
        }
        self.reports = self.reports.saturating_add(1);

        let snapshot = simulation.current_snapshot();
        info!(
            step = summary.step,
            time = %simulation.formatted_time(),
            period = %snapshot.period,
            weather = %snapshot.weather,
            sun_intensity = snapshot.sun_intensity,
            moon_intensity = snapshot.moon_intensity,
            cloud_coverage = snapshot.cloud_coverage,
            fog_density = snapshot.fog_density,
            "Environment"
        );
        debug!(
            sequence = snapshot.sequence,
            transitioning = summary.transitioning,
            exposure = snapshot.exposure,
            "Snapshot detail"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aether_core::{ManualTimeSource, SimulationConfig};

    use super::*;

    fn simulation() -> Simulation {
        let mut config = SimulationConfig::default();
        config.world.seed = Some(1);
        config.world.start_hour = Some(8.0);
        Simulation::with_time_source(&config, Box::new(ManualTimeSource::new(0.0))).unwrap()
    }

    #[test]
    fn reports_on_interval() {
        let mut sim = simulation();
        let mut callback = StatusCallback::new(4);
        for _ in 0..10 {
            let summary = sim.step(0.5);
            callback.on_step(&summary, &sim);
        }
        assert_eq!(callback.reports(), 2);
    }

    #[test]
    fn zero_interval_is_silent() {
        let mut sim = simulation();
        let mut callback = StatusCallback::new(0);
        let summary = sim.step(0.5);
        callback.on_step(&summary, &sim);
        assert_eq!(callback.reports(), 0);
    }
}
