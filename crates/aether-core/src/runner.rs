//! Step loop runner with run controls.
//!
//! [`run_simulation`] drives [`Simulation::step`] with a fixed simulated
//! step and adds the control plane around it:
//!
//! - **Bounded runs**: stop after `max_ticks` steps or `max_real_time_seconds`
//! - **Clean stop**: a stop request ends the loop before the next step
//!
//! Pausing simulated time is done through [`Simulation::set_mode`]; the
//! loop keeps stepping so weather and lightning continue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::control::{RunControl, SimulationEndReason};
use crate::simulation::{Simulation, StepSummary};

/// Errors that can occur during a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunnerError {
    /// The simulated step length is not a positive finite number.
    #[error("invalid step length: {step_seconds} seconds")]
    InvalidStep {
        /// The rejected step length.
        step_seconds: f32,
    },
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: SimulationEndReason,
    /// Summary of the last completed step, if any.
    pub final_summary: Option<StepSummary>,
    /// Steps executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each step.
pub trait StepCallback: Send {
    /// Called after a step completes.
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation);
}

/// A callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _simulation: &Simulation) {}
}

/// Run the step loop until a bound is reached or a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError::InvalidStep`] if `step_seconds` is not positive
/// and finite.
pub async fn run_simulation(
    simulation: &mut Simulation,
    control: &Arc<RunControl>,
    step_seconds: f32,
    callback: &mut dyn StepCallback,
) -> Result<SimulationResult, RunnerError> {
    if !step_seconds.is_finite() || step_seconds <= 0.0 {
        return Err(RunnerError::InvalidStep { step_seconds });
    }

    let mut last_summary: Option<StepSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        step_seconds,
        max_ticks = control.max_ticks(),
        max_real_time_seconds = control.max_real_time_seconds(),
        tick_interval_ms = control.tick_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check stop request (before step) ---
        if control.is_stop_requested() {
            info!("Stop requested");
            return Ok(finish(
                control,
                SimulationEndReason::StopRequested,
                last_summary,
                total_ticks,
            ));
        }

        // --- Check time limit (before step) ---
        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            return Ok(finish(
                control,
                SimulationEndReason::MaxRealTimeReached,
                last_summary,
                total_ticks,
            ));
        }

        // --- Execute step ---
        let summary = simulation.step(step_seconds);
        total_ticks = total_ticks.saturating_add(1);
        callback.on_step(&summary, simulation);

        // --- Check step limit (after step) ---
        if control.tick_limit_reached(total_ticks) {
            info!(
                steps = total_ticks,
                max_ticks = control.max_ticks(),
                "Step limit reached"
            );
            return Ok(finish(
                control,
                SimulationEndReason::MaxTicksReached,
                Some(summary),
                total_ticks,
            ));
        }

        last_summary = Some(summary);

        // --- Sleep for step interval ---
        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

fn finish(
    control: &RunControl,
    end_reason: SimulationEndReason,
    final_summary: Option<StepSummary>,
    total_ticks: u64,
) -> SimulationResult {
    control.set_end_reason(end_reason);
    SimulationResult {
        end_reason,
        final_summary,
        total_ticks,
    }
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            step = summary.step,
            hour = summary.hour,
            period = %summary.period,
            weather = %summary.weather,
            "Final step summary"
        );
    } else {
        warn!("Simulation ended with no steps executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};
    use crate::time_source::ManualTimeSource;

    fn simulation() -> Simulation {
        let mut config = SimulationConfig::default();
        config.world.seed = Some(11);
        config.world.start_hour = Some(6.0);
        Simulation::with_time_source(&config, Box::new(ManualTimeSource::new(0.0))).unwrap()
    }

    fn control(max_ticks: u64) -> Arc<RunControl> {
        Arc::new(RunControl::new(&SimulationBoundsConfig {
            tick_interval_ms: 0,
            max_ticks,
            ..SimulationBoundsConfig::default()
        }))
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut sim = simulation();
        let control = control(5);

        let result = run_simulation(&mut sim, &control, 0.5, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_summary.unwrap().step, 5);
        assert_eq!(control.end_reason(), Some(SimulationEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn stop_before_first_step() {
        let mut sim = simulation();
        let control = control(0);
        control.request_stop();

        let result = run_simulation(&mut sim, &control, 0.5, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::StopRequested);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn callback_sees_every_step() {
        struct CountCallback {
            count: u64,
        }
        impl StepCallback for CountCallback {
            fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
                self.count = self.count.saturating_add(1);
                assert_eq!(summary.step, simulation.steps());
            }
        }

        let mut sim = simulation();
        let control = control(3);
        let mut cb = CountCallback { count: 0 };

        let _ = run_simulation(&mut sim, &control, 0.5, &mut cb).await.unwrap();

        assert_eq!(cb.count, 3);
    }

    #[tokio::test]
    async fn callback_can_stop_the_run() {
        struct StopAfter {
            control: Arc<RunControl>,
            at: u64,
        }
        impl StepCallback for StopAfter {
            fn on_step(&mut self, summary: &StepSummary, _simulation: &Simulation) {
                if summary.step >= self.at {
                    self.control.request_stop();
                }
            }
        }

        let mut sim = simulation();
        let control = control(0);
        let mut cb = StopAfter {
            control: Arc::clone(&control),
            at: 4,
        };

        let result = run_simulation(&mut sim, &control, 0.5, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::StopRequested);
        assert_eq!(result.total_ticks, 4);
    }

    #[tokio::test]
    async fn paused_clock_still_steps_until_bound() {
        let mut sim = simulation();
        sim.set_mode(aether_types::AdvanceMode::Paused);
        let hour = sim.clock().hour();
        let control = control(4);

        let result = run_simulation(&mut sim, &control, 0.5, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 4);
        assert_eq!(sim.clock().hour().to_bits(), hour.to_bits());
        assert_eq!(control.status(&sim).steps, 4);
    }

    #[tokio::test]
    async fn rejects_non_positive_step() {
        let mut sim = simulation();
        let control = control(1);
        let err = run_simulation(&mut sim, &control, 0.0, &mut NoOpCallback)
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::InvalidStep { .. }));
    }
}
