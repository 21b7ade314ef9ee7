//! Event subscribers that write simulation events to the log.

use aether_core::Simulation;
use aether_types::{ClockEvent, WeatherEvent};
use tracing::{debug, info, trace};

/// Subscribe logging sinks to the clock and weather event streams.
pub fn attach(simulation: &mut Simulation) {
    simulation
        .clock_mut()
        .subscribe(|event: &ClockEvent| match event {
            ClockEvent::PeriodChanged { from, to } => info!(%from, %to, "Period changed"),
            ClockEvent::Sunrise => info!("Sunrise"),
            ClockEvent::Sunset => info!("Sunset"),
            ClockEvent::TimeChanged { hour } => trace!(hour, "Time changed"),
        });

    simulation
        .weather_mut()
        .subscribe(|event: &WeatherEvent| match event {
            WeatherEvent::WeatherChanged { condition } => info!(
                weather = %condition.kind,
                cloud_coverage = condition.cloud_coverage,
                visibility = condition.visibility,
                "Weather changed"
            ),
            WeatherEvent::TransitionStarted { previous, target } => info!(
                from = %previous.kind,
                to = %target.kind,
                "Weather turning"
            ),
            WeatherEvent::LightningStrike { peak_intensity } => {
                debug!(peak_intensity, "Lightning");
            }
            WeatherEvent::Thunder { delay_seconds } => debug!(delay_seconds, "Thunder"),
        });
}
