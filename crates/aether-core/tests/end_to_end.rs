//! Full-stack scenarios: clock, weather, and aggregator stepped together.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::panic
)]

use aether_core::{ManualTimeSource, Simulation, SimulationConfig};
use aether_events::EventRecorder;
use aether_types::{AdvanceMode, ClockEvent, EnvironmentEvent, Period, WeatherEvent, WeatherType};

fn config(start_hour: f32) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.seed = Some(2024);
    config.world.start_hour = Some(start_hour);
    config.time.mode = AdvanceMode::AcceleratedSimulation;
    config.time.day_length_seconds = 1440.0;
    config.time.time_scale = 1.0;
    config.weather.auto_change = false;
    config
}

fn simulation(start_hour: f32) -> Simulation {
    Simulation::with_time_source(&config(start_hour), Box::new(ManualTimeSource::new(0.0)))
        .unwrap()
}

#[test]
fn afternoon_into_dusk() {
    let mut sim = simulation(11.5);
    let clock_events = EventRecorder::new();
    sim.clock_mut().subscribe(clock_events.sink());

    let mut intensities = vec![sim.current_snapshot().sun_intensity];
    let mut hours = Vec::new();
    let mut period_steps = Vec::new();
    let mut sunset_steps = Vec::new();

    // 0.1 hours per 6 second step.
    for step in 0..60_usize {
        let before = sim.clock().hour();
        sim.step(6.0);
        hours.push((before, sim.clock().hour()));
        intensities.push(sim.current_snapshot().sun_intensity);
        for event in clock_events.take() {
            match event {
                ClockEvent::PeriodChanged { from, to } => {
                    assert_eq!((from, to), (Period::Day, Period::Dusk));
                    period_steps.push(step);
                }
                ClockEvent::Sunset => sunset_steps.push(step),
                ClockEvent::Sunrise => panic!("unexpected sunrise"),
                ClockEvent::TimeChanged { .. } => {}
            }
        }
        if sim.clock().hour() >= 17.1 {
            break;
        }
    }

    assert_eq!(sim.current_period(), Period::Dusk);
    assert_eq!(period_steps.len(), 1);
    assert_eq!(period_steps, sunset_steps);
    let (before, after) = hours[period_steps[0]];
    assert!(before < 17.0 && 17.0 <= after, "crossed at {before}..{after}");
    for pair in intensities.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-6, "sun brightened: {pair:?}");
    }
    assert!(intensities.first().unwrap() > intensities.last().unwrap());
}

#[test]
fn night_into_day_fires_sunrise_once() {
    let mut sim = simulation(4.0);
    let clock_events = EventRecorder::new();
    sim.clock_mut().subscribe(clock_events.sink());

    // Four hours in 30 second steps.
    for _ in 0..480 {
        sim.step(30.0);
        if sim.clock().hour() >= 8.0 {
            break;
        }
    }

    let periods: Vec<(Period, Period)> = clock_events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ClockEvent::PeriodChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        periods,
        vec![(Period::Night, Period::Dawn), (Period::Dawn, Period::Day)]
    );
    assert_eq!(clock_events.count(|e| matches!(e, ClockEvent::Sunrise)), 1);
    assert_eq!(clock_events.count(|e| matches!(e, ClockEvent::Sunset)), 0);
    assert!(sim.current_snapshot().sun_intensity > 0.5);
}

#[test]
fn weather_transition_flows_into_snapshots() {
    let mut sim = simulation(12.0);
    let weather_events = EventRecorder::new();
    sim.weather_mut().subscribe(weather_events.sink());

    sim.request_weather(WeatherType::Rain, false).unwrap();
    let mut coverage = Vec::new();
    for _ in 0..40 {
        sim.step(1.0);
        coverage.push(sim.current_snapshot().cloud_coverage);
    }

    for pair in coverage.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-6, "coverage fell: {pair:?}");
    }
    let snapshot = sim.current_snapshot();
    assert_eq!(snapshot.weather, WeatherType::Rain);
    assert!((snapshot.cloud_coverage - 0.85).abs() < 1e-4);
    assert!(snapshot.precipitation > 0.5);
    assert_eq!(
        weather_events.count(|e| matches!(e, WeatherEvent::TransitionStarted { .. })),
        1
    );
    assert_eq!(
        weather_events.count(|e| matches!(e, WeatherEvent::WeatherChanged { .. })),
        1
    );
}

#[test]
fn thunderstorm_lightning_reaches_snapshots() {
    let mut sim = simulation(23.0);
    sim.set_mode(AdvanceMode::Paused);
    sim.request_weather(WeatherType::Thunderstorm, true).unwrap();

    let mut brightest_flash: f32 = 0.0;
    for _ in 0..1_000 {
        sim.step(0.05);
        brightest_flash = brightest_flash.max(sim.current_snapshot().lightning_flash);
    }

    assert!(brightest_flash > 0.5);
    assert_eq!(sim.current_snapshot().hour, 23.0);
}

#[test]
fn every_step_publishes_one_update_event() {
    let mut sim = simulation(9.0);
    let updates = EventRecorder::new();
    sim.aggregator_mut().subscribe(updates.sink());
    let reader = sim.reader();

    for _ in 0..10 {
        sim.step(1.0);
    }

    let events = updates.events();
    assert_eq!(events.len(), 10);
    let EnvironmentEvent::Updated(last) = events.last().unwrap();
    assert_eq!(last.sequence, reader.sequence());
    assert_eq!(reader.sequence(), 11);
}

#[test]
fn config_file_round_trip_builds_simulation() {
    let yaml = r"
world:
  seed: 5
  start_hour: 18.0
time:
  mode: paused
weather:
  initial: foggy
  auto_change: false
sky:
  update_interval_seconds: 0.0
";
    let config = SimulationConfig::parse(yaml).unwrap();
    let mut sim =
        Simulation::with_time_source(&config, Box::new(ManualTimeSource::new(0.0))).unwrap();
    sim.step(100.0);

    let snapshot = sim.current_snapshot();
    assert_eq!(snapshot.period, Period::Dusk);
    assert_eq!(snapshot.weather, WeatherType::Foggy);
    assert!(snapshot.fog_density > sim.clock().lighting().fog_density);
}

#[test]
fn shipped_config_is_valid() {
    let config = SimulationConfig::parse(include_str!("../../../aether-config.yaml")).unwrap();
    assert_eq!(config.world.seed, Some(42));
    assert_eq!(config.weather.disabled, vec![WeatherType::Blizzard]);

    let mut sim =
        Simulation::with_time_source(&config, Box::new(ManualTimeSource::new(0.0))).unwrap();
    assert_eq!(sim.current_period(), Period::Dawn);
    assert!(sim.request_weather(WeatherType::Blizzard, true).is_err());
    assert!(sim.request_weather(WeatherType::Snow, true).is_ok());
}
