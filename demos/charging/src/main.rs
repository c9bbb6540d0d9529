//! charging: electric cars sharing a small charging station.
//!
//! Each car alternates between driving and charging.  After every drive it
//! queues for one of `CHARGERS` charging points, charges, and drives off
//! again.  Drive and charge durations are drawn from normal distributions
//! using the car's own RNG stream, so the run is reproducible from `SEED`.
//!
//! Every finished charging session is written to
//! `output/charging/sessions.csv`.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use rand_distr::Normal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use des_core::{ProcessRng, ResourceId, SimConfig};
use des_sim::{
    Context, EnvironmentBuilder, NoopObserver, Process, ProcessError, ProcessResult, Resume, Step,
    with_resource,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const CAR_COUNT:    u32   = 6;
const CHARGERS:     usize = 2;
const TRIPS:        u32   = 4;
const SEED:         u64   = 42;
const HORIZON:      f64   = 200.0;
const DRIVE_MEAN:   f64   = 15.0;
const DRIVE_SD:     f64   = 4.0;
const CHARGE_MEAN:  f64   = 6.0;
const CHARGE_SD:    f64   = 1.5;
/// Samples are clipped to this so no duration is negative.
const MIN_DURATION: f64   = 0.1;

// ── Report ────────────────────────────────────────────────────────────────────

/// One completed charging session, as written to CSV.
#[derive(Serialize, Clone, Debug)]
struct Session {
    car:      u32,
    arrived:  f64,
    started:  f64,
    finished: f64,
    waited:   f64,
}

/// Caller-owned model state filled in by the processes.
#[derive(Default)]
struct Report {
    sessions: Vec<Session>,
}

// ── Processes ─────────────────────────────────────────────────────────────────

/// Holds a charging point for `duration`, then records the session.
struct Charging {
    car:      u32,
    arrived:  f64,
    duration: f64,
    started:  Option<f64>,
}

impl Process<Report> for Charging {
    fn resume(
        &mut self,
        ctx:    &mut Context<'_, Report>,
        report: &mut Report,
        _:      Resume,
    ) -> ProcessResult<Step> {
        let now = ctx.now().as_f64();
        match self.started {
            None => {
                self.started = Some(now);
                Ok(Step::Wait(ctx.timeout(self.duration)?))
            }
            Some(started) => {
                report.sessions.push(Session {
                    car:      self.car,
                    arrived:  self.arrived,
                    started,
                    finished: now,
                    waited:   started - self.arrived,
                });
                Ok(Step::Done)
            }
        }
    }

    fn name(&self) -> &str {
        "charging"
    }
}

struct Car {
    index:      u32,
    name:       String,
    station:    ResourceId,
    trips_left: u32,
    drive:      Normal<f64>,
    charge:     Normal<f64>,
    rng:        Option<ProcessRng>,
}

impl Car {
    fn new(index: u32, station: ResourceId, drive: Normal<f64>, charge: Normal<f64>) -> Self {
        Self {
            index,
            name: format!("car {index}"),
            station,
            trips_left: TRIPS,
            drive,
            charge,
            rng: None,
        }
    }
}

impl Process<Report> for Car {
    fn resume(
        &mut self,
        ctx:    &mut Context<'_, Report>,
        _:      &mut Report,
        signal: Resume,
    ) -> ProcessResult<Step> {
        let rng = self.rng.get_or_insert_with(|| ProcessRng::new(ctx.seed(), ctx.current()));
        match signal {
            // Start of the run, or back from the charger: drive.
            Resume::Init | Resume::Exited(_) => {
                if self.trips_left == 0 {
                    return Ok(Step::Done);
                }
                self.trips_left -= 1;
                let delay: f64 = rng.sample(&self.drive);
                Ok(Step::Wait(ctx.timeout(delay.max(MIN_DURATION))?))
            }
            // Arrived at the station.
            Resume::Timeout => {
                let car = self.index;
                let arrived = ctx.now().as_f64();
                let sampled: f64 = rng.sample(&self.charge);
                let duration = sampled.max(MIN_DURATION);
                let session = ctx.spawn(
                    with_resource(self.station, move |_slot| Charging {
                        car,
                        arrived,
                        duration,
                        started: None,
                    })
                    .named(format!("car {car} at charger")),
                )?;
                Ok(Step::Wait(session.exit))
            }
            other => Err(ProcessError::failed(format!("unexpected {other:?}"))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn write_sessions(path: &Path, sessions: &[Session]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for session in sessions {
        writer.serialize(session)?;
    }
    writer.flush()?;
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== charging: rust_des demo ===");
    println!("Cars: {CAR_COUNT}  |  Chargers: {CHARGERS}  |  Trips: {TRIPS}  |  Seed: {SEED}");
    println!();

    let drive = Normal::new(DRIVE_MEAN, DRIVE_SD)?;
    let charge = Normal::new(CHARGE_MEAN, CHARGE_SD)?;
    let config = SimConfig { initial_time: 0.0, seed: SEED };

    // The station is the only resource, so it gets ResourceId(0).
    let station = ResourceId(0);
    let mut builder = EnvironmentBuilder::new(config).resource(CHARGERS);
    for index in 0..CAR_COUNT {
        builder = builder.process(Car::new(index, station, drive, charge));
    }
    let mut env = builder.build()?;

    let mut report = Report::default();
    let t0 = Instant::now();
    let state = env.run_until(HORIZON, &mut report, &mut NoopObserver)?;
    let elapsed = t0.elapsed();
    info!(%state, now = %env.now(), events = env.events_processed(), "simulation stopped");

    println!("Simulation {state} at {} in {:.3} ms", env.now(), elapsed.as_secs_f64() * 1e3);
    println!("  events processed : {}", env.events_processed());
    println!("  sessions         : {}", report.sessions.len());
    if !report.sessions.is_empty() {
        let total: f64 = report.sessions.iter().map(|s| s.waited).sum();
        println!("  mean wait        : {:.2}", total / report.sessions.len() as f64);
    }
    println!();

    println!("{:<5} {:>9} {:>9} {:>9} {:>8}", "Car", "Arrived", "Started", "Finished", "Waited");
    println!("{}", "-".repeat(44));
    for s in &report.sessions {
        println!(
            "{:<5} {:>9.2} {:>9.2} {:>9.2} {:>8.2}",
            s.car, s.arrived, s.started, s.finished, s.waited,
        );
    }

    let dir = Path::new("output/charging");
    fs::create_dir_all(dir)?;
    write_sessions(&dir.join("sessions.csv"), &report.sessions)?;
    println!();
    println!("Wrote {}", dir.join("sessions.csv").display());

    Ok(())
}
