//! Simulation time model.
//!
//! # Design
//!
//! Time is an abstract, continuous timestamp held in `SimTime`.  It has no
//! relation to wall-clock time: one unit may mean a second, a minute, or a
//! day, whatever the model decides.
//!
//! Durations come from external samplers (e.g. a normal distribution), so the
//! representation is `f64` rather than the integer ticks of a fixed-step
//! simulator.  To keep the event queue totally ordered, `SimTime` compares via
//! [`f64::total_cmp`], and every constructor the engine uses goes through
//! [`SimTime::checked_add`], which rejects NaN, infinities and negative
//! delays.  Inside the engine a `SimTime` is therefore always finite.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{DesError, DesResult};

// ── SimTime ──────────────────────────────────────────────────────────────────

/// An absolute simulation timestamp.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// The raw timestamp.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Return the time `delay` units after `self`.
    ///
    /// Fails with [`DesError::InvalidDelay`] if `delay` is negative, NaN or
    /// infinite, or if the sum overflows to infinity.
    #[inline]
    pub fn checked_add(self, delay: f64) -> DesResult<SimTime> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(DesError::InvalidDelay(delay));
        }
        let at = self.0 + delay;
        if !at.is_finite() {
            return Err(DesError::InvalidDelay(delay));
        }
        Ok(SimTime(at))
    }

    /// Time elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for SimTime {
    #[inline]
    fn from(t: f64) -> Self {
        SimTime(t)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The environment's notion of "now".
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Time the run started at.
    pub initial: SimTime,
    /// Current time.  Only the stepping loop moves it.
    pub now: SimTime,
}

impl SimClock {
    pub fn new(initial: SimTime) -> Self {
        Self { initial, now: initial }
    }

    /// Move the clock to `t`.
    ///
    /// # Panics
    /// Panics in debug mode if `t` is earlier than the current time.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) {
        debug_assert!(t >= self.now, "clock moved backward: {} -> {}", self.now, t);
        self.now = t;
    }

    /// Simulated time elapsed since the run started.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.now.since(self.initial)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (elapsed {})", self.now, self.elapsed())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically built in code or loaded from a config file by the application
/// crate and handed to `EnvironmentBuilder`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Value of `now()` before the first event is processed.  Default: 0.
    pub initial_time: f64,

    /// Master RNG seed.  The same seed always produces identical results,
    /// provided the model draws all its randomness from RNGs derived here.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { initial_time: 0.0, seed: 0 }
    }
}

impl SimConfig {
    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> DesResult<()> {
        if !self.initial_time.is_finite() {
            return Err(DesError::Config(format!(
                "initial_time must be finite, got {}",
                self.initial_time
            )));
        }
        Ok(())
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(SimTime(self.initial_time))
    }
}
