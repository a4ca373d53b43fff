//! Clock and random implementations.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::infrastructure::ports::{ClockPort, RandomPort};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared random source.
///
/// One generator behind a lock, so draws from concurrent tasks are serialized
/// instead of racing on the generator state. Seeded instances replay the same
/// sequence for a given order of calls.
pub struct SystemRandom {
    rng: Mutex<StdRng>,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave StdRng half-updated.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.with_rng(|rng| rng.gen_range(min..=max))
    }

    fn gen_unit(&self) -> f64 {
        self.with_rng(|rng| rng.gen::<f64>())
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max.max(min))
    }

    fn gen_unit(&self) -> f64 {
        0.0
    }
}

/// Random source replaying scripted values, for tests that need a specific
/// sequence of rolls. Once a script runs dry it repeats its fallback value.
#[cfg(test)]
pub struct ScriptedRandom {
    ints: Mutex<std::collections::VecDeque<i32>>,
    units: Mutex<std::collections::VecDeque<f64>>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(ints: impl IntoIterator<Item = i32>, units: impl IntoIterator<Item = f64>) -> Self {
        Self {
            ints: Mutex::new(ints.into_iter().collect()),
            units: Mutex::new(units.into_iter().collect()),
        }
    }
}

#[cfg(test)]
impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        let next = self.ints.lock().unwrap().pop_front().unwrap_or(min);
        next.clamp(min, max.max(min))
    }

    fn gen_unit(&self) -> f64 {
        self.units.lock().unwrap().pop_front().unwrap_or(0.0)
    }
}
