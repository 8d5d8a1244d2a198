// Copyright (c) 2022, Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Timestamp sources used to time individual signing calls.
//!
//! Every source returns a `u64` reading and the elapsed time of a call is the wrapping difference
//! of two readings, so the unit of a timing sample is the unit of the chosen source.

use crate::error::{TimeSignError, TimeSignResult};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Where timestamps come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockSource {
    /// Nanoseconds on a monotonic clock.
    #[default]
    Monotonic,
    /// The sub-second nanosecond part of the wall clock. A call that straddles a second boundary
    /// yields a wrapped, very large sample. Matches datasets recorded by earlier harnesses.
    WallSubsec,
    /// The CPU timestamp counter, in ticks.
    Cycles,
}

impl ClockSource {
    pub const NAMES: [&'static str; 3] = ["monotonic", "wall-subsec", "cycles"];

    pub fn name(&self) -> &'static str {
        match self {
            ClockSource::Monotonic => "monotonic",
            ClockSource::WallSubsec => "wall-subsec",
            ClockSource::Cycles => "cycles",
        }
    }
}

impl Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ClockSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monotonic" => Ok(ClockSource::Monotonic),
            "wall-subsec" => Ok(ClockSource::WallSubsec),
            "cycles" => Ok(ClockSource::Cycles),
            _ => Err(format!(
                "unknown clock {s}, expected one of {}",
                ClockSource::NAMES.join(", ")
            )),
        }
    }
}

/// A started clock. `start` is read right before the measured call and `stop` right after it.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    source: ClockSource,
    origin: Instant,
}

impl Clock {
    pub fn new(source: ClockSource) -> TimeSignResult<Self> {
        if source == ClockSource::Cycles && !cycles::AVAILABLE {
            return Err(TimeSignError::UnsupportedClock(source.name()));
        }
        Ok(Self {
            source,
            origin: Instant::now(),
        })
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    #[inline(always)]
    pub fn start(&self) -> u64 {
        match self.source {
            ClockSource::Monotonic => self.monotonic_nanos(),
            ClockSource::WallSubsec => wall_subsec_nanos(),
            ClockSource::Cycles => cycles::before(),
        }
    }

    #[inline(always)]
    pub fn stop(&self) -> u64 {
        match self.source {
            ClockSource::Monotonic => self.monotonic_nanos(),
            ClockSource::WallSubsec => wall_subsec_nanos(),
            ClockSource::Cycles => cycles::after(),
        }
    }

    /// Difference between two readings. Wraps instead of failing when `after < before`.
    pub fn elapsed(before: u64, after: u64) -> u64 {
        after.wrapping_sub(before)
    }

    fn monotonic_nanos(&self) -> u64 {
        // u64 nanoseconds cover more than five centuries of uptime.
        self.origin.elapsed().as_nanos() as u64
    }
}

fn wall_subsec_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "x86_64")]
mod cycles {
    use std::arch::x86_64::{__rdtscp, _mm_lfence, _rdtsc};

    pub const AVAILABLE: bool = true;

    #[inline(always)]
    pub fn before() -> u64 {
        // The fence keeps earlier instructions from being reordered past the read.
        unsafe {
            _mm_lfence();
            _rdtsc()
        }
    }

    #[inline(always)]
    pub fn after() -> u64 {
        let mut aux = 0u32;
        unsafe {
            let ticks = __rdtscp(&mut aux);
            _mm_lfence();
            ticks
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod cycles {
    use std::arch::asm;

    pub const AVAILABLE: bool = true;

    #[inline(always)]
    fn read() -> u64 {
        let ticks: u64;
        unsafe {
            asm!("isb", "mrs {}, cntvct_el0", out(reg) ticks, options(nostack));
        }
        ticks
    }

    #[inline(always)]
    pub fn before() -> u64 {
        read()
    }

    #[inline(always)]
    pub fn after() -> u64 {
        read()
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod cycles {
    pub const AVAILABLE: bool = false;

    pub fn before() -> u64 {
        0
    }

    pub fn after() -> u64 {
        0
    }
}
