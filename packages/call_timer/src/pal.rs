//! Platform abstraction layer for call timing.
//!
//! Timing code reads the clock through [`Platform`] so that unit tests can substitute a
//! controllable fake clock for the real monotonic one.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
