use std::time::Duration;

#[cfg(test)]
use crate::pal::FakePlatform;
use crate::pal::real::REAL_PLATFORM;
use crate::pal::{Platform, RealPlatform};

/// Dispatches clock reads to either the real clock or, in tests, a fake one.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    Real(&'static RealPlatform),

    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(&REAL_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }
}

impl Platform for PlatformFacade {
    fn now(&self) -> Duration {
        match self {
            Self::Real(p) => p.now(),
            #[cfg(test)]
            Self::Fake(p) => p.now(),
        }
    }
}
