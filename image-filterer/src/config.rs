//! Session configuration
//!
//! Defaults can be overridden from the environment:
//!
//! - `IMAGE_FILTERER_TASK_TIMEOUT_MS`: bound on waiting for a cancelled
//!   background task to exit (default 1000)
//! - `IMAGE_FILTERER_METHOD`: default averaging method, `packed`/`fast` or
//!   `channel`/`slow`

use crate::{SessionError, SessionResult};
use filterer_filter::AverageMethod;
use filterer_task::DEFAULT_TERMINATION_TIMEOUT;
use std::num::NonZeroU32;
use std::time::Duration;

/// Environment variable for the termination timeout in milliseconds
pub const ENV_TASK_TIMEOUT_MS: &str = "IMAGE_FILTERER_TASK_TIMEOUT_MS";
/// Environment variable for the default averaging method
pub const ENV_METHOD: &str = "IMAGE_FILTERER_METHOD";

/// Smallest accepted zoom factor
pub const MIN_ZOOM: f64 = 0.01;
/// Largest accepted zoom factor
pub const MAX_ZOOM: f64 = 32.0;
/// Largest rendering a pane may ask for, in pixels
pub const MAX_RENDERED_PIXELS: u64 = 1 << 26;

/// Number of blur passes for one apply, between 1 and 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IterationCount(NonZeroU32);

impl IterationCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10;

    pub fn new(value: u32) -> SessionResult<Self> {
        match NonZeroU32::new(value) {
            Some(n) if value <= Self::MAX => Ok(Self(n)),
            _ => Err(SessionError::InvalidIterations {
                value,
                min: Self::MIN,
                max: Self::MAX,
            }),
        }
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn as_non_zero(self) -> NonZeroU32 {
        self.0
    }
}

impl Default for IterationCount {
    fn default() -> Self {
        Self(NonZeroU32::MIN)
    }
}

impl TryFrom<u32> for IterationCount {
    type Error = SessionError;

    fn try_from(value: u32) -> SessionResult<Self> {
        Self::new(value)
    }
}

/// Check a zoom factor against the accepted range.
pub fn validate_zoom(zoom: f64) -> SessionResult<f64> {
    if zoom.is_finite() && (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        Ok(zoom)
    } else {
        Err(SessionError::InvalidZoom {
            value: zoom,
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        })
    }
}

/// Size of `width` x `height` rendered at `zoom`.
pub fn rendered_size(width: u32, height: u32, zoom: f64) -> (u64, u64) {
    let side = |len: u32| ((len as f64 * zoom) as u64).max(1);
    (side(width), side(height))
}

/// Check that rendering `width` x `height` at `zoom` stays within
/// [`MAX_RENDERED_PIXELS`].
pub fn validate_render(width: u32, height: u32, zoom: f64) -> SessionResult<()> {
    let (w, h) = rendered_size(width, height, zoom);
    if w.saturating_mul(h) <= MAX_RENDERED_PIXELS {
        Ok(())
    } else {
        Err(SessionError::RenderTooLarge {
            width: w,
            height: h,
            max: MAX_RENDERED_PIXELS,
        })
    }
}

/// Session-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Bound on waiting for a replaced or cancelled task to exit
    pub task_timeout: Duration,
    /// Method used when none is given
    pub method: AverageMethod,
    /// Iterations used when none is given
    pub iterations: IterationCount,
    /// Initial zoom of both panes
    pub zoom: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            task_timeout: DEFAULT_TERMINATION_TIMEOUT,
            method: AverageMethod::default(),
            iterations: IterationCount::default(),
            zoom: 1.0,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TASK_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.task_timeout = Duration::from_millis(ms),
                Err(e) => log::warn!("ignoring {}={:?}: {}", ENV_TASK_TIMEOUT_MS, raw, e),
            }
        }

        if let Some(raw) = lookup(ENV_METHOD) {
            match raw.parse::<AverageMethod>() {
                Ok(method) => config.method = method,
                Err(e) => log::warn!("ignoring {}={:?}: {}", ENV_METHOD, raw, e),
            }
        }

        config
    }
}
