//! Averaging strategies
//!
//! Two interchangeable ways to reduce a set of packed pixels to their
//! per-channel truncated mean:
//!
//! - [`PackedAverage`] ("fast") sums the channels straight out of the packed
//!   words with shifts and masks
//! - [`ChannelAverage`] ("slow") decomposes every pixel into [`Argb`] and
//!   averages each channel list with [`integer_average`]
//!
//! Both return the same value for every input. Alpha is averaged like any
//! other channel; colors are not premultiplied.

use crate::FilterError;
use filterer_core::color::{self, Argb, CHANNEL_MASK};
use std::fmt;
use std::str::FromStr;

/// Truncating integer mean of `values`.
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn integer_average(values: &[u32]) -> u32 {
    assert!(!values.is_empty(), "integer_average of an empty slice");
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    (sum / values.len() as u64) as u32
}

/// Reduces a neighborhood of packed pixels to one packed pixel.
pub trait AveragingStrategy: Send + Sync {
    /// Average `values` channel by channel.
    ///
    /// `values` is never empty when called from the blur.
    fn average(&self, values: &[u32]) -> u32;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Shift-and-mask averaging over packed words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedAverage;

impl AveragingStrategy for PackedAverage {
    fn average(&self, values: &[u32]) -> u32 {
        assert!(!values.is_empty(), "average of an empty neighborhood");
        let (mut a, mut r, mut g, mut b) = (0u64, 0u64, 0u64, 0u64);
        for &v in values {
            a += ((v >> color::ALPHA_SHIFT) & CHANNEL_MASK) as u64;
            r += ((v >> color::RED_SHIFT) & CHANNEL_MASK) as u64;
            g += ((v >> color::GREEN_SHIFT) & CHANNEL_MASK) as u64;
            b += ((v >> color::BLUE_SHIFT) & CHANNEL_MASK) as u64;
        }
        let n = values.len() as u64;
        color::compose((r / n) as u32, (g / n) as u32, (b / n) as u32, (a / n) as u32)
    }

    fn name(&self) -> &'static str {
        "packed"
    }
}

/// Per-channel averaging through decomposed colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelAverage;

impl AveragingStrategy for ChannelAverage {
    fn average(&self, values: &[u32]) -> u32 {
        let argb: Vec<Argb> = values.iter().map(|&v| color::decompose(v)).collect();
        let channel = |f: fn(&Argb) -> u32| -> u32 {
            let list: Vec<u32> = argb.iter().map(f).collect();
            integer_average(&list)
        };
        color::compose(
            channel(|c| c.red),
            channel(|c| c.green),
            channel(|c| c.blue),
            channel(|c| c.alpha),
        )
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Selectable averaging method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AverageMethod {
    /// [`PackedAverage`]
    #[default]
    Packed,
    /// [`ChannelAverage`]
    Channel,
}

impl AveragingStrategy for AverageMethod {
    fn average(&self, values: &[u32]) -> u32 {
        match self {
            Self::Packed => PackedAverage.average(values),
            Self::Channel => ChannelAverage.average(values),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Packed => PackedAverage.name(),
            Self::Channel => ChannelAverage.name(),
        }
    }
}

impl fmt::Display for AverageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AverageMethod {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packed" | "fast" => Ok(Self::Packed),
            "channel" | "slow" => Ok(Self::Channel),
            _ => Err(FilterError::UnknownMethod(s.to_string())),
        }
    }
}
