//! Image Filterer - Iterative neighborhood blur
//!
//! Open a PNG or JPEG image, blur it one to ten times with either averaging
//! strategy while watching every intermediate frame, zoom the input and
//! output panes, and save the result as PNG.
//!
//! # Example
//!
//! ```no_run
//! use image_filterer::{AverageMethod, Session, SessionConfig};
//! use std::time::Duration;
//!
//! let mut session = Session::new(SessionConfig::from_env());
//! session.open("photo.jpg")?;
//! session.apply(AverageMethod::Channel, 3)?;
//! session.wait_until(Duration::from_secs(30), |s| !s.is_busy());
//! let written = session.save("photo-blurred")?;
//! assert!(written.ends_with("photo-blurred.png"));
//! # Ok::<(), image_filterer::SessionError>(())
//! ```

pub mod config;
mod error;
pub mod session;

pub use config::{IterationCount, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use session::{About, Delivery, Pane, PaneView, Session, SessionEvent, TaskSlot};

// Re-export core types
pub use filterer_core::{Argb, RasterImage, RasterImageMut, color};
pub use filterer_filter::AverageMethod;

// Re-export domain crates as modules to avoid name conflicts
pub use filterer_filter as filter;
pub use filterer_io as io;
pub use filterer_task as task;
pub use filterer_transform as transform;
