//! filterer-test - Regression test framework for Image Filterer
//!
//! This crate provides a small regression test framework with two modes:
//!
//! - **Compare**: Check values and images, record failures (default)
//! - **Display**: Additionally write result images to `tests/regout` for
//!   visual inspection
//!
//! It also provides deterministic synthetic images, since the workspace
//! ships no binary fixtures.
//!
//! # Usage
//!
//! ```ignore
//! use filterer_test::{RegParams, images};
//!
//! let mut rp = RegParams::new("blur");
//! let pix = images::uniform(8, 8, 0xff80_4020);
//! rp.compare_values(8.0, pix.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"

mod error;
pub mod images;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // filterer-test is at crates/filterer-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}

/// Get a fresh scratch directory for a test that writes files.
///
/// The directory lives under the system temp dir, is named after the test
/// and the process id, and is emptied if it already exists.
pub fn scratch_dir(test_name: &str) -> TestResult<std::path::PathBuf> {
    let dir = std::env::temp_dir().join(format!(
        "image-filterer-{}-{}",
        test_name,
        std::process::id()
    ));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| TestError::DirectoryCreate {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
    }
    std::fs::create_dir_all(&dir).map_err(|e| TestError::DirectoryCreate {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
