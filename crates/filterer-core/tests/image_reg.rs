//! Image container regression test
//!
//! Exercises pixel access, copy-on-write conversion and comparison on
//! synthetic images.
//!
//! Run with:
//! ```
//! cargo test -p filterer-core --test image_reg
//! ```

use filterer_core::{Argb, RasterImage, color};
use filterer_test::{RegParams, images};

#[test]
fn image_reg() {
    let mut rp = RegParams::new("image");

    // Test 1-2: dimensions and packed layout
    let pix = images::gradient(8, 4);
    rp.compare_values(8.0, pix.width() as f64, 0.0);
    rp.compare_values(4.0, pix.height() as f64, 0.0);

    // Test 3: channel accessors agree with the codec
    let px = pix.get_pixel(7, 3).expect("in bounds");
    rp.check(
        pix.get_argb(7, 3) == Some(Argb::from(px)) && color::alpha(px) == 255,
        "accessors agree",
    );

    // Test 4: shared clones see the same data until converted
    let shared = pix.clone();
    rp.check(shared.shares_data_with(&pix), "clone shares data");
    let mut edited = shared.to_mut();
    edited.set_pixel(0, 0, 0x1234_5678).expect("set");
    let edited: RasterImage = edited.into();
    rp.check(pix.get_pixel(0, 0) != Some(0x1234_5678), "source untouched");

    // Test 5-6: comparison counts the single edit
    let cmp = pix.compare(&edited).expect("same size");
    rp.compare_values(1.0, cmp.n_diff as f64, 0.0);
    rp.check(!cmp.equal, "edit detected");

    // Test 7: out-of-bounds access
    rp.check(pix.get_pixel(8, 0).is_none(), "x out of bounds");

    assert!(rp.cleanup(), "image regression test failed");
}
