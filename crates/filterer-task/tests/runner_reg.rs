//! Background run regression test
//!
//! Drives iterative filter runs through the task registry the way the
//! session does: progress flows back over a channel tagged with the task
//! generation, and a resubmitted run supersedes the previous one.
//!
//! Run with:
//! ```
//! cargo test -p filterer-task --test runner_reg
//! ```

use filterer_filter::{AverageMethod, blur_repeated};
use filterer_task::{CancellableTaskRegistry, IterativeFilterRunner};
use filterer_test::{RegParams, images};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug)]
enum Event {
    Progress { generation: u64, iteration: u32 },
    Done { generation: u64, image: Option<filterer_core::RasterImage> },
}

#[test]
fn runner_reg() {
    let mut rp = RegParams::new("runner");
    let registry = CancellableTaskRegistry::new("apply");
    let (tx, rx) = mpsc::channel();
    let source = images::noise(24, 16, 11);

    let submit = |method: AverageMethod, passes: u32, tx: mpsc::Sender<Event>| {
        let runner =
            IterativeFilterRunner::new(Arc::new(method), NonZeroU32::new(passes).expect("passes"));
        let source = source.clone();
        registry
            .submit("apply", move |ctx| {
                let generation = ctx.generation();
                let outcome = runner.run(&source, ctx.token(), |p| {
                    let _ = tx.send(Event::Progress {
                        generation,
                        iteration: p.iteration,
                    });
                });
                let _ = tx.send(Event::Done {
                    generation,
                    image: outcome.into_image(),
                });
            })
            .expect("submit")
    };

    // Test 1-2: a full run reports 1..=4 then the same image as the
    // synchronous blur
    let generation = submit(AverageMethod::Channel, 4, tx.clone());
    let mut iterations = Vec::new();
    let final_image = loop {
        match rx.recv_timeout(Duration::from_secs(10)).expect("event") {
            Event::Progress { iteration, .. } => iterations.push(iteration),
            Event::Done { generation: g, image } => {
                rp.check(g == generation, "done carries the run generation");
                break image;
            }
        }
    };
    rp.check(iterations == vec![1, 2, 3, 4], "progress in order");
    let expected = blur_repeated(&source, &AverageMethod::Packed, 4);
    match final_image {
        Some(image) => {
            rp.compare_pix(&expected, &image);
        }
        None => {
            rp.check(false, "run completed");
        }
    }

    // Test 4-6: a second submission supersedes a long first run
    let first = submit(AverageMethod::Packed, 10, tx.clone());
    let second = submit(AverageMethod::Packed, 1, tx.clone());
    rp.check(!registry.is_current(&"apply", first), "first run is stale");
    rp.check(registry.is_current(&"apply", second), "second run is current");

    let mut second_done = false;
    while let Ok(event) = rx.recv_timeout(Duration::from_secs(10)) {
        if let Event::Done { generation, image } = event {
            if generation == first {
                // may have finished before it was superseded; either way it is stale
                rp.check(
                    !registry.is_current(&"apply", generation),
                    "superseded result is recognized as stale",
                );
            } else if generation == second {
                second_done = image.is_some();
                break;
            }
        }
    }
    rp.check(second_done, "second run completes");

    assert!(rp.cleanup(), "runner regression test failed");
}
