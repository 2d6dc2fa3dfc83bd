//! Command-line front end: open, filter, save.

use clap::Parser;
use image_filterer::io::IoError;
use image_filterer::{AverageMethod, Pane, Session, SessionConfig, SessionError, SessionEvent};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "image-filterer", version, about)]
struct Args {
    /// Image to open (.png, .jpg or .jpeg)
    input: PathBuf,
    /// Where to save the result; `.png` is appended if missing
    #[arg(short, long)]
    output: PathBuf,
    /// Averaging method: packed (fast) or channel (slow)
    #[arg(short, long)]
    method: Option<AverageMethod>,
    /// Number of blur passes, 1 to 10
    #[arg(short, long)]
    iterations: Option<u32>,
    /// Also save the output rendered at this zoom as `<output>.zoom.png`
    #[arg(long)]
    zoom: Option<f64>,
    /// Also save the result shrunk to fit SIZE x SIZE as `<output>.thumb.png`
    #[arg(long, value_name = "SIZE")]
    thumbnail: Option<u32>,
    /// Directory to write every intermediate frame into
    #[arg(long)]
    frames_dir: Option<PathBuf>,
    /// Seconds to wait for the run before giving up
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(written) => {
            println!("saved {}", written.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", e.title(), e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<PathBuf, SessionError> {
    let config = SessionConfig::from_env();
    let method = args.method.unwrap_or(config.method);
    let iterations = args.iterations.unwrap_or(config.iterations.get());
    let mut session = Session::new(config);

    if let Some(zoom) = args.zoom {
        session.set_zoom(Pane::Output, zoom)?;
    }
    if let Some(dir) = &args.frames_dir {
        std::fs::create_dir_all(dir).map_err(IoError::from)?;
    }
    session.open(&args.input)?;
    session.apply(method, iterations)?;

    let timeout = Duration::from_secs(args.timeout_secs);
    let deadline = Instant::now() + timeout;
    while session.is_busy() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            session.cancel_apply();
            log::error!("run did not finish within {:?}", timeout);
            break;
        }
        if let Some(delivery) = session.wait_for_event(remaining)
            && delivery.applied
        {
            report(&delivery.event, args.frames_dir.as_deref())?;
        }
    }

    let written = session.save(&args.output)?;

    if args.zoom.is_some() {
        let rendered = session.wait_until(timeout, |s| !s.pane(Pane::Output).is_rendering());
        if let Some(preview) = session.pane(Pane::Output).rendered().filter(|_| rendered) {
            let path = image_filterer::io::save_image(preview, zoom_path(&written))?;
            println!("saved {}", path.display());
        }
    }

    if let Some(size) = args.thumbnail
        && let Some(thumb) = session.thumbnail(Pane::Output, size)?
    {
        let path = image_filterer::io::save_image(&thumb, written.with_extension("thumb.png"))?;
        println!("saved {}", path.display());
    }

    session.quit();
    Ok(written)
}

fn report(event: &SessionEvent, frames_dir: Option<&Path>) -> Result<(), SessionError> {
    if let SessionEvent::Progress {
        image,
        iteration,
        total,
        ..
    } = event
    {
        println!("iteration {iteration}/{total}");
        if let Some(dir) = frames_dir {
            image_filterer::io::save_image(image, dir.join(format!("frame-{iteration:02}")))?;
        }
    }
    Ok(())
}

fn zoom_path(written: &Path) -> PathBuf {
    written.with_extension("zoom.png")
}
