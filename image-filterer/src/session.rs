//! Headless filtering session
//!
//! A [`Session`] owns the input and output panes and all background work.
//! It is driven from one foreground thread: commands are methods on the
//! session, and background tasks report back by sending [`SessionEvent`]s
//! that the foreground applies in [`Session::pump_events`] or
//! [`Session::wait_for_event`]. Worker threads never touch pane state.
//!
//! Every event carries the generation of the task that produced it. An
//! event whose task has been replaced or cancelled in the meantime is
//! stale and is dropped without effect.
//!
//! Commands never wait for background work to stop: replacing or
//! cancelling a task only detaches it from the session, and the bounded
//! wait for its exit happens on a background thread.

use crate::config::{IterationCount, SessionConfig, validate_render, validate_zoom};
use crate::{SessionError, SessionResult};
use filterer_core::RasterImage;
use filterer_filter::AverageMethod;
use filterer_task::{CancellableTaskRegistry, IterativeFilterRunner, RunOutcome};
use filterer_transform::{ScaleMethod, scale, scale_to_max_size};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// One of the two image panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Input,
    Output,
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Identity of a background task within the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSlot {
    /// The filter run
    Apply,
    /// Rendering a pane at its zoom level
    Zoom(Pane),
}

/// Message from a background task to the foreground.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A blur pass finished
    Progress {
        generation: u64,
        image: RasterImage,
        iteration: u32,
        total: u32,
    },
    /// The run finished every pass
    Completed { generation: u64, image: RasterImage },
    /// The run stopped early
    Cancelled { generation: u64, completed: u32 },
    /// A pane was rendered at its zoom level
    Rescaled {
        pane: Pane,
        generation: u64,
        image: RasterImage,
    },
}

impl SessionEvent {
    fn slot(&self) -> TaskSlot {
        match self {
            Self::Progress { .. } | Self::Completed { .. } | Self::Cancelled { .. } => {
                TaskSlot::Apply
            }
            Self::Rescaled { pane, .. } => TaskSlot::Zoom(*pane),
        }
    }

    fn generation(&self) -> u64 {
        match self {
            Self::Progress { generation, .. }
            | Self::Completed { generation, .. }
            | Self::Cancelled { generation, .. }
            | Self::Rescaled { generation, .. } => *generation,
        }
    }
}

/// An event taken off the queue, and whether it changed the session.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub event: SessionEvent,
    /// `false` if the event was stale and ignored
    pub applied: bool,
}

/// Image shown in one pane, and its rendering at the pane's zoom.
#[derive(Debug, Clone)]
pub struct PaneView {
    zoom: f64,
    source: Option<RasterImage>,
    rendered: Option<RasterImage>,
    pending: Option<u64>,
}

impl PaneView {
    fn new(zoom: f64) -> Self {
        Self {
            zoom,
            source: None,
            rendered: None,
            pending: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Full-resolution image of the pane.
    pub fn source(&self) -> Option<&RasterImage> {
        self.source.as_ref()
    }

    /// Most recent rendering at the pane's zoom.
    pub fn rendered(&self) -> Option<&RasterImage> {
        self.rendered.as_ref()
    }

    /// Whether a rescale has been requested and not yet delivered.
    pub fn is_rendering(&self) -> bool {
        self.pending.is_some()
    }

    fn clear(&mut self) {
        self.source = None;
        self.rendered = None;
        self.pending = None;
    }
}

/// Contents of the About notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct About {
    pub title: &'static str,
    pub text: String,
}

/// Filtering session state.
pub struct Session {
    config: SessionConfig,
    input: PaneView,
    output: PaneView,
    busy: bool,
    progress: Option<(u32, u32)>,
    quit: bool,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    tasks: CancellableTaskRegistry<TaskSlot>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("busy", &self.busy)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let tasks = CancellableTaskRegistry::new("image-filterer").with_timeout(config.task_timeout);
        Self {
            input: PaneView::new(config.zoom),
            output: PaneView::new(config.zoom),
            config,
            busy: false,
            progress: None,
            quit: false,
            events_tx,
            events_rx,
            tasks,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pane(&self, pane: Pane) -> &PaneView {
        match pane {
            Pane::Input => &self.input,
            Pane::Output => &self.output,
        }
    }

    fn pane_mut(&mut self, pane: Pane) -> &mut PaneView {
        match pane {
            Pane::Input => &mut self.input,
            Pane::Output => &mut self.output,
        }
    }

    /// The opened image.
    pub fn input(&self) -> Option<&RasterImage> {
        self.input.source()
    }

    /// The latest filter result, intermediate or final.
    pub fn output(&self) -> Option<&RasterImage> {
        self.output.source()
    }

    /// Whether a filter run is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// `(iteration, total)` of the last applied progress event.
    pub fn progress(&self) -> Option<(u32, u32)> {
        self.progress
    }

    pub fn has_quit(&self) -> bool {
        self.quit
    }

    /// Open an image, replacing the input and clearing the output.
    ///
    /// On failure the previous input stays in place. A run in flight is
    /// cancelled since its result would belong to the old input.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> SessionResult<()> {
        let image = filterer_io::load_image(path)?;
        validate_render(image.width(), image.height(), self.input.zoom)?;

        self.cancel_apply();
        self.tasks.cancel_detached(&TaskSlot::Zoom(Pane::Output));
        self.output.clear();
        self.progress = None;

        self.input.source = Some(image);
        self.input.rendered = None;
        self.refresh_zoom(Pane::Input)?;
        Ok(())
    }

    /// Save the current output as PNG; returns the path written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SessionResult<PathBuf> {
        let output = self.output.source().ok_or(SessionError::NoOutput)?;
        Ok(filterer_io::save_image(output, path)?)
    }

    /// Start a filter run on the input, replacing any run in flight.
    ///
    /// Returns the run's generation.
    pub fn apply(&mut self, method: AverageMethod, iterations: u32) -> SessionResult<u64> {
        let source = self.input.source().cloned().ok_or(SessionError::NoImage)?;
        let iterations = IterationCount::new(iterations)?;

        let runner = IterativeFilterRunner::new(Arc::new(method), iterations.as_non_zero());
        let tx = self.events_tx.clone();
        let generation = self.tasks.submit(TaskSlot::Apply, move |ctx| {
            let generation = ctx.generation();
            let outcome = runner.run(&source, ctx.token(), |p| {
                let _ = tx.send(SessionEvent::Progress {
                    generation,
                    image: p.image,
                    iteration: p.iteration,
                    total: p.total,
                });
            });
            let event = match outcome {
                RunOutcome::Completed(image) => SessionEvent::Completed { generation, image },
                RunOutcome::Cancelled { completed } => SessionEvent::Cancelled {
                    generation,
                    completed,
                },
            };
            let _ = tx.send(event);
        })?;

        log::info!(
            "apply #{}: {} x{} on {}x{}",
            generation,
            method,
            iterations.get(),
            self.input.source().map_or(0, |p| p.width()),
            self.input.source().map_or(0, |p| p.height()),
        );
        self.busy = true;
        self.progress = None;
        Ok(generation)
    }

    /// Apply with the configured default method and iteration count.
    pub fn apply_default(&mut self) -> SessionResult<u64> {
        let (method, iterations) = (self.config.method, self.config.iterations.get());
        self.apply(method, iterations)
    }

    /// Cancel the run in flight, if any, without waiting for it to stop.
    ///
    /// Events the run still sends are ignored. Returns whether a run was
    /// registered.
    pub fn cancel_apply(&mut self) -> bool {
        self.busy = false;
        self.tasks.cancel_detached(&TaskSlot::Apply)
    }

    /// Change a pane's zoom. Takes effect on the next [`refresh_zoom`].
    ///
    /// Rejects zooms outside the accepted range, and zooms at which the
    /// pane's current image would render too large.
    ///
    /// [`refresh_zoom`]: Session::refresh_zoom
    pub fn set_zoom(&mut self, pane: Pane, zoom: f64) -> SessionResult<()> {
        let zoom = validate_zoom(zoom)?;
        if let Some(source) = self.pane(pane).source() {
            validate_render(source.width(), source.height(), zoom)?;
        }
        self.pane_mut(pane).zoom = zoom;
        Ok(())
    }

    /// Re-render a pane at its zoom in the background.
    ///
    /// Replaces a rescale already in flight for the pane. Returns the task
    /// generation, or `None` if the pane is empty.
    pub fn refresh_zoom(&mut self, pane: Pane) -> SessionResult<Option<u64>> {
        let view = self.pane(pane);
        let Some(source) = view.source().cloned() else {
            return Ok(None);
        };
        validate_render(source.width(), source.height(), view.zoom())?;
        let zoom = view.zoom() as f32;

        let tx = self.events_tx.clone();
        let generation = self.tasks.submit(TaskSlot::Zoom(pane), move |ctx| {
            if ctx.is_cancelled() {
                return;
            }
            match scale(&source, zoom, zoom, ScaleMethod::Auto) {
                Ok(image) if !ctx.is_cancelled() => {
                    let _ = tx.send(SessionEvent::Rescaled {
                        pane,
                        generation: ctx.generation(),
                        image,
                    });
                }
                Ok(_) => {}
                Err(e) => log::error!("rescaling {} pane failed: {}", pane, e),
            }
        })?;

        self.pane_mut(pane).pending = Some(generation);
        Ok(Some(generation))
    }

    /// The pane's image shrunk so neither side exceeds `max_size`.
    ///
    /// Returns `None` if the pane is empty.
    pub fn thumbnail(&self, pane: Pane, max_size: u32) -> SessionResult<Option<RasterImage>> {
        self.pane(pane)
            .source()
            .map(|source| scale_to_max_size(source, max_size))
            .transpose()
            .map_err(SessionError::from)
    }

    /// Apply every queued event without blocking.
    pub fn pump_events(&mut self) -> Vec<Delivery> {
        let mut delivered = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            delivered.push(self.deliver(event));
        }
        delivered
    }

    /// Wait up to `timeout` for one event and apply it.
    pub fn wait_for_event(&mut self, timeout: Duration) -> Option<Delivery> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(self.deliver(event)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Apply events until `done` holds or `timeout` elapses.
    ///
    /// Returns whether `done` held.
    pub fn wait_until(&mut self, timeout: Duration, mut done: impl FnMut(&Session) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while !done(self) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_event(remaining);
        }
        true
    }

    fn deliver(&mut self, event: SessionEvent) -> Delivery {
        let applied = self.tasks.is_current(&event.slot(), event.generation());
        if applied {
            self.apply_event(&event);
        } else {
            log::debug!("dropping stale event from generation {}", event.generation());
        }
        Delivery { event, applied }
    }

    fn apply_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Progress {
                image,
                iteration,
                total,
                ..
            } => {
                self.progress = Some((*iteration, *total));
                self.show_output(image.clone());
            }
            SessionEvent::Completed { image, .. } => {
                self.busy = false;
                self.show_output(image.clone());
            }
            SessionEvent::Cancelled { completed, .. } => {
                log::info!("run cancelled after {} passes", completed);
                self.busy = false;
            }
            SessionEvent::Rescaled { pane, image, .. } => {
                let view = self.pane_mut(*pane);
                view.rendered = Some(image.clone());
                view.pending = None;
            }
        }
    }

    fn show_output(&mut self, image: RasterImage) {
        self.output.source = Some(image);
        if let Err(e) = self.refresh_zoom(Pane::Output) {
            log::error!("could not refresh output pane: {}", e);
        }
    }

    /// Title and text of the About notice.
    pub fn about(&self) -> About {
        About {
            title: "About Image Filterer",
            text: format!(
                "{} {}\n{}\nLicensed under {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
                env!("CARGO_PKG_LICENSE"),
            ),
        }
    }

    /// Cancel all background work and mark the session finished.
    ///
    /// Waits (bounded) for the tasks to exit. Returns whether every task
    /// stopped within the timeout.
    pub fn quit(&mut self) -> bool {
        self.busy = false;
        self.quit = true;
        self.tasks.cancel_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_without_image() {
        let mut session = Session::default();
        assert!(matches!(
            session.apply(AverageMethod::Packed, 1),
            Err(SessionError::NoImage)
        ));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_save_without_output() {
        let session = Session::default();
        assert!(matches!(
            session.save("/tmp/never-written"),
            Err(SessionError::NoOutput)
        ));
    }

    #[test]
    fn test_set_zoom_validates() {
        let mut session = Session::default();
        assert!(session.set_zoom(Pane::Input, 2.0).is_ok());
        assert_eq!(session.pane(Pane::Input).zoom(), 2.0);
        assert!(matches!(
            session.set_zoom(Pane::Input, 0.0),
            Err(SessionError::InvalidZoom { .. })
        ));
        assert_eq!(session.pane(Pane::Input).zoom(), 2.0);
    }

    #[test]
    fn test_refresh_empty_pane_is_noop() {
        let mut session = Session::default();
        assert_eq!(session.refresh_zoom(Pane::Output).unwrap(), None);
        assert!(!session.pane(Pane::Output).is_rendering());
    }

    #[test]
    fn test_stale_event_is_ignored() {
        let mut session = Session::default();
        session
            .events_tx
            .send(SessionEvent::Completed {
                generation: 42,
                image: RasterImage::new(1, 1).unwrap(),
            })
            .unwrap();
        let delivered = session.pump_events();
        assert_eq!(delivered.len(), 1);
        assert!(!delivered[0].applied);
        assert!(session.output().is_none());
    }

    #[test]
    fn test_superseded_rescale_is_ignored() {
        let mut session = Session::default();
        session.output.source = Some(RasterImage::new(40, 30).unwrap());

        session.set_zoom(Pane::Output, 0.5).unwrap();
        let first = session.refresh_zoom(Pane::Output).unwrap().unwrap();
        session.set_zoom(Pane::Output, 3.0).unwrap();
        let second = session.refresh_zoom(Pane::Output).unwrap().unwrap();
        assert!(second > first);
        assert_eq!(session.pane(Pane::Output).pending, Some(second));

        let mut applied = Vec::new();
        while session.pane(Pane::Output).is_rendering() {
            let delivery = session
                .wait_for_event(Duration::from_secs(10))
                .expect("rescale event");
            if let SessionEvent::Rescaled { generation, .. } = delivery.event
                && delivery.applied
            {
                applied.push(generation);
            }
        }
        assert_eq!(applied, vec![second]);
        let dims = session.pane(Pane::Output).rendered().map(|p| p.dimensions());
        assert_eq!(dims, Some((120, 90)));

        // a late event from the first rescale changes nothing
        session
            .events_tx
            .send(SessionEvent::Rescaled {
                pane: Pane::Output,
                generation: first,
                image: RasterImage::new(20, 15).unwrap(),
            })
            .unwrap();
        let delivered = session.pump_events();
        assert!(delivered.iter().all(|d| !d.applied));
        let dims = session.pane(Pane::Output).rendered().map(|p| p.dimensions());
        assert_eq!(dims, Some((120, 90)));
    }

    #[test]
    fn test_oversized_render_rejected() {
        let mut session = Session::default();
        session.output.source = Some(RasterImage::new(2000, 2000).unwrap());
        assert!(matches!(
            session.set_zoom(Pane::Output, 32.0),
            Err(SessionError::RenderTooLarge { .. })
        ));
        assert_eq!(session.pane(Pane::Output).zoom(), 1.0);
        assert!(session.set_zoom(Pane::Output, 2.0).is_ok());
    }

    #[test]
    fn test_thumbnail() {
        let mut session = Session::default();
        assert!(session.thumbnail(Pane::Input, 32).unwrap().is_none());
        session.input.source = Some(RasterImage::new(64, 16).unwrap());
        let thumb = session.thumbnail(Pane::Input, 32).unwrap().unwrap();
        assert_eq!(thumb.dimensions(), (32, 8));
    }

    #[test]
    fn test_about() {
        let about = Session::default().about();
        assert_eq!(about.title, "About Image Filterer");
        assert!(about.text.contains("image-filterer"));
    }

    #[test]
    fn test_quit() {
        let mut session = Session::default();
        assert!(session.quit());
        assert!(session.has_quit());
    }
}
