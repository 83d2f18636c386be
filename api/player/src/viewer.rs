use catalog::{Manifest, RegionOption};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::playback::{PlaybackEngine, PlaybackState};
use crate::resolver::{Frame, FrameResolver};
use crate::selection::{Rejection, Selection, SelectionMachine};
use crate::ticker::Ticker;

/// Notifications for whoever renders the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// A new frame should be loaded and shown.
    FrameResolved(Frame),
    /// The current frame failed to load while stopped.
    FrameUnavailable(Frame),
    /// The selection no longer names a frame (no region has data).
    FrameCleared,
    PlaybackChanged(PlaybackState),
    /// The manifest could not be loaded; nothing else will happen.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerStatus {
    Loading,
    Ready,
    Failed(String),
}

type Listener = Box<dyn FnMut(&ViewerEvent)>;

/// Owns the manifest, the selection and the playback engine. All methods run
/// on one event loop and complete before the next event is handled.
pub struct Viewer<T: Ticker> {
    status: ViewerStatus,
    selection: SelectionMachine,
    resolver: FrameResolver,
    playback: PlaybackEngine<T>,
    current: Option<Frame>,
    listeners: Vec<Listener>,
}

impl<T: Ticker> Viewer<T> {
    pub fn new(config: &ViewerConfig, ticker: T) -> Self {
        Self {
            status: ViewerStatus::Loading,
            selection: SelectionMachine::new(config.reset_hour_on_cycle_change),
            resolver: FrameResolver::new(config.addressing),
            playback: PlaybackEngine::new(ticker, config.step_policy, config.cadence()),
            current: None,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Apply the loaded manifest and show the default frame.
    pub fn load(&mut self, manifest: impl Into<Arc<Manifest>>) {
        if self.status != ViewerStatus::Loading {
            warn!("manifest already applied, ignoring reload");
            return;
        }
        let selection = self.selection.load(manifest.into());
        info!(
            "viewer ready: cycle {:?}, variable {:?}, region {:?}",
            selection.cycle, selection.variable, selection.region
        );
        self.status = ViewerStatus::Ready;
        self.refresh();
    }

    /// Startup failed for good: surface the error and stop responding.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("viewer unavailable: {}", message);
        self.playback.stop();
        self.current = None;
        self.status = ViewerStatus::Failed(message.clone());
        self.emit(ViewerEvent::Failed(message));
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ViewerStatus::Ready
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.selection.manifest().map(|m| m.as_ref())
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn ticker(&self) -> &T {
        self.playback.ticker()
    }

    /// Regions for the current variable, unavailable ones disabled.
    pub fn region_options(&self) -> Vec<RegionOption> {
        match (self.manifest(), self.selection().variable.as_deref()) {
            (Some(manifest), Some(variable)) => manifest.region_options(variable),
            _ => Vec::new(),
        }
    }

    pub fn set_cycle(&mut self, key: &str) -> Result<(), Rejection> {
        self.ensure_ready()?;
        self.selection.set_cycle(key).inspect_err(log_rejection)?;
        self.refresh();
        Ok(())
    }

    pub fn set_variable(&mut self, key: &str) -> Result<(), Rejection> {
        self.ensure_ready()?;
        self.selection.set_variable(key).inspect_err(log_rejection)?;
        self.refresh();
        Ok(())
    }

    pub fn set_region(&mut self, key: &str) -> Result<(), Rejection> {
        self.ensure_ready()?;
        self.selection.set_region(key).inspect_err(log_rejection)?;
        self.refresh();
        Ok(())
    }

    pub fn set_hour_index(&mut self, index: i64) -> Result<(), Rejection> {
        self.ensure_ready()?;
        self.selection.set_hour_index(index).inspect_err(log_rejection)?;
        self.refresh();
        Ok(())
    }

    /// Start playback, or stop it when already playing.
    pub fn play(&mut self) -> PlaybackState {
        if !self.is_ready() {
            return self.playback.state();
        }
        let state = self.playback.play();
        self.emit(ViewerEvent::PlaybackChanged(state));
        state
    }

    pub fn stop(&mut self) {
        if self.playback.is_playing() {
            self.playback.stop();
            self.emit(ViewerEvent::PlaybackChanged(PlaybackState::Stopped));
        }
    }

    /// Stop playback and go back to the first forecast hour.
    pub fn rewind(&mut self) -> Result<(), Rejection> {
        self.ensure_ready()?;
        self.stop();
        self.playback.rewind(&mut self.selection);
        self.refresh();
        Ok(())
    }

    /// Scheduled playback step. Returns whether the hour index moved.
    pub fn tick(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        match self.playback.tick(&mut self.selection) {
            Some(_) => {
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn frame_loaded(&mut self, locator: &str) {
        if self.is_current(locator) {
            self.playback.frame_loaded();
        }
    }

    /// The renderer could not load `locator`. While playing this skips
    /// ahead at once; while stopped the frame is only marked unavailable.
    /// Reports for frames that are no longer current are ignored.
    pub fn frame_failed(&mut self, locator: &str) {
        if !self.is_ready() || !self.is_current(locator) {
            debug!("stale failure report for {}", locator);
            return;
        }
        warn!("frame unavailable: {}", locator);

        if self.playback.is_playing() {
            if self.playback.frame_failed(&mut self.selection).is_some() {
                self.refresh();
                return;
            }
            if !self.playback.is_playing() {
                self.emit(ViewerEvent::PlaybackChanged(PlaybackState::Stopped));
            }
        }

        if let Some(frame) = self.current.clone() {
            self.emit(ViewerEvent::FrameUnavailable(frame));
        }
    }

    fn is_current(&self, locator: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|frame| frame.locator == locator)
    }

    fn ensure_ready(&self) -> Result<(), Rejection> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Rejection::NotReady)
        }
    }

    fn resolve_current(&self) -> Option<Frame> {
        let manifest = self.selection.manifest()?;
        let s = self.selection.selection();
        Some(self.resolver.resolve(
            manifest,
            s.cycle.as_deref()?,
            s.region.as_deref()?,
            s.variable.as_deref()?,
            s.hour_index,
        ))
    }

    fn refresh(&mut self) {
        self.current = self.resolve_current();
        match self.current.clone() {
            Some(frame) => {
                debug!("frame {} ({})", frame.locator, frame.caption);
                self.emit(ViewerEvent::FrameResolved(frame));
            }
            None => {
                debug!("selection {:?} names no frame", self.selection());
                self.emit(ViewerEvent::FrameCleared);
            }
        }
    }

    fn emit(&mut self, event: ViewerEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

fn log_rejection(rejection: &Rejection) {
    debug!("selection change rejected: {}", rejection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::ManualTicker;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MANIFEST: &str = r#"{
        "base_url": "assets",
        "latest_cycle": "20250126_00Z",
        "available_cycles": ["20250125_00Z", "20250126_00Z"],
        "variables": {"storm_surge": "Storm surge", "salinity": "Salinity"},
        "regions": {"plataforma": "Plataforma"},
        "availability": {"storm_surge": ["plataforma"]},
        "times_hours": [0, 3, 6, 9]
    }"#;

    fn recorded(viewer: &mut Viewer<ManualTicker>) -> Rc<RefCell<Vec<ViewerEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        viewer.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    fn config() -> ViewerConfig {
        ViewerConfig {
            step_policy: crate::playback::StepPolicy::Cyclic,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn load_emits_the_default_frame() {
        let mut viewer = Viewer::new(&config(), ManualTicker::new());
        let events = recorded(&mut viewer);
        viewer.load(Manifest::from_json(MANIFEST).unwrap());

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ViewerEvent::FrameResolved(frame) => {
                assert_eq!(frame.locator, "assets/20250126_00Z/plataforma/storm_surge/000h.png");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn each_successful_change_emits_one_frame() {
        let mut viewer = Viewer::new(&config(), ManualTicker::new());
        viewer.load(Manifest::from_json(MANIFEST).unwrap());
        let events = recorded(&mut viewer);

        viewer.set_hour_index(2).unwrap();
        viewer.set_cycle("20250125_00Z").unwrap();
        assert!(viewer.set_cycle("bogus").is_err());
        assert!(viewer.set_region("atlantis").is_err());

        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn variable_without_regions_clears_the_frame() {
        let mut viewer = Viewer::new(&config(), ManualTicker::new());
        viewer.load(Manifest::from_json(MANIFEST).unwrap());
        let events = recorded(&mut viewer);

        viewer.set_variable("salinity").unwrap();
        assert_eq!(viewer.current_frame(), None);
        assert_eq!(events.borrow().as_slice(), &[ViewerEvent::FrameCleared]);
        assert!(viewer.region_options().iter().all(|o| !o.enabled));
    }

    #[test]
    fn stale_failures_are_ignored() {
        let mut viewer = Viewer::new(&config(), ManualTicker::new());
        viewer.load(Manifest::from_json(MANIFEST).unwrap());
        let old = viewer.current_frame().unwrap().locator.clone();
        viewer.play();
        viewer.tick();

        viewer.frame_failed(&old);
        assert_eq!(viewer.selection().hour_index, 1);
    }

    #[test]
    fn failed_viewer_ignores_everything() {
        let mut viewer = Viewer::new(&config(), ManualTicker::new());
        let events = recorded(&mut viewer);
        viewer.fail("manifest unavailable");

        viewer.load(Manifest::from_json(MANIFEST).unwrap());
        assert_eq!(viewer.set_hour_index(1), Err(Rejection::NotReady));
        assert_eq!(viewer.play(), PlaybackState::Stopped);
        assert!(!viewer.tick());
        assert_eq!(
            viewer.status(),
            &ViewerStatus::Failed("manifest unavailable".into())
        );
        assert_eq!(
            events.borrow().as_slice(),
            &[ViewerEvent::Failed("manifest unavailable".into())]
        );
    }
}
