use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use catalog::{cycle_label, hour_label, Manifest};
use player::{FrameFetcher, PlaybackState, Ticker, Viewer, ViewerConfig, ViewerEvent};
use slint::{ComponentHandle, ModelRc, SharedString, Timer, TimerMode, VecModel};

use crate::app::frames::request_frame;
use crate::app::utils::format_valid_time;
use crate::{MainWindow, MenuItem};

pub type SharedViewer = Rc<RefCell<Viewer<SlintTicker>>>;

/// Playback timer on the Slint event loop. Restarting a `slint::Timer`
/// replaces the running one, so there is never more than one.
pub struct SlintTicker {
    timer: Timer,
    viewer: Weak<RefCell<Viewer<SlintTicker>>>,
}

impl Ticker for SlintTicker {
    fn start(&mut self, cadence: Duration) {
        let viewer = self.viewer.clone();
        self.timer.start(TimerMode::Repeated, cadence, move || {
            if let Some(viewer) = viewer.upgrade() {
                match viewer.try_borrow_mut() {
                    Ok(mut viewer) => {
                        viewer.tick();
                    }
                    Err(_) => debug!("Viewer busy, playback tick skipped"),
                }
            }
        });
    }

    fn stop(&mut self) {
        self.timer.stop();
    }
}

pub fn build_viewer(main_window: &MainWindow, config: &ViewerConfig) -> SharedViewer {
    let viewer = Rc::new_cyclic(|weak| {
        let ticker = SlintTicker {
            timer: Timer::default(),
            viewer: weak.clone(),
        };
        RefCell::new(Viewer::new(config, ticker))
    });

    let fetcher = FrameFetcher::new(config.frames_root.clone());
    let window_weak = main_window.as_weak();
    viewer
        .borrow_mut()
        .subscribe(move |event| handle_viewer_event(&window_weak, &fetcher, event));

    viewer
}

// Listeners run while the viewer is borrowed: only touch the window here.
fn handle_viewer_event(
    window_weak: &slint::Weak<MainWindow>,
    fetcher: &FrameFetcher,
    event: &ViewerEvent,
) {
    let Some(window) = window_weak.upgrade() else {
        return;
    };

    match event {
        ViewerEvent::FrameResolved(frame) => {
            window.set_frame_locator(frame.locator.as_str().into());
            window.set_caption(frame.caption.as_str().into());
            window.set_hour_position(frame.hour_index as f32);
            window.set_hour_label(hour_label(frame.hour).into());
            let valid = frame.valid_time.map(format_valid_time).unwrap_or_default();
            window.set_valid_time(valid.into());
            request_frame(window_weak.clone(), fetcher.clone(), frame.locator.clone());
        }
        ViewerEvent::FrameUnavailable(frame) => {
            window.set_frame_image(slint::Image::default());
            window.set_caption(frame.unavailable_caption().into());
        }
        ViewerEvent::FrameCleared => {
            window.set_frame_locator(SharedString::default());
            window.set_frame_image(slint::Image::default());
            window.set_caption("No region has data for this variable".into());
            window.set_valid_time(SharedString::default());
        }
        ViewerEvent::PlaybackChanged(state) => {
            window.set_playing(*state == PlaybackState::Playing);
        }
        ViewerEvent::Failed(message) => {
            window.set_error_message(format!("Failed to load manifest: {}", message).into());
        }
    }
}

pub fn load_manifest(main_window: &MainWindow, viewer: &SharedViewer, manifest: Manifest) {
    let mut viewer = viewer.borrow_mut();
    viewer.load(manifest);
    sync_menus(main_window, &viewer);
}

/// Rebuild cycle, variable and region menus from the current selection.
pub fn sync_menus(main_window: &MainWindow, viewer: &Viewer<SlintTicker>) {
    let Some(manifest) = viewer.manifest() else {
        return;
    };
    let selection = viewer.selection();

    let cycles = manifest.cycles();
    let labels: Vec<SharedString> = cycles.iter().map(|c| cycle_label(c).into()).collect();
    main_window.set_cycle_labels(ModelRc::new(VecModel::from(labels)));
    let index = selection
        .cycle
        .as_deref()
        .and_then(|current| cycles.iter().position(|c| c == current))
        .unwrap_or(0);
    main_window.set_cycle_index(index as i32);
    // a single cycle needs no picker
    main_window.set_show_cycles(cycles.len() > 1);

    let variables: Vec<MenuItem> = manifest
        .variables()
        .iter()
        .map(|(key, label)| MenuItem {
            key: key.into(),
            label: label.into(),
            enabled: true,
            selected: selection.variable.as_deref() == Some(key),
        })
        .collect();
    main_window.set_variables(ModelRc::new(VecModel::from(variables)));

    let regions: Vec<MenuItem> = viewer
        .region_options()
        .into_iter()
        .map(|option| MenuItem {
            selected: selection.region.as_deref() == Some(option.key.as_str()),
            key: option.key.into(),
            label: option.label.into(),
            enabled: option.enabled,
        })
        .collect();
    main_window.set_regions(ModelRc::new(VecModel::from(regions)));

    main_window.set_hour_count(manifest.hours().len() as i32);
}

pub fn setup_viewer_callbacks(main_window: &MainWindow, viewer: &SharedViewer) {
    let v = viewer.clone();
    let w = main_window.as_weak();
    main_window.on_cycle_selected(move |index| {
        debug!("Cycle {} selected", index);
        let Some(window) = w.upgrade() else { return };
        let mut viewer = v.borrow_mut();
        let cycle = viewer
            .manifest()
            .and_then(|m| m.cycles().get(index.max(0) as usize).cloned());
        if let Some(cycle) = cycle {
            if let Err(e) = viewer.set_cycle(&cycle) {
                info!("Cycle change ignored: {}", e);
            }
        }
        sync_menus(&window, &viewer);
    });

    let v = viewer.clone();
    let w = main_window.as_weak();
    main_window.on_variable_selected(move |key| {
        debug!("Variable {} selected", key);
        let Some(window) = w.upgrade() else { return };
        let mut viewer = v.borrow_mut();
        if let Err(e) = viewer.set_variable(&key) {
            info!("Variable change ignored: {}", e);
        }
        sync_menus(&window, &viewer);
    });

    let v = viewer.clone();
    let w = main_window.as_weak();
    main_window.on_region_selected(move |key| {
        debug!("Region {} selected", key);
        let Some(window) = w.upgrade() else { return };
        let mut viewer = v.borrow_mut();
        if let Err(e) = viewer.set_region(&key) {
            info!("Region change ignored: {}", e);
        }
        sync_menus(&window, &viewer);
    });

    let v = viewer.clone();
    main_window.on_hour_changed(move |index| {
        let mut viewer = v.borrow_mut();
        if viewer.selection().hour_index as i64 == i64::from(index) {
            return;
        }
        if let Err(e) = viewer.set_hour_index(i64::from(index)) {
            info!("Hour change ignored: {}", e);
        }
    });

    let v = viewer.clone();
    main_window.on_play_toggled(move || {
        let state = v.borrow_mut().play();
        info!("Playback {:?}", state);
    });

    let v = viewer.clone();
    main_window.on_rewind(move || {
        if let Err(e) = v.borrow_mut().rewind() {
            info!("Rewind ignored: {}", e);
        }
    });

    let v = viewer.clone();
    main_window.on_frame_loaded(move |locator| {
        v.borrow_mut().frame_loaded(&locator);
    });

    let v = viewer.clone();
    main_window.on_frame_failed(move |locator| {
        v.borrow_mut().frame_failed(&locator);
    });
}

