//! Selection and playback for a forecast frame viewer.
//!
//! A [`Viewer`] owns the loaded manifest, the current selection
//! (cycle, variable, region, hour index) and the playback engine. UI
//! bindings call its mutation methods and subscribe to [`ViewerEvent`]s to
//! learn which frame to render.

pub mod config;
pub mod frames;
pub mod playback;
pub mod resolver;
pub mod selection;
pub mod ticker;
pub mod viewer;

pub use config::{ConfigError, ViewerConfig, DEFAULT_CONFIG_FILE};
pub use frames::FrameFetcher;
pub use playback::{PlaybackEngine, PlaybackState, StepPolicy};
pub use resolver::{Addressing, Frame, FrameResolver};
pub use selection::{Rejection, Selection, SelectionMachine};
pub use ticker::{IntervalTicker, ManualTicker, Tick, TickGate, Ticker};
pub use viewer::{Viewer, ViewerEvent, ViewerStatus};
