//! Forecast dataset catalog: the manifest describing which cycles, variables,
//! regions and forecast hours exist, where the frames live, and which
//! regions have data for which variable.

mod availability;
mod error;
mod labels;
mod loader;
mod manifest;

pub use availability::RegionOption;
pub use error::{CatalogError, KeyKind};
pub use labels::{cycle_label, cycle_start, hour_label};
pub use loader::{ManifestLoader, ManifestSource};
pub use manifest::{LabelTable, Manifest, EMBEDDED_MANIFEST};
