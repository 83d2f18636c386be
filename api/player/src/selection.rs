use catalog::{KeyKind, Manifest};
use log::debug;
use std::sync::Arc;

/// The live selection. Only [`SelectionMachine`] mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub cycle: Option<String>,
    pub variable: Option<String>,
    pub region: Option<String>,
    pub hour_index: usize,
}

impl Selection {
    /// True when a frame can be resolved for this selection.
    pub fn is_complete(&self) -> bool {
        self.cycle.is_some() && self.variable.is_some() && self.region.is_some()
    }
}

/// Why a mutation was rejected. The selection is left untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("manifest not loaded")]
    NotReady,

    #[error("unknown {kind} key: {key}")]
    UnknownKey { kind: KeyKind, key: String },

    #[error("region {region} has no data for the selected variable")]
    RegionUnavailable { region: String },
}

/// Keeps cycle, variable, region and hour index consistent with the
/// manifest. Every operation either applies fully or is rejected.
#[derive(Debug, Clone)]
pub struct SelectionMachine {
    manifest: Option<Arc<Manifest>>,
    selection: Selection,
    reset_hour_on_cycle_change: bool,
}

impl SelectionMachine {
    pub fn new(reset_hour_on_cycle_change: bool) -> Self {
        Self {
            manifest: None,
            selection: Selection::default(),
            reset_hour_on_cycle_change,
        }
    }

    /// Leave the loading state and apply the default selection: latest
    /// cycle, first variable, its first allowed region, hour index 0.
    pub fn load(&mut self, manifest: Arc<Manifest>) -> &Selection {
        let variable = manifest.variables().first().map(str::to_string);
        let region = variable
            .as_deref()
            .and_then(|v| manifest.first_allowed_region(v))
            .map(str::to_string);

        self.selection = Selection {
            cycle: manifest.default_cycle().map(str::to_string),
            variable,
            region,
            hour_index: 0,
        };
        self.manifest = Some(manifest);
        debug!("default selection: {:?}", self.selection);
        &self.selection
    }

    pub fn is_ready(&self) -> bool {
        self.manifest.is_some()
    }

    pub fn manifest(&self) -> Option<&Arc<Manifest>> {
        self.manifest.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn resets_hour_on_cycle_change(&self) -> bool {
        self.reset_hour_on_cycle_change
    }

    fn ready_manifest(&self) -> Result<Arc<Manifest>, Rejection> {
        self.manifest.clone().ok_or(Rejection::NotReady)
    }

    pub fn set_cycle(&mut self, key: &str) -> Result<(), Rejection> {
        let manifest = self.ready_manifest()?;
        if !manifest.has_cycle(key) {
            return Err(Rejection::UnknownKey {
                kind: KeyKind::Cycle,
                key: key.to_string(),
            });
        }
        self.selection.cycle = Some(key.to_string());
        if self.reset_hour_on_cycle_change {
            self.selection.hour_index = 0;
        }
        Ok(())
    }

    /// Switches variable and re-picks the region when the current one has no
    /// data for it (first allowed in declared order, or none).
    pub fn set_variable(&mut self, key: &str) -> Result<(), Rejection> {
        let manifest = self.ready_manifest()?;
        if !manifest.variables().contains(key) {
            return Err(Rejection::UnknownKey {
                kind: KeyKind::Variable,
                key: key.to_string(),
            });
        }

        let keep_region = self
            .selection
            .region
            .as_deref()
            .is_some_and(|region| manifest.is_region_allowed(key, region));
        if !keep_region {
            let region = manifest.first_allowed_region(key).map(str::to_string);
            debug!(
                "region {:?} not available for {}, switching to {:?}",
                self.selection.region, key, region
            );
            self.selection.region = region;
        }
        self.selection.variable = Some(key.to_string());
        Ok(())
    }

    pub fn set_region(&mut self, key: &str) -> Result<(), Rejection> {
        let manifest = self.ready_manifest()?;
        if !manifest.regions().contains(key) {
            return Err(Rejection::UnknownKey {
                kind: KeyKind::Region,
                key: key.to_string(),
            });
        }
        let allowed = self
            .selection
            .variable
            .as_deref()
            .is_some_and(|variable| manifest.is_region_allowed(variable, key));
        if !allowed {
            return Err(Rejection::RegionUnavailable {
                region: key.to_string(),
            });
        }
        self.selection.region = Some(key.to_string());
        Ok(())
    }

    /// Clamps into `[0, len(hours) - 1]`; never rejects once ready.
    pub fn set_hour_index(&mut self, index: i64) -> Result<(), Rejection> {
        let manifest = self.ready_manifest()?;
        let last = manifest.last_hour_index();
        let clamped = index.clamp(0, last as i64) as usize;
        self.selection.hour_index = clamped;
        Ok(())
    }
}
