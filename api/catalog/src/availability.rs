use std::collections::BTreeSet;

use crate::manifest::Manifest;

/// A region as a menu would show it for the current variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOption {
    pub key: String,
    pub label: String,
    pub enabled: bool,
}

impl Manifest {
    /// Regions that have frames for `variable`. Undeclared variables and
    /// availability entries naming undeclared regions count as unavailable.
    pub fn allowed_regions(&self, variable: &str) -> BTreeSet<&str> {
        self.declared_availability(variable)
            .iter()
            .map(String::as_str)
            .filter(|region| self.regions().contains(region))
            .collect()
    }

    pub fn is_region_allowed(&self, variable: &str, region: &str) -> bool {
        self.regions().contains(region)
            && self
                .declared_availability(variable)
                .iter()
                .any(|r| r == region)
    }

    /// First allowed region in the manifest's declared region order.
    pub fn first_allowed_region(&self, variable: &str) -> Option<&str> {
        self.regions()
            .keys()
            .find(|region| self.is_region_allowed(variable, region))
    }

    /// Every declared region, flagged by whether `variable` has data there.
    pub fn region_options(&self, variable: &str) -> Vec<RegionOption> {
        self.regions()
            .iter()
            .map(|(key, label)| RegionOption {
                key: key.to_string(),
                label: label.to_string(),
                enabled: self.is_region_allowed(variable, key),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{
                "base_url": "assets",
                "available_cycles": ["20250126_00Z"],
                "variables": {"storm_surge": "Storm surge", "swh_dir": "SWH", "salinity": "Salinity"},
                "regions": {"plataforma": "Plataforma", "rio_de_la_plata": "Río de la Plata", "golfo_san_matias": "Golfo San Matías"},
                "availability": {
                    "storm_surge": ["rio_de_la_plata", "plataforma"],
                    "swh_dir": ["golfo_san_matias", "atlantis"],
                    "ghost_variable": ["plataforma"]
                },
                "times_hours": [0, 3]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn allowed_regions_match_declared_availability() {
        let m = manifest();
        let allowed: Vec<_> = m.allowed_regions("storm_surge").into_iter().collect();
        assert_eq!(allowed, vec!["plataforma", "rio_de_la_plata"]);
    }

    #[test]
    fn allowed_regions_are_always_declared_regions() {
        let m = manifest();
        for variable in m.variables().keys() {
            for region in m.allowed_regions(variable) {
                assert!(m.regions().contains(region), "{region} leaked for {variable}");
            }
        }
        assert!(!m.allowed_regions("swh_dir").contains("atlantis"));
    }

    #[test]
    fn undeclared_availability_is_empty() {
        let m = manifest();
        assert!(m.allowed_regions("salinity").is_empty());
        assert!(m.allowed_regions("no_such_variable").is_empty());
        assert_eq!(m.first_allowed_region("salinity"), None);
    }

    #[test]
    fn first_allowed_follows_region_declaration_order() {
        let m = manifest();
        // availability lists rio_de_la_plata first, regions declare plataforma first
        assert_eq!(m.first_allowed_region("storm_surge"), Some("plataforma"));
        assert_eq!(m.first_allowed_region("swh_dir"), Some("golfo_san_matias"));
    }

    #[test]
    fn region_options_flag_unavailable_regions() {
        let m = manifest();
        let options = m.region_options("swh_dir");
        assert_eq!(options.len(), 3);
        let enabled: Vec<_> = options
            .iter()
            .filter(|o| o.enabled)
            .map(|o| o.key.as_str())
            .collect();
        assert_eq!(enabled, vec!["golfo_san_matias"]);
        assert_eq!(options[1].label, "Río de la Plata");
    }
}
