use catalog::{cycle_start, Manifest};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// How frame locators are addressed in a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// `{base}/{cycle}/{region}/{variable}/{hour:03}h.png`
    #[default]
    Hourly,
    /// `{base}/{cycle}/{region}/{variable}/{YYYYMMDDTHHMMSSZ}.png`, the
    /// timestamp being the cycle start plus the forecast hour.
    Timestamped,
}

/// A resolved frame: where to load it from and how to title it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub locator: String,
    pub caption: String,
    pub hour_index: usize,
    pub hour: u32,
    /// Absolute UTC instant of the frame, when the cycle identifier parses.
    pub valid_time: Option<DateTime<Utc>>,
}

impl Frame {
    pub fn unavailable_caption(&self) -> String {
        format!("{} · Image unavailable", self.caption)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameResolver {
    addressing: Addressing,
}

impl FrameResolver {
    pub fn new(addressing: Addressing) -> Self {
        Self { addressing }
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Pure and deterministic. Keys are not checked against availability; an
    /// impossible combination just yields a locator that fails to load.
    pub fn resolve(
        &self,
        manifest: &Manifest,
        cycle: &str,
        region: &str,
        variable: &str,
        hour_index: usize,
    ) -> Frame {
        let hour = manifest.hour_at(hour_index).unwrap_or_else(|| {
            debug!("hour index {} out of range, using hour 0", hour_index);
            0
        });
        let valid_time = cycle_start(cycle)
            .and_then(|start| start.checked_add_signed(Duration::hours(i64::from(hour))));

        let token = match self.addressing {
            Addressing::Hourly => format!("{:03}h", hour),
            Addressing::Timestamped => match valid_time {
                Some(t) => t.format("%Y%m%dT%H%M%SZ").to_string(),
                None => {
                    debug!("no valid time for cycle {} at +{}h, using an offset token", cycle, hour);
                    format!("{}+{:03}h", cycle, hour)
                }
            },
        };

        let locator = format!(
            "{}/{}/{}/{}/{}.png",
            manifest.base_url(),
            cycle,
            region,
            variable,
            token
        );

        Frame {
            locator,
            caption: caption(manifest, region, variable, hour),
            hour_index,
            hour,
            valid_time,
        }
    }
}

fn caption(manifest: &Manifest, region: &str, variable: &str, hour: u32) -> String {
    let region_label = manifest.region_label(region).unwrap_or_else(|e| {
        debug!("{}, captioning with the raw key", e);
        region
    });
    let variable_label = manifest.variable_label(variable).unwrap_or_else(|e| {
        debug!("{}, captioning with the raw key", e);
        variable
    });
    format!("{} · {} · {:03} h", region_label, variable_label, hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{
                "base_url": "assets/",
                "latest_cycle": "20250126_00Z",
                "available_cycles": ["20250126_00Z"],
                "variables": {"swh_dir": "Altura de ola (SWH) + dirección"},
                "regions": {"golfo_san_matias": "Golfo San Matías"},
                "availability": {"swh_dir": ["golfo_san_matias"]},
                "times_hours": [0, 3, 6, 48, 54, 120]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn hourly_locator_pads_the_hour() {
        let m = manifest();
        let frame = FrameResolver::new(Addressing::Hourly).resolve(
            &m,
            "20250126_00Z",
            "golfo_san_matias",
            "swh_dir",
            1,
        );
        assert_eq!(
            frame.locator,
            "assets/20250126_00Z/golfo_san_matias/swh_dir/003h.png"
        );
        assert_eq!(
            frame.caption,
            "Golfo San Matías · Altura de ola (SWH) + dirección · 003 h"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let m = manifest();
        let resolver = FrameResolver::default();
        let a = resolver.resolve(&m, "20250126_00Z", "golfo_san_matias", "swh_dir", 0);
        let b = resolver.resolve(&m, "20250126_00Z", "golfo_san_matias", "swh_dir", 0);
        assert_eq!(a, b);
        assert_eq!(a.locator, "assets/20250126_00Z/golfo_san_matias/swh_dir/000h.png");
    }

    #[test]
    fn timestamped_locator_adds_the_hour_to_the_cycle_start() {
        let m = manifest();
        let frame = FrameResolver::new(Addressing::Timestamped).resolve(
            &m,
            "20250126_00Z",
            "golfo_san_matias",
            "swh_dir",
            4,
        );
        // 54 h after 2025-01-26 00Z
        assert_eq!(
            frame.locator,
            "assets/20250126_00Z/golfo_san_matias/swh_dir/20250128T060000Z.png"
        );
        assert_eq!(frame.hour, 54);
        assert!(frame.valid_time.is_some());
    }

    #[test]
    fn timestamped_locator_with_unparsable_cycle_still_resolves() {
        let m = manifest();
        let frame = FrameResolver::new(Addressing::Timestamped).resolve(
            &m,
            "latest",
            "golfo_san_matias",
            "swh_dir",
            2,
        );
        assert_eq!(
            frame.locator,
            "assets/latest/golfo_san_matias/swh_dir/latest+006h.png"
        );
        assert!(frame.valid_time.is_none());
    }

    #[test]
    fn timestamped_locator_past_the_calendar_falls_back_to_offset() {
        let m = Manifest::from_json(
            r#"{
                "base_url": "assets",
                "latest_cycle": "20250126_00Z",
                "variables": {"v": "V"},
                "regions": {"r": "R"},
                "times_hours": [0, 4294967295]
            }"#,
        )
        .unwrap();
        let frame = FrameResolver::new(Addressing::Timestamped).resolve(&m, "20250126_00Z", "r", "v", 1);
        assert!(frame.valid_time.is_none());
        assert_eq!(
            frame.locator,
            "assets/20250126_00Z/r/v/20250126_00Z+4294967295h.png"
        );
    }

    #[test]
    fn three_digit_hours_are_not_truncated() {
        let m = manifest();
        let frame = FrameResolver::default().resolve(&m, "20250126_00Z", "golfo_san_matias", "swh_dir", 5);
        assert!(frame.locator.ends_with("/120h.png"));
        assert!(frame.caption.ends_with("· 120 h"));
    }

    #[test]
    fn unknown_labels_fall_back_to_raw_keys() {
        let m = manifest();
        let frame = FrameResolver::default().resolve(&m, "20250126_00Z", "atlantis", "salinity", 0);
        assert_eq!(frame.caption, "atlantis · salinity · 000 h");
        assert_eq!(frame.locator, "assets/20250126_00Z/atlantis/salinity/000h.png");
    }

    #[test]
    fn out_of_range_index_uses_hour_zero() {
        let m = manifest();
        let frame = FrameResolver::default().resolve(&m, "20250126_00Z", "golfo_san_matias", "swh_dir", 99);
        assert_eq!(frame.hour, 0);
        assert!(frame.locator.ends_with("/000h.png"));
    }

    #[test]
    fn unavailable_caption_keeps_the_title() {
        let m = manifest();
        let frame = FrameResolver::default().resolve(&m, "20250126_00Z", "golfo_san_matias", "swh_dir", 0);
        assert_eq!(
            frame.unavailable_caption(),
            "Golfo San Matías · Altura de ola (SWH) + dirección · 000 h · Image unavailable"
        );
    }
}
