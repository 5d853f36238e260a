use serde::{Deserialize, Serialize};

use crate::resolution::FINEST_RESOLUTION;

/// Resource yields of one grid cell, as served by the info endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub wood: f64,
    #[serde(default)]
    pub ore: f64,
}

impl ResourceInfo {
    pub fn is_empty(&self) -> bool {
        self.gold == 0.0 && self.wood == 0.0 && self.ore == 0.0
    }

    /// Deterministic yields for a cell that has no stored record.
    ///
    /// Derived from a CRC32 of `"{resolution}/{cell_id}"`, scaled by 7 per level
    /// coarser than the finest resolution (an H3 parent covers ~7 children).
    pub fn seeded(resolution: u8, cell_id: &str) -> Self {
        let hash = crc32fast::hash(format!("{resolution}/{cell_id}").as_bytes());
        let bytes = hash.to_be_bytes();
        let levels = i32::from(FINEST_RESOLUTION.saturating_sub(resolution));
        let scale = 7f64.powi(levels);
        Self {
            gold: f64::from(bytes[0] % 50) * scale,
            wood: f64::from(bytes[1]) * scale,
            ore: f64::from(bytes[2] % 120) * scale,
        }
    }
}

/// One entry of the `/api/polygons` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonRecord {
    #[serde(alias = "cellId", alias = "cell_id", alias = "h3")]
    pub id: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u8>,
}

/// Format an amount for compact display (e.g. 9000 -> "9.0k").
pub fn format_amount(val: f64) -> String {
    let abs = val.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", val / 1_000_000.0)
    } else if abs >= 1000.0 {
        format!("{:.1}k", val / 1000.0)
    } else if val.fract() == 0.0 {
        format!("{}", val as i64)
    } else {
        format!("{val:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_float_payloads() {
        let info: ResourceInfo =
            serde_json::from_str(r#"{"gold": 12, "wood": 3.5, "ore": 0}"#).expect("parse info");
        assert_eq!(
            info,
            ResourceInfo {
                gold: 12.0,
                wood: 3.5,
                ore: 0.0
            }
        );
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let info: ResourceInfo = serde_json::from_str(r#"{"gold": 4}"#).expect("parse info");
        assert_eq!(info.wood, 0.0);
        assert_eq!(info.ore, 0.0);
        assert!(!info.is_empty());
        assert!(ResourceInfo::default().is_empty());
    }

    #[test]
    fn seeded_is_deterministic_and_scales_with_coarseness() {
        let a = ResourceInfo::seeded(10, "8a1f05a0aa5ffff");
        let b = ResourceInfo::seeded(10, "8a1f05a0aa5ffff");
        assert_eq!(a, b);

        let fine = ResourceInfo::seeded(10, "abc");
        assert!(fine.gold < 50.0);
        assert!(fine.ore < 120.0);
        assert!(fine.wood <= 255.0);

        let coarse = ResourceInfo::seeded(9, "abc");
        assert_eq!(coarse.gold % 7.0, 0.0);
        assert_eq!(coarse.wood % 7.0, 0.0);
    }

    #[test]
    fn polygon_record_accepts_alias_fields() {
        let records: Vec<PolygonRecord> = serde_json::from_str(
            r#"[{"id": "a"}, {"cellId": "b", "resolution": 7}, {"h3": "c"}]"#,
        )
        .expect("parse records");
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(records[1].resolution, Some(7));
    }

    #[test]
    fn polygon_record_omits_missing_resolution() {
        let json = serde_json::to_string(&PolygonRecord {
            id: "a".into(),
            resolution: None,
        })
        .expect("serialize record");
        assert_eq!(json, r#"{"id":"a"}"#);
    }

    #[test]
    fn formats_amounts_compactly() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(42.0), "42");
        assert_eq!(format_amount(3.7), "3.7");
        assert_eq!(format_amount(9000.0), "9.0k");
        assert_eq!(format_amount(2_460_000.0), "2.5M");
    }
}
