use crate::domain::{EpcRecord, UnitSpec};
use crate::evidence::normalize_address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorAreaSource {
    Explicit,
    Epc,
    Typical,
}

/// Typical flat sizes in sqft when neither the caller nor the EPC register
/// supplies an area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypicalFloorAreas {
    pub studio: f64,
    pub one_bed: f64,
    pub two_bed: f64,
    pub three_bed: f64,
    pub four_plus_bed: f64,
    pub unknown: f64,
}

impl Default for TypicalFloorAreas {
    fn default() -> Self {
        Self {
            studio: 350.0,
            one_bed: 500.0,
            two_bed: 650.0,
            three_bed: 850.0,
            four_plus_bed: 1100.0,
            unknown: 500.0,
        }
    }
}

impl TypicalFloorAreas {
    pub fn for_bedrooms(&self, bedrooms: Option<u8>) -> f64 {
        match bedrooms {
            Some(0) => self.studio,
            Some(1) => self.one_bed,
            Some(2) => self.two_bed,
            Some(3) => self.three_bed,
            Some(_) => self.four_plus_bed,
            None => self.unknown,
        }
    }
}

/// EPC certificate belonging to a unit: the record whose first address
/// segment names the unit, else the record at the unit's position.
pub(crate) fn epc_for_unit<'a>(
    unit: &UnitSpec,
    position: usize,
    epcs: &'a [EpcRecord],
) -> Option<&'a EpcRecord> {
    let unit_key = normalize_address(&unit.id);
    if !unit_key.is_empty() {
        let by_name = epcs.iter().find(|epc| {
            let first_segment = epc.address.split(',').next().unwrap_or_default();
            normalize_address(first_segment) == unit_key
        });
        if by_name.is_some() {
            return by_name;
        }
    }

    epcs.get(position)
}

pub(crate) fn resolve_floor_area(
    unit: &UnitSpec,
    epc: Option<&EpcRecord>,
    typical: &TypicalFloorAreas,
) -> (f64, FloorAreaSource) {
    if let Some(sqft) = unit.floor_area_sqft.filter(|sqft| sqft.is_finite() && *sqft > 0.0) {
        return (sqft, FloorAreaSource::Explicit);
    }

    if let Some(sqft) = epc.and_then(EpcRecord::floor_area_sqft) {
        return (sqft, FloorAreaSource::Epc);
    }

    (typical.for_bedrooms(unit.bedrooms), FloorAreaSource::Typical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, bedrooms: Option<u8>, floor_area_sqft: Option<f64>) -> UnitSpec {
        UnitSpec {
            id: id.to_string(),
            bedrooms,
            floor_area_sqft,
            energy_rating: None,
        }
    }

    fn epc(address: &str, floor_area_sqm: Option<f64>) -> EpcRecord {
        EpcRecord {
            address: address.to_string(),
            postcode: "PR9 0NP".to_string(),
            rating: None,
            floor_area_sqm,
        }
    }

    #[test]
    fn explicit_area_wins_over_epc() {
        let record = epc("Flat 1, 10 Lord Street", Some(40.0));
        let (area, source) = resolve_floor_area(
            &unit("Flat 1", Some(1), Some(520.0)),
            Some(&record),
            &TypicalFloorAreas::default(),
        );
        assert_eq!(area, 520.0);
        assert_eq!(source, FloorAreaSource::Explicit);
    }

    #[test]
    fn epc_area_is_converted_to_sqft() {
        let record = epc("Flat 1, 10 Lord Street", Some(50.0));
        let (area, source) = resolve_floor_area(
            &unit("Flat 1", Some(1), None),
            Some(&record),
            &TypicalFloorAreas::default(),
        );
        assert!((area - 538.2).abs() < 1e-9);
        assert_eq!(source, FloorAreaSource::Epc);
    }

    #[test]
    fn typical_area_follows_bedroom_count() {
        let typical = TypicalFloorAreas::default();
        assert_eq!(typical.for_bedrooms(Some(0)), 350.0);
        assert_eq!(typical.for_bedrooms(Some(2)), 650.0);
        assert_eq!(typical.for_bedrooms(Some(6)), 1100.0);

        let (area, source) = resolve_floor_area(&unit("Flat 3", None, Some(0.0)), None, &typical);
        assert_eq!(area, 500.0);
        assert_eq!(source, FloorAreaSource::Typical);
    }

    #[test]
    fn epc_matched_by_unit_name_before_position() {
        let records = vec![
            epc("Flat 2, 10 Lord Street", Some(55.0)),
            epc("Flat 1, 10 Lord Street", Some(45.0)),
        ];

        let matched = epc_for_unit(&unit("Flat 1", None, None), 0, &records).expect("match");
        assert_eq!(matched.floor_area_sqm, Some(45.0));

        let positional = epc_for_unit(&unit("Basement", None, None), 1, &records).expect("match");
        assert_eq!(positional.floor_area_sqm, Some(45.0));
        assert!(epc_for_unit(&unit("Basement", None, None), 5, &records).is_none());
    }
}
