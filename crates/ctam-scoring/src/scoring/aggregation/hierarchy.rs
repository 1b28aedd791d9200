use super::AreaSummary;
use crate::scoring::domain::{OrgUnit, Province, Region, UnitId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Regions, provinces and the units located in them.
#[derive(Debug, Clone, Default)]
pub struct OrganizationDirectory {
    regions: Vec<Region>,
    provinces: Vec<Province>,
    units: Vec<OrgUnit>,
}

impl OrganizationDirectory {
    pub fn new(regions: Vec<Region>, provinces: Vec<Province>, units: Vec<OrgUnit>) -> Self {
        Self {
            regions,
            provinces,
            units,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn units(&self) -> &[OrgUnit] {
        &self.units
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.code == code)
    }

    pub fn province(&self, code: &str) -> Option<&Province> {
        self.provinces.iter().find(|province| province.code == code)
    }

    pub fn unit(&self, id: &UnitId) -> Option<&OrgUnit> {
        self.units.iter().find(|unit| &unit.id == id)
    }

    pub fn units_in_province(&self, province_code: &str) -> Vec<&OrgUnit> {
        self.units
            .iter()
            .filter(|unit| unit.province_code == province_code)
            .collect()
    }

    pub fn province_units(&self, province: &Province) -> ProvinceUnits {
        ProvinceUnits {
            province: province.clone(),
            unit_ids: self
                .units_in_province(&province.code)
                .into_iter()
                .map(|unit| unit.id.clone())
                .collect(),
        }
    }

    pub fn region_units(&self, region: &Region) -> RegionUnits {
        let provinces = self
            .provinces
            .iter()
            .filter(|province| province.region_code == region.code)
            .map(|province| self.province_units(province))
            .collect();

        RegionUnits {
            region: region.clone(),
            provinces,
        }
    }

    /// Every region with its provinces and units, in directory order.
    pub fn region_tree(&self) -> Vec<RegionUnits> {
        let tree: Vec<RegionUnits> = self
            .regions
            .iter()
            .map(|region| self.region_units(region))
            .collect();

        let placed: usize = tree.iter().map(|region| region.unit_ids().len()).sum();
        if placed < self.units.len() {
            debug!(
                orphaned = self.units.len() - placed,
                "units without a known province/region are left out of roll-ups"
            );
        }

        tree
    }

    /// Narrows the directory to units the caller may see.
    ///
    /// Regions and provinces are kept so empty areas still show up.
    pub fn restrict_to(&self, visible: &HashSet<UnitId>) -> Self {
        Self {
            regions: self.regions.clone(),
            provinces: self.provinces.clone(),
            units: self
                .units
                .iter()
                .filter(|unit| visible.contains(&unit.id))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProvinceUnits {
    pub province: Province,
    pub unit_ids: Vec<UnitId>,
}

#[derive(Debug, Clone)]
pub struct RegionUnits {
    pub region: Region,
    pub provinces: Vec<ProvinceUnits>,
}

impl RegionUnits {
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.provinces
            .iter()
            .flat_map(|province| province.unit_ids.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceReport {
    pub province: Province,
    pub summary: AreaSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: Region,
    pub summary: AreaSummary,
    pub provinces: Vec<ProvinceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountryReport {
    pub summary: AreaSummary,
    pub regions: Vec<RegionReport>,
}

/// Aggregates each province and then the region's combined unit set.
///
/// Percentages are not additive, so the region summary is recomputed over the
/// union of its provinces' units rather than merged from province results.
pub fn roll_up_region<F>(region: &RegionUnits, aggregate: F) -> RegionReport
where
    F: Fn(&[UnitId]) -> AreaSummary,
{
    let provinces = region
        .provinces
        .iter()
        .map(|province| ProvinceReport {
            province: province.province.clone(),
            summary: aggregate(&province.unit_ids),
        })
        .collect();

    RegionReport {
        region: region.region.clone(),
        summary: aggregate(&region.unit_ids()),
        provinces,
    }
}

pub fn roll_up_country<F>(regions: &[RegionUnits], aggregate: F) -> CountryReport
where
    F: Fn(&[UnitId]) -> AreaSummary,
{
    let reports = regions
        .iter()
        .map(|region| roll_up_region(region, &aggregate))
        .collect();

    let all_units: Vec<UnitId> = regions.iter().flat_map(RegionUnits::unit_ids).collect();

    CountryReport {
        summary: aggregate(&all_units),
        regions: reports,
    }
}
