use {
    super::crs::Crs,
    crate::config::ACCESSIBILITY,
    geo::Point,
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_FACILITY_TYPE: &str = "healthcare_clinic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub location: Point<f64>,
    /// Positive attractiveness weight (beds, staff, visits per day)
    pub capacity: f64,
    pub facility_type: String,
}

impl Facility {
    pub fn new(location: Point<f64>, capacity: f64, facility_type: impl Into<String>) -> Self {
        Self {
            location,
            capacity,
            facility_type: facility_type.into(),
        }
    }

    /// A clinic with the default capacity.
    pub fn clinic(location: Point<f64>) -> Self {
        Self::new(location, ACCESSIBILITY.default_capacity, DEFAULT_FACILITY_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilitySet {
    pub crs: Crs,
    pub facilities: Vec<Facility>,
}

impl FacilitySet {
    pub fn new(crs: Crs, facilities: Vec<Facility>) -> Self {
        Self { crs, facilities }
    }

    pub fn empty(crs: Crs) -> Self {
        Self::new(crs, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn points(&self) -> Vec<Point<f64>> {
        self.facilities.iter().map(|f| f.location).collect()
    }

    pub fn capacities(&self) -> Vec<f64> {
        self.facilities.iter().map(|f| f.capacity).collect()
    }

    /// A copy of the set with one more facility. The new location is taken to be in `self.crs`.
    pub fn with_facility(&self, facility: Facility) -> FacilitySet {
        let mut next = self.clone();
        next.facilities.push(facility);
        next
    }
}
