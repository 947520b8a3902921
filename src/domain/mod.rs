// Domain types and value objects
mod crs;
mod facility;
mod grid;
mod layer;
mod zone;

pub use crs::{Crs, reproject};
pub use facility::{DEFAULT_FACILITY_TYPE, Facility, FacilitySet};
pub use grid::{GeoTransform, Grid, Mask};
pub use layer::Layer;
pub use zone::{VULNERABILITY_ATTRIBUTE, Zone, ZoneSet};
