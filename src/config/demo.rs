//! Synthetic demo city used by the binaries

/// Geographic bounding box in degrees (EPSG:4326)
pub struct DemoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// A demo clinic: (longitude, latitude, capacity)
pub type DemoClinic = (f64, f64, f64);

pub struct DemoConfig {
    pub city: &'static str,
    pub bounds: DemoBounds,
    /// Raster shape (rows, cols)
    pub shape: (usize, usize),
    /// Tract lattice laid over the bounds (rows, cols)
    pub zone_lattice: (usize, usize),
    pub clinics: &'static [DemoClinic],
    /// Existing parks as inclusive-exclusive cell windows (row0, row1, col0, col1)
    pub parks: &'static [(usize, usize, usize, usize)],
}

pub const DEMO: DemoConfig = DemoConfig {
    city: "demo",
    bounds: DemoBounds {
        west: -87.8,
        south: 41.8,
        east: -87.5,
        north: 42.1,
    },
    shape: (60, 60),
    zone_lattice: (6, 6),
    clinics: &[
        (-87.74, 42.05, 1200.0),
        (-87.62, 41.95, 1000.0),
        (-87.55, 41.86, 800.0),
        (-87.70, 41.84, 1000.0),
    ],
    parks: &[(5, 12, 8, 14), (35, 42, 30, 36)],
};
