use {
    super::crs::{Crs, reproject},
    crate::error::Result,
    geo::{Centroid, Point, Polygon},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub const VULNERABILITY_ATTRIBUTE: &str = "vulnerability";

/// A scoring unit (census tract, ward, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub geometry: Polygon<f64>,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl Zone {
    pub fn new(id: impl Into<String>, geometry: Polygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Social vulnerability in [0, 1]; absent or NaN reads as 0.
    pub fn vulnerability(&self) -> f64 {
        match self.attributes.get(VULNERABILITY_ATTRIBUTE) {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }
}

/// Zones sharing one coordinate reference system. Order is significant: every
/// per-zone output is index-aligned with `zones`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub crs: Crs,
    pub zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(crs: Crs, zones: Vec<Zone>) -> Self {
        Self { crs, zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.id.as_str())
    }

    pub fn vulnerabilities(&self) -> Vec<f64> {
        self.zones.iter().map(Zone::vulnerability).collect()
    }

    /// Centroids in the set's own CRS. `None` for degenerate (empty) polygons.
    pub fn centroids(&self) -> Vec<Option<Point<f64>>> {
        self.zones.iter().map(Zone::centroid).collect()
    }

    /// A copy of the set with every polygon moved into `to`.
    pub fn reprojected(&self, to: Crs) -> Result<ZoneSet> {
        if self.crs == to {
            return Ok(self.clone());
        }
        let zones = self
            .zones
            .iter()
            .map(|z| {
                Ok(Zone {
                    id: z.id.clone(),
                    geometry: reproject(&z.geometry, self.crs, to)?,
                    attributes: z.attributes.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ZoneSet::new(to, zones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(id: &str, x0: f64, y0: f64) -> Zone {
        Zone::new(
            id,
            polygon![(x: x0, y: y0), (x: x0 + 1.0, y: y0), (x: x0 + 1.0, y: y0 + 1.0), (x: x0, y: y0 + 1.0)],
        )
    }

    #[test]
    fn test_vulnerability_is_clamped() {
        assert_eq!(square("a", 0.0, 0.0).vulnerability(), 0.0);
        assert_eq!(square("b", 0.0, 0.0).with_attribute("vulnerability", 1.7).vulnerability(), 1.0);
        assert_eq!(square("c", 0.0, 0.0).with_attribute("vulnerability", -0.2).vulnerability(), 0.0);
        assert_eq!(square("d", 0.0, 0.0).with_attribute("vulnerability", f64::NAN).vulnerability(), 0.0);
        assert_eq!(square("e", 0.0, 0.0).with_attribute("vulnerability", 0.3).vulnerability(), 0.3);
    }

    #[test]
    fn test_centroids_and_reprojection() {
        let set = ZoneSet::new(Crs::Wgs84, vec![square("a", -87.7, 41.9)]);
        let c = set.centroids()[0].unwrap();
        assert!((c.x() + 87.2).abs() < 1e-9 && (c.y() - 42.4).abs() < 1e-9);

        let merc = set.reprojected(Crs::WebMercator).unwrap();
        assert_eq!(merc.crs, Crs::WebMercator);
        assert!(merc.centroids()[0].unwrap().x() < -9.0e6);
        assert!(set.reprojected(Crs::Planar(32616)).is_err());
    }
}
