//! Coordinate reference systems the core can move between without an
//! external projection library: geographic WGS84, spherical Web Mercator and
//! opaque planar frames (which only ever map onto themselves).

use {
    crate::error::{HcsError, Result},
    geo::{Coord, MapCoords},
    serde::{Deserialize, Serialize},
    std::{f64::consts::FRAC_PI_4, fmt, str::FromStr},
};

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Crs {
    /// EPSG:4326, degrees
    #[default]
    Wgs84,
    /// EPSG:3857, metres
    WebMercator,
    /// Any other projected frame, identified by EPSG code. Linear units assumed.
    Planar(u32),
}

impl Crs {
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => Self::Wgs84,
            3857 => Self::WebMercator,
            other => Self::Planar(other),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
            Self::Planar(code) => *code,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84)
    }

    /// The frame distances are measured in: geographic data goes to Web Mercator.
    pub fn planar_frame(&self) -> Crs {
        if self.is_geographic() {
            Self::WebMercator
        } else {
            *self
        }
    }

    pub fn transform_coord(self, to: Crs, c: Coord<f64>) -> Result<Coord<f64>> {
        match (self, to) {
            (from, to) if from == to => Ok(c),
            (Self::Wgs84, Self::WebMercator) => Ok(lonlat_to_mercator(c)),
            (Self::WebMercator, Self::Wgs84) => Ok(mercator_to_lonlat(c)),
            (from, to) => Err(HcsError::Configuration(format!(
                "no reprojection available from {} to {}",
                from, to
            ))),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = HcsError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s
            .trim()
            .to_ascii_uppercase()
            .strip_prefix("EPSG:")
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| HcsError::Configuration(format!("unrecognised CRS '{}'", s)))?;
        Ok(Self::from_epsg(code))
    }
}

fn lonlat_to_mercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    Coord {
        x: EARTH_RADIUS_M * c.x.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

fn mercator_to_lonlat(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees(),
    }
}

/// Reprojects any geo geometry between two supported frames.
pub fn reproject<G>(geometry: &G, from: Crs, to: Crs) -> Result<G>
where
    G: MapCoords<f64, f64, Output = G> + Clone,
{
    if from == to {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|c| from.transform_coord(to, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!("epsg:3857".parse::<Crs>().unwrap(), Crs::WebMercator);
        assert_eq!("EPSG:32616".parse::<Crs>().unwrap(), Crs::Planar(32616));
        assert!("WGS84".parse::<Crs>().is_err());
        assert_eq!(Crs::Planar(32616).to_string(), "EPSG:32616");
    }

    #[test]
    fn test_mercator_round_trip() {
        let p = Point::new(-87.63, 41.88);
        let m = reproject(&p, Crs::Wgs84, Crs::WebMercator).unwrap();
        // Chicago sits roughly 9.75e6 m west, 5.14e6 m north
        assert!((m.x() + 9_754_927.0).abs() < 1_000.0);
        assert!((m.y() - 5_143_021.0).abs() < 1_000.0);
        let back = reproject(&m, Crs::WebMercator, Crs::Wgs84).unwrap();
        assert!((back.x() - p.x()).abs() < 1e-9);
        assert!((back.y() - p.y()).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_reprojection() {
        let p = Point::new(1.0, 2.0);
        assert!(matches!(
            reproject(&p, Crs::Planar(32616), Crs::Wgs84),
            Err(HcsError::Configuration(_))
        ));
        assert_eq!(reproject(&p, Crs::Planar(1), Crs::Planar(1)).unwrap(), p);
    }
}
