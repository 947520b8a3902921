use {
    geo::Geometry,
    serde::{Deserialize, Serialize},
    std::ops::{Add, AddAssign, Neg},
    strum_macros::{AsRefStr, Display, EnumIter, EnumString},
};

/// The fixed set of interventions the catalog knows about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    AddPark,
    AddTrees,
    CoolRoof,
    AddClinic,
    EvZone,
    GreenInfrastructure,
}

/// Broad geometry family an action expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Family of a concrete geometry. Collections have none.
    pub fn of(geometry: &Geometry<f64>) -> Option<GeometryKind> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(Self::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(Self::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(Self::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TemperatureEffect {
    None,
    Direct(f64),
    /// Response scaled by the vegetation change, plus an optional direct offset
    VegetationFactor { factor: f64, direct: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PollutantEffect {
    None,
    Direct(f64),
    /// Change expressed in city standard deviations
    ZScore(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum HealthcareEffect {
    None,
    Fixed(f64),
    RecomputeAccessibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectProfile {
    pub vegetation_delta: f64,
    pub temperature: TemperatureEffect,
    pub pollutant: PollutantEffect,
    pub healthcare: HealthcareEffect,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterventionDefinition {
    pub kind: InterventionKind,
    pub description: &'static str,
    pub requires_geometry: bool,
    pub geometry_kind: GeometryKind,
    pub effects: EffectProfile,
    /// Facility-adding kinds only
    pub default_capacity: Option<f64>,
    pub facility_type: Option<&'static str>,
}

/// A parsed, typed action. Every variant may carry a geometry; clinics also
/// carry their capacity and type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterventionAction {
    AddPark {
        geometry: Option<Geometry<f64>>,
    },
    AddTrees {
        geometry: Option<Geometry<f64>>,
    },
    CoolRoof {
        geometry: Option<Geometry<f64>>,
    },
    AddClinic {
        geometry: Option<Geometry<f64>>,
        capacity: f64,
        facility_type: String,
    },
    EvZone {
        geometry: Option<Geometry<f64>>,
    },
    GreenInfrastructure {
        geometry: Option<Geometry<f64>>,
    },
}

impl InterventionAction {
    pub fn kind(&self) -> InterventionKind {
        match self {
            Self::AddPark { .. } => InterventionKind::AddPark,
            Self::AddTrees { .. } => InterventionKind::AddTrees,
            Self::CoolRoof { .. } => InterventionKind::CoolRoof,
            Self::AddClinic { .. } => InterventionKind::AddClinic,
            Self::EvZone { .. } => InterventionKind::EvZone,
            Self::GreenInfrastructure { .. } => InterventionKind::GreenInfrastructure,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        match self {
            Self::AddPark { geometry }
            | Self::AddTrees { geometry }
            | Self::CoolRoof { geometry }
            | Self::AddClinic { geometry, .. }
            | Self::EvZone { geometry }
            | Self::GreenInfrastructure { geometry } => geometry.as_ref(),
        }
    }
}

/// Loosely typed action as it arrives from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry<f64>>,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub facility_type: Option<String>,
}

impl ActionRequest {
    pub fn new(kind: impl Into<String>, geometry: Option<Geometry<f64>>) -> Self {
        Self {
            kind: kind.into(),
            geometry,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Change to a zone's aggregated layer values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDeltas {
    pub vegetation: f64,
    pub temperature: f64,
    pub pollutant: f64,
    pub accessibility: f64,
}

impl LayerDeltas {
    pub fn is_zero(&self) -> bool {
        self.vegetation == 0.0
            && self.temperature == 0.0
            && self.pollutant == 0.0
            && self.accessibility == 0.0
    }
}

impl Neg for LayerDeltas {
    type Output = LayerDeltas;

    fn neg(self) -> LayerDeltas {
        LayerDeltas {
            vegetation: -self.vegetation,
            temperature: -self.temperature,
            pollutant: -self.pollutant,
            accessibility: -self.accessibility,
        }
    }
}

impl Add for LayerDeltas {
    type Output = LayerDeltas;

    fn add(self, rhs: LayerDeltas) -> LayerDeltas {
        LayerDeltas {
            vegetation: self.vegetation + rhs.vegetation,
            temperature: self.temperature + rhs.temperature,
            pollutant: self.pollutant + rhs.pollutant,
            accessibility: self.accessibility + rhs.accessibility,
        }
    }
}

impl AddAssign for LayerDeltas {
    fn add_assign(&mut self, rhs: LayerDeltas) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, line_string, polygon};

    #[test]
    fn test_kind_names() {
        assert_eq!(InterventionKind::GreenInfrastructure.to_string(), "green_infrastructure");
        assert_eq!("add_clinic".parse::<InterventionKind>().unwrap(), InterventionKind::AddClinic);
        assert!("add_hospital".parse::<InterventionKind>().is_err());
    }

    #[test]
    fn test_geometry_kind_of() {
        let pt: Geometry<f64> = Point::new(0.0, 0.0).into();
        let ls: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into();
        let poly: Geometry<f64> = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)].into();
        assert_eq!(GeometryKind::of(&pt), Some(GeometryKind::Point));
        assert_eq!(GeometryKind::of(&ls), Some(GeometryKind::Line));
        assert_eq!(GeometryKind::of(&poly), Some(GeometryKind::Polygon));
    }

    #[test]
    fn test_delta_negation_cancels() {
        let d = LayerDeltas {
            vegetation: 0.08,
            temperature: -1.2,
            pollutant: -0.003,
            accessibility: 4.0,
        };
        assert!((d + -d).is_zero());
    }
}
