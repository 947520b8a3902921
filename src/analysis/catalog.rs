//! Registry of the interventions the simulator can apply, and the rules that
//! turn their declared effects into layer deltas.

use {
    crate::{
        config::SIMULATION,
        domain::{DEFAULT_FACILITY_TYPE, Layer},
        error::{HcsError, Result},
        models::{
            ActionRequest, CityStatistics, EffectProfile, GeometryKind, HealthcareEffect,
            InterventionAction, InterventionDefinition, InterventionKind, LayerDeltas,
            PollutantEffect, TemperatureEffect, ValidationReport,
        },
    },
    std::str::FromStr,
};

pub const CATALOG: [InterventionDefinition; 6] = [
    InterventionDefinition {
        kind: InterventionKind::AddPark,
        description: "Add a new park or green space",
        requires_geometry: true,
        geometry_kind: GeometryKind::Polygon,
        effects: EffectProfile {
            vegetation_delta: 0.08,
            temperature: TemperatureEffect::VegetationFactor {
                factor: -0.6,
                direct: 0.0,
            },
            pollutant: PollutantEffect::Direct(0.0),
            healthcare: HealthcareEffect::None,
        },
        default_capacity: None,
        facility_type: None,
    },
    InterventionDefinition {
        kind: InterventionKind::AddTrees,
        description: "Plant trees along streets or in areas",
        requires_geometry: true,
        geometry_kind: GeometryKind::Line,
        effects: EffectProfile {
            vegetation_delta: 0.04,
            temperature: TemperatureEffect::VegetationFactor {
                factor: -0.3,
                direct: 0.0,
            },
            pollutant: PollutantEffect::Direct(-0.05),
            healthcare: HealthcareEffect::None,
        },
        default_capacity: None,
        facility_type: None,
    },
    InterventionDefinition {
        kind: InterventionKind::CoolRoof,
        description: "Install cool roof technology",
        requires_geometry: true,
        geometry_kind: GeometryKind::Polygon,
        effects: EffectProfile {
            vegetation_delta: 0.0,
            temperature: TemperatureEffect::Direct(-0.8),
            pollutant: PollutantEffect::Direct(0.0),
            healthcare: HealthcareEffect::None,
        },
        default_capacity: None,
        facility_type: None,
    },
    InterventionDefinition {
        kind: InterventionKind::AddClinic,
        description: "Add a new healthcare clinic",
        requires_geometry: true,
        geometry_kind: GeometryKind::Point,
        effects: EffectProfile {
            vegetation_delta: 0.0,
            temperature: TemperatureEffect::Direct(0.0),
            pollutant: PollutantEffect::Direct(0.0),
            healthcare: HealthcareEffect::RecomputeAccessibility,
        },
        default_capacity: Some(1000.0),
        facility_type: Some(DEFAULT_FACILITY_TYPE),
    },
    InterventionDefinition {
        kind: InterventionKind::EvZone,
        description: "Establish electric vehicle only zone",
        requires_geometry: true,
        geometry_kind: GeometryKind::Polygon,
        effects: EffectProfile {
            vegetation_delta: 0.0,
            temperature: TemperatureEffect::Direct(0.0),
            pollutant: PollutantEffect::ZScore(-0.3),
            healthcare: HealthcareEffect::None,
        },
        default_capacity: None,
        facility_type: None,
    },
    InterventionDefinition {
        kind: InterventionKind::GreenInfrastructure,
        description: "Install rain gardens, bioswales, etc.",
        requires_geometry: true,
        geometry_kind: GeometryKind::Polygon,
        effects: EffectProfile {
            vegetation_delta: 0.03,
            temperature: TemperatureEffect::VegetationFactor {
                factor: -0.2,
                direct: 0.0,
            },
            pollutant: PollutantEffect::Direct(-0.02),
            healthcare: HealthcareEffect::None,
        },
        default_capacity: None,
        facility_type: None,
    },
];

pub fn definition(kind: InterventionKind) -> &'static InterventionDefinition {
    // The catalog covers every kind, in declaration order.
    &CATALOG[kind as usize]
}

/// Catalog entry by its wire name. Unknown names are a configuration error.
pub fn lookup(name: &str) -> Result<&'static InterventionDefinition> {
    InterventionKind::from_str(name)
        .map(definition)
        .map_err(|_| HcsError::Configuration(format!("unknown intervention kind '{}'", name)))
}

/// Checks a request against its catalog entry.
///
/// Only an unknown kind is an `Err`; everything else is reported: missing
/// geometry and bad clinic capacity make the report invalid, a geometry of the
/// wrong family only adds a warning.
pub fn validate(request: &ActionRequest) -> Result<ValidationReport> {
    let def = lookup(&request.kind)?;
    let mut report = ValidationReport {
        valid: true,
        ..Default::default()
    };

    match &request.geometry {
        None if def.requires_geometry => {
            report.errors.push(format!("{} requires input geometry", def.kind));
        }
        None => {}
        Some(geometry) => match GeometryKind::of(geometry) {
            Some(found) if found == def.geometry_kind => {}
            found => report.warnings.push(format!(
                "expected {} geometry, got {}",
                def.geometry_kind,
                found.map_or_else(|| "collection".to_string(), |k| k.to_string())
            )),
        },
    }

    if let Some(capacity) = request.capacity {
        if def.default_capacity.is_none() {
            report
                .warnings
                .push(format!("capacity is ignored for {}", def.kind));
        } else if !capacity.is_finite() || capacity <= 0.0 {
            report
                .errors
                .push(format!("capacity must be a positive number, got {}", capacity));
        }
    }

    report.valid = report.errors.is_empty();
    Ok(report)
}

/// Validates and converts a loose request into a typed action.
pub fn parse_action(request: &ActionRequest) -> Result<(InterventionAction, ValidationReport)> {
    let report = validate(request)?;
    if !report.valid {
        return Err(HcsError::Validation(report.errors.join("; ")));
    }

    let def = lookup(&request.kind)?;
    let geometry = request.geometry.clone();
    let action = match def.kind {
        InterventionKind::AddPark => InterventionAction::AddPark { geometry },
        InterventionKind::AddTrees => InterventionAction::AddTrees { geometry },
        InterventionKind::CoolRoof => InterventionAction::CoolRoof { geometry },
        InterventionKind::AddClinic => InterventionAction::AddClinic {
            geometry,
            capacity: request
                .capacity
                .or(def.default_capacity)
                .unwrap_or(crate::config::ACCESSIBILITY.default_capacity),
            facility_type: request
                .facility_type
                .clone()
                .unwrap_or_else(|| def.facility_type.unwrap_or(DEFAULT_FACILITY_TYPE).to_string()),
        },
        InterventionKind::EvZone => InterventionAction::EvZone { geometry },
        InterventionKind::GreenInfrastructure => InterventionAction::GreenInfrastructure { geometry },
    };
    Ok((action, report))
}

/// Raster-layer deltas implied by a catalog entry.
///
/// Vegetation-factor temperature: `factor * (Δveg / 0.1) * std(temperature) + direct`.
/// Z-score pollutant: `z * std(pollutant)`. Either rule without cached
/// statistics for its layer is `DataUnavailable`. The recompute-accessibility
/// effect contributes 0 here; the simulator fills it in per zone.
pub fn derive_deltas(def: &InterventionDefinition, stats: &CityStatistics) -> Result<LayerDeltas> {
    let effects = &def.effects;
    let vegetation = effects.vegetation_delta;

    let temperature = match effects.temperature {
        TemperatureEffect::None => 0.0,
        TemperatureEffect::Direct(delta) => delta,
        TemperatureEffect::VegetationFactor { factor, direct } => {
            let std = stats.require_std(Layer::Temperature)?;
            factor * (vegetation / SIMULATION.zone.vegetation_reference_delta) * std + direct
        }
    };

    let pollutant = match effects.pollutant {
        PollutantEffect::None => 0.0,
        PollutantEffect::Direct(delta) => delta,
        PollutantEffect::ZScore(z) => z * stats.require_std(Layer::Pollutant)?,
    };

    let accessibility = match effects.healthcare {
        HealthcareEffect::Fixed(delta) => delta,
        HealthcareEffect::None | HealthcareEffect::RecomputeAccessibility => 0.0,
    };

    Ok(LayerDeltas {
        vegetation,
        temperature,
        pollutant,
        accessibility,
    })
}
