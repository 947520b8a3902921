use {
    super::context::CityContext,
    crate::{
        analysis::{StatisticsNormalizer, apply_zone_deltas, parse_action},
        config::{DF, SCORING, SIMULATION},
        error::Result,
        models::{
            ActionImpact, ActionRequest, AggregateSimulationResponse, LayerDeltas, RejectedAction,
            ZoneScorePoint,
        },
    },
    std::collections::{BTreeMap, HashMap},
};

/// Applies several zone-scoped actions to the city's baseline table.
///
/// Each request is validated and applied on its own; a rejected request is
/// reported and the rest still run. Accepted actions add their deltas to the
/// zones they touch, and the touched zones are rescored once at the end.
pub fn simulate_actions(ctx: &CityContext, requests: &[ActionRequest]) -> Result<AggregateSimulationResponse> {
    let baseline = ctx.score_zones()?;
    let zones = ctx.zones()?;
    let simulator = ctx.zone_simulator()?;
    let index_of: HashMap<&str, usize> = zones.ids().enumerate().map(|(i, id)| (id, i)).collect();

    let mut impacts = Vec::new();
    let mut rejected = Vec::new();
    let mut cumulative: BTreeMap<usize, LayerDeltas> = BTreeMap::new();

    for (i, request) in requests.iter().enumerate() {
        let action_index = i + 1;
        let outcome = parse_action(request).and_then(|(action, _)| simulator.apply(&action, &baseline));
        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                if DF.log_scenario {
                    log::info!("Action {} ({}) rejected: {}", action_index, request.kind, e);
                }
                rejected.push(RejectedAction {
                    action_index,
                    kind: request.kind.clone(),
                    errors: vec![e.to_string()],
                });
                continue;
            }
        };

        for change in &report.changes {
            if let Some(&zone) = index_of.get(change.zone_id.as_str()) {
                *cumulative.entry(zone).or_default() += change.deltas;
            }
        }

        impacts.push(ActionImpact {
            action_index,
            kind: report.kind,
            description: report.description.clone(),
            affected_zone_count: report.affected_count(),
            estimated_delta_range: report.estimated_delta_range,
            layer_deltas: report.layer_deltas,
            healthcare_effect: report.healthcare_effect.clone(),
            warnings: report.warnings.clone(),
        });
    }

    let indices: Vec<usize> = cumulative.keys().copied().collect();
    let deltas: Vec<LayerDeltas> = cumulative.values().copied().collect();
    let before: Vec<_> = indices.iter().map(|&i| baseline[i].clone()).collect();
    let stats = ctx.statistics()?;
    let after = apply_zone_deltas(
        &before,
        zones,
        &indices,
        &deltas,
        &StatisticsNormalizer::new(stats),
        &SCORING.zone,
    );

    let point = |zone_id: &str, hcs: f64| ZoneScorePoint {
        zone_id: zone_id.to_string(),
        hcs,
    };
    let delta: Vec<ZoneScorePoint> = before
        .iter()
        .zip(&after)
        .map(|(b, a)| point(&b.id, a.hcs - b.hcs))
        .collect();
    let total_hcs_delta = delta.iter().map(|d| d.hcs).sum();

    let c = SIMULATION.confidence;
    let confidence = (c.base + c.per_zone * indices.len() as f64).min(c.cap);

    if DF.log_scenario {
        log::info!(
            "Scenario for '{}': {} applied, {} rejected, {} zones, total HCS delta {:.3}",
            ctx.city(),
            impacts.len(),
            rejected.len(),
            indices.len(),
            total_hcs_delta
        );
    }

    Ok(AggregateSimulationResponse {
        city: ctx.city().to_string(),
        actions_applied: impacts.len(),
        actions_rejected: rejected,
        affected_zone_count: indices.len(),
        total_hcs_delta,
        impacts,
        before: before.iter().map(|z| point(&z.id, z.hcs)).collect(),
        after: after.iter().map(|z| point(&z.id, z.hcs)).collect(),
        delta,
        confidence,
    })
}
