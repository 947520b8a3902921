use {
    anyhow::{Context, Result},
    clap::Parser,
    healthy_city::{
        CityContext, Cli, Command,
        analysis::{CATALOG, coverage::square_mask},
        data::{FileStatisticsCache, demo_context},
        models::{ActionRequest, ScoreSummary, ScoredZone, ZoneTableSummary},
        optimizer_config, parse_action_arg, simulate_actions,
    },
    serde::Serialize,
    std::{fs, panic},
    tabled::{Table, Tabled, settings::Style},
};

#[derive(Tabled)]
struct ZoneRow {
    zone: String,
    hcs: String,
    base: String,
    heat: String,
    air: String,
    green: String,
    healthcare: String,
    vulnerability: String,
}

#[derive(Tabled)]
struct StatsRow {
    layer: String,
    mean: String,
    std: String,
    min: String,
    max: String,
    count: usize,
}

#[derive(Tabled)]
struct ActionRow {
    kind: String,
    geometry: String,
    description: String,
}

#[derive(Tabled)]
struct StepRow {
    step: usize,
    cell: usize,
    row: usize,
    col: usize,
    marginal_gain: String,
    equity_delta: String,
    coverage_gain: String,
    hcs_mean: String,
    equity_mean: String,
}

#[derive(Tabled)]
struct DeltaRow {
    zone: String,
    before: String,
    after: String,
    delta: String,
}

fn f3(v: f64) -> String {
    format!("{:.3}", v)
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("healthy_city"), my_code_level)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    if let Command::Actions = args.command {
        return list_actions(args.json);
    }

    let mut ctx = demo_context().context("Failed to build the demo city")?;
    let cache = FileStatisticsCache::new(&args.cache_dir);
    ctx.ensure_statistics(&cache, args.force_stats)
        .context("Failed to obtain city statistics")?;

    match &args.command {
        Command::Actions => Ok(()),
        Command::Score { zone } => score(&ctx, zone.as_deref(), args.json),
        Command::Stats => stats(&ctx, args.json),
        Command::Simulate { actions, file } => {
            let mut requests: Vec<ActionRequest> = match file {
                Some(path) => {
                    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
                    serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?
                }
                None => Vec::new(),
            };
            for a in actions {
                requests.push(parse_action_arg(a)?);
            }
            simulate(&ctx, &requests, args.json)
        }
        Command::SimulateGrid { row, col, kernel, params } => {
            if kernel % 2 == 0 {
                anyhow::bail!("kernel size must be a positive odd number, got {}", kernel);
            }
            let (rows, cols) = ctx.coverage_mask()?.dim();
            if *row >= rows || *col >= cols {
                anyhow::bail!("cell ({}, {}) is outside the {}x{} raster", row, col, rows, cols);
            }
            let candidate = square_mask((rows, cols), row * cols + col, *kernel);
            let params = params.resolve(ctx.pixel_size());
            match ctx.simulate_grid(&candidate, &params)? {
                None => {
                    println!("No new cells at ({}, {}): the square is already covered", row, col);
                    Ok(())
                }
                Some(result) if args.json => print_json(&result.diagnostics),
                Some(result) => {
                    let before = ScoreSummary::of(&result.hcs_before, &result.equity_before);
                    let after = result.summary_after();
                    let d = &result.diagnostics;
                    println!("Mean HCS:    {} -> {}", f3(before.hcs_mean), f3(after.hcs_mean));
                    println!("Mean equity: {} -> {}", f3(before.equity_mean), f3(after.equity_mean));
                    println!(
                        "Marginal gain {} (equity {}, coverage {}, maintenance {}, overlap {})",
                        f3(d.marginal_gain),
                        f3(d.mean_equity_delta),
                        f3(d.coverage_gain),
                        f3(d.maintenance_penalty),
                        f3(d.overlap_penalty)
                    );
                    Ok(())
                }
            }
        }
        Command::Optimize { candidates, iterations, kernel, params } => {
            let config = optimizer_config(*candidates, *iterations, *kernel);
            let result = ctx.optimize(config, params.resolve(ctx.pixel_size()))?;
            if args.json {
                return print_json(&result);
            }
            println!(
                "Baseline mean HCS {}, mean equity {}; {} placements",
                f3(result.baseline.hcs_mean),
                f3(result.baseline.equity_mean),
                result.optimal_count
            );
            print_table(
                result
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(i, s)| StepRow {
                        step: i + 1,
                        cell: s.index,
                        row: s.row,
                        col: s.col,
                        marginal_gain: f3(s.marginal_gain),
                        equity_delta: f3(s.equity_delta),
                        coverage_gain: f3(s.coverage_gain),
                        hcs_mean: f3(s.hcs_mean),
                        equity_mean: f3(s.equity_mean),
                    })
                    .collect(),
            );
            Ok(())
        }
    }
}

fn list_actions(json: bool) -> Result<()> {
    if json {
        return print_json(&CATALOG);
    }
    print_table(
        CATALOG
            .iter()
            .map(|d| ActionRow {
                kind: d.kind.to_string(),
                geometry: format!("{:?}", d.geometry_kind),
                description: d.description.to_string(),
            })
            .collect(),
    );
    Ok(())
}

#[derive(Serialize)]
struct ScoreResponse<'a> {
    city: &'a str,
    score_statistics: ZoneTableSummary,
    zones: &'a [ScoredZone],
}

fn zone_row(z: &ScoredZone) -> ZoneRow {
    ZoneRow {
        zone: z.id.clone(),
        hcs: f3(z.hcs),
        base: f3(z.hcs_base),
        heat: f3(z.heat_index),
        air: f3(z.air_risk_index),
        green: f3(z.green_access_index),
        healthcare: f3(z.healthcare_index),
        vulnerability: f3(z.vulnerability),
    }
}

fn score(ctx: &CityContext, zone: Option<&str>, json: bool) -> Result<()> {
    if let Some(id) = zone {
        let row = ctx.zone_score(id)?;
        if json {
            return print_json(&row);
        }
        print_table(vec![zone_row(&row)]);
        return Ok(());
    }

    let zones = ctx.score_zones()?;
    let summary = ZoneTableSummary::of(&zones);
    if json {
        return print_json(&ScoreResponse {
            city: ctx.city(),
            score_statistics: summary,
            zones: &zones,
        });
    }
    print_table(zones.iter().map(zone_row).collect());
    println!(
        "{} tracts, HCS mean {} (std {}, min {}, max {})",
        summary.tract_count,
        f3(summary.hcs_mean),
        f3(summary.hcs_std),
        f3(summary.hcs_min),
        f3(summary.hcs_max)
    );
    Ok(())
}

fn stats(ctx: &CityContext, json: bool) -> Result<()> {
    let stats = ctx.statistics()?;
    if json {
        return print_json(stats);
    }
    print_table(
        stats
            .layers
            .iter()
            .map(|(layer, s)| StatsRow {
                layer: layer.to_string(),
                mean: f3(s.mean),
                std: f3(s.std),
                min: f3(s.min),
                max: f3(s.max),
                count: s.count,
            })
            .collect(),
    );
    Ok(())
}

fn simulate(ctx: &CityContext, requests: &[ActionRequest], json: bool) -> Result<()> {
    let response = simulate_actions(ctx, requests)?;
    if json {
        return print_json(&response);
    }

    for impact in &response.impacts {
        let (lo, hi) = impact.estimated_delta_range;
        println!(
            "#{} {}: {} zones, estimated HCS delta [{}, {}]",
            impact.action_index,
            impact.kind,
            impact.affected_zone_count,
            f3(lo),
            f3(hi)
        );
        for w in &impact.warnings {
            println!("   warning: {}", w);
        }
    }
    for rejected in &response.actions_rejected {
        println!("#{} {} rejected: {}", rejected.action_index, rejected.kind, rejected.errors.join("; "));
    }

    print_table(
        response
            .before
            .iter()
            .zip(&response.after)
            .zip(&response.delta)
            .map(|((b, a), d)| DeltaRow {
                zone: b.zone_id.clone(),
                before: f3(b.hcs),
                after: f3(a.hcs),
                delta: f3(d.hcs),
            })
            .collect(),
    );
    println!(
        "{} applied, {} zones affected, total HCS delta {}, confidence {:.2}",
        response.actions_applied,
        response.affected_zone_count,
        f3(response.total_hcs_delta),
        response.confidence
    );
    Ok(())
}
