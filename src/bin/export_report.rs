use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use perf_terminal::charts::ChartKind;
use perf_terminal::config::AppConfig;
use perf_terminal::demo;
use perf_terminal::heatmap::HeatmapPipeline;
use perf_terminal::ingest;
use perf_terminal::metrics::{AnalysisModule, MetricId};
use perf_terminal::report::{self, ReportRequest};
use perf_terminal::state::report_file_name;

fn main() -> Result<()> {
    env_logger::init();
    let config = AppConfig::load();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let data_dir = arg_value(&args, "data")
        .map(PathBuf::from)
        .or_else(|| config.data_dir.clone());
    let bundle = match &data_dir {
        Some(dir) => ingest::load_bundle(dir)
            .with_context(|| format!("load bundle from {}", dir.display()))?,
        None => {
            log::info!("no data directory given, using demo bundle");
            demo::demo_bundle(config.demo_seed)
        }
    };

    let module = match arg_value(&args, "module").as_deref() {
        None | Some("feminine") | Some("f") => AnalysisModule::Feminine,
        Some("masculine") | Some("m") => AnalysisModule::Masculine,
        Some(other) => bail!("unknown module {other:?} (expected feminine or masculine)"),
    };

    let player = match arg_value(&args, "player") {
        Some(p) => p,
        None => bundle
            .players()
            .into_iter()
            .next()
            .context("bundle has no players")?,
    };
    if !bundle.players().contains(&player) {
        bail!("player {player:?} not found in bundle");
    }

    let charts = parse_charts(arg_value(&args, "charts").as_deref(), module, has_flag(&args, "touches"))?;

    let min_duration_s = if has_flag(&args, "include-short") {
        None
    } else {
        Some(config.min_duration_s)
    };

    let session = arg_value(&args, "session")
        .or_else(|| bundle.sessions_for(&player).into_iter().next())
        .filter(|s| bundle.video_for(&player, s).is_some());
    let heatmap = match &session {
        Some(session) => {
            let row = bundle
                .video_for(&player, session)
                .context("video row disappeared")?;
            Some(HeatmapPipeline::new(config.raster).run(&row.x, &row.y)?)
        }
        None => None,
    };

    let out = arg_value(&args, "out")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.export_dir.join(report_file_name(&player)));

    let request = ReportRequest {
        bundle: &bundle,
        module,
        player: &player,
        charts,
        min_duration_s,
        heatmap: session.as_deref().zip(heatmap.as_ref()),
    };
    let summary = report::export_report(&request, &out)?;

    println!("Report export complete");
    println!("Player: {player} ({})", module.label());
    println!("Output: {}", summary.path.display());
    println!("Charts: {} on {} pages", summary.charts, summary.pages);
    println!("Data rows: {}", summary.data_rows);
    if !summary.skipped.is_empty() {
        println!("Skipped (no data): {}", summary.skipped.len());
        for title in &summary.skipped {
            println!(" - {title}");
        }
    }
    Ok(())
}

/// `all` (default) or a comma-separated list of metric labels.
fn parse_charts(raw: Option<&str>, module: AnalysisModule, touches: bool) -> Result<Vec<ChartKind>> {
    let mut charts = match raw.map(str::trim) {
        None | Some("") | Some("all") => ChartKind::menu(module),
        Some(list) => {
            let mut out = Vec::new();
            for label in list.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                if label == ChartKind::StackedBands.title() || label == "stacked" {
                    out.push(ChartKind::StackedBands);
                    continue;
                }
                let Some(metric) = MetricId::from_label(label) else {
                    bail!("unknown metric {label:?}");
                };
                out.push(ChartKind::Metric(metric));
            }
            out
        }
    };
    if touches {
        charts.push(ChartKind::Touches);
    }
    Ok(charts)
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    let flag = format!("--{name}");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    let flag = format!("--{name}");
    args.iter().any(|a| *a == flag)
}
