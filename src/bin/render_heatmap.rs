use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use perf_terminal::config::AppConfig;
use perf_terminal::demo;
use perf_terminal::heatmap::{HeatmapPipeline, HeatmapSummary};
use perf_terminal::ingest::{self, SessionBundle, VideoRow};
use perf_terminal::render;

struct Args {
    data_dir: Option<PathBuf>,
    player: Option<String>,
    session: Option<String>,
    out: PathBuf,
    json: bool,
    all: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let config = AppConfig::load();
    let args = parse_args(&config)?;

    let bundle = match args.data_dir.as_deref().or(config.data_dir.as_deref()) {
        Some(dir) => ingest::load_bundle(dir)
            .with_context(|| format!("load bundle from {}", dir.display()))?,
        None => {
            log::info!("no data directory given, using demo bundle");
            demo::demo_bundle(config.demo_seed)
        }
    };
    let pipeline = HeatmapPipeline::new(config.raster);

    if args.all {
        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("create output dir {}", args.out.display()))?;
        let rows: Vec<&VideoRow> = bundle.video.iter().collect();
        let results: Vec<Result<HeatmapSummary>> = rows
            .par_iter()
            .map(|row| {
                let path = args.out.join(png_file_name(&row.player, &row.session));
                render_row(&pipeline, row, &path)
            })
            .collect();

        let mut summaries = Vec::with_capacity(results.len());
        let mut failures = 0usize;
        for (row, result) in rows.iter().zip(results) {
            match result {
                Ok(summary) => summaries.push((row.player.clone(), row.session.clone(), summary)),
                Err(err) => {
                    failures += 1;
                    log::error!("{} / {}: {err:#}", row.player, row.session);
                }
            }
        }
        println!("Heat maps rendered: {}/{}", summaries.len(), rows.len());
        println!("Output: {}", args.out.display());
        if args.json {
            let index: Vec<_> = summaries
                .iter()
                .map(|(player, session, summary)| {
                    serde_json::json!({ "player": player, "session": session, "summary": summary })
                })
                .collect();
            let path = args.out.join("index.json");
            std::fs::write(&path, serde_json::to_vec_pretty(&index)?)
                .with_context(|| format!("write {}", path.display()))?;
        }
        if failures > 0 {
            bail!("{failures} heat maps failed");
        }
        return Ok(());
    }

    let row = pick_row(&bundle, args.player.as_deref(), args.session.as_deref())?;
    let summary = render_row(&pipeline, row, &args.out)?;
    println!("Heat map: {} / {}", row.player, row.session);
    println!("Output: {}", args.out.display());
    println!(
        "Positions: {} deposited, {} skipped",
        summary.deposited, summary.skipped
    );
    for warning in &summary.warnings {
        println!(" - {warning}");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn render_row(pipeline: &HeatmapPipeline, row: &VideoRow, path: &Path) -> Result<HeatmapSummary> {
    let view = pipeline
        .run(&row.x, &row.y)
        .with_context(|| format!("rasterize {} / {}", row.player, row.session))?;
    render::save_png(&view, path)?;
    Ok(view.summary())
}

fn pick_row<'a>(
    bundle: &'a SessionBundle,
    player: Option<&str>,
    session: Option<&str>,
) -> Result<&'a VideoRow> {
    let player = match player {
        Some(p) => p.to_string(),
        None => bundle
            .video_players()
            .into_iter()
            .next()
            .context("bundle has no video rows")?,
    };
    let rows = bundle.video_rows_for(&player);
    let row = match session {
        Some(s) => rows.into_iter().find(|r| r.session == s),
        None => rows.into_iter().next(),
    };
    row.with_context(|| format!("no video session for {player}"))
}

fn png_file_name(player: &str, session: &str) -> String {
    let stem: String = format!("{player}_{session}")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("heatmap_{stem}.png")
}

fn parse_args(config: &AppConfig) -> Result<Args> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut parsed = Args {
        data_dir: None,
        player: None,
        session: None,
        out: PathBuf::new(),
        json: false,
        all: false,
    };
    let mut out = None;

    let mut idx = 0;
    while idx < args.len() {
        let arg = args[idx].as_str();
        let mut value = |name: &str| -> Option<String> {
            if let Some(v) = arg.strip_prefix(&format!("--{name}=")) {
                return Some(v.trim().to_string());
            }
            if arg == format!("--{name}") {
                idx += 1;
                return args.get(idx).map(|v| v.trim().to_string());
            }
            None
        };
        if let Some(v) = value("data") {
            parsed.data_dir = Some(PathBuf::from(v));
        } else if let Some(v) = value("player") {
            parsed.player = Some(v);
        } else if let Some(v) = value("session") {
            parsed.session = Some(v);
        } else if let Some(v) = value("out") {
            out = Some(PathBuf::from(v));
        } else if arg == "--json" {
            parsed.json = true;
        } else if arg == "--all" {
            parsed.all = true;
        } else {
            bail!("unknown argument {arg:?}");
        }
        idx += 1;
    }

    parsed.out = match out {
        Some(path) => path,
        None if parsed.all => config.export_dir.join("heatmaps"),
        None => config.export_dir.join("heatmap.png"),
    };
    Ok(parsed)
}
