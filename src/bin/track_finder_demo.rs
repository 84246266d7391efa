use conformal_track_finder::config::{self, RuntimeConfig};
use conformal_track_finder::diagnostics::FinderReport;
use conformal_track_finder::io::{load_hit_records, write_json_file};
use conformal_track_finder::{HitPool, Track, TrackFinder};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage() -> String {
    "Usage: track_finder_demo <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackSummary<'a> {
    track: &'a Track,
    hit_ids: Vec<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoOutput<'a> {
    tracks: Vec<TrackSummary<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a conformal_track_finder::diagnostics::FinderTrace>,
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config: RuntimeConfig =
        config::load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let records = load_hit_records(&config.input_path)?;
    let mut pool = HitPool::from_records(&config.geometry, &records);
    let finder = TrackFinder::new(config.finder_params.clone(), config.geometry.clone())
        .map_err(|e| e.to_string())?;
    let report = finder.process(&mut pool);

    print_text_summary(&pool, &report);

    let output = DemoOutput {
        tracks: report
            .tracks
            .iter()
            .map(|track| TrackSummary {
                track,
                hit_ids: track.hits.iter().map(|&h| pool.get(h).id().0).collect(),
            })
            .collect(),
        trace: config.output.include_trace.then_some(&report.trace),
    };
    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, &output)?;
            println!("\nJSON report written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
            println!("\nJSON report:\n{json}");
        }
    }
    Ok(())
}

fn print_text_summary(pool: &HitPool, report: &FinderReport) {
    let trace = &report.trace;
    println!("Track finding summary");
    println!(
        "  hits: {} (free {}, background {}, mapped {}, skipped {})",
        trace.input.hits,
        trace.input.free,
        trace.input.background,
        trace.input.mapped,
        trace.input.skipped_origin + trace.input.skipped_degenerate
    );
    for pass in &trace.passes {
        println!(
            "  pass min_hits={:>3}: candidates={:>5} accepted={:>5} clusters={:>3} tracks={:>3} nodes={}",
            pass.min_hits,
            pass.candidates,
            pass.accepted,
            pass.clusters,
            pass.tracks,
            pass.search.nodes_created
        );
    }
    if let Some(secondary) = &trace.secondary {
        println!(
            "  secondary: candidates={} clusters={} tracks={}",
            secondary.candidates, secondary.clusters, secondary.tracks
        );
    }
    if let Some(linking) = &trace.linking {
        println!(
            "  linking: {} → {} tracks ({} segments, {} bridges)",
            linking.stats.tracks_in,
            linking.stats.tracks_out,
            linking.stats.segments,
            linking.stats.bridges
        );
    }
    println!("  tracks: {}", report.tracks.len());
    for track in &report.tracks {
        println!(
            "    #{:<3} hits={:>3} superlayers={} theta={:.4} curvature={:+.5}",
            track.id.0,
            track.len(),
            track.superlayer_count,
            track.params.theta,
            track.params.curvature
        );
    }
    let claimed = pool.hits().iter().filter(|h| !h.is_free()).count();
    println!("  claimed hits: {claimed}/{}", pool.len());
    for stage in &trace.timings.stages {
        println!("  {:<10} {:>8.3} ms", stage.label, stage.elapsed_ms);
    }
    println!("  total      {:>8.3} ms", trace.timings.total_ms);
}
