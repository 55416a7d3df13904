//! Surface LOD probe.
//!
//! Drives the LOD engine through a scripted scenario of moving viewers and
//! drifting zones, logging per-frame refresh decisions and a closing summary
//! of chunk counts, gating and timings.
//!
//! ```text
//! RUST_LOG=surface_lod=debug surface_lod_probe --scenario scenarios/ocean.toml
//! ```

mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scenario::Scenario;
use surface_lod::{FrameInputs, FrameReport, LodContext, ViewerFrame, ViewerId, Zone};

/// Scenario driver for the surface LOD engine.
#[derive(Parser, Debug)]
#[command(name = "surface_lod_probe")]
#[command(about = "Runs a scripted viewer/zone scenario through the surface LOD engine")]
struct Args {
	/// Path to scenario TOML file.
	#[arg(short, long)]
	scenario: PathBuf,

	/// Override the scenario's frame count.
	#[arg(short, long)]
	frames: Option<u32>,

	/// Log viewer state every N frames (0 disables).
	#[arg(long, default_value_t = 30)]
	report_every: u32,
}

/// Totals accumulated over the run.
#[derive(Default, Debug)]
struct Totals {
	rebuilds: u32,
	refreshes: u64,
	reuses: u64,
	skipped: u64,
	evicted: u64,
	removed: u64,
	grid_uploads: u64,
}

impl Totals {
	fn add(&mut self, report: &FrameReport) {
		self.rebuilds += report.rebuilt as u32;
		self.refreshes += report.refreshed.len() as u64;
		self.reuses += report.reused.len() as u64;
		self.skipped += report.skipped.len() as u64;
		self.evicted += report.evicted.len() as u64;
		self.grid_uploads +=
			report.zones.wave.grid_uploaded as u64 + report.zones.color_wind.grid_uploaded as u64;
	}
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	info!(path = %args.scenario.display(), "Loading scenario");
	let scenario = Scenario::load(&args.scenario)?;
	let frames = args.frames.unwrap_or(scenario.frames);

	let mut context = LodContext::new();
	let surface = context.initialize(scenario.surface.clone());
	info!(
		surface = surface.raw(),
		nodes = context.surface(surface)?.hierarchy().len(),
		viewers = scenario.viewers.len(),
		zones = scenario.zones.len(),
		frames,
		"Surface initialized"
	);

	let mut totals = Totals::default();
	for frame in 0..frames {
		for path in &scenario.viewers {
			if path.leave_frame == Some(frame) && context.remove_viewer(surface, path.id())? {
				totals.removed += 1;
				info!(frame, viewer = path.id, "Viewer left");
			}
		}

		let viewers: Vec<ViewerFrame> = scenario
			.viewers
			.iter()
			.filter(|path| path.is_present(frame))
			.map(|path| path.frame(frame))
			.collect();
		let zones: Vec<Zone> = scenario.zones.iter().map(|track| track.zone(frame)).collect();

		let report = context
			.update(
				surface,
				&FrameInputs {
					viewers: &viewers,
					zones: &zones,
					max_wave_height: scenario.max_wave_height,
					wind_speed: scenario.wind_speed,
					detail_by_distance: scenario.detail_at(frame),
					primary_viewer: scenario.primary_viewer.map(ViewerId),
				},
			)
			.with_context(|| format!("Frame {frame} failed"))?;
		totals.add(&report);

		if report.rebuilt {
			info!(frame, detail_by_distance = scenario.detail_at(frame), "Hierarchy rebuilt");
		}
		for viewer in &report.evicted {
			warn!(frame, viewer = viewer.0, "Viewer evicted by viewer cap");
		}
		for (viewer, reason) in &report.refreshed {
			tracing::debug!(frame, viewer = viewer.0, ?reason, "Refreshed");
		}

		if args.report_every > 0 && frame % args.report_every == 0 {
			log_viewers(&context, surface, &viewers, &report)?;
		}
	}

	let instance = context.surface(surface)?;
	let metrics = instance.metrics();
	info!(
		frames,
		rebuilds = totals.rebuilds,
		refreshes = totals.refreshes,
		reuses = totals.reuses,
		skipped = totals.skipped,
		evicted = totals.evicted,
		removed = totals.removed,
		grid_uploads = totals.grid_uploads,
		"Run complete"
	);
	info!(
		gating_ratio = %format_args!("{:.2}", metrics.gating_ratio()),
		avg_refresh_us = %format_args!("{:.1}", metrics.avg_refresh_timing_us()),
		avg_cluster_us = %format_args!("{:.1}", metrics.avg_cluster_timing_us()),
		grid_uploads_skipped = metrics.grid_uploads_skipped,
		zone_data_uploads = metrics.zone_data_uploads,
		"Engine metrics"
	);
	if surface_lod::metrics::is_enabled() {
		let depths: Vec<String> = metrics
			.chunks_per_depth
			.iter()
			.enumerate()
			.filter(|(_, &count)| count > 0)
			.map(|(depth, count)| format!("d{depth}={count}"))
			.collect();
		info!(
			visible_chunks = metrics.visible_chunks,
			seam_edges = metrics.seam_edges,
			infinite_edges = metrics.infinite_edges,
			depths = %depths.join(" "),
			"Last frame chunk distribution"
		);
	}

	context.shutdown(surface)?;
	Ok(())
}

fn log_viewers(
	context: &LodContext,
	surface: surface_lod::SurfaceHandle,
	viewers: &[ViewerFrame],
	report: &FrameReport,
) -> Result<()> {
	for viewer in viewers {
		let Some(data) = context.render_data(surface, viewer.id)? else {
			continue;
		};
		let chunks = context
			.surface(surface)?
			.viewer(viewer.id)
			.map_or(0, |state| state.visible().len());
		info!(
			frame = report.frame,
			viewer = viewer.id.0,
			chunks,
			instances = data.instances.count(),
			tier = data.tier,
			mesh_resolution = data.mesh.resolution,
			wave_zones = report.zones.wave.retained,
			color_wind_zones = report.zones.color_wind.retained,
			"Viewer state"
		);
	}
	Ok(())
}
