//! Scenario files: a surface configuration plus scripted viewers and zones.

use anyhow::{Context, Result};
use glam::{DQuat, DVec3};
use serde::Deserialize;
use std::path::Path;

use surface_lod::{Frustum, SurfaceConfig, ViewerFrame, ViewerId, ViewerPose, Zone, ZoneKey, ZoneKind};

/// Root of a scenario TOML file.
#[derive(Debug, Deserialize)]
pub struct Scenario {
	/// Frames to simulate.
	#[serde(default = "default_frames")]
	pub frames: u32,
	#[serde(default = "default_max_wave_height")]
	pub max_wave_height: f64,
	#[serde(default)]
	pub wind_speed: f64,
	#[serde(default = "default_true")]
	pub detail_by_distance: bool,
	/// Frames at which the detail-by-distance setting flips.
	#[serde(default)]
	pub toggle_detail_at: Vec<u32>,
	/// Viewer zones are ranked against (default: first listed).
	#[serde(default)]
	pub primary_viewer: Option<u64>,
	/// Engine configuration; omitted keys keep their defaults.
	#[serde(default)]
	pub surface: SurfaceConfig,
	pub viewers: Vec<ViewerPath>,
	#[serde(default)]
	pub zones: Vec<ZoneTrack>,
}

/// A viewer moving on a straight line while yawing at a constant rate.
#[derive(Debug, Deserialize)]
pub struct ViewerPath {
	pub id: u64,
	pub start: [f64; 3],
	/// World units per frame.
	#[serde(default)]
	pub velocity: [f64; 3],
	#[serde(default = "default_forward")]
	pub forward: [f64; 3],
	/// Degrees per frame about +Y.
	#[serde(default)]
	pub yaw_rate: f64,
	#[serde(default = "default_far_clip")]
	pub far_clip: f64,
	/// Vertical field of view.
	#[serde(default = "default_fov")]
	pub fov_degrees: f64,
	#[serde(default = "default_aspect")]
	pub aspect: f64,
	/// False simulates a viewer whose culling data is unavailable.
	#[serde(default = "default_true")]
	pub culling: bool,
	/// First frame the viewer is present.
	#[serde(default)]
	pub enter_frame: u32,
	/// Frame at which the viewer leaves and is removed from the surface.
	#[serde(default)]
	pub leave_frame: Option<u32>,
}

/// A zone drifting at a constant velocity.
#[derive(Debug, Deserialize)]
pub struct ZoneTrack {
	pub key: u64,
	pub position: [f64; 3],
	pub size: [f64; 3],
	#[serde(default)]
	pub yaw_degrees: f64,
	/// World units per frame.
	#[serde(default)]
	pub drift: [f64; 3],
	#[serde(default = "default_true")]
	pub initialized: bool,
	pub kind: ZoneKind,
}

fn default_frames() -> u32 {
	120
}

fn default_max_wave_height() -> f64 {
	1.0
}

fn default_true() -> bool {
	true
}

fn default_forward() -> [f64; 3] {
	[0.0, -0.2, 1.0]
}

fn default_far_clip() -> f64 {
	2000.0
}

fn default_fov() -> f64 {
	60.0
}

fn default_aspect() -> f64 {
	16.0 / 9.0
}

const NEAR_CLIP: f64 = 0.1;

impl Scenario {
	/// Load and validate a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		let scenario: Scenario =
			toml::from_str(&content).with_context(|| "Failed to parse scenario TOML")?;

		scenario
			.surface
			.validate()
			.context("Invalid surface configuration")?;
		if scenario.viewers.is_empty() {
			anyhow::bail!("Scenario must have at least one viewer");
		}
		for viewer in &scenario.viewers {
			if DVec3::from(viewer.forward).length_squared() == 0.0 {
				anyhow::bail!("Viewer {} has a zero forward vector", viewer.id);
			}
			if viewer.leave_frame.is_some_and(|leave| leave <= viewer.enter_frame) {
				anyhow::bail!("Viewer {} leaves before it enters", viewer.id);
			}
		}

		Ok(scenario)
	}

	/// Detail setting in effect at `frame`.
	pub fn detail_at(&self, frame: u32) -> bool {
		let flips = self.toggle_detail_at.iter().filter(|&&at| at <= frame).count();
		self.detail_by_distance ^ (flips % 2 == 1)
	}
}

impl ViewerPath {
	pub fn id(&self) -> ViewerId {
		ViewerId(self.id)
	}

	pub fn is_present(&self, frame: u32) -> bool {
		frame >= self.enter_frame && self.leave_frame.map_or(true, |leave| frame < leave)
	}

	/// Pose and culling planes at `frame`.
	pub fn frame(&self, frame: u32) -> ViewerFrame {
		let t = frame as f64;
		let position = DVec3::from(self.start) + DVec3::from(self.velocity) * t;
		let forward = DQuat::from_rotation_y((self.yaw_rate * t).to_radians())
			* DVec3::from(self.forward).normalize();
		let fov = self.fov_degrees.to_radians();

		ViewerFrame {
			id: self.id(),
			pose: ViewerPose {
				position,
				forward,
				far_clip: self.far_clip,
				fov,
			},
			frustum: self.culling.then(|| {
				Frustum::perspective(position, forward, fov, self.aspect, NEAR_CLIP, self.far_clip)
			}),
			surface_height: None,
		}
	}
}

impl ZoneTrack {
	pub fn zone(&self, frame: u32) -> Zone {
		Zone {
			key: ZoneKey(self.key),
			position: DVec3::from(self.position) + DVec3::from(self.drift) * frame as f64,
			size: DVec3::from(self.size),
			yaw: self.yaw_degrees.to_radians(),
			initialized: self.initialized,
			kind: self.kind,
		}
	}
}
