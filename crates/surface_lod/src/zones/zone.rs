//! Zone - a rotated rectangular area with kind-specific parameters.
//!
//! Zones belong to the caller. The clustering pass only keeps per-frame
//! copies of the ones it retains.

use glam::{DVec2, DVec3};
use serde::Deserialize;

use crate::quadtree::{DAabb3, Rect2};

/// Stable caller-side identity of a zone. Survives reordering and is what
/// refresh gating and the upload hash track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct ZoneKey(pub u64);

/// Interactive wave-simulation area.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveSimParams {
  pub amplitude: f32,
  pub damping: f32,
  pub foam_amount: f32,
  /// Distance over which the simulation fades into the open surface.
  pub blend_distance: f32,
}

impl Default for WaveSimParams {
  fn default() -> Self {
    Self {
      amplitude: 1.0,
      damping: 0.98,
      foam_amount: 0.5,
      blend_distance: 4.0,
    }
  }
}

/// Local surface tint and wind override.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorWindParams {
  /// Radians, measured like zone yaw.
  pub wind_direction: f32,
  pub wind_strength: f32,
  pub color_intensity: f32,
  pub blend_distance: f32,
}

impl Default for ColorWindParams {
  fn default() -> Self {
    Self {
      wind_direction: 0.0,
      wind_strength: 1.0,
      color_intensity: 1.0,
      blend_distance: 4.0,
    }
  }
}

/// In TOML: `kind = { type = "wave_simulation", amplitude = 2.0 }`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneKind {
  WaveSimulation(WaveSimParams),
  ColorWind(ColorWindParams),
}

/// Payload-free discriminant of [`ZoneKind`]. Each tag is clustered into its
/// own grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoneKindTag {
  WaveSimulation,
  ColorWind,
}

impl ZoneKind {
  #[inline]
  pub fn tag(&self) -> ZoneKindTag {
    match self {
      ZoneKind::WaveSimulation(_) => ZoneKindTag::WaveSimulation,
      ZoneKind::ColorWind(_) => ZoneKindTag::ColorWind,
    }
  }

  /// The four kind-specific floats of the GPU zone record.
  pub fn params(&self) -> [f32; 4] {
    match self {
      ZoneKind::WaveSimulation(p) => [p.amplitude, p.damping, p.foam_amount, p.blend_distance],
      ZoneKind::ColorWind(p) => [
        p.wind_direction,
        p.wind_strength,
        p.color_intensity,
        p.blend_distance,
      ],
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zone {
  pub key: ZoneKey,
  /// World-space center.
  pub position: DVec3,
  /// Full extents: `x` and `z` span the footprint, `y` the vertical range.
  pub size: DVec3,
  /// Rotation about +Y, radians.
  pub yaw: f64,
  /// False until the owner has set up the zone's simulation resources.
  pub initialized: bool,
  pub kind: ZoneKind,
}

impl Zone {
  #[inline]
  pub fn tag(&self) -> ZoneKindTag {
    self.kind.tag()
  }

  pub fn oriented_rect(&self) -> OrientedRect {
    OrientedRect::new(
      DVec2::new(self.position.x, self.position.z),
      DVec2::new(self.size.x, self.size.z) * 0.5,
      self.yaw,
    )
  }

  /// Axis-aligned box enclosing the rotated zone.
  pub fn bounds(&self) -> DAabb3 {
    let half_y = self.size.y * 0.5;
    self
      .oriented_rect()
      .bounds()
      .extrude(self.position.y - half_y, self.position.y + half_y)
  }

  /// Half the larger horizontal edge.
  #[inline]
  pub fn radius(&self) -> f64 {
    self.size.x.max(self.size.z) * 0.5
  }
}

/// Rotated rectangle in the horizontal plane.
///
/// ```text
///          v
///          ▲   u = ( cos yaw, -sin yaw)
///      ┌───┼───┐   v = ( sin yaw,  cos yaw)
///      │   ●───┼──▶ u
///      └───────┘   (x, z) components
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedRect {
  pub center: DVec2,
  /// Half extents along `u` and `v`.
  pub half_extents: DVec2,
  pub u: DVec2,
  pub v: DVec2,
}

impl OrientedRect {
  pub fn new(center: DVec2, half_extents: DVec2, yaw: f64) -> Self {
    let (sin, cos) = yaw.sin_cos();
    Self {
      center,
      half_extents,
      u: DVec2::new(cos, -sin),
      v: DVec2::new(sin, cos),
    }
  }

  pub fn corners(&self) -> [DVec2; 4] {
    let hu = self.u * self.half_extents.x;
    let hv = self.v * self.half_extents.y;
    [
      self.center - hu - hv,
      self.center + hu - hv,
      self.center + hu + hv,
      self.center - hu + hv,
    ]
  }

  /// Axis-aligned bounds.
  pub fn bounds(&self) -> Rect2 {
    let extent = self.u.abs() * self.half_extents.x + self.v.abs() * self.half_extents.y;
    Rect2::new(self.center - extent, self.center + extent)
  }

  pub fn contains_point(&self, point: DVec2) -> bool {
    let d = point - self.center;
    d.dot(self.u).abs() <= self.half_extents.x && d.dot(self.v).abs() <= self.half_extents.y
  }
}
