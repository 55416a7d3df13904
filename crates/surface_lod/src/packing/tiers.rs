//! Detail tiers: chunk mesh resolution picked from wind speed.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct DetailTier {
  /// Highest wind speed this tier is used for.
  pub max_wind_speed: f64,
  /// Quads per chunk edge.
  pub resolution: u32,
}

/// Tiers ordered by ascending wind breakpoint (and mesh resolution).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetailTierTable {
  pub tiers: Vec<DetailTier>,
  /// Added to the selected tier while simulation zones are active.
  pub zone_tier_offset: usize,
}

impl Default for DetailTierTable {
  fn default() -> Self {
    Self {
      tiers: vec![
        DetailTier {
          max_wind_speed: 2.0,
          resolution: 8,
        },
        DetailTier {
          max_wind_speed: 6.0,
          resolution: 16,
        },
        DetailTier {
          max_wind_speed: 12.0,
          resolution: 24,
        },
        DetailTier {
          max_wind_speed: f64::INFINITY,
          resolution: 32,
        },
      ],
      zone_tier_offset: 1,
    }
  }
}

impl DetailTierTable {
  /// First tier whose breakpoint covers `wind_speed` (the last one if none
  /// does), shifted up by the zone offset when zones are active.
  pub fn select(&self, wind_speed: f64, zones_active: bool) -> usize {
    let Some(last) = self.tiers.len().checked_sub(1) else {
      return 0;
    };
    let base = self
      .tiers
      .iter()
      .position(|tier| tier.max_wind_speed >= wind_speed)
      .unwrap_or(last);
    if zones_active {
      (base + self.zone_tier_offset).min(last)
    } else {
      base
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.tiers.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.tiers.is_empty()
  }
}
