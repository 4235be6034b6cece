use glam::Vec3;
use std::f32::consts::{FRAC_PI_4, PI};
use worldview_common::{Aabb2, CameraSettingId, wrap_angle};
use worldview_region::CameraSettingCatalog;

use crate::config::AoiConfig;

/// Camera-relative view footprint of one player.
///
/// The footprint is computed once per camera change and then translated to
/// the player's position for every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    footprint: Aabb2,
    expansion: f32,
}

impl CameraView {
    /// Unrotated default footprint.
    pub fn unrotated(config: &AoiConfig) -> Self {
        let center = Vec3::new(config.view_offset, config.view_offset, 0.0);
        Self {
            footprint: Aabb2::from_center(center, config.view_width),
            expansion: config.view_expansion,
        }
    }

    /// Footprint for the given camera settings.
    ///
    /// Unknown settings fall back to the catalog's player default; if nothing
    /// usable remains the unrotated footprint is kept.
    pub fn new(
        settings: Option<CameraSettingId>,
        catalog: &CameraSettingCatalog,
        config: &AoiConfig,
    ) -> Self {
        let mut view = Self::unrotated(config);
        let Some(id) = settings else {
            return view;
        };
        let Some(setting) = catalog.resolve(id) else {
            tracing::debug!(%id, "no usable camera setting, keeping default footprint");
            return view;
        };
        match view_angle(setting.direction) {
            Some(angle) => view.footprint = view.footprint.rotated_z(angle),
            None => tracing::debug!(%id, "camera looks straight down, keeping default footprint"),
        }
        view
    }

    pub fn footprint(&self) -> Aabb2 {
        self.footprint
    }

    /// Volume in which entities are streamed.
    pub fn entities_volume(&self, position: Vec3) -> Aabb2 {
        self.footprint.translate(position)
    }

    /// Entity volume plus the pre-load margin, used for cells.
    pub fn visibility_volume(&self, position: Vec3) -> Aabb2 {
        self.entities_volume(position).expand(self.expansion)
    }
}

// Footprint rotation for a camera looking along `direction`. The base
// footprint is laid out for a camera looking along (-1, -1).
fn view_angle(direction: Vec3) -> Option<f32> {
    let planar = direction.truncate().try_normalize()?;
    let yaw = planar.y.atan2(planar.x);
    Some(wrap_angle(yaw + PI - FRAC_PI_4))
}
