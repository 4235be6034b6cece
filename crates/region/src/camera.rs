use glam::Vec3;
use serde::{Deserialize, Serialize};
use worldview_common::CameraSettingId;

/// One camera placement. Only the look direction matters for view volumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSetting {
    pub direction: Vec3,
    #[serde(default)]
    pub distance: f32,
    #[serde(default)]
    pub fov: f32,
}

/// Named group of camera settings; the first entry is the one in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettingCollection {
    pub id: CameraSettingId,
    #[serde(default)]
    pub settings: Vec<CameraSetting>,
}

/// Camera setting collections available in a region, plus the global player
/// default used when a requested collection is unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraSettingCatalog {
    #[serde(default)]
    pub player_default: Option<CameraSettingId>,
    #[serde(default)]
    pub collections: Vec<CameraSettingCollection>,
}

impl CameraSettingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player_default(mut self, id: CameraSettingId) -> Self {
        self.player_default = Some(id);
        self
    }

    /// Add or replace a collection.
    pub fn insert(&mut self, collection: CameraSettingCollection) {
        match self.collections.iter_mut().find(|c| c.id == collection.id) {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
    }

    pub fn collection(&self, id: CameraSettingId) -> Option<&CameraSettingCollection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Resolve the setting to use for `id`.
    ///
    /// An unknown id falls back to the player default collection. A known
    /// collection without settings resolves to `None` without falling back.
    pub fn resolve(&self, id: CameraSettingId) -> Option<&CameraSetting> {
        let collection = match self.collection(id) {
            Some(c) => c,
            None => {
                tracing::debug!(%id, "camera settings not found, trying player default");
                self.collection(self.player_default?)?
            }
        };
        collection.settings.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(x: f32, y: f32) -> CameraSetting {
        CameraSetting {
            direction: Vec3::new(x, y, -1.0),
            distance: 1200.0,
            fov: 45.0,
        }
    }

    fn catalog() -> CameraSettingCatalog {
        let mut catalog = CameraSettingCatalog::new().with_player_default(CameraSettingId(1));
        catalog.insert(CameraSettingCollection {
            id: CameraSettingId(1),
            settings: vec![setting(1.0, 0.0), setting(0.0, 1.0)],
        });
        catalog.insert(CameraSettingCollection {
            id: CameraSettingId(2),
            settings: vec![setting(-1.0, 0.0)],
        });
        catalog.insert(CameraSettingCollection {
            id: CameraSettingId(3),
            settings: Vec::new(),
        });
        catalog
    }

    #[test]
    fn resolves_first_setting() {
        let c = catalog();
        assert_eq!(c.resolve(CameraSettingId(2)).unwrap().direction.x, -1.0);
        assert_eq!(c.resolve(CameraSettingId(1)).unwrap().direction.x, 1.0);
    }

    #[test]
    fn unknown_id_falls_back_to_player_default() {
        let c = catalog();
        assert_eq!(c.resolve(CameraSettingId(99)).unwrap().direction.x, 1.0);
    }

    #[test]
    fn empty_collection_does_not_fall_back() {
        assert!(catalog().resolve(CameraSettingId(3)).is_none());
    }

    #[test]
    fn nothing_to_fall_back_to() {
        let c = CameraSettingCatalog::new();
        assert!(c.resolve(CameraSettingId(1)).is_none());
    }

    #[test]
    fn insert_replaces_existing() {
        let mut c = catalog();
        c.insert(CameraSettingCollection {
            id: CameraSettingId(2),
            settings: vec![setting(0.0, -1.0)],
        });
        assert_eq!(c.collections.len(), 3);
        assert_eq!(c.resolve(CameraSettingId(2)).unwrap().direction.y, -1.0);
    }

    #[test]
    fn loads_from_yaml() {
        let yaml = r#"
player_default: 10
collections:
  - id: 10
    settings:
      - direction: [0.0, 1.0, -0.5]
        distance: 1500.0
"#;
        let c: CameraSettingCatalog = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.player_default, Some(CameraSettingId(10)));
        let s = c.resolve(CameraSettingId(10)).unwrap();
        assert_eq!(s.direction, Vec3::new(0.0, 1.0, -0.5));
        assert_eq!(s.fov, 0.0);
    }
}
