//! Scene files: a static snapshot of engine state for offline runs.

use std::path::Path;

use fieldlines_core::{Bounds, Magnet, OverlayError, Particle, ViewTransform};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub width: f64,
    pub height: f64,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Sources, screen size and camera. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub particles: Vec<Particle>,
    pub magnets: Vec<Magnet>,
    pub screen: Screen,
    /// Defaults to a camera centered on the origin with world Y up.
    pub view: Option<ViewTransform>,
}

impl Default for Scene {
    /// A +10/-10 charge pair on the x axis.
    fn default() -> Self {
        Self {
            particles: vec![
                Particle::new(-200.0, 0.0, 10.0),
                Particle::new(200.0, 0.0, -10.0),
            ],
            magnets: Vec::new(),
            screen: Screen::default(),
            view: None,
        }
    }
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, OverlayError> {
        let scene: Scene =
            serde_json::from_str(text).map_err(|e| OverlayError::InvalidScene(e.to_string()))?;
        if !(scene.screen.width > 0.0 && scene.screen.height > 0.0) {
            return Err(OverlayError::InvalidScene(format!(
                "screen must have positive size, got {}x{}",
                scene.screen.width, scene.screen.height
            )));
        }
        Ok(scene)
    }

    pub fn transform(&self) -> ViewTransform {
        self.view.unwrap_or_else(|| {
            ViewTransform::centered(self.screen.width, self.screen.height, 1.0)
        })
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_transform(&self.transform(), self.screen.width, self.screen.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_default_scene() {
        assert_eq!(Scene::from_json("{}").unwrap(), Scene::default());
    }

    #[test]
    fn explicit_empty_lists_clear_sources() {
        let scene = Scene::from_json(r#"{"particles": [], "magnets": []}"#).unwrap();
        assert!(scene.particles.is_empty());
        assert_eq!(scene.screen, Screen::default());
    }

    #[test]
    fn parses_particles_and_magnets() {
        let scene = Scene::from_json(
            r#"{
                "particles": [{"pos": [1.0, 2.0], "charge": -3.0}],
                "magnets": [{"pos": [0.0, 0.0], "angle": 0.5, "size": 40.0, "strength": 2.0}]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.particles, vec![Particle::new(1.0, 2.0, -3.0)]);
        assert_eq!(scene.magnets.len(), 1);
        assert_eq!(scene.magnets[0].size, 40.0);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Scene::from_json("{\"particles\": 3}"),
            Err(OverlayError::InvalidScene(_))
        ));
    }

    #[test]
    fn rejects_empty_screen() {
        let err = Scene::from_json(r#"{"screen": {"width": 0, "height": 10}}"#).unwrap_err();
        assert!(err.to_string().contains("positive size"));
    }

    #[test]
    fn default_bounds_center_on_origin() {
        let scene = Scene::default();
        assert_eq!(scene.bounds(), Bounds::new(-400.0, -300.0, 400.0, 300.0));
    }

    #[test]
    fn explicit_view_overrides_default_camera() {
        let scene = Scene::from_json(
            r#"{"screen": {"width": 100, "height": 100}, "view": {"zoom": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(scene.bounds(), Bounds::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"particles": [{{"pos": [0, 0], "charge": 1}}]}}"#).unwrap();
        let scene = Scene::load(file.path()).unwrap();
        assert_eq!(scene.particles.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Scene::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OverlayError::Io(_)));
    }
}
