//! Scenes: the world, the cameras looking at it, and where the pictures go

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cameras::{Camera, CameraConfig};
use crate::images::ImageBuffer;
use crate::objects::{HittableList, HittableObj, SphereConfig};
use crate::{Error, Result};

/// Scene Config, as read from a YAML scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    /// Directory the images are written to, relative to the working directory
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Fixed seed for reproducible renders
    #[serde(default)]
    pub seed: Option<u64>,
    pub cameras: Vec<CameraConfig>,
    #[serde(default)]
    pub objects: Vec<SphereConfig>,
}
impl SceneConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }
}

/// A renderable scene
///
/// Cameras render in insertion order, which fixes the numbering of the output files. The
/// nearest hit always wins whatever the object order; only exact ties go to the earlier object.
pub struct Scene {
    name: String,
    output_dir: PathBuf,
    seed: Option<u64>,
    world: HittableList,
    cameras: Vec<Camera>,
    show_progress: bool,
    write_png: bool,
}
impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_dir: PathBuf::new(),
            seed: None,
            world: HittableList::default(),
            cameras: Vec::new(),
            show_progress: false,
            write_png: false,
        }
    }

    pub fn from_config(config: SceneConfig) -> Result<Self> {
        if config.name.is_empty() {
            return Err(Error::InvalidConfig("scene name must not be empty".to_string()));
        }
        let mut scene = Self::new(config.name)
            .with_output_dir(config.output_dir)
            .with_seed(config.seed);
        scene.world = HittableList::from_config(config.objects)?;
        for camera in config.cameras {
            scene.add_camera(Camera::from_config(camera)?);
        }
        log::debug!(
            "Scene {:?}: {} objects, {} cameras",
            scene.name,
            scene.world.len(),
            scene.cameras.len()
        );
        Ok(scene)
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Also write a PNG next to every PPM
    pub fn with_png(mut self, write_png: bool) -> Self {
        self.write_png = write_png;
        self
    }

    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.push(camera)
    }

    pub fn add_object(&mut self, obj: HittableObj) {
        self.world.add(obj)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn world(&self) -> &HittableList {
        &self.world
    }

    /// Where camera `index` is written
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(output_file_name(&self.name, index))
    }

    /// Render a single camera into memory
    ///
    /// Without a fixed seed every call draws a fresh one.
    pub fn render_camera(&self, index: usize) -> Option<ImageBuffer> {
        let camera = self.cameras.get(index)?;
        let seed = self.camera_seed(index);
        log::debug!("Rendering camera {} with seed {seed}", index + 1);

        let progress = if self.show_progress {
            let bar = ProgressBar::new(u64::from(camera.image_height()));
            if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} rows") {
                bar.set_style(style);
            }
            bar.set_message(format!("camera {}", index + 1));
            bar
        } else {
            ProgressBar::hidden()
        };
        let image = camera.render(&self.world, seed, &progress);
        progress.finish_and_clear();
        Some(image)
    }

    /// Render every camera and write `<name>.ppm`, `<name>-2.ppm`, ...
    ///
    /// Returns the paths of the written images.
    pub fn render(&self) -> Result<Vec<PathBuf>> {
        if self.cameras.is_empty() {
            log::warn!("Scene {:?} has no cameras, nothing to render", self.name);
        }
        if self.world.is_empty() {
            log::warn!("Scene {:?} has no objects, only the background will show", self.name);
        }
        if !self.output_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.output_dir)?;
        }

        let mut written = Vec::with_capacity(self.cameras.len());
        for index in 0..self.cameras.len() {
            let Some(image) = self.render_camera(index) else {
                continue;
            };
            let path = self.output_path(index);
            image.save_ppm(&path)?;
            log::info!("Rendered camera {} to {}", index + 1, path.display());
            if self.write_png {
                let png = path.with_extension("png");
                image.save_png(&png)?;
                log::info!("Saved {}", png.display());
            }
            written.push(path);
        }
        Ok(written)
    }

    fn camera_seed(&self, index: usize) -> u64 {
        match self.seed {
            Some(seed) => seed.wrapping_add(index as u64),
            None => rand::thread_rng().gen(),
        }
    }
}

/// `<name>.ppm` for the first camera, `<name>-<index + 1>.ppm` for the others
pub fn output_file_name(name: &str, index: usize) -> String {
    if index == 0 {
        format!("{name}.ppm")
    } else {
        format!("{name}-{}.ppm", index + 1)
    }
}
