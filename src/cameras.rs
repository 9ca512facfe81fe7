//! Cameras and configs for cameras
use crate::images::ImageBuffer;
use crate::objects::Hittable;
use crate::utils::{self, SerdeVector};
use crate::{Color, Error, Point, Ray, Result, Vec3};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Camera Config
///
/// Only the image shape and focal length are required, everything else has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub aspect_ratio: f64,
    pub image_width: u32,
    pub focal_length: f64,
    /// Horizontal field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f64,
    #[serde(default = "default_look_from")]
    pub look_from: SerdeVector,
    #[serde(default = "default_look_at")]
    pub look_at: SerdeVector,
    #[serde(default = "default_v_up")]
    pub v_up: SerdeVector,
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: u32,
    #[serde(default = "default_t_min")]
    pub t_min: f64,
    #[serde(default = "default_t_max")]
    pub t_max: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Background gradient from the bottom to the top of the sky
    #[serde(default = "default_background")]
    pub background: (SerdeVector, SerdeVector),
    #[serde(default)]
    pub aperture: f64,
}

fn default_fov() -> f64 {
    130.0
}
fn default_look_from() -> SerdeVector {
    SerdeVector([0.0, 0.0, 0.0])
}
fn default_look_at() -> SerdeVector {
    SerdeVector([0.0, 0.0, -1.0])
}
fn default_v_up() -> SerdeVector {
    SerdeVector([0.0, 1.0, 0.0])
}
fn default_samples_per_pixel() -> u32 {
    1
}
fn default_t_min() -> f64 {
    0.001
}
fn default_t_max() -> f64 {
    f64::INFINITY
}
fn default_max_depth() -> u32 {
    50
}
fn default_background() -> (SerdeVector, SerdeVector) {
    (SerdeVector([1.0, 1.0, 1.0]), SerdeVector([0.5, 0.7, 1.0]))
}

/// Per-render settings for tracing a single ray
#[derive(Debug, Clone, PartialEq)]
pub struct TraceParams {
    /// Put a minimum above 0 to reduce shadow acne
    pub t_min: f64,
    pub t_max: f64,
    /// Maximum number of bounces per sample
    pub max_depth: u32,
    /// Colors at the bottom and at the top of the sky
    pub background: (Color, Color),
}
impl Default for TraceParams {
    fn default() -> Self {
        Self {
            t_min: default_t_min(),
            t_max: default_t_max(),
            max_depth: default_max_depth(),
            background: (Color::new(1.0, 1.0, 1.0), Color::new(0.5, 0.7, 1.0)),
        }
    }
}
impl TraceParams {
    /// Linearly blends the background colors depending on height of y
    pub fn background_color(&self, ray: &Ray) -> Color {
        let unit_direction = ray.dir.normalize();
        let t = 0.5 * (unit_direction[1] + 1.0);
        (1.0 - t) * self.background.0 + t * self.background.1
    }
}

/// Camera and related tasks
#[derive(Debug, Clone)]
pub struct Camera {
    origin: Point,
    lower_left_corner: Point,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    aspect_ratio: f64,
    lens_radius: f64,
    image_width: u32,
    image_height: u32,
    samples_per_pixel: u32,
    trace: TraceParams,
}
impl Camera {
    pub fn new(
        look_from: Point,
        look_at: Point,
        v_up: Vec3,
        fov_deg: f64,
        aspect_ratio: f64,
        aperture: f64,
        focal_length: f64,
    ) -> Self {
        // Establish the viewport; the field of view spans the width
        let theta = fov_deg.to_radians();
        let viewport_width = 2.0 * (theta / 2.0).tan() * focal_length;
        let viewport_height = viewport_width / aspect_ratio;

        // Calculate the viewing vectors
        let w = (look_from - look_at).normalize();
        let u = (v_up.cross(&w)).normalize();
        let v = w.cross(&u);

        let origin = look_from;
        let horizontal = viewport_width * u;
        let vertical = viewport_height * v;
        let lower_left_corner = origin - focal_length * w - horizontal / 2.0 - vertical / 2.0;

        let mut camera = Self {
            origin,
            lower_left_corner,
            horizontal,
            vertical,
            u,
            v,
            w,
            aspect_ratio,
            lens_radius: aperture / 2.0,
            image_width: 0,
            image_height: 0,
            samples_per_pixel: default_samples_per_pixel(),
            trace: TraceParams::default(),
        };
        camera.set_image_width(400);
        camera
    }

    /// Set the image width; the height follows from the aspect ratio
    pub fn with_image_width(mut self, image_width: u32) -> Self {
        self.set_image_width(image_width);
        self
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_trace_params(mut self, trace: TraceParams) -> Self {
        self.trace = trace;
        self
    }

    fn set_image_width(&mut self, image_width: u32) {
        self.image_width = image_width;
        self.image_height = (f64::from(image_width) / self.aspect_ratio).floor() as u32;
    }

    pub fn from_config(config: CameraConfig) -> Result<Self> {
        let invalid = |msg: String| -> Result<Self> { Err(Error::InvalidConfig(msg)) };
        if config.aspect_ratio.is_nan() || config.aspect_ratio <= 0.0 {
            return invalid(format!("aspect_ratio must be positive, got {}", config.aspect_ratio));
        }
        if config.image_width == 0 {
            return invalid("image_width must be at least 1".to_string());
        }
        if f64::from(config.image_width) / config.aspect_ratio < 1.0 {
            return invalid(format!(
                "image_width {} with aspect_ratio {} gives an empty image",
                config.image_width, config.aspect_ratio
            ));
        }
        if config.samples_per_pixel == 0 {
            return invalid("samples_per_pixel must be at least 1".to_string());
        }
        if config.t_min.is_nan() || config.t_min >= config.t_max {
            return invalid(format!(
                "t_min ({}) must be smaller than t_max ({})",
                config.t_min, config.t_max
            ));
        }
        if !(config.focal_length.is_finite() && config.focal_length > 0.0) {
            return invalid(format!(
                "focal_length must be positive, got {}",
                config.focal_length
            ));
        }
        if !(config.fov > 0.0 && config.fov < 180.0) {
            return invalid(format!(
                "fov must lie strictly between 0 and 180 degrees, got {}",
                config.fov
            ));
        }
        if config.aperture < 0.0 {
            return invalid(format!("aperture must not be negative, got {}", config.aperture));
        }
        let look_from: Point = config.look_from.into();
        let look_at: Point = config.look_at.into();
        let v_up: Vec3 = config.v_up.into();
        if (look_from - look_at).norm() == 0.0 || v_up.cross(&(look_from - look_at)).norm() == 0.0
        {
            return invalid("look_from, look_at and v_up must span a view basis".to_string());
        }

        let camera = Self::new(
            look_from,
            look_at,
            v_up,
            config.fov,
            config.aspect_ratio,
            config.aperture,
            config.focal_length,
        )
        .with_image_width(config.image_width)
        .with_samples_per_pixel(config.samples_per_pixel)
        .with_trace_params(TraceParams {
            t_min: config.t_min,
            t_max: config.t_max,
            max_depth: config.max_depth,
            background: (config.background.0.into(), config.background.1.into()),
        });
        log::debug!(
            "Camera at {:?}: u={:?} v={:?} w={:?}, {}x{} px, lens radius {}",
            camera.origin,
            camera.u,
            camera.v,
            camera.w,
            camera.image_width,
            camera.image_height,
            camera.lens_radius
        );
        Ok(camera)
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    pub fn trace_params(&self) -> &TraceParams {
        &self.trace
    }

    /// View basis `(u, v, w)`: right, up, and backwards
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Ray through pixel `(x, y)`, counted from the bottom-left corner
    ///
    /// The origin is jittered across the lens for defocus blur. With `antialiasing` the target
    /// point is jittered within the pixel as well.
    pub fn get_ray<R: Rng + ?Sized>(&self, x: u32, y: u32, antialiasing: bool, rng: &mut R) -> Ray {
        let rd = self.lens_radius * utils::random_in_unit_disk(rng);
        let offset = self.u * rd[0] + self.v * rd[1];

        let (jx, jy) = if antialiasing {
            (rng.gen::<f64>(), rng.gen::<f64>())
        } else {
            (0.0, 0.0)
        };
        let s = (f64::from(x) + jx) / f64::from(self.image_width.saturating_sub(1).max(1));
        let t = (f64::from(y) + jy) / f64::from(self.image_height.saturating_sub(1).max(1));

        Ray::new(
            self.origin + offset,
            self.lower_left_corner + s * self.horizontal + t * self.vertical - self.origin - offset,
        )
    }

    /// Render the world as seen by this camera
    ///
    /// Rows are traced in parallel. Row `j` draws from its own generator seeded from `seed` and
    /// `j`, so the same seed always produces the same image.
    pub fn render(
        &self,
        world: &(impl Hittable + Sync),
        seed: u64,
        progress: &ProgressBar,
    ) -> ImageBuffer {
        let antialiasing = self.samples_per_pixel > 1;
        let rows: Vec<Vec<[u8; 3]>> = (0..self.image_height)
            .into_par_iter()
            .rev()
            .map(|j| {
                let mut rng = StdRng::seed_from_u64(row_seed(seed, j));
                let row = (0..self.image_width)
                    .map(|i| {
                        let mut pixel_color = Color::zeros();
                        for _ in 0..self.samples_per_pixel {
                            let ray = self.get_ray(i, j, antialiasing, &mut rng);
                            pixel_color +=
                                ray.get_color(world, self.trace.max_depth, &self.trace, &mut rng);
                        }
                        utils::get_pixel(&pixel_color, self.samples_per_pixel)
                    })
                    .collect();
                progress.inc(1);
                row
            })
            .collect();

        ImageBuffer::from_pixels(
            self.image_width,
            self.image_height,
            rows.into_iter().flatten().collect(),
        )
    }
}

fn row_seed(seed: u64, row: u32) -> u64 {
    seed ^ u64::from(row).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
