//! Sphere Path Tracing Library
//!
//! Renders scenes of spheres by Monte-Carlo path tracing and writes the results as plain-text
//! PPM images.

use nalgebra::Vector3;
use rand::RngCore;

pub mod cameras;
use cameras::TraceParams;

pub mod error;
pub use error::{Error, Result};

pub mod images;

pub mod materials;
use materials::Scatterable;

pub mod objects;
use objects::Hittable;

pub mod scenes;

pub mod utils;

pub type Vec3 = Vector3<f64>;
pub type Point = Vec3;
pub type Color = Vec3;
pub type Material = Box<dyn Scatterable + Send + Sync>;

/// Prelude
pub mod prelude {
    pub use crate::cameras::{Camera, CameraConfig, TraceParams};
    pub use crate::images::ImageBuffer;
    pub use crate::materials::{Dielectric, DiffuseLight, Lambertian, Metal};
    pub use crate::objects::{Hittable, HittableList, Sphere};
    pub use crate::scenes::{Scene, SceneConfig};
    pub use crate::{Color, Material, Point, Ray, Vec3};
}

/// The ray in ray tracing
#[derive(Debug, Clone)]
pub struct Ray {
    pub orig: Point,
    pub dir: Vec3,
}
impl Ray {
    pub fn new(orig: Point, dir: Vec3) -> Self {
        Self { orig, dir }
    }

    pub fn get(&self, t: f64) -> Point {
        self.orig + t * self.dir
    }

    /// Estimate the light arriving back along this ray
    ///
    /// Follows the ray through at most `depth` bounces. Each bounce adds the surface emission
    /// weighted by the attenuation gathered so far and then continues along the scattered ray.
    /// A ray that escapes picks up the background gradient, a ray that is absorbed stops, and
    /// a ray still bouncing when the depth runs out contributes nothing further.
    pub fn get_color(
        &self,
        obj: &impl Hittable,
        depth: u32,
        params: &TraceParams,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut color = Color::zeros();
        let mut throughput = Color::new(1.0, 1.0, 1.0);
        let mut ray = self.clone();

        for _ in 0..depth {
            let Some(hr) = obj.try_hit(&ray, params.t_min, params.t_max) else {
                color += throughput.component_mul(&params.background_color(&ray));
                break;
            };
            let Some(material) = hr.material else {
                // Flat shading
                color += throughput.component_mul(&hr.color);
                break;
            };

            color += throughput.component_mul(&material.emitted());
            match material.try_scatter(&ray, &hr, rng) {
                Some(sr) => {
                    throughput.component_mul_assign(&sr.attenuation);
                    ray = sr.scattered;
                }
                None => break,
            }
        }
        color
    }
}
