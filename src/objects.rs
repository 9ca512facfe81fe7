//! Objects
use crate::{
    materials::{self, MaterialConfig, Scatterable},
    utils::SerdeVector,
    Color, Error, Material, Point, Ray, Result, Vec3,
};
use serde::{Deserialize, Serialize};

pub type HittableObj = Box<dyn Hittable + Send + Sync>;

pub trait Hittable {
    fn try_hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>>;
}

/// Ordered collection of objects, searched linearly for the nearest hit
#[derive(Default)]
pub struct HittableList(pub Vec<HittableObj>);
impl HittableList {
    pub fn add(&mut self, boxed_obj: HittableObj) {
        self.0.push(boxed_obj)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_config(config: Vec<SphereConfig>) -> Result<Self> {
        let mut s = Self::default();
        for obj_cfg in config {
            let obj = Sphere::from_config(obj_cfg)?;
            s.add(Box::new(obj));
        }
        Ok(s)
    }
}
impl Hittable for HittableList {
    fn try_hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let mut closest_so_far = t_max;
        let mut hr_final = None;

        for obj in &self.0 {
            if let Some(hr) = obj.try_hit(ray, t_min, closest_so_far) {
                // On an exact tie the earlier object keeps the hit
                if hr_final.is_some() && hr.t >= closest_so_far {
                    continue;
                }
                closest_so_far = hr.t;
                hr_final = Some(hr)
            }
        }
        hr_final
    }
}

/// Represents a hit
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Point,
    /// Normal vector, always facing against the incoming ray
    pub normal: Vec3,
    /// Ray parameter of the intersection
    pub t: f64,
    /// Whether the ray arrived from the outward side of the surface
    pub front_face: bool,
    /// Flat color of the object, used when it has no material
    pub color: Color,
    /// Material
    pub material: Option<&'a dyn Scatterable>,
}
impl<'a> HitRecord<'a> {
    pub fn new(
        p: Point,
        t: f64,
        ray: &Ray,
        outward_normal: &Vec3,
        color: Color,
        material: Option<&'a dyn Scatterable>,
    ) -> Self {
        // Perpendicular rays count as front facing
        let front_face = ray.dir.dot(outward_normal) <= 0.0;
        let normal = if front_face {
            *outward_normal
        } else {
            -outward_normal
        };
        Self {
            p,
            normal,
            t,
            front_face,
            color,
            material,
        }
    }
}

/// A sphere. A negative radius turns the surface inside out, which makes a hollow shell when
/// nested inside a regular sphere of the same material.
pub struct Sphere {
    pub center: Point,
    pub radius: f64,
    pub material: Option<Material>,
    pub color: Color,
}
impl Sphere {
    pub fn new(center: Point, radius: f64, material: Material) -> Self {
        Self {
            center,
            radius,
            material: Some(material),
            color: Color::zeros(),
        }
    }

    /// A sphere without material, shaded with a constant color
    pub fn flat(center: Point, radius: f64, color: Color) -> Self {
        Self {
            center,
            radius,
            material: None,
            color,
        }
    }

    pub fn from_config(config: SphereConfig) -> Result<Self> {
        if config.radius == 0.0 || !config.radius.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "sphere radius must be finite and non-zero, got {}",
                config.radius
            )));
        }
        let material = config
            .material
            .map(materials::Generator::from_config)
            .transpose()?;
        Ok(Self {
            center: config.center.into(),
            radius: config.radius,
            material,
            color: config.color.map(Color::from).unwrap_or_else(Color::zeros),
        })
    }
}
impl Hittable for Sphere {
    fn try_hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let oc = ray.orig - self.center;
        let a = ray.dir.norm_squared();
        let half_b = oc.dot(&ray.dir);
        let c = oc.norm_squared() - self.radius.powi(2);
        let discriminant = half_b.powi(2) - a * c;
        if discriminant < 0.0 {
            return None;
        }

        // Find the nearest root that lies in the acceptable range; NaN roots never do
        let in_range = |t: f64| t_min <= t && t <= t_max;
        let sqrtd = discriminant.sqrt();
        let mut root = (-half_b - sqrtd) / a;
        if !in_range(root) {
            root = (-half_b + sqrtd) / a;
            if !in_range(root) {
                return None;
            }
        }
        let p = ray.get(root);
        let outward_normal = (p - self.center) / self.radius;
        Some(HitRecord::new(
            p,
            root,
            ray,
            &outward_normal,
            self.color,
            self.material
                .as_deref()
                .map(|m| m as &dyn Scatterable),
        ))
    }
}

/// Sphere config
///
/// Spheres without a material are drawn flat in `color`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereConfig {
    pub center: SerdeVector,
    pub radius: f64,
    #[serde(default)]
    pub material: Option<MaterialConfig>,
    #[serde(default)]
    pub color: Option<SerdeVector>,
}
