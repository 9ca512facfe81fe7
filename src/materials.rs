//! Implementation of materials

use crate::{
    objects::HitRecord,
    utils::{self, NearZero, SerdeVector},
    Color, Error, Material, Ray, Result,
};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Material
///
/// Every material must say how it scatters; emission defaults to black.
pub trait Scatterable {
    fn try_scatter(
        &self,
        ray_in: &Ray,
        hit_record: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult>;

    fn emitted(&self) -> Color {
        Color::zeros()
    }
}

/// Scatter Result
#[derive(Debug)]
pub struct ScatterResult {
    /// Attenuation Color
    pub attenuation: Color,
    /// Resulting Scattered Ray
    pub scattered: Ray,
}

/// Config for materials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialConfig {
    Lambertian(LambertianConfig),
    Metal(MetalConfig),
    Dielectric(DielectricConfig),
    DiffuseLight(DiffuseLightConfig),
}

/// Generator from config
pub struct Generator;
impl Generator {
    pub fn from_config(config: MaterialConfig) -> Result<Material> {
        Ok(match config {
            MaterialConfig::Lambertian(c) => Box::new(Lambertian::from_config(c)),
            MaterialConfig::Metal(c) => Box::new(Metal::from_config(c)?),
            MaterialConfig::Dielectric(c) => Box::new(Dielectric::from_config(c)?),
            MaterialConfig::DiffuseLight(c) => Box::new(DiffuseLight::from_config(c)?),
        })
    }
}

/// Lambertian Scatterer
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
    near_zero: NearZero,
}
impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo,
            near_zero: NearZero::default(),
        }
    }

    /// Choose how a degenerate scatter direction is detected
    pub fn with_near_zero(mut self, near_zero: NearZero) -> Self {
        self.near_zero = near_zero;
        self
    }

    pub fn from_config(config: LambertianConfig) -> Self {
        Self::new(config.albedo.into()).with_near_zero(config.near_zero)
    }
}
impl Scatterable for Lambertian {
    fn try_scatter(
        &self,
        _ray_in: &Ray,
        hit_record: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let mut scatter_direction = hit_record.normal + utils::random_in_unit_sphere(rng);

        // Protect against if hit_record.normal and the random_in_unit_sphere as exact opposites
        if self.near_zero.test(&scatter_direction) {
            scatter_direction = hit_record.normal;
        }
        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(hit_record.p, scatter_direction),
        })
    }
}

/// Lambertian Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambertianConfig {
    pub albedo: SerdeVector,
    #[serde(default)]
    pub near_zero: NearZero,
}

/// Metal Scatterer
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f64,
}
impl Metal {
    /// Fuzz above 1 is clamped to 1
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        Self {
            albedo,
            fuzz: fuzz.min(1.0),
        }
    }

    pub fn fuzz(&self) -> f64 {
        self.fuzz
    }

    pub fn from_config(config: MetalConfig) -> Result<Self> {
        if config.fuzz < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "metal fuzz must not be negative, got {}",
                config.fuzz
            )));
        }
        Ok(Self::new(config.albedo.into(), config.fuzz))
    }
}
impl Scatterable for Metal {
    fn try_scatter(
        &self,
        ray_in: &Ray,
        hit_record: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let reflected = utils::reflect(&ray_in.dir.normalize(), &hit_record.normal);
        let scattered = Ray::new(
            hit_record.p,
            reflected + self.fuzz * utils::random_in_unit_sphere(rng),
        );
        // Fuzzed below the surface: absorbed
        if scattered.dir.dot(&hit_record.normal) > 0.0 {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered,
            })
        } else {
            None
        }
    }
}

/// Metal Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetalConfig {
    pub albedo: SerdeVector,
    #[serde(default)]
    pub fuzz: f64,
}

/// A Dielectric is a refractive material, such as glass
#[derive(Debug, Clone)]
pub struct Dielectric {
    ir: f64,
}
impl Dielectric {
    pub fn new(ir: f64) -> Self {
        Self { ir }
    }

    pub fn from_config(config: DielectricConfig) -> Result<Self> {
        if config.ir <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "index of refraction must be positive, got {}",
                config.ir
            )));
        }
        Ok(Self::new(config.ir))
    }

    /// Use Schlick's approximation for reflectance
    pub fn reflectance(cosine: f64, ref_idx: f64) -> f64 {
        let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }

    fn refraction_ratio(&self, front_face: bool) -> f64 {
        if front_face {
            1.0 / self.ir
        } else {
            self.ir
        }
    }

    /// Whether Snell's law has no solution (total internal reflection)
    pub fn cannot_refract(&self, cos_theta: f64, front_face: bool) -> bool {
        let sin_theta = (1.0 - cos_theta.powi(2)).sqrt();
        self.refraction_ratio(front_face) * sin_theta > 1.0
    }
}
impl Scatterable for Dielectric {
    fn try_scatter(
        &self,
        ray_in: &Ray,
        hit_record: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let refraction_ratio = self.refraction_ratio(hit_record.front_face);

        let unit_direction = ray_in.dir.normalize();
        let cos_theta = (-unit_direction).dot(&hit_record.normal).min(1.0);

        let direction = if self.cannot_refract(cos_theta, hit_record.front_face)
            || Self::reflectance(cos_theta, refraction_ratio) > rng.gen::<f64>()
        {
            utils::reflect(&unit_direction, &hit_record.normal)
        } else {
            utils::refract(
                &unit_direction,
                &hit_record.normal,
                cos_theta,
                refraction_ratio,
            )
        };

        Some(ScatterResult {
            attenuation: Color::new(1.0, 1.0, 1.0),
            scattered: Ray::new(hit_record.p, direction),
        })
    }
}

/// Dielectric Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DielectricConfig {
    pub ir: f64,
}

/// A light source: emits `color * intensity` and absorbs everything that hits it
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    color: Color,
    intensity: f64,
}
impl DiffuseLight {
    pub fn new(color: Color, intensity: f64) -> Self {
        Self { color, intensity }
    }

    pub fn from_config(config: DiffuseLightConfig) -> Result<Self> {
        if config.intensity < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "light intensity must not be negative, got {}",
                config.intensity
            )));
        }
        Ok(Self::new(config.color.into(), config.intensity))
    }
}
impl Scatterable for DiffuseLight {
    fn try_scatter(
        &self,
        _ray_in: &Ray,
        _hit_record: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        None
    }

    fn emitted(&self) -> Color {
        self.color * self.intensity
    }
}

/// Diffuse Light Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffuseLightConfig {
    pub color: SerdeVector,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

fn default_intensity() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Vec3};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(normal: Vec3, front_face: bool) -> HitRecord<'static> {
        HitRecord {
            p: Point::zeros(),
            normal,
            t: 1.0,
            front_face,
            color: Color::zeros(),
            material: None,
        }
    }

    #[test]
    fn lambertian_always_scatters_off_the_surface() {
        let mat = Lambertian::new(Color::new(0.1, 0.2, 0.3));
        let hr = record(Vec3::new(0.0, 1.0, 0.0), true);
        let ray = Ray::new(Point::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let sr = mat.try_scatter(&ray, &hr, &mut rng).unwrap();
            assert_eq!(sr.attenuation, Color::new(0.1, 0.2, 0.3));
            assert_eq!(sr.scattered.orig, hr.p);
            assert!(sr.scattered.dir.dot(&hr.normal) >= 0.0);
            assert!(sr.scattered.dir.norm() > 0.0);
        }
    }

    #[test]
    fn default_lambertian_collapses_negative_octant_scatter_onto_normal() {
        let normal = Vec3::new(-1.0, -1.0, -1.0).normalize();
        let hr = record(normal, true);
        let ray = Ray::new(Point::new(1.0, 1.0, 1.0), Vec3::new(-1.0, -1.0, -1.0));
        let count_collapsed = |mat: &Lambertian, seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..1000)
                .filter(|_| mat.try_scatter(&ray, &hr, &mut rng).unwrap().scattered.dir == normal)
                .count()
        };

        let literal = Lambertian::new(Color::new(0.5, 0.5, 0.5));
        assert!(count_collapsed(&literal, 42) > 100);

        let corrected = literal.clone().with_near_zero(NearZero::Magnitude);
        assert_eq!(count_collapsed(&corrected, 42), 0);
    }

    #[test]
    fn metal_fuzz_is_clamped() {
        assert_eq!(Metal::new(Color::zeros(), 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::zeros(), 0.25).fuzz(), 0.25);
    }

    #[test]
    fn polished_metal_mirrors() {
        let mat = Metal::new(Color::new(0.8, 0.8, 0.8), 0.0);
        let hr = record(Vec3::new(0.0, 1.0, 0.0), true);
        let ray = Ray::new(Point::new(-1.0, 1.0, 0.0), Vec3::new(2.0, -2.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);
        let sr = mat.try_scatter(&ray, &hr, &mut rng).unwrap();
        assert_relative_eq!(
            sr.scattered.dir,
            Vec3::new(1.0, 1.0, 0.0).normalize(),
            epsilon = 1e-12
        );
        assert_eq!(sr.attenuation, Color::new(0.8, 0.8, 0.8));
    }

    #[test]
    fn metal_absorbs_whenever_fuzz_pushes_below_surface() {
        // Grazing incidence with maximum fuzz: plenty of draws end up under the surface
        let mat = Metal::new(Color::new(1.0, 1.0, 1.0), 1.0);
        let hr = record(Vec3::new(0.0, 1.0, 0.0), true);
        let ray = Ray::new(Point::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let mut rng = StdRng::seed_from_u64(7);
        let mut absorbed = 0;
        for _ in 0..1000 {
            match mat.try_scatter(&ray, &hr, &mut rng) {
                Some(sr) => assert!(sr.scattered.dir.dot(&hr.normal) > 0.0),
                None => absorbed += 1,
            }
        }
        assert!(absorbed > 0);
        assert!(absorbed < 1000);
    }

    #[test]
    fn dielectric_normal_incidence() {
        let glass = Dielectric::new(1.5);
        assert!(!glass.cannot_refract(1.0, true));
        assert!(!glass.cannot_refract(1.0, false));
        assert_relative_eq!(Dielectric::reflectance(1.0, 1.5), 0.04, epsilon = 1e-12);
        // Same value from the inverted ratio used on entry
        assert_relative_eq!(Dielectric::reflectance(1.0, 1.0 / 1.5), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn dielectric_total_internal_reflection() {
        let glass = Dielectric::new(1.5);
        // Leaving the glass at 60 degrees: 1.5 * sin(60) > 1
        let cos_theta = 60f64.to_radians().cos();
        assert!(glass.cannot_refract(cos_theta, false));
        assert!(!glass.cannot_refract(cos_theta, true));

        let n = Vec3::new(0.0, 1.0, 0.0);
        let hr = record(n, false);
        let dir = Vec3::new(60f64.to_radians().sin(), -cos_theta, 0.0);
        let ray = Ray::new(Point::new(-1.0, 1.0, 0.0), dir);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let sr = glass.try_scatter(&ray, &hr, &mut rng).unwrap();
            assert_relative_eq!(sr.scattered.dir, utils::reflect(&dir, &n), epsilon = 1e-12);
            assert_eq!(sr.attenuation, Color::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn dielectric_mostly_transmits_at_normal_incidence() {
        let glass = Dielectric::new(1.5);
        let hr = record(Vec3::new(0.0, 0.0, 1.0), true);
        let ray = Ray::new(Point::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rng = StdRng::seed_from_u64(42);
        let transmitted = (0..1000)
            .filter(|_| glass.try_scatter(&ray, &hr, &mut rng).unwrap().scattered.dir[2] < 0.0)
            .count();
        // ~4% reflect
        assert!(transmitted > 900, "transmitted {transmitted}");
        assert!(transmitted < 1000);
    }

    #[test]
    fn light_never_scatters() {
        let light = DiffuseLight::new(Color::new(1.0, 0.5, 0.0), 3.0);
        let hr = record(Vec3::new(0.0, 1.0, 0.0), true);
        let ray = Ray::new(Point::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);
        assert!(light.try_scatter(&ray, &hr, &mut rng).is_none());
        assert_eq!(light.emitted(), Color::new(3.0, 1.5, 0.0));
        assert_eq!(Lambertian::new(Color::zeros()).emitted(), Color::zeros());
    }

    #[test]
    fn config_is_tagged_and_validated() {
        let cfg: MaterialConfig =
            serde_yaml::from_str("{ type: Metal, albedo: [0.5, 0.5, 0.5], fuzz: 0.3 }").unwrap();
        assert!(Generator::from_config(cfg).is_ok());

        let cfg: MaterialConfig = serde_yaml::from_str("{ type: Dielectric, ir: 0.0 }").unwrap();
        assert!(matches!(
            Generator::from_config(cfg),
            Err(Error::InvalidConfig(_))
        ));

        let cfg: MaterialConfig =
            serde_yaml::from_str("{ type: Lambertian, albedo: [1, 0, 0], near_zero: magnitude }")
                .unwrap();
        match cfg {
            MaterialConfig::Lambertian(c) => assert_eq!(c.near_zero, NearZero::Magnitude),
            other => panic!("unexpected {other:?}"),
        }

        let cfg: MaterialConfig =
            serde_yaml::from_str("{ type: DiffuseLight, color: [1, 1, 1] }").unwrap();
        match cfg {
            MaterialConfig::DiffuseLight(c) => assert_eq!(c.intensity, 1.0),
            other => panic!("unexpected {other:?}"),
        }
    }
}
