//! Utils
//!
//! Vector helpers that nalgebra does not provide, the random samplers every
//! material and camera draws from, and the color quantization used by the image buffer.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Color, Vec3};

/// Threshold below which a component is considered zero
pub const NEAR_ZERO_EPS: f64 = 1e-8;

/// Vector representation for configuration files: `[x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerdeVector(pub [f64; 3]);
impl From<SerdeVector> for Vec3 {
    fn from(v: SerdeVector) -> Self {
        Vec3::new(v.0[0], v.0[1], v.0[2])
    }
}
impl From<Vec3> for SerdeVector {
    fn from(v: Vec3) -> Self {
        Self([v[0], v[1], v[2]])
    }
}

/// How to decide a scatter direction has collapsed to zero
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearZero {
    /// `x < eps && y < eps && z < eps` without taking the absolute value.
    ///
    /// Any vector with three sufficiently negative components passes this test, so diffuse
    /// scatter directions pointing into the negative octant collapse onto the normal.
    #[default]
    Signed,
    /// `|x| < eps && |y| < eps && |z| < eps`
    Magnitude,
}
impl NearZero {
    pub fn test(self, v: &Vec3) -> bool {
        match self {
            Self::Signed => v.iter().all(|c| *c < NEAR_ZERO_EPS),
            Self::Magnitude => v.iter().all(|c| c.abs() < NEAR_ZERO_EPS),
        }
    }
}

/// Mirror `v` about the plane with normal `n`
pub fn reflect(v: &Vec3, n: &Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Bend the unit vector `uv` through a surface with normal `n` using Snell's law
///
/// `cos_theta` is the cosine between `-uv` and `n`, `etai_over_etat` the ratio of refractive
/// indices.
pub fn refract(uv: &Vec3, n: &Vec3, cos_theta: f64, etai_over_etat: f64) -> Vec3 {
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.norm_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Compute a random unit vector
///
/// Randomly generate vectors in the enclosing cube. If the norm is < 1, it is inside the unit
/// sphere and is accepted.
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = gen_random(rng, Some(-1.0), Some(1.0));

        if p.norm_squared() < 1.0 {
            // We normalize the vector on the output to more exactly represent Lambertian
            return p.normalize();
        }
    }
}

/// Generate a random vector inside a unit disk on the z = 0 plane
///
/// This simulates defocus blur
pub fn random_in_unit_disk<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0);
        if p.norm_squared() < 1.0 {
            return p;
        }
    }
}

/// Generate Random Vectors
///
/// Each component is uniform in `[min, max)`, or in `[0, 1)` when no range is given.
pub fn gen_random<R: Rng + ?Sized>(rng: &mut R, min: Option<f64>, max: Option<f64>) -> Vec3 {
    Vec3::from_iterator((0..3).map(|_| match (min, max) {
        (Some(lo), Some(hi)) => rng.gen_range(lo..hi),
        _ => rng.gen(),
    }))
}

/// Gamma-correct for gamma = 2.0
pub fn gamma2(color: &Color) -> Color {
    color.map(f64::sqrt)
}

/// Average an accumulated color and quantize it to 8-bit channels
pub fn get_pixel(color: &Color, samples_per_pixel: u32) -> [u8; 3] {
    let scale = 1.0 / f64::from(samples_per_pixel);
    let corrected = gamma2(&(scale * color));
    [
        scale_color(corrected[0]),
        scale_color(corrected[1]),
        scale_color(corrected[2]),
    ]
}

/// scale the color to between 0 and 255
fn scale_color(val: f64) -> u8 {
    (255.0 * val).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn normalize_is_scale_invariant() {
        let v = Vec3::new(3.0, -4.0, 12.0);
        for k in [0.001, 2.5, -7.0, 1e6] {
            let scaled = (v * k).normalize();
            assert_relative_eq!(scaled.norm(), 1.0, epsilon = 1e-12);
            // parallel: |cross| == 0
            assert!(scaled.cross(&v.normalize()).norm() < 1e-12);
        }
    }

    #[test]
    fn reflect_flips_normal_component() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        let n = Vec3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(reflect(&v, &n), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn refract_at_normal_incidence_goes_straight_through() {
        let uv = Vec3::new(0.0, 0.0, -1.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let out = refract(&uv, &n, 1.0, 1.0 / 1.5);
        assert_relative_eq!(out, uv, epsilon = 1e-12);
    }

    #[test]
    fn refract_obeys_snell() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let uv = Vec3::new(1.0, -1.0, 0.0).normalize();
        let cos_theta = (-uv).dot(&n);
        let ratio = 1.0 / 1.5;
        let out = refract(&uv, &n, cos_theta, ratio);
        let sin_in = (1.0 - cos_theta * cos_theta).sqrt();
        let sin_out = out.normalize().cross(&(-n)).norm();
        assert_relative_eq!(sin_out, ratio * sin_in, epsilon = 1e-12);
    }

    #[test]
    fn near_zero_signed_and_magnitude_disagree_on_negative_vectors() {
        let tiny = Vec3::new(1e-9, -1e-9, 0.0);
        assert!(NearZero::Signed.test(&tiny));
        assert!(NearZero::Magnitude.test(&tiny));

        let negative = Vec3::new(-3.0, -0.5, -100.0);
        assert!(NearZero::Signed.test(&negative));
        assert!(!NearZero::Magnitude.test(&negative));

        let positive = Vec3::new(1e-3, 0.0, 0.0);
        assert!(!NearZero::Signed.test(&positive));
        assert!(!NearZero::Magnitude.test(&positive));

        // The literal comparison is the default, the magnitude test is opt-in
        assert_eq!(NearZero::default(), NearZero::Signed);
    }

    #[test]
    fn random_samplers_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let s = random_in_unit_sphere(&mut rng);
            assert_relative_eq!(s.norm(), 1.0, epsilon = 1e-12);

            let d = random_in_unit_disk(&mut rng);
            assert!(d.norm() < 1.0);
            assert_eq!(d[2], 0.0);

            let c = gen_random(&mut rng, Some(-2.0), Some(3.0));
            assert!(c.iter().all(|x| (-2.0..3.0).contains(x)));

            let u = gen_random(&mut rng, None, None);
            assert!(u.iter().all(|x| (0.0..1.0).contains(x)));
        }
    }

    #[test]
    fn pixel_is_averaged_and_gamma_corrected() {
        // 4 samples summing to 1.0 per channel: 0.25 -> sqrt -> 0.5 -> 127.5 -> 128
        let px = get_pixel(&Color::new(1.0, 0.0, 4.0), 4);
        assert_eq!(px, [128, 0, 255]);
    }

    #[test]
    fn pixel_clamps_overbright_and_nan() {
        assert_eq!(get_pixel(&Color::new(9.0, f64::NAN, -1.0), 1), [255, 0, 0]);
    }

    #[test]
    fn serde_vector_reads_sequences() {
        let v: SerdeVector = serde_yaml::from_str("[1.0, 2.5, -3]").unwrap();
        assert_eq!(Vec3::from(v), Vec3::new(1.0, 2.5, -3.0));
    }
}
