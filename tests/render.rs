//! Scene description in, PPM files out

use std::fs;

use sphere_tracer::images::ImageBuffer;
use sphere_tracer::scenes::{Scene, SceneConfig};

const SCENE: &str = r#"
name: lenses
seed: 21
cameras:
  - aspect_ratio: 1.5
    image_width: 12
    focal_length: 1.0
    fov: 90
    max_depth: 8
  - aspect_ratio: 1.5
    image_width: 12
    focal_length: 2.0
    fov: 60
    samples_per_pixel: 2
    max_depth: 8
    background: [[0, 0, 0], [0, 0, 0]]
    look_from: [0, 1, 1]
    aperture: 0.2
objects:
  - center: [0, -100.5, -1]
    radius: 100
    material: { type: Lambertian, albedo: [0.8, 0.8, 0.0] }
  - center: [0, 0, -1]
    radius: 0.5
    material: { type: Lambertian, albedo: [0.1, 0.2, 0.5], near_zero: magnitude }
  - center: [-1, 0, -1]
    radius: 0.5
    material: { type: Dielectric, ir: 1.5 }
  - center: [-1, 0, -1]
    radius: -0.4
    material: { type: Dielectric, ir: 1.5 }
  - center: [1, 0, -1]
    radius: 0.5
    material: { type: Metal, albedo: [0.8, 0.6, 0.2], fuzz: 0.3 }
  - center: [0, 2, -1]
    radius: 0.5
    material: { type: DiffuseLight, color: [1, 0.9, 0.8], intensity: 4 }
  - center: [0, 0.5, -3]
    radius: 0.25
    color: [1, 0, 1]
"#;

fn render_into(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut config = SceneConfig::from_yaml_str(SCENE).unwrap();
    config.output_dir = dir.to_path_buf();
    Scene::from_config(config).unwrap().render().unwrap()
}

#[test]
fn renders_every_camera_to_numbered_files() {
    let root = std::env::temp_dir().join(format!("sphere-tracer-render-{}", std::process::id()));
    let first = root.join("a");
    let second = root.join("b");

    let written = render_into(&first);
    assert_eq!(written, vec![first.join("lenses.ppm"), first.join("lenses-2.ppm")]);

    for path in &written {
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("P3\n12 8 255\n"));
        let image = ImageBuffer::parse_ppm(&text).unwrap();
        assert_eq!((image.width(), image.height()), (12, 8));
    }

    // Fixed seed: byte-identical output
    let again = render_into(&second);
    for (a, b) in written.iter().zip(&again) {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    fs::remove_dir_all(&root).unwrap();
}
