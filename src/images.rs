//! Image buffer and plain-text PPM output

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use crate::{Error, Result};

/// Largest channel value written to the PPM header
pub const MAX_COLOR_VALUE: u8 = 255;

/// Rendered 8-bit pixels, stored row-major with the top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}
impl ImageBuffer {
    /// Wrap pixels already laid out top row first
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    /// Pixel in column `x` of row `row`, where row 0 is the top of the image
    pub fn get(&self, x: u32, row: u32) -> [u8; 3] {
        self.pixels[self.index(x, row)]
    }

    fn index(&self, x: u32, row: u32) -> usize {
        row as usize * self.width as usize + x as usize
    }

    /// Write as plain-text PPM: a `P3` header line, the dimensions line, then one `r g b`
    /// triple per line from the top-left pixel onwards
    pub fn write_ppm<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {} {}", self.width, self.height, MAX_COLOR_VALUE)?;
        for [r, g, b] in &self.pixels {
            writeln!(out, "{r} {g} {b}")?;
        }
        out.flush()
    }

    pub fn to_ppm_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_ppm(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn save_ppm(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_ppm(BufWriter::new(file))?;
        Ok(())
    }

    /// Read back plain-text PPM as written by [`ImageBuffer::write_ppm`]
    ///
    /// Tokens may be separated by any whitespace. The maximum color value must be 255.
    pub fn parse_ppm(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        let magic = tokens.next();
        if magic != Some("P3") {
            return Err(Error::Ppm(format!("expected P3 header, got {magic:?}")));
        }
        let mut number = |what: &str| -> Result<u32> {
            let tok = tokens
                .next()
                .ok_or_else(|| Error::Ppm(format!("missing {what}")))?;
            tok.parse()
                .map_err(|_| Error::Ppm(format!("invalid {what}: {tok:?}")))
        };
        let width = number("width")?;
        let height = number("height")?;
        let max = number("max color value")?;
        if max != u32::from(MAX_COLOR_VALUE) {
            return Err(Error::Ppm(format!("unsupported max color value {max}")));
        }

        // Grows with the data actually present; the header alone is not trusted
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::Ppm(format!("{width}x{height} is too large")))?;
        let mut pixels = Vec::new();
        for _ in 0..count {
            let mut rgb = [0u8; 3];
            for channel in &mut rgb {
                let value = number("channel")?;
                *channel = u8::try_from(value)
                    .map_err(|_| Error::Ppm(format!("channel {value} out of range")))?;
            }
            pixels.push(rgb);
        }
        if let Some(extra) = tokens.next() {
            return Err(Error::Ppm(format!("trailing data starting at {extra:?}")));
        }
        Ok(Self::from_pixels(width, height, pixels))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| Rgb(self.get(x, y)))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgb_image().save(path)?;
        Ok(())
    }
}

/// Convert every `.ppm` file in `in_dir` into a `.png` with the same stem in `out_dir`
///
/// Returns the written paths, sorted.
pub fn convert_dir(in_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    for entry in fs::read_dir(in_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("ppm") {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let target = out_dir.join(stem).with_extension("png");
        match image::open(&path) {
            Ok(img) => {
                img.to_rgb8().save(&target)?;
                log::info!("Converted {} to {}", path.display(), target.display());
                written.push(target);
            }
            Err(e) => log::warn!("Skipping {}: {e}", path.display()),
        }
    }
    written.sort();
    Ok(written)
}
