//! Compositor - load layer images, then draw them in layer order
//!
//! Loads for one artwork fan out on the rayon pool and are joined before the
//! surface is touched. Draw order always follows the layer list.

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use rand::Rng;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::{Position, Size};
use crate::error::{ForgeError, Result};

/// Drawing target shared by every artwork of a run.
pub trait Surface {
    fn clear(&mut self);
    fn fill(&mut self, color: Rgba<u8>);
    fn draw(&mut self, image: &RgbaImage, position: Position, size: Size);
    fn encode_png(&self) -> Result<Vec<u8>>;
}

/// One layer of an artwork: which file, where, how large.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDraw {
    pub path: PathBuf,
    pub position: Position,
    pub size: Size,
}

/// CPU surface backed by an RGBA buffer.
pub struct RasterSurface {
    canvas: RgbaImage,
}

impl RasterSurface {
    pub fn new(size: Size) -> Self {
        Self {
            canvas: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }
}

impl Surface for RasterSurface {
    fn clear(&mut self) {
        self.canvas.fill(0);
    }

    fn fill(&mut self, color: Rgba<u8>) {
        for px in self.canvas.pixels_mut() {
            *px = color;
        }
    }

    fn draw(&mut self, image: &RgbaImage, position: Position, size: Size) {
        if image.dimensions() == (size.width, size.height) {
            imageops::overlay(&mut self.canvas, image, position.x, position.y);
        } else {
            let scaled = imageops::resize(image, size.width, size.height, FilterType::Triangle);
            imageops::overlay(&mut self.canvas, &scaled, position.x, position.y);
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.canvas
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(ForgeError::ImageEncode)?;
        Ok(buf)
    }
}

/// Pastel lightness used for random backgrounds: `hsl(h, 100%, 85%)`.
const PASTEL_LIGHTNESS: f64 = 0.85;

/// Opaque pastel with a hue drawn from `rng`.
pub fn pastel_color<R: Rng + ?Sized>(rng: &mut R) -> Rgba<u8> {
    let hue = rng.random_range(0..360);
    hsl_to_rgba(f64::from(hue), 1.0, PASTEL_LIGHTNESS)
}

/// HSL to opaque RGBA. Hue in degrees, saturation and lightness in `0..=1`.
pub fn hsl_to_rgba(h: f64, s: f64, l: f64) -> Rgba<u8> {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let channel = |v: f64| (v * 255.0).round() as u8;
    if s == 0.0 {
        let v = channel(l);
        return Rgba([v, v, v, 255]);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Rgba([
        channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        channel(hue_to_rgb(p, q, h)),
        channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        255,
    ])
}

/// Load every image concurrently; results come back in input order.
pub fn load_images(paths: &[&Path]) -> Result<Vec<RgbaImage>> {
    paths
        .par_iter()
        .map(|path| {
            image::open(path)
                .map(|img| img.to_rgba8())
                .map_err(|source| ForgeError::ImageLoad {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect()
}

/// Clear the surface, paint the optional background, then draw every layer
/// once all loads have completed.
pub fn compose<S: Surface + ?Sized>(
    surface: &mut S,
    background: Option<Rgba<u8>>,
    draws: &[LayerDraw],
) -> Result<()> {
    let paths: Vec<&Path> = draws.iter().map(|d| d.path.as_path()).collect();
    let images = load_images(&paths)?;

    surface.clear();
    if let Some(color) = background {
        surface.fill(color);
    }
    for (draw, image) in draws.iter().zip(&images) {
        surface.draw(image, draw.position, draw.size);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solid(path: &Path, w: u32, h: u32, color: [u8; 4]) {
        RgbaImage::from_pixel(w, h, Rgba(color)).save(path).unwrap();
    }

    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.ops.push("clear".to_string());
        }

        fn fill(&mut self, color: Rgba<u8>) {
            self.ops.push(format!("fill {}", color[0]));
        }

        fn draw(&mut self, image: &RgbaImage, position: Position, _size: Size) {
            let px = image.get_pixel(0, 0);
            self.ops.push(format!("draw {} at {},{}", px[0], position.x, position.y));
        }

        fn encode_png(&self) -> Result<Vec<u8>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_draw_order_follows_layer_list() {
        let dir = tempfile::tempdir().unwrap();
        let size = Size { width: 2, height: 2 };
        let mut draws = vec![];
        for (i, red) in [10u8, 20, 30].iter().enumerate() {
            let path = dir.path().join(format!("{}.png", i));
            solid(&path, 2, 2, [*red, 0, 0, 255]);
            draws.push(LayerDraw { path, position: Position { x: i as i64, y: 0 }, size });
        }

        let mut surface = RecordingSurface::default();
        compose(&mut surface, None, &draws).unwrap();
        assert_eq!(
            surface.ops,
            vec!["clear", "draw 10 at 0,0", "draw 20 at 1,0", "draw 30 at 2,0"]
        );
    }

    #[test]
    fn test_later_layers_stack_on_top() {
        let dir = tempfile::tempdir().unwrap();
        let bottom = dir.path().join("bottom.png");
        let top = dir.path().join("top.png");
        solid(&bottom, 4, 4, [255, 0, 0, 255]);
        solid(&top, 2, 2, [0, 0, 255, 255]);

        let mut surface = RasterSurface::new(Size { width: 4, height: 4 });
        compose(
            &mut surface,
            None,
            &[
                LayerDraw { path: bottom, position: Position::default(), size: Size { width: 4, height: 4 } },
                LayerDraw { path: top, position: Position { x: 2, y: 2 }, size: Size { width: 2, height: 2 } },
            ],
        )
        .unwrap();

        assert_eq!(surface.image().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.image().get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_layers_scaled_to_configured_size() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.png");
        solid(&small, 1, 1, [0, 255, 0, 255]);

        let mut surface = RasterSurface::new(Size { width: 3, height: 3 });
        compose(
            &mut surface,
            None,
            &[LayerDraw { path: small, position: Position::default(), size: Size { width: 3, height: 3 } }],
        )
        .unwrap();
        assert_eq!(surface.image().get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_clear_between_artworks() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.png");
        let corner = dir.path().join("corner.png");
        solid(&full, 2, 2, [9, 9, 9, 255]);
        solid(&corner, 1, 1, [1, 1, 1, 255]);

        let mut surface = RasterSurface::new(Size { width: 2, height: 2 });
        let size = Size { width: 2, height: 2 };
        compose(&mut surface, None, &[LayerDraw { path: full, position: Position::default(), size }]).unwrap();
        compose(
            &mut surface,
            None,
            &[LayerDraw { path: corner, position: Position::default(), size: Size { width: 1, height: 1 } }],
        )
        .unwrap();

        assert_eq!(surface.image().get_pixel(1, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_missing_image_aborts_before_drawing() {
        let mut surface = RecordingSurface::default();
        let err = compose(
            &mut surface,
            Some(Rgba([1, 2, 3, 255])),
            &[LayerDraw {
                path: PathBuf::from("/no/such/card.png"),
                position: Position::default(),
                size: Size { width: 1, height: 1 },
            }],
        )
        .unwrap_err();
        assert!(matches!(err, ForgeError::ImageLoad { .. }));
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_background_filled_before_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        solid(&path, 1, 1, [40, 0, 0, 255]);
        let draw = LayerDraw { path, position: Position::default(), size: Size { width: 1, height: 1 } };

        let mut recording = RecordingSurface::default();
        compose(&mut recording, Some(Rgba([200, 220, 255, 255])), &[draw.clone()]).unwrap();
        assert_eq!(recording.ops, vec!["clear", "fill 200", "draw 40 at 0,0"]);

        let mut surface = RasterSurface::new(Size { width: 2, height: 2 });
        compose(&mut surface, Some(Rgba([200, 220, 255, 255])), &[draw]).unwrap();
        assert_eq!(surface.image().get_pixel(0, 0), &Rgba([40, 0, 0, 255]));
        assert_eq!(surface.image().get_pixel(1, 1), &Rgba([200, 220, 255, 255]));
    }

    #[test]
    fn test_hsl_to_rgba() {
        assert_eq!(hsl_to_rgba(0.0, 1.0, 0.5), Rgba([255, 0, 0, 255]));
        assert_eq!(hsl_to_rgba(120.0, 1.0, 0.5), Rgba([0, 255, 0, 255]));
        assert_eq!(hsl_to_rgba(240.0, 1.0, 0.5), Rgba([0, 0, 255, 255]));
        let pastel = hsl_to_rgba(0.0, 1.0, 0.85);
        assert_eq!(pastel[0], 255);
        assert_eq!(pastel[1], pastel[2]);
        assert_eq!(hsl_to_rgba(90.0, 0.0, 1.0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_pastel_color_seeded() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let color = pastel_color(&mut a);
            assert_eq!(color, pastel_color(&mut b));
            assert!(color.0.iter().all(|&c| c >= 178));
            assert_eq!(color[3], 255);
        }
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let surface = RasterSurface::new(Size { width: 5, height: 3 });
        let bytes = surface.encode_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }
}
