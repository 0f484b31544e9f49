use std::fs;
use std::path::Path;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use tiny_skia::{Pixmap, Transform};

use crate::diagram::VectorImage;
use crate::error::SheetError;
use crate::fonts::FontLibrary;

/// Renders `image` into a square-pixel bitmap `px` wide.
pub fn rasterize(image: &VectorImage, px: u32, fonts: &FontLibrary) -> Result<Pixmap, SheetError> {
    let tree = fonts
        .parse(&image.svg)
        .map_err(|source| SheetError::DiagramConversion { index: 0, source })?;
    let scale = px as f32 / tree.size.width();
    let height = (tree.size.height() * scale).round() as u32;
    let mut pixmap = Pixmap::new(px, height).ok_or(SheetError::Raster { width: px, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// RGBA PNG with fixed encoder settings, so equal pixmaps give equal bytes.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, SheetError> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        enc.set_filter(FilterType::NoFilter);
        enc.set_compression(Compression::Default);
        let mut writer = enc.write_header()?;
        writer.write_image_data(pixmap.data())?;
    }
    Ok(buf)
}

pub fn write_png(path: impl AsRef<Path>, pixmap: &Pixmap) -> Result<(), SheetError> {
    let path = path.as_ref();
    let bytes = encode_png(pixmap)?;
    fs::write(path, bytes).map_err(|source| SheetError::RenderTarget {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(fill: &str) -> VectorImage {
        VectorImage {
            svg: format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40" viewBox="0 0 40 40"><rect width="40" height="40" fill="{fill}"/></svg>"#
            ),
            width: 40.0,
            height: 40.0,
        }
    }

    #[test]
    fn rasterize_scales_to_requested_width() {
        let pixmap = rasterize(&square("#ff0000"), 120, &FontLibrary::empty()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (120, 120));
        let px = pixmap.pixel(60, 60).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn png_output_is_deterministic() {
        let fonts = FontLibrary::empty();
        let a = encode_png(&rasterize(&square("#123456"), 64, &fonts).unwrap()).unwrap();
        let b = encode_png(&rasterize(&square("#123456"), 64, &fonts).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn zero_width_is_a_raster_error() {
        let err = rasterize(&square("#000"), 0, &FontLibrary::empty()).unwrap_err();
        assert!(matches!(err, SheetError::Raster { .. }));
    }

    #[test]
    fn write_png_reports_bad_target() {
        let dir = tempfile::tempdir().unwrap();
        let pixmap = rasterize(&square("#000"), 8, &FontLibrary::empty()).unwrap();
        let good = dir.path().join("a.png");
        write_png(&good, &pixmap).unwrap();
        assert!(good.exists());
        let bad = dir.path().join("missing").join("a.png");
        assert!(matches!(write_png(&bad, &pixmap), Err(SheetError::RenderTarget { .. })));
    }
}
