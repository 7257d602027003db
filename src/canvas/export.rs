//! PNG export of the drawing surface.
//!
//! Every export flattens the transparent bitmap onto an opaque white
//! background in a scratch buffer first: downstream consumers of the payload
//! need an opaque image, while the visible surface keeps its transparency.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

use super::surface::DrawingSurface;

/// Prefix of the self-describing data-URL export form.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes the white-composited surface as PNG bytes.
///
/// # Errors
/// - If PNG encoding fails
pub fn export_png(surface: &DrawingSurface) -> Result<Vec<u8>> {
    let rgb = surface.composite_on_white();

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, surface.width(), surface.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .context("failed to write PNG header")?;
        writer
            .write_image_data(&rgb)
            .context("failed to write PNG image data")?;
    }

    Ok(bytes)
}

/// The white-composited PNG as a base64 payload, prefix-free.
///
/// # Errors
/// - If PNG encoding fails
pub fn export_base64(surface: &DrawingSurface) -> Result<String> {
    Ok(STANDARD.encode(export_png(surface)?))
}

/// The white-composited PNG as a `data:image/png;base64,` URL.
///
/// # Errors
/// - If PNG encoding fails
pub fn export_data_url(surface: &DrawingSurface) -> Result<String> {
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, export_base64(surface)?))
}

/// Writes the white-composited PNG to disk.
///
/// # Errors
/// - If PNG encoding fails or the file cannot be written
pub fn download(surface: &DrawingSurface, path: &Path) -> Result<()> {
    let bytes = export_png(surface)?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Drawing saved: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::surface::Point;
    use std::io::Cursor;

    fn decode_png(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_export_flattens_onto_opaque_white() {
        let mut surface = DrawingSurface::default();
        surface.draw_segment(Point::new(10.0, 10.0), Point::new(50.0, 50.0));

        let bytes = export_png(&surface).unwrap();
        let (info, buf) = decode_png(&bytes);

        assert_eq!(info.width, 500);
        assert_eq!(info.height, 500);
        assert_eq!(info.color_type, png::ColorType::Rgb);

        // A background pixel far from the stroke is white, not transparent
        let offset = ((400 * 500 + 400) * 3) as usize;
        assert_eq!(&buf[offset..offset + 3], &[255, 255, 255]);

        // The stroke itself is black
        let offset = ((30 * 500 + 30) * 3) as usize;
        assert_eq!(&buf[offset..offset + 3], &[0, 0, 0]);
    }

    #[test]
    fn test_data_url_payload_matches_base64_export() {
        let mut surface = DrawingSurface::default();
        surface.draw_segment(Point::new(0.0, 0.0), Point::new(5.0, 5.0));

        let payload = export_base64(&surface).unwrap();
        let data_url = export_data_url(&surface).unwrap();

        assert!(data_url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(&data_url[PNG_DATA_URL_PREFIX.len()..], payload);

        let decoded = STANDARD.decode(&payload).unwrap();
        assert_eq!(decoded, export_png(&surface).unwrap());
    }

    #[test]
    fn test_download_writes_a_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.png");

        let mut surface = DrawingSurface::new(16, 16, 2.0);
        surface.draw_segment(Point::new(2.0, 2.0), Point::new(12.0, 12.0));
        download(&surface, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let (info, _) = decode_png(&bytes);
        assert_eq!(info.width, 16);
        assert_eq!(info.height, 16);
    }
}
