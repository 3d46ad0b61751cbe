mod common;

use common::*;
use image::Rgb;
use wastesort::{PipelineError, decode_image, load_image};

#[test]
fn decodes_png_to_rgb() -> anyhow::Result<()> {
    let mut img = solid_image(7, 5, [10, 200, 30]);
    img.put_pixel(3, 2, Rgb([255, 0, 255]));

    let decoded = decode_image(&png_bytes(&img))?;

    assert_eq!(decoded, img);
    Ok(())
}

#[test]
fn decodes_jpeg_with_same_dimensions() -> anyhow::Result<()> {
    let img = solid_image(64, 48, [128, 128, 128]);

    let decoded = decode_image(&jpeg_bytes(&img))?;

    assert_eq!(decoded.dimensions(), (64, 48));
    let pixel = decoded.get_pixel(10, 10);
    assert!(pixel.0.iter().all(|c| c.abs_diff(128) <= 3));
    Ok(())
}

#[test]
fn converts_alpha_png_to_three_channels() -> anyhow::Result<()> {
    let rgba = image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
    let mut bytes = Vec::new();
    rgba.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;

    let decoded = decode_image(&bytes)?;

    assert_eq!(*decoded.get_pixel(0, 0), Rgb([1, 2, 3]));
    Ok(())
}

#[test]
fn rejects_other_formats() {
    let img = solid_image(4, 4, [0, 0, 0]);
    let mut bmp = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bmp), image::ImageFormat::Bmp)
        .unwrap();

    let err = decode_image(&bmp).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
}

#[test]
fn rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
}

#[test]
fn truncated_png_is_decode_error() {
    let bytes = png_bytes(&solid_image(32, 32, [9, 9, 9]));

    let err = decode_image(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

#[test]
fn load_image_reads_file() -> anyhow::Result<()> {
    let img = solid_image(12, 9, [50, 60, 70]);
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    std::fs::write(file.path(), png_bytes(&img))?;

    assert_eq!(load_image(file.path())?, img);
    Ok(())
}

#[test]
fn load_image_reports_missing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(load_image(&dir.path().join("missing.png")).is_err());
}
