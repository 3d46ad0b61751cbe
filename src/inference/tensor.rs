use image::{RgbImage, imageops};

use super::{InputTensor, TensorLayout};

/// Bilinear resize to exactly `width` x `height`.
pub fn resize_exact(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, imageops::FilterType::Triangle)
}

/// Lay out pixels in `layout` order, mapping every sample through `f`.
fn image_to_tensor(img: &RgbImage, layout: TensorLayout, f: impl Fn(u8) -> f32) -> InputTensor {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut data = vec![0.0f32; w * h * 3];

    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let idx = match layout {
                TensorLayout::Nhwc => (y * w + x) * 3 + c,
                TensorLayout::Nchw => c * h * w + y * w + x,
            };
            data[idx] = f(pixel[c]);
        }
    }

    InputTensor::new(layout, h, w, data)
}

/// Classifier preprocessing: resize to `size` x `size`, scale samples to [0, 1].
pub fn classifier_input(img: &RgbImage, size: u32, layout: TensorLayout) -> InputTensor {
    let resized = resize_exact(img, size, size);
    image_to_tensor(&resized, layout, |v| v as f32 / 255.0)
}

/// Detector preprocessing: resize to `size` x `size`, then
/// `(sample - mean) * scale` per channel.
pub fn detector_input(
    img: &RgbImage,
    size: u32,
    scale: f32,
    mean: f32,
    layout: TensorLayout,
) -> InputTensor {
    let resized = resize_exact(img, size, size);
    image_to_tensor(&resized, layout, |v| (v as f32 - mean) * scale)
}
