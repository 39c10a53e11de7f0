use image::{imageops::FilterType, ImageReader, RgbImage};
use ndarray::{Array, Ix4};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{0}")]
    Read(#[from] std::io::Error),
    #[error("{0}")]
    Decode(#[from] image::ImageError),
}

pub fn decode_rgb(image_data: &[u8]) -> Result<RgbImage, TransformError> {
    let image = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()?
        .decode()?;

    Ok(image.to_rgb8())
}

/// Resizes to `width` x `height` and lays the pixels out as a
/// `(1, height, width, 3)` batch scaled to [0, 1].
pub fn to_input_tensor(image: &RgbImage, width: u32, height: u32) -> Array<f32, Ix4> {
    let resized = image::imageops::resize(image, width, height, FilterType::CatmullRom);

    Array::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, channel)| {
            let pixel = resized.get_pixel(x as u32, y as u32);
            (pixel.0[channel] as f32) / 255.
        },
    )
}

pub fn transform_image(
    image_data: &[u8],
    width: u32,
    height: u32,
) -> Result<Array<f32, Ix4>, TransformError> {
    let image = decode_rgb(image_data)?;
    Ok(to_input_tensor(&image, width, height))
}
