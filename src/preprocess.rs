use crate::error::DecodeError;
use image::{imageops::FilterType, ColorType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::{Array3, Array4, ArrayView4, Axis};
use std::io::Cursor;

/// Side length of the square input the model was trained on.
pub const IMAGE_SIZE: u32 = 256;
pub const NUM_CHANNELS: usize = 3;

const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Pixel layouts the normalizer knows how to turn into RGB. Palette images are
/// expanded by the decoder, so they arrive here as `Rgb` or `Rgba`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl TryFrom<ColorType> for ColorMode {
    type Error = DecodeError;

    fn try_from(color: ColorType) -> Result<Self, Self::Error> {
        match color {
            ColorType::L8 | ColorType::L16 => Ok(ColorMode::Luma),
            ColorType::La8 | ColorType::La16 => Ok(ColorMode::LumaAlpha),
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => Ok(ColorMode::Rgb),
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Ok(ColorMode::Rgba),
            other => Err(DecodeError::UnsupportedColorMode(other)),
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    image: DynamicImage,
    color_mode: ColorMode,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }
}

/// (height, width, channel) tensor of raw 0-255 intensities, always
/// `IMAGE_SIZE x IMAGE_SIZE x 3`.
#[derive(Debug, Clone)]
pub struct NormalizedTensor(Array3<f32>);

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn get(&self, y: usize, x: usize, channel: usize) -> Option<f32> {
        self.0.get((y, x, channel)).copied()
    }

    pub fn into_batch(self) -> BatchedTensor {
        debug_assert_eq!(
            self.0.shape(),
            &[IMAGE_SIZE as usize, IMAGE_SIZE as usize, NUM_CHANNELS]
        );
        BatchedTensor(self.0.insert_axis(Axis(0)))
    }
}

/// Model input: a single-image batch, `(1, IMAGE_SIZE, IMAGE_SIZE, 3)`.
#[derive(Debug, Clone)]
pub struct BatchedTensor(Array4<f32>);

impl BatchedTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }
}

pub fn decode_image(image_data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let image_reader = image::ImageReader::new(Cursor::new(image_data)).with_guessed_format()?;
    if image_reader.format().is_none() {
        return Err(DecodeError::UnknownFormat);
    }

    let image = image_reader.decode()?;
    let color_mode = ColorMode::try_from(image.color())?;

    Ok(DecodedImage { image, color_mode })
}

fn to_rgb(decoded: DecodedImage) -> RgbImage {
    let DecodedImage { image, color_mode } = decoded;
    let (width, height) = image.dimensions();

    match color_mode {
        ColorMode::Rgb => image.into_rgb8(),
        ColorMode::Rgba => {
            let rgba = image.into_rgba8();
            RgbImage::from_fn(width, height, |x, y| {
                let [r, g, b, _] = rgba.get_pixel(x, y).0;
                Rgb([r, g, b])
            })
        }
        // 16-bit gray is scaled down to 8 bits, not clipped.
        ColorMode::Luma => {
            let gray = image.into_luma8();
            RgbImage::from_fn(width, height, |x, y| {
                let [v] = gray.get_pixel(x, y).0;
                Rgb([v, v, v])
            })
        }
        ColorMode::LumaAlpha => {
            let gray = image.into_luma_alpha8();
            RgbImage::from_fn(width, height, |x, y| {
                let [v, _] = gray.get_pixel(x, y).0;
                Rgb([v, v, v])
            })
        }
    }
}

fn resize(image: RgbImage) -> RgbImage {
    if image.dimensions() == (IMAGE_SIZE, IMAGE_SIZE) {
        return image;
    }
    // Stretches to the square; the model was trained on squashed images.
    image::imageops::resize(&image, IMAGE_SIZE, IMAGE_SIZE, RESIZE_FILTER)
}

pub fn normalize(decoded: DecodedImage) -> NormalizedTensor {
    let img = resize(to_rgb(decoded));
    let size = IMAGE_SIZE as usize;

    let tensor = Array3::from_shape_fn((size, size, NUM_CHANNELS), |(y, x, c)| {
        img.get_pixel(x as u32, y as u32)[c] as f32
    });

    NormalizedTensor(tensor)
}
