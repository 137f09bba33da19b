//! Image transformer - turns one upload into the derivatives its policy asks for

use crate::image::resize::ImageResize;
use folio_core::{AppError, AssetPolicy, DerivativeSpec, OutputFormat, MIME_SVG};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {label} derivative: {reason}")]
    Encode { label: String, reason: String },

    #[error("Invalid SVG document: {0}")]
    InvalidSvg(String),

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Policy defines no derivatives")]
    NoDerivatives,

    #[error("Transform task failed: {0}")]
    Task(String),
}

impl From<TransformError> for AppError {
    fn from(err: TransformError) -> Self {
        AppError::ImageProcessing(err.to_string())
    }
}

/// One encoded output of a transform.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub label: &'static str,
    /// Pixel size; `None` for vector pass-through.
    pub dimensions: Option<(u32, u32)>,
    pub format: OutputFormat,
    pub data: Vec<u8>,
}

impl Derivative {
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Source format and size, read without resizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: String,
    pub width: u32,
    pub height: u32,
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Produce every derivative of `policy`, in policy order.
    ///
    /// SVG input under a pass-through policy is returned byte-identical under the
    /// first derivative's label.
    pub fn transform(
        data: &[u8],
        content_type: &str,
        policy: &AssetPolicy,
    ) -> Result<Vec<Derivative>, TransformError> {
        let first = policy.derivatives.first().ok_or(TransformError::NoDerivatives)?;

        if policy.vector_passthrough && content_type == MIME_SVG {
            Self::check_svg(data)?;
            return Ok(vec![Derivative {
                label: first.label,
                dimensions: None,
                format: OutputFormat::Svg,
                data: data.to_vec(),
            }]);
        }

        let img = Self::decode(data)?;
        policy
            .derivatives
            .iter()
            .map(|spec| Self::render(&img, spec))
            .collect()
    }

    /// Same as [`transform`](Self::transform), on tokio's blocking pool.
    pub async fn transform_async(
        data: bytes::Bytes,
        content_type: String,
        policy: &'static AssetPolicy,
    ) -> Result<Vec<Derivative>, TransformError> {
        tokio::task::spawn_blocking(move || Self::transform(&data, &content_type, policy))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))?
    }

    pub fn probe(data: &[u8]) -> Result<ImageInfo, TransformError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .map(|f| format!("{:?}", f).to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| TransformError::Decode(e.to_string()))?;

        Ok(ImageInfo {
            format,
            width,
            height,
        })
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, TransformError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| TransformError::Decode(e.to_string()))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(TransformError::EmptyImage);
        }
        Ok(img)
    }

    fn render(img: &DynamicImage, spec: &DerivativeSpec) -> Result<Derivative, TransformError> {
        let resized = ImageResize::apply(img, spec);
        let (width, height) = resized.dimensions();
        let data = Self::encode_webp(&resized, spec)?;

        tracing::debug!(
            label = spec.label,
            width,
            height,
            quality = spec.quality,
            size_bytes = data.len(),
            "Rendered derivative"
        );

        Ok(Derivative {
            label: spec.label,
            dimensions: Some((width, height)),
            format: OutputFormat::WebP,
            data,
        })
    }

    fn encode_webp(img: &DynamicImage, spec: &DerivativeSpec) -> Result<Vec<u8>, TransformError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let encoder = webp::Encoder::from_rgba(&rgba, width, height);
        let webp_data = encoder.encode(spec.quality as f32);

        if webp_data.is_empty() {
            return Err(TransformError::Encode {
                label: spec.label.to_string(),
                reason: "encoder produced no output".to_string(),
            });
        }
        Ok(webp_data.to_vec())
    }

    /// Light check only: UTF-8 markup with an `<svg` element.
    fn check_svg(data: &[u8]) -> Result<(), TransformError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| TransformError::InvalidSvg("not UTF-8 text".to_string()))?;
        if !text.contains("<svg") {
            return Err(TransformError::InvalidSvg("missing <svg> element".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::AssetKind;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }));
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(data, ImageFormat::WebP)
            .unwrap()
            .dimensions()
    }

    #[test]
    fn test_cover_produces_exact_small_and_large() {
        let data = create_test_image(1600, 900, ImageFormat::Png);
        let out =
            ImageTransformer::transform(&data, "image/png", AssetKind::Cover.policy()).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "small");
        assert_eq!(out[0].dimensions, Some((400, 400)));
        assert_eq!(decoded_dimensions(&out[0].data), (400, 400));
        assert_eq!(out[1].label, "large");
        assert_eq!(decoded_dimensions(&out[1].data), (1000, 1000));
        assert!(out.iter().all(|d| d.format == OutputFormat::WebP));
    }

    #[test]
    fn test_cover_from_thin_strip() {
        let data = create_test_image(10000, 1, ImageFormat::Png);
        let out =
            ImageTransformer::transform(&data, "image/png", AssetKind::Cover.policy()).unwrap();

        assert_eq!(decoded_dimensions(&out[0].data), (400, 400));
        assert_eq!(decoded_dimensions(&out[1].data), (1000, 1000));

        let data = create_test_image(4, 1000, ImageFormat::Png);
        let out =
            ImageTransformer::transform(&data, "image/png", AssetKind::Avatar.policy()).unwrap();
        assert_eq!(decoded_dimensions(&out[0].data), (400, 400));
    }

    #[test]
    fn test_picture_fits_inside_without_upscaling() {
        let policy = AssetKind::Picture.policy();

        let large = create_test_image(2400, 1800, ImageFormat::Jpeg);
        let out = ImageTransformer::transform(&large, "image/jpeg", policy).unwrap();
        assert_eq!(decoded_dimensions(&out[0].data), (1200, 900));

        let small = create_test_image(640, 480, ImageFormat::Png);
        let out = ImageTransformer::transform(&small, "image/png", policy).unwrap();
        assert_eq!(decoded_dimensions(&out[0].data), (640, 480));
    }

    #[test]
    fn test_svg_icon_passes_through_unchanged() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        let out =
            ImageTransformer::transform(svg, MIME_SVG, AssetKind::Icon.policy()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].format, OutputFormat::Svg);
        assert_eq!(out[0].data, svg.to_vec());
        assert_eq!(out[0].dimensions, None);
    }

    #[test]
    fn test_malformed_svg_is_rejected() {
        let result =
            ImageTransformer::transform(b"not markup", MIME_SVG, AssetKind::Icon.policy());
        assert!(matches!(result, Err(TransformError::InvalidSvg(_))));

        let result =
            ImageTransformer::transform(&[0xff, 0xfe, 0x00], MIME_SVG, AssetKind::Icon.policy());
        assert!(matches!(result, Err(TransformError::InvalidSvg(_))));
    }

    #[test]
    fn test_raster_icon_is_rasterized() {
        let data = create_test_image(1024, 1024, ImageFormat::Png);
        let out =
            ImageTransformer::transform(&data, "image/png", AssetKind::Icon.policy()).unwrap();
        assert_eq!(out[0].format, OutputFormat::WebP);
        assert_eq!(decoded_dimensions(&out[0].data), (512, 512));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let result = ImageTransformer::transform(
            b"definitely not an image",
            "image/jpeg",
            AssetKind::Avatar.policy(),
        );
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_probe_reports_format_and_size() {
        let data = create_test_image(320, 200, ImageFormat::Png);
        let info = ImageTransformer::probe(&data).unwrap();
        assert_eq!(info.format, "png");
        assert_eq!((info.width, info.height), (320, 200));
    }

    #[tokio::test]
    async fn test_transform_async_runs_on_blocking_pool() {
        let data = create_test_image(800, 800, ImageFormat::Png);
        let out = ImageTransformer::transform_async(
            bytes::Bytes::from(data),
            "image/png".to_string(),
            AssetKind::ExperiencePhoto.policy(),
        )
        .await
        .unwrap();
        assert_eq!(out[0].label, "photo");
        assert_eq!(decoded_dimensions(&out[0].data), (400, 400));
    }

    #[test]
    fn test_transform_error_maps_to_processing_error() {
        let err: AppError = TransformError::EmptyImage.into();
        assert!(matches!(err, AppError::ImageProcessing(_)));
    }
}
