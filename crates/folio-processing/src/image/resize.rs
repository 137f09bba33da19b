use folio_core::{DerivativeSpec, FitMode};
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Largest size that fits within `max_width`x`max_height`, keeping the aspect
    /// ratio and never enlarging.
    pub fn fit_inside_dimensions(
        orig_width: u32,
        orig_height: u32,
        max_width: u32,
        max_height: u32,
    ) -> (u32, u32) {
        if orig_width <= max_width && orig_height <= max_height {
            return (orig_width, orig_height);
        }

        let scale_width = max_width as f64 / orig_width as f64;
        let scale_height = max_height as f64 / orig_height as f64;
        let scale = scale_width.min(scale_height);

        let width = ((orig_width as f64 * scale).round() as u32).clamp(1, max_width);
        let height = ((orig_height as f64 * scale).round() as u32).clamp(1, max_height);
        (width, height)
    }

    /// Centered region of the source with the target's aspect ratio, as
    /// `(x, y, width, height)` in source pixels.
    pub fn cover_crop_region(
        orig_width: u32,
        orig_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> (u32, u32, u32, u32) {
        let (w, h) = (orig_width as u64, orig_height as u64);
        let (tw, th) = (target_width.max(1) as u64, target_height.max(1) as u64);

        let (crop_width, crop_height) = if w * th > h * tw {
            // Source is wider than the box: keep full height
            (((h * tw + th / 2) / th).clamp(1, w), h)
        } else {
            (w, ((w * th + tw / 2) / tw).clamp(1, h))
        };

        let x = (w - crop_width) / 2;
        let y = (h - crop_height) / 2;
        (x as u32, y as u32, crop_width as u32, crop_height as u32)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img.clone();
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Crop the centered region matching the box's aspect ratio, then scale it to
    /// the exact box. No intermediate is larger than the source or the target.
    pub fn resize_to_cover(
        img: &DynamicImage,
        target_width: u32,
        target_height: u32,
    ) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (x, y, crop_width, crop_height) =
            Self::cover_crop_region(orig_width, orig_height, target_width, target_height);

        let region = if (crop_width, crop_height) == (orig_width, orig_height) {
            img.clone()
        } else {
            img.crop_imm(x, y, crop_width, crop_height)
        };
        Self::resize_image(&region, target_width, target_height)
    }

    pub fn resize_to_inside(img: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) =
            Self::fit_inside_dimensions(orig_width, orig_height, max_width, max_height);
        Self::resize_image(img, width, height)
    }

    /// Apply one derivative's geometry.
    pub fn apply(img: &DynamicImage, spec: &DerivativeSpec) -> DynamicImage {
        match spec.fit {
            FitMode::Cover => Self::resize_to_cover(img, spec.width, spec.height),
            FitMode::Inside => Self::resize_to_inside(img, spec.width, spec.height),
        }
    }
}
