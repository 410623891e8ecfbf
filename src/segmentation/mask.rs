//! Subject mask rasterization.
//!
//! [`rasterize`] turns the per-subject confidence masks of a segmentation result into a single
//! full-image [`MaskRaster`], the stencil consumed by [`cut_out`][crate::image::cut_out].

use std::fmt;

use itertools::Itertools;

use crate::image::{Color, Image, Resolution};
use crate::rect::Rect;
use crate::Error;

use super::Subject;

/// A pixel belongs to a subject when its confidence is strictly greater than this.
const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// The colors assigned to rasterized subjects, in order.
///
/// Subject `k` is painted with `PALETTE[k % PALETTE.len()]`; with more subjects than palette
/// entries, colors repeat.
pub const PALETTE: [Color; 12] = [
    Color::from_rgb8(255, 0, 255),
    Color::from_rgb8(0, 255, 255),
    Color::from_rgb8(255, 255, 0),
    Color::from_rgb8(255, 0, 0),
    Color::from_rgb8(0, 255, 0),
    Color::from_rgb8(0, 0, 255),
    Color::from_rgb8(128, 0, 128),
    Color::from_rgb8(0, 128, 128),
    Color::from_rgb8(128, 128, 0),
    Color::from_rgb8(128, 0, 0),
    Color::from_rgb8(0, 128, 0),
    Color::from_rgb8(0, 0, 128),
];

/// A full-image color-coded subject mask.
///
/// Produced by [`rasterize`]. Every pixel either carries the opaque palette color of the subject
/// covering it, or is fully transparent where no subject was detected.
pub struct MaskRaster {
    raster: Image,
}

impl MaskRaster {
    /// Returns the size of this mask raster, which equals the size of the image it was
    /// rasterized for.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.raster.resolution()
    }

    /// Gets the mask color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this mask raster.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.raster.get(x, y)
    }

    /// Returns the underlying color-coded image.
    #[inline]
    pub fn as_image(&self) -> &Image {
        &self.raster
    }

    /// Unwraps the mask raster into its underlying image, e.g. to save or display it directly.
    pub fn into_image(self) -> Image {
        self.raster
    }
}

impl fmt::Debug for MaskRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MaskRaster", self.resolution())
    }
}

/// Rasterizes `subjects` into a color-coded [`MaskRaster`] of the given size.
///
/// The raster starts out fully transparent. For each subject, every region pixel whose
/// confidence exceeds 0.5 is painted with the subject's palette color (fully opaque); a
/// confidence of exactly 0.5 counts as background. Subjects are painted in order, so where
/// regions overlap, a later subject silently overwrites an earlier one. No subjects at all is
/// valid and yields an all-transparent raster.
///
/// Every subject's region has to lie fully inside `resolution`, otherwise
/// [`Error::OutOfBounds`] is returned and nothing is painted.
pub fn rasterize(subjects: &[Subject], resolution: Resolution) -> Result<MaskRaster, Error> {
    let bounds = Rect::from_top_left(0, 0, resolution.width(), resolution.height());
    for (index, subject) in subjects.iter().enumerate() {
        if !bounds.contains_rect(&subject.region()) {
            return Err(Error::OutOfBounds {
                index,
                region: subject.region(),
                bounds,
            });
        }
    }

    log::trace!("rasterizing {} subjects into {}", subjects.len(), resolution);

    let mut raster = Image::new(resolution.width(), resolution.height());
    for (index, subject) in subjects.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let region = subject.region();
        for (y, x) in (0..region.height()).cartesian_product(0..region.width()) {
            if subject.confidence_at(x, y) > CONFIDENCE_THRESHOLD {
                raster.set(region.x() as u32 + x, region.y() as u32 + y, color);
            }
        }
    }

    Ok(MaskRaster { raster })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_subject(region: Rect, confidence: f32) -> Subject {
        let len = region.width() as usize * region.height() as usize;
        Subject::new(region, vec![confidence; len])
    }

    #[test]
    fn no_subjects() {
        let raster = rasterize(&[], Resolution::new(3, 2)).unwrap();
        assert_eq!(raster.resolution(), Resolution::new(3, 2));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(raster.get(x, y), Color::NULL);
            }
        }
    }

    #[test]
    fn paints_confident_region() {
        let subject = solid_subject(Rect::from_top_left(1, 0, 2, 1), 0.9);
        let raster = rasterize(&[subject], Resolution::new(4, 2)).unwrap();
        assert_eq!(raster.get(0, 0), Color::NULL);
        assert_eq!(raster.get(1, 0), PALETTE[0]);
        assert_eq!(raster.get(2, 0), PALETTE[0]);
        assert_eq!(raster.get(3, 0), Color::NULL);
        for x in 0..4 {
            assert_eq!(raster.get(x, 1), Color::NULL);
        }
    }

    #[test]
    fn threshold_is_strict() {
        let subject = Subject::new(Rect::from_top_left(0, 0, 2, 1), vec![0.5, 0.2]);
        let raster = rasterize(&[subject], Resolution::new(2, 1)).unwrap();
        assert_eq!(raster.get(0, 0), Color::NULL);
        assert_eq!(raster.get(1, 0), Color::NULL);
    }

    #[test]
    fn rasterize_is_idempotent() {
        fastrand::seed(0x5eed);
        let region = Rect::from_top_left(1, 2, 5, 4);
        let mask = (0..region.width() * region.height())
            .map(|_| fastrand::f32())
            .collect();
        let subjects = [Subject::new(region, mask)];

        let first = rasterize(&subjects, Resolution::new(8, 8)).unwrap();
        let second = rasterize(&subjects, Resolution::new(8, 8)).unwrap();
        assert_eq!(first.as_image().data(), second.as_image().data());
    }

    #[test]
    fn palette_wraps_after_12_subjects() {
        let subjects = (0..13)
            .map(|k| solid_subject(Rect::from_top_left(k, 0, 1, 1), 1.0))
            .collect::<Vec<_>>();
        let raster = rasterize(&subjects, Resolution::new(13, 1)).unwrap();
        for k in 0..12 {
            assert_eq!(raster.get(k, 0), PALETTE[k as usize]);
        }
        assert_eq!(raster.get(12, 0), PALETTE[0]);
    }

    #[test]
    fn later_subject_wins_overlap() {
        let region = Rect::from_top_left(0, 0, 1, 1);
        let subjects = [solid_subject(region, 0.9), solid_subject(region, 0.9)];
        let raster = rasterize(&subjects, Resolution::new(1, 1)).unwrap();
        assert_eq!(raster.get(0, 0), PALETTE[1]);
        assert_eq!(raster.get(0, 0), Color::CYAN);
    }

    #[test]
    fn rejects_out_of_bounds_region() {
        let inside = solid_subject(Rect::from_top_left(0, 0, 1, 1), 0.9);
        let outside = solid_subject(Rect::from_top_left(1, 0, 2, 1), 0.9);
        assert_eq!(
            rasterize(&[inside, outside], Resolution::new(2, 1)).unwrap_err(),
            Error::OutOfBounds {
                index: 1,
                region: Rect::from_top_left(1, 0, 2, 1),
                bounds: Rect::from_top_left(0, 0, 2, 1),
            },
        );

        let negative = solid_subject(Rect::from_top_left(-1, 0, 1, 1), 0.9);
        assert!(matches!(
            rasterize(&[negative], Resolution::new(2, 1)),
            Err(Error::OutOfBounds { index: 0, .. }),
        ));
    }

    #[test]
    fn into_image_keeps_pixels() {
        let subject = solid_subject(Rect::from_top_left(0, 0, 1, 1), 1.0);
        let image = rasterize(&[subject], Resolution::new(1, 1))
            .unwrap()
            .into_image();
        assert_eq!(image.get(0, 0), PALETTE[0]);
    }
}
