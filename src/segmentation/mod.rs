//! Subject segmentation primitives.
//!
//! A segmentation backend produces a [`SegmentationResult`], an ordered list of [`Subject`]s
//! tied to the image it was computed against. Inference itself is deliberately outside of this
//! crate: implement [`SegmentationModel`] with any backend and drive the full
//! segment → rasterize → composite pipeline through a [`Segmenter`].

pub mod mask;

use std::fmt;

use crate::image::{cut_out, Image, Resolution};
use crate::rect::Rect;
use crate::timer::Timer;
use crate::Error;

use self::mask::rasterize;

/// A single segmented subject within an image.
///
/// A [`Subject`] consists of a [`Rect`] enclosing the detected subject and a per-pixel
/// confidence mask covering exactly that region.
#[derive(Clone)]
pub struct Subject {
    region: Rect,
    confidence_mask: Vec<f32>,
}

impl Subject {
    /// Creates a subject from its bounding region and confidence mask.
    ///
    /// `confidence_mask` stores one value in range 0.0 to 1.0 per region pixel, row by row.
    /// Its length needs to be exactly `region.width() * region.height()`, or this function will
    /// panic.
    pub fn new(region: Rect, confidence_mask: Vec<f32>) -> Self {
        let expected_len = region.width() as usize * region.height() as usize;
        assert_eq!(
            expected_len,
            confidence_mask.len(),
            "incorrect confidence mask length {} for subject region {:?} (expected {} values)",
            confidence_mask.len(),
            region,
            expected_len,
        );

        Self {
            region,
            confidence_mask,
        }
    }

    /// Returns the bounding region of this subject, in image coordinates.
    #[inline]
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Returns the raw confidence values covering [`region`][Self::region], row by row.
    #[inline]
    pub fn confidence_mask(&self) -> &[f32] {
        &self.confidence_mask
    }

    /// Returns the confidence that the region-local pixel `(x, y)` belongs to this subject.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of the subject's region.
    #[inline]
    pub fn confidence_at(&self, x: u32, y: u32) -> f32 {
        assert!(
            x < self.region.width() && y < self.region.height(),
            "confidence coordinates ({x},{y}) outside of subject region {:?}",
            self.region,
        );
        self.confidence_mask[y as usize * self.region.width() as usize + x as usize]
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The confidence mask is omitted, it can hold millions of values.
        write!(f, "Subject({:?})", self.region)
    }
}

/// The subjects detected in one source image.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    subjects: Vec<Subject>,
    resolution: Resolution,
}

impl SegmentationResult {
    /// Creates a result from the detected subjects and the resolution of the image they were
    /// computed against.
    pub fn new(subjects: Vec<Subject>, resolution: Resolution) -> Self {
        Self {
            subjects,
            resolution,
        }
    }

    /// Returns the resolution of the image this result was computed against.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the detected subjects, in detection order.
    #[inline]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Returns an iterator yielding the detected subjects.
    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }

    /// Returns the number of detected subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Trait implemented by backends that segment subjects out of an input image.
///
/// Subject positions in the returned [`SegmentationResult`] are expected to be in the coordinate
/// system of the input image, and the result's resolution has to match the input image.
///
/// `segment` takes `&mut self` because some backends keep temporal state between frames.
/// Sequential reuse of a model is the contract; none of this crate's types synchronize.
pub trait SegmentationModel {
    /// Runs subject segmentation on `image`.
    fn segment(&mut self, image: &Image) -> anyhow::Result<SegmentationResult>;
}

/// Runs a [`SegmentationModel`] and composites its output.
///
/// This type wraps a model backend and drives the whole pipeline: segment the image, rasterize
/// the resulting confidence masks into a color-coded stencil, and cut the subjects out of the
/// source.
pub struct Segmenter {
    model: Box<dyn SegmentationModel>,
    t_infer: Timer,
    t_mask: Timer,
    t_blend: Timer,
}

impl Segmenter {
    pub fn new<M: SegmentationModel + 'static>(model: M) -> Self {
        Self {
            model: Box::new(model),
            t_infer: Timer::new("infer"),
            t_mask: Timer::new("mask"),
            t_blend: Timer::new("blend"),
        }
    }

    /// Runs subject segmentation on `image`.
    pub fn segment(&mut self, image: &Image) -> anyhow::Result<SegmentationResult> {
        let model = &mut self.model;
        let result = self.t_infer.time(|| model.segment(image))?;
        log::trace!("segmentation result: {:?}", result);
        Ok(result)
    }

    /// Cuts all detected subjects out of `image`.
    ///
    /// The returned image has the same dimensions as `image`; subject pixels keep their source
    /// color, everything else is fully transparent. When the model detects no subjects, the
    /// result is entirely transparent.
    pub fn cut_out(&mut self, image: &Image) -> anyhow::Result<Image> {
        let result = self.segment(image)?;
        if result.resolution() != image.resolution() {
            return Err(Error::DimensionMismatch {
                image: image.resolution(),
                mask: result.resolution(),
            }
            .into());
        }

        let raster = self
            .t_mask
            .time(|| rasterize(result.subjects(), result.resolution()))?;
        let out = self.t_blend.time(|| cut_out(image, &raster))?;
        Ok(out)
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_infer, &self.t_mask, &self.t_blend].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::image::Color;

    use super::*;

    #[test]
    fn confidence_mask_is_row_major() {
        let subject = Subject::new(
            Rect::from_top_left(0, 0, 3, 2),
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
        );
        assert_eq!(subject.confidence_mask().len(), 6);
        assert_relative_eq!(subject.confidence_at(0, 0), 0.0);
        assert_relative_eq!(subject.confidence_at(2, 0), 0.2);
        assert_relative_eq!(subject.confidence_at(0, 1), 0.3);
        assert_relative_eq!(subject.confidence_at(2, 1), 0.5);
    }

    #[test]
    fn result_accessors() {
        let subject = Subject::new(Rect::from_top_left(0, 0, 1, 1), vec![0.7]);
        let result = SegmentationResult::new(vec![subject], Resolution::new(4, 4));
        assert_eq!(result.len(), 1);
        assert!(!result.is_empty());
        assert_eq!(result.resolution(), Resolution::new(4, 4));
        assert_eq!(result.iter().count(), 1);
        assert_eq!(result.subjects()[0].region(), Rect::from_top_left(0, 0, 1, 1));
    }

    #[test]
    #[should_panic]
    fn confidence_mask_length_must_match_region() {
        Subject::new(Rect::from_top_left(0, 0, 2, 2), vec![1.0; 3]);
    }

    struct StubModel {
        region: Rect,
    }

    impl SegmentationModel for StubModel {
        fn segment(&mut self, image: &Image) -> anyhow::Result<SegmentationResult> {
            let len = self.region.width() as usize * self.region.height() as usize;
            Ok(SegmentationResult::new(
                vec![Subject::new(self.region, vec![1.0; len])],
                image.resolution(),
            ))
        }
    }

    struct WrongSizeModel;

    impl SegmentationModel for WrongSizeModel {
        fn segment(&mut self, _image: &Image) -> anyhow::Result<SegmentationResult> {
            Ok(SegmentationResult::new(Vec::new(), Resolution::new(1, 1)))
        }
    }

    #[test]
    fn cut_out_keeps_subject_pixels() {
        let mut source = Image::new(2, 2);
        source.set(0, 0, Color::RED);
        source.set(1, 0, Color::GREEN);
        source.set(0, 1, Color::BLUE);
        source.set(1, 1, Color::WHITE);

        let mut segmenter = Segmenter::new(StubModel {
            region: Rect::from_top_left(0, 0, 1, 2),
        });
        let out = segmenter.cut_out(&source).unwrap();

        assert_eq!(out.get(0, 0), Color::RED);
        assert_eq!(out.get(0, 1), Color::BLUE);
        assert_eq!(out.get(1, 0), Color::NULL);
        assert_eq!(out.get(1, 1), Color::NULL);
        assert_eq!(segmenter.timers().count(), 3);
    }

    #[test]
    fn cut_out_rejects_mismatched_model_output() {
        let source = Image::new(2, 2);
        let mut segmenter = Segmenter::new(WrongSizeModel);
        let err = segmenter.cut_out(&source).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::DimensionMismatch {
                image: Resolution::new(2, 2),
                mask: Resolution::new(1, 1),
            }),
        );
    }
}
