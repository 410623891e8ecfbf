//! Subject cutout library.
//!
//! Given an already-decoded source image and a subject segmentation result, this crate cuts the
//! detected subjects out of the image, leaving everything else fully transparent:
//!
//! - [`segmentation::mask::rasterize`] converts the per-subject confidence masks into a single
//!   color-coded mask raster, assigning each subject a distinct color from a fixed palette.
//! - [`image::cut_out`] then uses that raster as an alpha stencil: source pixels covered by an
//!   opaque mask pixel are kept, all others become transparent.
//!
//! Inference itself is not part of this crate. Implement
//! [`SegmentationModel`][segmentation::SegmentationModel] to plug in a model backend and drive
//! the whole pipeline through a [`Segmenter`][segmentation::Segmenter], or construct a
//! [`SegmentationResult`][segmentation::SegmentationResult] by hand and call the two operations
//! directly.

use log::LevelFilter;

pub mod image;
pub mod rect;
pub mod segmentation;
pub mod timer;

use crate::image::Resolution;
use crate::rect::Rect;

/// Errors reported by the rasterization and compositing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A mask raster was applied to an image of a different size.
    #[error("mask raster resolution {mask} does not match image resolution {image}")]
    DimensionMismatch {
        /// Resolution of the source image.
        image: Resolution,
        /// Resolution the mask raster was built for.
        mask: Resolution,
    },

    /// A subject's region does not lie fully inside the target image.
    #[error("subject {index} region {region:?} lies outside of image bounds {bounds:?}")]
    OutOfBounds {
        /// Index of the offending subject in the input sequence.
        index: usize,
        /// The subject's bounding region.
        region: Rect,
        /// The target image bounds the region has to fit in.
        bounds: Rect,
    },
}

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this library will log at *debug* level.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
