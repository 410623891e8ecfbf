use crate::segmentation::mask::MaskRaster;
use crate::Error;

use super::{Color, Image};

/// Cuts the masked pixels out of `source`, producing a new [`Image`].
///
/// Wherever `mask` contains an opaque pixel, the output keeps the source pixel unchanged
/// (including its alpha). Everywhere else the output is fully transparent, regardless of the
/// source content. In compositing terms this is a *destination-in* blend of `source` against the
/// mask raster's alpha channel.
///
/// `mask` must have been rasterized for an image of the same dimensions as `source`, otherwise
/// [`Error::DimensionMismatch`] is returned. Neither input is mutated.
pub fn cut_out(source: &Image, mask: &MaskRaster) -> Result<Image, Error> {
    if source.resolution() != mask.resolution() {
        return Err(Error::DimensionMismatch {
            image: source.resolution(),
            mask: mask.resolution(),
        });
    }

    let mut out = Image::new(source.width(), source.height());
    for y in 0..source.height() {
        for x in 0..source.width() {
            out.set(x, y, blend_destination_in(source.get(x, y), mask.get(x, y)));
        }
    }

    Ok(out)
}

fn blend_destination_in(src: Color, mask: Color) -> Color {
    if mask.a() > 0 {
        src
    } else {
        Color::NULL
    }
}
