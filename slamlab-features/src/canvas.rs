use std::ops::Range;

use opencv::{
    core::{self, Mat, Scalar, Size},
    imgproc,
    prelude::*,
};

/// Result image shared by all handlers. Split into equal-height horizontal
/// stripes, one per handler; handler `i` only ever writes stripe `i`.
///
/// The backing image is allocated on the first write and sized from that panel.
pub struct CompositeCanvas {
    stripes: usize,
    image: Mat,
}

impl CompositeCanvas {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes,
            image: Mat::default(),
        }
    }

    pub fn stripes(&self) -> usize {
        self.stripes
    }

    pub fn image(&self) -> &Mat {
        &self.image
    }

    pub fn is_allocated(&self) -> bool {
        !self.image.empty()
    }

    /// Pixel rows covered by stripe `index`, or an empty range before allocation.
    pub fn stripe_rows(&self, index: usize) -> Range<i32> {
        let height = self.stripe_height();
        let start = index as i32 * height;
        start..start + height
    }

    fn stripe_height(&self) -> i32 {
        if self.stripes == 0 {
            0
        } else {
            self.image.rows() / self.stripes as i32
        }
    }

    /// Copies `panel` into stripe `index`, resizing it to the stripe size when needed.
    pub fn write_stripe(&mut self, index: usize, panel: &Mat) -> opencv::Result<()> {
        if index >= self.stripes {
            return Err(opencv::Error::new(
                core::StsOutOfRange,
                format!("stripe {index} out of {} stripes", self.stripes),
            ));
        }
        if panel.empty() {
            return Err(opencv::Error::new(core::StsBadArg, "empty panel".to_string()));
        }

        if !self.is_allocated() {
            self.image = Mat::new_rows_cols_with_default(
                panel.rows() * self.stripes as i32,
                panel.cols(),
                panel.typ(),
                Scalar::all(0.),
            )?;
            log::debug!(
                "allocated composite canvas {}x{} for {} stripes",
                self.image.cols(),
                self.image.rows(),
                self.stripes
            );
        }
        if panel.typ() != self.image.typ() {
            return Err(opencv::Error::new(
                core::StsUnmatchedFormats,
                format!("panel type {} differs from canvas type {}", panel.typ(), self.image.typ()),
            ));
        }

        let width = self.image.cols();
        let height = self.stripe_height();
        let resized;
        let fitted = if panel.cols() == width && panel.rows() == height && panel.is_continuous() {
            panel
        } else {
            let mut out = Mat::default();
            imgproc::resize(
                panel,
                &mut out,
                Size::new(width, height),
                0.,
                0.,
                imgproc::INTER_LINEAR,
            )?;
            resized = out;
            &resized
        };

        let row_bytes = width as usize * self.image.elem_size()?;
        let start = self.stripe_rows(index).start as usize * row_bytes;
        let src = fitted.data_bytes()?;
        self.image.data_bytes_mut()?[start..start + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// The whole canvas scaled to `target_width` pixels wide, keeping the aspect ratio.
    pub fn resulting_img(&self, target_width: i32) -> opencv::Result<Mat> {
        if !self.is_allocated() {
            return Ok(Mat::default());
        }
        let scale = target_width as f64 / self.image.cols() as f64;
        let height = ((self.image.rows() as f64 * scale).round() as i32).max(1);
        let mut out = Mat::default();
        imgproc::resize(
            &self.image,
            &mut out,
            Size::new(target_width, height),
            0.,
            0.,
            imgproc::INTER_LINEAR,
        )?;
        Ok(out)
    }
}
