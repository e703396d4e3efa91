use opencv::{core::Mat, highgui, prelude::*, videoio};

use crate::MatchError;

/// Something that yields frames. An empty `Mat` means no frame was available this time.
pub trait FrameSource {
    fn grab(&mut self) -> Result<Mat, MatchError>;

    /// Device index reported in capture errors; -1 when there is none.
    fn device(&self) -> i32 {
        -1
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn grab(&mut self) -> Result<Mat, MatchError> {
        (**self).grab()
    }

    fn device(&self) -> i32 {
        (**self).device()
    }
}

/// Key polling and display.
pub trait Ui {
    /// Waits up to `wait_ms` for a key press; `None` when nothing was pressed.
    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<i32>, MatchError>;
    fn show(&mut self, image: &Mat) -> Result<(), MatchError>;
}

impl<U: Ui + ?Sized> Ui for &mut U {
    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<i32>, MatchError> {
        (**self).poll_key(wait_ms)
    }

    fn show(&mut self, image: &Mat) -> Result<(), MatchError> {
        (**self).show(image)
    }
}

/// A camera opened through `VideoCapture`; released when dropped.
pub struct CameraSource {
    device: i32,
    capture: videoio::VideoCapture,
}

impl CameraSource {
    pub fn open(device: i32) -> Result<Self, MatchError> {
        let capture = videoio::VideoCapture::new(device, videoio::CAP_ANY)
            .map_err(|_| MatchError::CaptureUnavailable(device))?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(MatchError::CaptureUnavailable(device));
        }
        log::info!("opened camera {device}");
        Ok(Self { device, capture })
    }
}

impl FrameSource for CameraSource {
    fn grab(&mut self) -> Result<Mat, MatchError> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|_| MatchError::CaptureUnavailable(self.device))?;
        if !grabbed {
            return Ok(Mat::default());
        }
        Ok(frame)
    }

    fn device(&self) -> i32 {
        self.device
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("failed to release camera {}: {e}", self.device);
        } else {
            log::debug!("released camera {}", self.device);
        }
    }
}

/// A single highgui window; destroyed when dropped.
pub struct HighGui {
    window: String,
}

impl HighGui {
    pub fn new(window: &str) -> Result<Self, MatchError> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE).map_err(MatchError::RenderError)?;
        Ok(Self {
            window: window.to_string(),
        })
    }
}

impl Ui for HighGui {
    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<i32>, MatchError> {
        let key = highgui::wait_key(wait_ms).map_err(MatchError::RenderError)?;
        Ok((key >= 0).then_some(key))
    }

    fn show(&mut self, image: &Mat) -> Result<(), MatchError> {
        if image.empty() {
            return Ok(());
        }
        highgui::imshow(&self.window, image).map_err(MatchError::RenderError)
    }
}

impl Drop for HighGui {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.window) {
            log::warn!("failed to destroy window {}: {e}", self.window);
        }
    }
}
