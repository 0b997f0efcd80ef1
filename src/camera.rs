use opencv::{
    prelude::*,
    videoio::{VideoCapture, VideoCaptureAPIs, CAP_PROP_BUFFERSIZE},
};
use anyhow::Result;
use log::{info, warn};

use crate::session::FrameSource;

/// Webcam frame source. The device is released when this is dropped.
pub struct Camera {
    capture: VideoCapture,
}

impl Camera {
    pub fn new(device_id: i32) -> Result<Self> {
        let mut capture = VideoCapture::new(device_id, VideoCaptureAPIs::CAP_ANY as i32)?;

        if !capture.is_opened()? {
            anyhow::bail!("Could not access camera {}", device_id);
        }

        // Keep only the newest frame so a slow tick drops frames instead of lagging.
        if !capture.set(CAP_PROP_BUFFERSIZE, 1.0)? {
            warn!("Camera {} ignored buffer size request", device_id);
        }

        info!("Opened camera {}", device_id);
        Ok(Self { capture })
    }

    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

impl FrameSource for Camera {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        self.read_frame()
    }
}
