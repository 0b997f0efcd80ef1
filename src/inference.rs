use anyhow::Result;
use log::{debug, info};
use opencv::{core::Mat, prelude::*};
use ort::{GraphOptimizationLevel, Session, Tensor};

use crate::landmarks::{Landmark, POSE_LANDMARK_COUNT};
use crate::session::PoseEstimator;

/// Values per landmark in the BlazePose landmark output: x, y, z, visibility, presence.
const LANDMARK_STRIDE: usize = 5;

/// BlazePose landmark model running on ONNX Runtime.
///
/// The model's first output holds 33 landmarks in input-pixel coordinates,
/// the second a pose presence score. Visibility comes out as a logit.
pub struct PoseDetector {
    session: Session,
    input_width: i32,
    input_height: i32,
    min_presence: f32,
}

impl PoseDetector {
    pub fn new(model_path: &str, min_presence: f32) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;

        let (input_width, input_height) = Self::get_input_dimensions(&session)?;
        info!(
            "Loaded pose model {} ({}x{})",
            model_path, input_width, input_height
        );

        Ok(Self {
            session,
            input_width,
            input_height,
            min_presence,
        })
    }

    fn get_input_dimensions(session: &Session) -> Result<(i32, i32)> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model has no inputs"))?;

        // NHWC: [1, height, width, 3]
        match input.input_type.tensor_dimensions() {
            Some(dims) if dims.len() == 4 && dims[1] > 0 && dims[2] > 0 => {
                Ok((dims[2] as i32, dims[1] as i32))
            }
            _ => Ok((256, 256)),
        }
    }

    pub fn detect(&self, frame: &Mat) -> Result<Option<Vec<Landmark>>> {
        let input_tensor = self.preprocess(frame)?;

        let outputs = self.session.run(ort::inputs![input_tensor]?)?;

        let presence = match outputs.len() {
            n if n > 1 => {
                let score = outputs[1].try_extract_tensor::<f32>()?;
                score.iter().next().copied().map(sigmoid).unwrap_or(1.0)
            }
            _ => 1.0,
        };
        if presence < self.min_presence {
            debug!("No pose in frame (presence {:.2})", presence);
            return Ok(None);
        }

        let raw = outputs[0].try_extract_tensor::<f32>()?;
        let values: Vec<f32> = raw.iter().copied().collect();
        Ok(Some(self.postprocess(&values)?))
    }

    fn preprocess(&self, frame: &Mat) -> Result<Tensor<f32>> {
        use opencv::core;
        use opencv::imgproc;

        let mut rgb = Mat::default();
        imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            core::Size::new(self.input_width, self.input_height),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut float_img = Mat::default();
        resized.convert_to(&mut float_img, core::CV_32FC3, 1.0 / 255.0, 0.0)?;

        let h = self.input_height as usize;
        let w = self.input_width as usize;
        let mut data = Vec::with_capacity(h * w * 3);

        for y in 0..h {
            for x in 0..w {
                let pixel = float_img.at_2d::<core::Vec3f>(y as i32, x as i32)?;
                data.extend_from_slice(&[pixel[0], pixel[1], pixel[2]]);
            }
        }

        Ok(Tensor::from_array(([1usize, h, w, 3], data.into_boxed_slice()))?)
    }

    fn postprocess(&self, values: &[f32]) -> Result<Vec<Landmark>> {
        if values.len() < POSE_LANDMARK_COUNT * LANDMARK_STRIDE {
            anyhow::bail!(
                "Landmark output too short: {} values, expected {}",
                values.len(),
                POSE_LANDMARK_COUNT * LANDMARK_STRIDE
            );
        }

        let w = self.input_width as f32;
        let h = self.input_height as f32;

        Ok(values
            .chunks_exact(LANDMARK_STRIDE)
            .take(POSE_LANDMARK_COUNT)
            .map(|v| Landmark {
                x: v[0] / w,
                y: v[1] / h,
                z: v[2] / w,
                visibility: sigmoid(v[3]),
            })
            .collect())
    }
}

impl PoseEstimator<Mat> for PoseDetector {
    fn estimate(&mut self, frame: &Mat) -> Result<Option<Vec<Landmark>>> {
        self.detect(frame)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
