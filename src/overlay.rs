use opencv::{
    core::{Mat, Point, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use anyhow::Result;

use crate::landmarks::{Landmark, ARM_CONNECTIONS};
use crate::reps::RepState;

const WINDOW_TITLE: &str = "Biceps Curl Counter";
const KEY_ESC: i32 = 27;

/// HighGUI window showing the camera feed, the arm skeleton and the rep count.
/// The window is destroyed on drop.
pub struct CounterWindow {
    wait_ms: i32,
}

impl CounterWindow {
    pub fn new(wait_ms: u64) -> Result<Self> {
        highgui::named_window(WINDOW_TITLE, highgui::WINDOW_NORMAL)?;
        Ok(Self {
            wait_ms: wait_ms.clamp(1, i32::MAX as u64) as i32,
        })
    }

    /// Draws and shows one frame. Returns `true` when the user asked to stop.
    pub fn present(
        &self,
        frame: Option<&Mat>,
        landmarks: Option<&[Landmark]>,
        angle: Option<f32>,
        state: RepState,
    ) -> Result<bool> {
        if let Some(frame) = frame {
            let mut canvas = frame.try_clone()?;
            if let Some(landmarks) = landmarks {
                draw_arms(&mut canvas, landmarks)?;
            }
            draw_status(&mut canvas, angle, state)?;
            highgui::imshow(WINDOW_TITLE, &canvas)?;
        }

        let key = highgui::wait_key(self.wait_ms)?;
        Ok(key == i32::from(b'q') || key == KEY_ESC)
    }
}

impl Drop for CounterWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(WINDOW_TITLE);
    }
}

fn to_pixel(lm: &Landmark, width: i32, height: i32) -> Point {
    Point::new(
        (lm.x * width as f32).round() as i32,
        (lm.y * height as f32).round() as i32,
    )
}

fn draw_arms(canvas: &mut Mat, landmarks: &[Landmark]) -> Result<()> {
    let (width, height) = (canvas.cols(), canvas.rows());
    let bone = Scalar::new(245.0, 117.0, 66.0, 0.0);
    let joint = Scalar::new(66.0, 230.0, 245.0, 0.0);

    for &(from, to) in ARM_CONNECTIONS.iter() {
        if let (Some(a), Some(b)) = (landmarks.get(from), landmarks.get(to)) {
            imgproc::line(
                canvas,
                to_pixel(a, width, height),
                to_pixel(b, width, height),
                bone,
                2,
                LINE_8,
                0,
            )?;
        }
    }

    for lm in landmarks {
        imgproc::circle(canvas, to_pixel(lm, width, height), 3, joint, -1, LINE_8, 0)?;
    }

    Ok(())
}

fn draw_status(canvas: &mut Mat, angle: Option<f32>, state: RepState) -> Result<()> {
    let yellow = Scalar::new(0.0, 255.0, 255.0, 0.0);
    let white = Scalar::new(255.0, 255.0, 255.0, 0.0);

    imgproc::put_text(
        canvas,
        &format!("REPS : {}", state.count),
        Point::new(20, 45),
        FONT_HERSHEY_SIMPLEX,
        1.2,
        yellow,
        3,
        LINE_8,
        false,
    )?;

    let detail = match angle {
        Some(angle) => format!("{:?}  {:.0} deg", state.phase, angle),
        None => format!("{:?}", state.phase),
    };
    imgproc::put_text(
        canvas,
        &detail,
        Point::new(20, 85),
        FONT_HERSHEY_SIMPLEX,
        0.8,
        white,
        2,
        LINE_8,
        false,
    )?;

    Ok(())
}
