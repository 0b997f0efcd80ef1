//! Per-tick driver for one exercise session.
//!
//! Each tick: frame -> pose estimate -> arm joints -> elbow angle -> rep
//! state. A tick without a frame, a detection or usable geometry leaves the
//! rep state untouched.

use std::ops::ControlFlow;

use anyhow::Result;
use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::geometry::{elbow_angle, GeometryError};
use crate::landmarks::{extract_arm, Arm, ArmJoints, Landmark};
use crate::reps::{RepCounter, RepState};

/// Supplies at most one frame per tick.
pub trait FrameSource {
    type Frame;

    /// `Ok(None)` means no frame this tick, which is not an error.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// Produces at most one landmark set per frame.
pub trait PoseEstimator<F> {
    fn estimate(&mut self, frame: &F) -> Result<Option<Vec<Landmark>>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    Updated { angle: f32, state: RepState },
    NoFrame,
    NoDetection,
    Rejected(GeometryError),
}

impl Tick {
    pub fn angle(&self) -> Option<f32> {
        match self {
            Tick::Updated { angle, .. } => Some(*angle),
            _ => None,
        }
    }
}

/// Stateless per-tick logic; the rep state is passed in and handed back.
#[derive(Debug, Clone, Copy)]
pub struct Tracker {
    counter: RepCounter,
    arm: Arm,
    min_visibility: f32,
}

impl Tracker {
    pub fn new(counter: RepCounter, arm: Arm, min_visibility: f32) -> Self {
        Self {
            counter,
            arm,
            min_visibility,
        }
    }

    pub fn arm(&self) -> Arm {
        self.arm
    }

    pub fn tick(&self, landmarks: Option<&[Landmark]>, state: RepState) -> (Tick, RepState) {
        let joints = landmarks.and_then(|lms| extract_arm(lms, self.arm, self.min_visibility));
        match joints {
            Some(joints) => self.tick_joints(&joints, state),
            None => (Tick::NoDetection, state),
        }
    }

    pub fn tick_joints(&self, joints: &ArmJoints, state: RepState) -> (Tick, RepState) {
        match elbow_angle(joints.shoulder, joints.elbow, joints.wrist) {
            Ok(angle) => {
                let next = self.counter.step(angle, state);
                if next.count != state.count {
                    info!("rep {} completed at {:.1}°", next.count, angle);
                }
                (Tick::Updated { angle, state: next }, next)
            }
            Err(err) => {
                warn!("skipping tick: {}", err);
                (Tick::Rejected(err), state)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub reps: u32,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

/// One start-to-stop period. Owns the rep state for its lifetime.
#[derive(Debug)]
pub struct Session {
    tracker: Tracker,
    state: RepState,
    started_at: DateTime<Local>,
    ticks: u64,
}

impl Session {
    pub fn start(tracker: Tracker) -> Self {
        info!("session started, tracking {:?} arm", tracker.arm());
        Self {
            tracker,
            state: RepState::default(),
            started_at: Local::now(),
            ticks: 0,
        }
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn observe(&mut self, landmarks: Option<&[Landmark]>) -> Tick {
        self.ticks += 1;
        let (tick, state) = self.tracker.tick(landmarks, self.state);
        self.state = state;
        tick
    }

    pub fn observe_joints(&mut self, joints: Option<&ArmJoints>) -> Tick {
        self.ticks += 1;
        let Some(joints) = joints else {
            return Tick::NoDetection;
        };
        let (tick, state) = self.tracker.tick_joints(joints, self.state);
        self.state = state;
        tick
    }

    pub fn skip(&mut self) -> Tick {
        self.ticks += 1;
        Tick::NoFrame
    }

    pub fn finish(self) -> SessionSummary {
        let summary = SessionSummary {
            reps: self.state.count,
            started_at: self.started_at,
            ended_at: Local::now(),
        };
        info!(
            "session finished: {} reps over {} ticks",
            summary.reps, self.ticks
        );
        summary
    }
}

/// Drives a session until `present` breaks.
///
/// `present` sees every tick, including skipped ones, with the frame (if
/// any), the landmarks (if any) and the current rep state. Source and
/// estimator errors only skip their tick; an error from `present` ends the
/// session.
pub fn run_session<S, E, P>(
    source: &mut S,
    estimator: &mut E,
    tracker: Tracker,
    mut present: P,
) -> Result<SessionSummary>
where
    S: FrameSource,
    E: PoseEstimator<S::Frame>,
    P: FnMut(Option<&S::Frame>, Option<&[Landmark]>, &Tick, RepState) -> Result<ControlFlow<()>>,
{
    let mut session = Session::start(tracker);

    loop {
        let frame = source.next_frame().unwrap_or_else(|err| {
            warn!("frame source failed, skipping tick: {:#}", err);
            None
        });

        let flow = match frame {
            None => {
                let tick = session.skip();
                debug!("no frame");
                present(None, None, &tick, session.state())?
            }
            Some(frame) => {
                let landmarks = estimator.estimate(&frame).unwrap_or_else(|err| {
                    warn!("pose estimation failed, skipping tick: {:#}", err);
                    None
                });
                let tick = session.observe(landmarks.as_deref());
                present(Some(&frame), landmarks.as_deref(), &tick, session.state())?
            }
        };

        if flow.is_break() {
            break;
        }
    }

    Ok(session.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LEFT_ELBOW, LEFT_SHOULDER, LEFT_WRIST, POSE_LANDMARK_COUNT};
    use crate::reps::RepPhase;
    use std::collections::VecDeque;

    /// Each frame carries the elbow angle to pose, or `None` for nobody in view.
    struct ScriptedSource(VecDeque<Option<Option<f32>>>);

    impl FrameSource for ScriptedSource {
        type Frame = Option<f32>;

        fn next_frame(&mut self) -> Result<Option<Self::Frame>> {
            Ok(self.0.pop_front().flatten())
        }
    }

    /// Fails on the listed (1-based) calls, otherwise defers to the script.
    struct FlakySource {
        inner: ScriptedSource,
        fail_at: Vec<usize>,
        calls: usize,
    }

    impl FrameSource for FlakySource {
        type Frame = Option<f32>;

        fn next_frame(&mut self) -> Result<Option<Self::Frame>> {
            self.calls += 1;
            if self.fail_at.contains(&self.calls) {
                anyhow::bail!("transient capture error");
            }
            self.inner.next_frame()
        }
    }

    struct AngleEstimator;

    impl PoseEstimator<Option<f32>> for AngleEstimator {
        fn estimate(&mut self, frame: &Option<f32>) -> Result<Option<Vec<Landmark>>> {
            Ok(frame.map(pose_with_angle))
        }
    }

    fn pose_with_angle(deg: f32) -> Vec<Landmark> {
        let mut landmarks = vec![
            Landmark {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                visibility: 1.0
            };
            POSE_LANDMARK_COUNT
        ];
        let rad = deg.to_radians();
        landmarks[LEFT_ELBOW].x = 0.5;
        landmarks[LEFT_ELBOW].y = 0.5;
        landmarks[LEFT_SHOULDER].x = 0.5;
        landmarks[LEFT_SHOULDER].y = 0.2;
        landmarks[LEFT_WRIST].x = 0.5 + 0.3 * rad.sin();
        landmarks[LEFT_WRIST].y = 0.5 - 0.3 * rad.cos();
        landmarks
    }

    fn tracker() -> Tracker {
        Tracker::new(RepCounter::default(), Arm::Left, 0.5)
    }

    #[test]
    fn test_tracker_counts_from_landmarks() {
        let tracker = tracker();
        let mut state = RepState::default();
        for deg in [170.0, 90.0, 20.0, 175.0, 25.0] {
            let landmarks = pose_with_angle(deg);
            let (tick, next) = tracker.tick(Some(&landmarks), state);
            assert!((tick.angle().unwrap() - deg).abs() < 0.01);
            state = next;
        }
        assert_eq!(state.count, 2);
        assert_eq!(state.phase, RepPhase::Up);
    }

    #[test]
    fn test_missing_detection_holds_state() {
        let tracker = tracker();
        let state = RepState {
            count: 4,
            phase: RepPhase::Down,
        };
        assert_eq!(tracker.tick(None, state), (Tick::NoDetection, state));

        let mut hidden = pose_with_angle(20.0);
        hidden[LEFT_ELBOW].visibility = 0.1;
        assert_eq!(
            tracker.tick(Some(&hidden), state),
            (Tick::NoDetection, state)
        );
    }

    #[test]
    fn test_degenerate_geometry_is_skipped() {
        let mut session = Session::start(tracker());
        session.observe(Some(&pose_with_angle(170.0)));

        let mut collapsed = pose_with_angle(20.0);
        collapsed[LEFT_WRIST].x = collapsed[LEFT_ELBOW].x;
        collapsed[LEFT_WRIST].y = collapsed[LEFT_ELBOW].y;
        let tick = session.observe(Some(&collapsed));

        assert!(matches!(tick, Tick::Rejected(GeometryError::Degenerate { .. })));
        assert_eq!(session.state().phase, RepPhase::Down);
        assert_eq!(session.state().count, 0);
        assert_eq!(session.ticks(), 2);
    }

    #[test]
    fn test_run_session_until_presenter_stops() {
        let script = vec![
            Some(Some(170.0)),
            None,
            Some(None),
            Some(Some(20.0)),
            Some(Some(170.0)),
            None,
            Some(Some(25.0)),
            Some(Some(160.0)),
        ];
        let total = script.len();
        let mut source = ScriptedSource(script.into_iter().collect());
        let mut seen = Vec::new();

        let summary = run_session(&mut source, &mut AngleEstimator, tracker(), |_, _, tick, state| {
            seen.push((*tick, state.count));
            Ok(if seen.len() == total {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();

        assert_eq!(summary.reps, 2);
        assert!(summary.ended_at >= summary.started_at);
        assert_eq!(seen[1].0, Tick::NoFrame);
        assert_eq!(seen[2].0, Tick::NoDetection);
        let counts: Vec<u32> = seen.iter().map(|(_, c)| *c).collect();
        assert_eq!(counts, vec![0, 0, 0, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn test_source_errors_skip_ticks() {
        let script = [170.0, 20.0, 170.0, 20.0, 170.0]
            .into_iter()
            .map(|deg| Some(Some(deg)))
            .collect();
        let mut source = FlakySource {
            inner: ScriptedSource(script),
            fail_at: vec![3, 5, 6],
            calls: 0,
        };
        let mut seen = Vec::new();

        let summary = run_session(&mut source, &mut AngleEstimator, tracker(), |_, _, tick, state| {
            seen.push((*tick, state.count));
            Ok(if seen.len() == 8 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();

        assert_eq!(summary.reps, 2);
        assert_eq!(seen[2].0, Tick::NoFrame);
        assert_eq!(seen[4].0, Tick::NoFrame);
        assert_eq!(seen[5].0, Tick::NoFrame);
        assert_eq!(seen.last().unwrap().1, 2);
    }

    #[test]
    fn test_estimator_errors_skip_ticks() {
        struct BrokenAt(f32);

        impl PoseEstimator<Option<f32>> for BrokenAt {
            fn estimate(&mut self, frame: &Option<f32>) -> Result<Option<Vec<Landmark>>> {
                match frame {
                    Some(deg) if *deg == self.0 => anyhow::bail!("model returned garbage"),
                    _ => Ok(frame.map(pose_with_angle)),
                }
            }
        }

        let script = [170.0, 20.0, 999.0, 170.0, 25.0]
            .into_iter()
            .map(|deg| Some(Some(deg)))
            .collect();
        let mut source = ScriptedSource(script);
        let mut ticks = Vec::new();

        let summary = run_session(&mut source, &mut BrokenAt(999.0), tracker(), |_, _, tick, _| {
            ticks.push(*tick);
            Ok(if ticks.len() == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();

        assert_eq!(ticks[2], Tick::NoDetection);
        assert_eq!(summary.reps, 2);
    }

    #[test]
    fn test_presenter_error_ends_session() {
        let mut source = ScriptedSource([Some(Some(170.0))].into_iter().collect());
        let result = run_session(&mut source, &mut AngleEstimator, tracker(), |_, _, _, _| {
            anyhow::bail!("window closed")
        });
        assert!(result.is_err());
    }
}
