//! Repetition counting over the elbow angle.
//!
//! Two thresholds split the angle range into an extension zone, a flexion
//! zone and a dead band between them. A rep is counted when the arm reaches
//! the flexion zone having last been confirmed in the extension zone.

use thiserror::Error;

pub const DEFAULT_EXTENSION_DEG: f32 = 160.0;
pub const DEFAULT_FLEXION_DEG: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepPhase {
    /// No extension observed yet.
    #[default]
    Undefined,
    /// Arm extended.
    Down,
    /// Arm flexed.
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepState {
    pub count: u32,
    pub phase: RepPhase,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ThresholdError {
    #[error("flexion threshold {flexion}° must be below extension threshold {extension}°")]
    Inverted { flexion: f32, extension: f32 },
    #[error("threshold {0}° is outside [0°, 180°]")]
    OutOfRange(f32),
}

/// Validated pair of phase thresholds, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    extension: f32,
    flexion: f32,
}

impl Thresholds {
    pub fn new(extension: f32, flexion: f32) -> Result<Self, ThresholdError> {
        for value in [extension, flexion] {
            if !(0.0..=180.0).contains(&value) {
                return Err(ThresholdError::OutOfRange(value));
            }
        }
        if flexion >= extension {
            return Err(ThresholdError::Inverted { flexion, extension });
        }
        Ok(Self { extension, flexion })
    }

    pub fn extension(&self) -> f32 {
        self.extension
    }

    pub fn flexion(&self) -> f32 {
        self.flexion
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION_DEG,
            flexion: DEFAULT_FLEXION_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepCounter {
    thresholds: Thresholds,
}

impl RepCounter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Advances the phase machine by one angle sample.
    ///
    /// The only transition that increments `count` is `Down -> Up`.
    pub fn update(&self, angle: f32, count: u32, phase: RepPhase) -> (u32, RepPhase) {
        if angle >= self.thresholds.extension {
            (count, RepPhase::Down)
        } else if angle <= self.thresholds.flexion && phase == RepPhase::Down {
            (count.saturating_add(1), RepPhase::Up)
        } else {
            (count, phase)
        }
    }

    pub fn step(&self, angle: f32, state: RepState) -> RepState {
        let (count, phase) = self.update(angle, state.count, state.phase);
        RepState { count, phase }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(angles: &[f32]) -> Vec<RepState> {
        let counter = RepCounter::default();
        angles
            .iter()
            .scan(RepState::default(), |state, &angle| {
                *state = counter.step(angle, *state);
                Some(*state)
            })
            .collect()
    }

    #[test]
    fn test_single_cycle() {
        let states = feed(&[170.0, 165.0, 20.0, 25.0, 170.0]);
        let counts: Vec<u32> = states.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![0, 0, 1, 1, 1]);
        assert_eq!(states[2].phase, RepPhase::Up);
        assert_eq!(states[4].phase, RepPhase::Down);
    }

    #[test]
    fn test_two_cycles() {
        let states = feed(&[170.0, 20.0, 170.0, 20.0, 170.0]);
        assert_eq!(states.last().unwrap().count, 2);
    }

    #[test]
    fn test_no_rep_without_extension() {
        let states = feed(&[25.0, 20.0, 30.0]);
        assert!(states
            .iter()
            .all(|s| s.count == 0 && s.phase == RepPhase::Undefined));
    }

    #[test]
    fn test_dead_band_holds_state() {
        let states = feed(&[90.0, 95.0, 88.0, 92.0]);
        assert!(states.iter().all(|s| *s == RepState::default()));
    }

    #[test]
    fn test_repeated_extension_is_idempotent() {
        let counter = RepCounter::default();
        let first = counter.update(170.0, 3, RepPhase::Up);
        assert_eq!(first, (3, RepPhase::Down));
        assert_eq!(counter.update(170.0, first.0, first.1), first);
        assert_eq!(counter.update(170.0, first.0, first.1), first);
    }

    #[test]
    fn test_repeated_flexion_counts_once() {
        let states = feed(&[170.0, 25.0, 20.0, 28.0, 15.0]);
        assert_eq!(states.last().unwrap().count, 1);
    }

    #[test]
    fn test_jitter_around_one_threshold() {
        let states = feed(&[159.0, 161.0, 158.0, 162.0, 159.5, 160.0]);
        assert!(states.iter().all(|s| s.count == 0));
        assert_eq!(states.last().unwrap().phase, RepPhase::Down);

        let states = feed(&[170.0, 29.0, 31.0, 29.0, 31.0, 30.0]);
        assert_eq!(states.last().unwrap().count, 1);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let counter = RepCounter::default();
        assert_eq!(counter.update(160.0, 0, RepPhase::Undefined), (0, RepPhase::Down));
        assert_eq!(counter.update(30.0, 0, RepPhase::Down), (1, RepPhase::Up));
    }

    #[test]
    fn test_custom_thresholds() {
        let counter = RepCounter::new(Thresholds::new(150.0, 45.0).unwrap());
        let (count, phase) = counter.update(152.0, 0, RepPhase::Undefined);
        assert_eq!(phase, RepPhase::Down);
        assert_eq!(counter.update(44.0, count, phase), (1, RepPhase::Up));
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(matches!(
            Thresholds::new(30.0, 160.0),
            Err(ThresholdError::Inverted { .. })
        ));
        assert!(matches!(
            Thresholds::new(90.0, 90.0),
            Err(ThresholdError::Inverted { .. })
        ));
        assert_eq!(
            Thresholds::new(200.0, 30.0),
            Err(ThresholdError::OutOfRange(200.0))
        );
        assert!(Thresholds::new(f32::NAN, 30.0).is_err());
    }
}
