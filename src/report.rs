//! End-of-session summary shown to the user.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::session::SessionSummary;

pub const DEFAULT_TARGET_REPS: u32 = 12;

const TIPS: &[&str] = &[
    "Maintain a full range of motion during each rep to maximize muscle engagement and growth.",
    "Keep your core engaged throughout the movement to prevent swinging or cheating with your back.",
    "Use a neutral grip (hammer curl) occasionally to target the brachialis, a key supporting muscle for bigger biceps.",
    "Don't let the weights drop too quickly. Control the descent to create more time under tension.",
    "Squeeze your biceps at the top of the curl for 1-2 seconds to enhance the contraction and build strength.",
    "Focus on your breathing: exhale as you lift the weights and inhale as you lower them.",
    "Avoid locking your elbows at the bottom; this keeps the tension on your biceps and reduces the risk of injury.",
];

const MOTIVATION: &[&str] = &[
    "Keep pushing! You're getting stronger with every session!",
    "Great effort! Remember: Progress, not perfection.",
    "Fantastic job! The journey to strength is built one rep at a time.",
    "You've got this! Keep those curls steady and strong next time.",
    "Awesome work! Never forget: Rest is as important as exercise.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    BelowTarget { target: u32 },
    TargetReached,
}

impl Feedback {
    pub fn for_reps(reps: u32, target: u32) -> Self {
        if reps < target {
            Feedback::BelowTarget { target }
        } else {
            Feedback::TargetReached
        }
    }

    pub fn message(&self) -> String {
        match self {
            Feedback::BelowTarget { target } => format!(
                "You did fewer than {target} reps. Aim higher in your next session for better results!"
            ),
            Feedback::TargetReached => {
                "Great job hitting your target! Keep challenging yourself to improve further.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub summary: SessionSummary,
    pub feedback: Feedback,
    pub tip: &'static str,
    pub motivation: &'static str,
}

impl Report {
    pub fn new<R: Rng + ?Sized>(summary: SessionSummary, target: u32, rng: &mut R) -> Self {
        Self {
            summary,
            feedback: Feedback::for_reps(summary.reps, target),
            tip: TIPS.choose(rng).copied().unwrap_or_default(),
            motivation: MOTIVATION.choose(rng).copied().unwrap_or_default(),
        }
    }

    pub fn render(&self) -> String {
        let duration = self.summary.ended_at - self.summary.started_at;
        let mut out = String::new();
        out.push_str("Session Summary\n");
        out.push_str("===============\n");
        out.push_str(&format!("Reps completed: {}\n", self.summary.reps));
        out.push_str(&format!(
            "Duration:       {}m {:02}s\n",
            duration.num_minutes(),
            duration.num_seconds() % 60
        ));
        out.push_str(&format!("{}\n\n", self.feedback.message()));
        out.push_str(&format!("Tip of the day: {}\n", self.tip));
        out.push_str(&format!("Motivation:     {}\n", self.motivation));
        out
    }
}
