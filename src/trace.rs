//! Recorded arm traces for offline replay.
//!
//! One tick per line: `sx,sy,ex,ey,wx,wy` (shoulder, elbow, wrist). A blank
//! line or `-` is a tick with no detection. `#` starts a comment.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::geometry::Point2;
use crate::landmarks::ArmJoints;

pub fn parse_line(line: &str) -> Result<Option<ArmJoints>> {
    let body = line.split('#').next().unwrap_or_default().trim();
    if body.is_empty() || body == "-" {
        return Ok(None);
    }

    let values = body
        .split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f32>()
                .with_context(|| format!("invalid coordinate {:?}", field))
        })
        .collect::<Result<Vec<f32>>>()?;

    let &[sx, sy, ex, ey, wx, wy] = values.as_slice() else {
        bail!("expected 6 coordinates, found {}", values.len());
    };

    Ok(Some(ArmJoints {
        shoulder: Point2::new(sx, sy),
        elbow: Point2::new(ex, ey),
        wrist: Point2::new(wx, wy),
    }))
}

pub fn parse(content: &str) -> Result<Vec<Option<ArmJoints>>> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_line(line).with_context(|| format!("line {}", idx + 1)))
        .collect()
}

pub fn read(path: &Path) -> Result<Vec<Option<ArmJoints>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    parse(&content).with_context(|| format!("parsing trace {}", path.display()))
}
