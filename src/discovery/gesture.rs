//! Swipe gesture tracking
//!
//! State machine: Idle → Dragging → (Committed | back to Idle).
//! Pointer and touch input both feed points in; the tracker only knows
//! offsets from the origin. Presentation (card tilt and fade) is derived
//! from the horizontal offset and carries no meaning for the decision.

use crate::types::Verdict;

/// Pointer position in view units
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Displacement of the card from where the drag started
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0.0, dy: 0.0 };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// Right = connect, left = pass
    pub fn verdict(&self) -> Verdict {
        match self {
            SwipeDirection::Right => Verdict::Interested,
            SwipeDirection::Left => Verdict::Ignored,
        }
    }
}

/// Result of lifting the pointer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Threshold crossed; the gesture is a decision
    Committed(SwipeDirection),
    /// Not far enough (or no drag at all); card snaps back
    Reset,
}

impl Release {
    pub fn is_committed(&self) -> bool {
        matches!(self, Release::Committed(_))
    }

    pub fn direction(&self) -> Option<SwipeDirection> {
        match self {
            Release::Committed(direction) => Some(*direction),
            Release::Reset => None,
        }
    }
}

/// Visual transform of the card for the current offset
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardPose {
    pub offset: Offset,
    pub rotation_deg: f32,
    pub opacity: f32,
}

const MAX_ROTATION_DEG: f32 = 20.0;
const ROTATION_PER_UNIT: f32 = 0.1;
const MIN_OPACITY: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Dragging { origin: Point, offset: Offset },
}

/// Drag tracker for a single card
#[derive(Clone, Debug)]
pub struct GestureTracker {
    threshold: f32,
    phase: Phase,
}

impl GestureTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            phase: Phase::Idle,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Pointer/touch down - a second down while dragging restarts from the new point
    pub fn on_start(&mut self, point: Point) {
        self.phase = Phase::Dragging {
            origin: point,
            offset: Offset::ZERO,
        };
    }

    /// Pointer/touch move - returns the new offset (zero when not dragging)
    pub fn on_move(&mut self, point: Point) -> Offset {
        match &mut self.phase {
            Phase::Idle => Offset::ZERO,
            Phase::Dragging { origin, offset } => {
                *offset = Offset {
                    dx: point.x - origin.x,
                    dy: point.y - origin.y,
                };
                *offset
            }
        }
    }

    /// Pointer/touch up - commits if |dx| is strictly past the threshold
    ///
    /// Either way the drag is over and the tracker is back to idle.
    pub fn on_release(&mut self) -> Release {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Dragging { offset, .. } if offset.dx.abs() > self.threshold => {
                if offset.dx > 0.0 {
                    Release::Committed(SwipeDirection::Right)
                } else {
                    Release::Committed(SwipeDirection::Left)
                }
            }
            _ => Release::Reset,
        }
    }

    pub fn offset(&self) -> Offset {
        match self.phase {
            Phase::Idle => Offset::ZERO,
            Phase::Dragging { offset, .. } => offset,
        }
    }

    pub fn pose(&self) -> CardPose {
        let offset = self.offset();
        let rotation_deg = (offset.dx * ROTATION_PER_UNIT).clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG);
        // Fully faded at three thresholds
        let fade = (offset.dx.abs() / (self.threshold * 3.0)).min(1.0);
        CardPose {
            offset,
            rotation_deg,
            opacity: 1.0 - fade * (1.0 - MIN_OPACITY),
        }
    }
}
