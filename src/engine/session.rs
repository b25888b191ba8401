//! Transient gesture state.

use crate::anchor::AnchorRole;
use crate::factory::ShapeDraft;
use crate::geometry::Point;
use crate::model::{Shape, ShapeKind};

/// What a drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The whole shape (move).
    Body,
    /// One control handle (resize or reshape).
    Anchor(AnchorRole),
}

/// An active drag on an existing shape.
#[derive(Debug, Clone)]
pub struct DragState {
    pub target: DragTarget,
    /// World point of the pointer-down.
    pub start: Point,
    /// Snapshot taken at pointer-down, used for rollback and undo.
    pub original: Shape,
    /// False until the pointer has moved past the min draw distance.
    pub moved: bool,
    /// Whether the shape was already selected before this press.
    pub was_selected: bool,
}

/// Draw session mode.
#[derive(Debug, Clone, Default)]
pub enum SessionMode {
    /// Pointer events pass through to viewport navigation.
    #[default]
    Idle,
    /// One shape is being constructed.
    Drawing(ShapeDraft),
    /// An existing shape or one of its anchors is being moved.
    Dragging(DragState),
}

/// Coarse session state reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Drawing,
    Dragging,
}

/// The single gesture an overlay can own at a time.
#[derive(Debug, Clone, Default)]
pub struct DrawSession {
    pub mode: SessionMode,
    pub last_pointer_world: Option<Point>,
}

impl DrawSession {
    pub fn state(&self) -> SessionState {
        match self.mode {
            SessionMode::Idle => SessionState::Idle,
            SessionMode::Drawing(_) => SessionState::Drawing,
            SessionMode::Dragging(_) => SessionState::Dragging,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, SessionMode::Idle)
    }

    /// Id of the shape being drawn or dragged.
    pub fn active_shape_id(&self) -> Option<&str> {
        match &self.mode {
            SessionMode::Idle => None,
            SessionMode::Drawing(draft) => Some(draft.id()),
            SessionMode::Dragging(drag) => Some(drag.original.id.as_str()),
        }
    }

    /// Kind of the draft in progress.
    pub fn draw_kind(&self) -> Option<ShapeKind> {
        match &self.mode {
            SessionMode::Drawing(draft) => Some(draft.kind()),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&ShapeDraft> {
        match &self.mode {
            SessionMode::Drawing(draft) => Some(draft),
            _ => None,
        }
    }

    /// Leave the current mode, returning it.
    pub fn take(&mut self) -> SessionMode {
        std::mem::take(&mut self.mode)
    }
}
