//! Undo/Redo for shape operations.
//!
//! Each undoable action is recorded as a [`Command`] after it has been applied
//! to the [`ShapeStore`]. Commands carry full shape snapshots, so undoing and
//! redoing never depends on the current frame or pixel size.

use crate::constants::MAX_UNDO_HISTORY;
use crate::model::Shape;
use crate::store::ShapeStore;

// ============================================================================
// Command Types
// ============================================================================

/// A command that can be undone and redone.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A drawn shape was added on top
    AddShape {
        shape: Shape,
    },
    /// A shape was deleted
    RemoveShape {
        /// Paint position it was removed from
        index: usize,
        shape: Shape,
    },
    /// Geometry, style or label text changed
    ModifyShape {
        old: Shape,
        new: Shape,
    },
    /// Bulk replacement through the attr boundary
    ReplaceAll {
        old: Vec<Shape>,
        new: Vec<Shape>,
    },
}

impl Command {
    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::AddShape { shape } => format!("Add {}", shape.kind().name().to_lowercase()),
            Command::RemoveShape { shape, .. } => {
                format!("Delete {}", shape.kind().name().to_lowercase())
            }
            Command::ModifyShape { old, new } if old.geometry != new.geometry => {
                "Move/resize shape".to_string()
            }
            Command::ModifyShape { .. } => "Edit shape label".to_string(),
            Command::ReplaceAll { new, .. } => format!("Load {} shapes", new.len()),
        }
    }
}

// ============================================================================
// Undo Stack
// ============================================================================

/// The undo/redo history stack.
///
/// When a new command is pushed the redo stack is cleared. Undo moves the
/// command from the undo stack to the redo stack and redo moves it back.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum number of commands to keep in history
    max_history: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_max_history(MAX_UNDO_HISTORY)
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Record an already applied command. Clears the redo stack.
    pub fn push(&mut self, command: Command) {
        log::debug!("Undo: pushed '{}'", command.description());
        self.undo_stack.push(command);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop a command for undoing. The command moves to the redo stack.
    pub fn pop_undo(&mut self) -> Option<Command> {
        let cmd = self.undo_stack.pop()?;
        log::debug!("Undo: '{}'", cmd.description());
        self.redo_stack.push(cmd.clone());
        Some(cmd)
    }

    /// Pop a command for redoing. The command moves back to the undo stack.
    pub fn pop_redo(&mut self) -> Option<Command> {
        let cmd = self.redo_stack.pop()?;
        log::debug!("Redo: '{}'", cmd.description());
        self.undo_stack.push(cmd.clone());
        Some(cmd)
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("Undo history cleared");
    }
}

// ============================================================================
// Undo/Redo Execution
// ============================================================================

/// Undo the most recent command against the store.
/// Returns false if there was nothing to undo.
pub fn undo_command(stack: &mut UndoStack, store: &mut ShapeStore) -> bool {
    let Some(cmd) = stack.pop_undo() else {
        return false;
    };
    apply_undo(&cmd, store);
    true
}

/// Redo the most recently undone command against the store.
/// Returns false if there was nothing to redo.
pub fn redo_command(stack: &mut UndoStack, store: &mut ShapeStore) -> bool {
    let Some(cmd) = stack.pop_redo() else {
        return false;
    };
    apply_redo(&cmd, store);
    true
}

fn apply_undo(cmd: &Command, store: &mut ShapeStore) {
    match cmd {
        Command::AddShape { shape } => {
            store.remove(&shape.id);
        }
        Command::RemoveShape { index, shape } => store.insert(*index, shape.clone()),
        Command::ModifyShape { old, .. } => restore_shape(store, old),
        Command::ReplaceAll { old, .. } => {
            store.replace_all(old.clone());
        }
    }
}

fn apply_redo(cmd: &Command, store: &mut ShapeStore) {
    match cmd {
        Command::AddShape { shape } => store.add(shape.clone()),
        Command::RemoveShape { shape, .. } => {
            store.remove(&shape.id);
        }
        Command::ModifyShape { new, .. } => restore_shape(store, new),
        Command::ReplaceAll { new, .. } => {
            store.replace_all(new.clone());
        }
    }
}

fn restore_shape(store: &mut ShapeStore, snapshot: &Shape) {
    if let Some(shape) = store.get_mut(&snapshot.id) {
        *shape = snapshot.clone();
    } else {
        log::warn!("Undo target {} no longer exists", snapshot.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{FlagGeometry, Geometry, Measurement, Style};

    fn flag(id: &str, x: f64) -> Shape {
        Shape {
            id: id.into(),
            geometry: Geometry::Flag(FlagGeometry {
                position: Point::new(x, x),
            }),
            style: Style {
                stroke: "#fff".into(),
                stroke_width: 1.0,
                visible: true,
            },
            measurement: Measurement::default(),
        }
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut stack = UndoStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        stack.push(Command::AddShape {
            shape: flag("a", 1.0),
        });
        assert!(stack.can_undo());

        assert!(stack.pop_undo().is_some());
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        assert!(stack.pop_redo().is_some());
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = UndoStack::new();
        stack.push(Command::AddShape {
            shape: flag("a", 1.0),
        });
        stack.pop_undo();
        assert!(stack.can_redo());

        stack.push(Command::AddShape {
            shape: flag("b", 2.0),
        });
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_max_history() {
        let mut stack = UndoStack::with_max_history(3);
        for i in 0..5 {
            stack.push(Command::AddShape {
                shape: flag(&format!("s{i}"), f64::from(i)),
            });
        }
        assert_eq!(stack.undo_description().as_deref(), Some("Add flag"));
        for _ in 0..3 {
            assert!(stack.pop_undo().is_some());
        }
        assert!(stack.pop_undo().is_none());
    }

    #[test]
    fn test_undo_remove_restores_paint_order() {
        let mut store = ShapeStore::new();
        let mut stack = UndoStack::new();
        store.add(flag("a", 1.0));
        store.add(flag("b", 2.0));
        store.add(flag("c", 3.0));

        let (index, shape) = store.remove("b").unwrap();
        stack.push(Command::RemoveShape { index, shape });

        assert!(undo_command(&mut stack, &mut store));
        let ids: Vec<&str> = store.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        assert!(redo_command(&mut stack, &mut store));
        assert!(store.get("b").is_none());
        assert!(!redo_command(&mut stack, &mut store));
    }

    #[test]
    fn test_modify_round_trip() {
        let mut store = ShapeStore::new();
        let mut stack = UndoStack::new();
        let old = flag("a", 1.0);
        let new = flag("a", 9.0);
        store.add(new.clone());
        stack.push(Command::ModifyShape {
            old: old.clone(),
            new: new.clone(),
        });

        undo_command(&mut stack, &mut store);
        assert_eq!(store.get("a"), Some(&old));
        redo_command(&mut stack, &mut store);
        assert_eq!(store.get("a"), Some(&new));
    }

    #[test]
    fn test_command_descriptions() {
        let add = Command::AddShape {
            shape: flag("a", 1.0),
        };
        assert_eq!(add.description(), "Add flag");

        let mut edited = flag("a", 1.0);
        edited.measurement.description = "note".into();
        let relabel = Command::ModifyShape {
            old: flag("a", 1.0),
            new: edited,
        };
        assert_eq!(relabel.description(), "Edit shape label");

        let moved = Command::ModifyShape {
            old: flag("a", 1.0),
            new: flag("a", 2.0),
        };
        assert_eq!(moved.description(), "Move/resize shape");
    }
}
