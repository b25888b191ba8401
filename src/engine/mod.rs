//! The overlay engine.
//!
//! [`OverlayEngine`] owns every shape of one overlay and routes pointer and
//! key input through the Idle / Drawing / Dragging state machine. While a
//! gesture is active the host viewport's navigation is switched off, and it
//! is switched back on by every path that leaves the gesture.

mod session;

pub use session::{DragState, DragTarget, DrawSession, SessionMode, SessionState};

use crate::anchor;
use crate::config::{OverlayConfig, StyleDefaults};
use crate::constants::MIN_POLYGON_VERTICES;
use crate::context::OverlayContext;
use crate::error::AttrError;
use crate::factory::{self, ShapeDraft, VertexOutcome};
use crate::geometry::Point;
use crate::keybindings::{Key, KeyAction};
use crate::label::LabelOptions;
use crate::model::{DrawMode, Shape, ShapeAttr, ShapeKind, parse_attrs, validate_attrs};
use crate::scene::Scene;
use crate::store::ShapeStore;
use crate::undo::{self, Command, UndoStack};
use crate::viewport::{FrameSync, ViewportAdapter, ViewportFrame, ViewportHost};

/// Pointer event kinds forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    DoubleClick,
}

/// A pointer event in container (screen) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
        }
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub fn double_click(x: f64, y: f64) -> Self {
        Self::new(PointerKind::DoubleClick, x, y)
    }
}

/// Who handles a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResponse {
    /// The overlay used the event; the viewport must ignore it.
    Consumed,
    /// The viewport should navigate with it.
    PassThrough,
}

/// Completion notification receiving the affected shape.
pub type ShapeCallback = Box<dyn FnMut(&ShapeAttr)>;

/// Host editor for a shape's description. Returns the new text, or `None` to keep it.
pub type DescriptionEditor = Box<dyn FnMut(&ShapeAttr) -> Option<String>>;

#[derive(Default)]
struct Callbacks {
    draw_complete: Option<ShapeCallback>,
    drag_complete: Option<ShapeCallback>,
    transform_complete: Option<ShapeCallback>,
    delete_complete: Option<ShapeCallback>,
    edit_description: Option<DescriptionEditor>,
}

fn notify(callback: &mut Option<ShapeCallback>, attr: &ShapeAttr) {
    if let Some(callback) = callback {
        callback(attr);
    }
}

/// A viewport-synchronized annotation overlay.
pub struct OverlayEngine<V: ViewportHost> {
    viewport: V,
    ctx: OverlayContext,
    adapter: ViewportAdapter,
    store: ShapeStore,
    undo: UndoStack,
    session: DrawSession,
    draw_mode: DrawMode,
    callbacks: Callbacks,
    /// Set when the frame changed since the last scene.
    frame_dirty: bool,
}

impl<V: ViewportHost> OverlayEngine<V> {
    /// Attach a new overlay to a host viewport.
    pub fn new(viewport: V, config: OverlayConfig) -> Self {
        let undo = UndoStack::with_max_history(config.interaction.max_undo_history);
        let mut engine = Self {
            viewport,
            ctx: OverlayContext::new(config),
            adapter: ViewportAdapter::new(),
            store: ShapeStore::new(),
            undo,
            session: DrawSession::default(),
            draw_mode: DrawMode::Move,
            callbacks: Callbacks::default(),
            frame_dirty: true,
        };
        engine.on_viewport_changed();
        engine
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Mutable access to the host viewport. Call [`Self::on_viewport_changed`] afterwards.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.ctx.config
    }

    pub fn frame(&self) -> &ViewportFrame {
        &self.ctx.frame
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn active_shape_id(&self) -> Option<&str> {
        self.session.active_shape_id()
    }

    pub fn last_pointer_world(&self) -> Option<Point> {
        self.session.last_pointer_world
    }

    /// The draft being drawn, if any.
    pub fn draft(&self) -> Option<&ShapeDraft> {
        self.session.draft()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.store.iter()
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.store.get(id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.store.selected()
    }

    /// Select a shape from the host (or clear with `None`).
    pub fn select_shape(&mut self, id: Option<&str>) {
        self.store.select(id.map(str::to_string));
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Label for an undo menu entry, e.g. "Delete rectangle".
    pub fn undo_description(&self) -> Option<String> {
        self.undo.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.undo.redo_description()
    }

    /// Label lines of a shape under the current label options.
    pub fn label_lines(&self, id: &str) -> Option<Vec<String>> {
        self.store
            .get(id)
            .map(|shape| factory::measurement_text(shape, &self.ctx))
    }

    // ========================================================================
    // Host configuration
    // ========================================================================

    /// Arm a draw kind, or go back to Move. Any gesture in progress is cancelled.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        if !self.session.is_idle() {
            self.cancel();
        }
        if mode != self.draw_mode {
            log::debug!("Draw mode: {:?} -> {:?}", self.draw_mode, mode);
            self.draw_mode = mode;
        }
        if mode.armed_kind().is_some() {
            self.store.select(None);
        }
    }

    /// Style for shapes drawn from now on. The stroke width applies to all shapes.
    pub fn set_shape_style_defaults(&mut self, style: StyleDefaults) {
        self.ctx.config.style = style;
        self.compensate_strokes();
    }

    pub fn set_label_options(&mut self, options: LabelOptions) {
        let rescale = options.pixel_size_per_world_unit != self.ctx.pixel_size();
        self.ctx.config.label = options;
        if rescale {
            self.recompute_measurements();
        }
        self.store.mark_dirty();
    }

    pub fn on_draw_complete(&mut self, callback: impl FnMut(&ShapeAttr) + 'static) {
        self.callbacks.draw_complete = Some(Box::new(callback));
    }

    pub fn on_drag_complete(&mut self, callback: impl FnMut(&ShapeAttr) + 'static) {
        self.callbacks.drag_complete = Some(Box::new(callback));
    }

    pub fn on_transform_complete(&mut self, callback: impl FnMut(&ShapeAttr) + 'static) {
        self.callbacks.transform_complete = Some(Box::new(callback));
    }

    pub fn on_delete_complete(&mut self, callback: impl FnMut(&ShapeAttr) + 'static) {
        self.callbacks.delete_complete = Some(Box::new(callback));
    }

    pub fn on_edit_description(
        &mut self,
        editor: impl FnMut(&ShapeAttr) -> Option<String> + 'static,
    ) {
        self.callbacks.edit_description = Some(Box::new(editor));
    }

    // ========================================================================
    // Viewport sync and repaint
    // ========================================================================

    /// Re-read the host viewport. Call on every pan/zoom/rotate/resize/open.
    pub fn on_viewport_changed(&mut self) -> FrameSync {
        let sync = self.adapter.sync_frame(&self.viewport);
        if let FrameSync::Changed(frame) = sync {
            self.ctx.frame = frame;
            self.compensate_strokes();
            self.frame_dirty = true;
        }
        sync
    }

    /// Build the scene if anything changed since the last tick.
    pub fn tick(&mut self) -> Option<Scene> {
        if !self.frame_dirty && !self.store.is_dirty() {
            return None;
        }
        let scene = Scene::build(&self.store, self.session.draft(), &self.ctx);
        self.frame_dirty = false;
        self.store.clear_dirty();
        Some(scene)
    }

    fn compensate_strokes(&mut self) {
        let stroke_width = self.ctx.stroke_width();
        for shape in self.store.iter_mut() {
            shape.style.stroke_width = stroke_width;
        }
        if let SessionMode::Drawing(draft) = &mut self.session.mode {
            draft.refresh(&self.ctx);
        }
    }

    fn recompute_measurements(&mut self) {
        let pixel_size = self.ctx.pixel_size();
        for shape in self.store.iter_mut() {
            shape.measurement.recompute(&shape.geometry, pixel_size);
        }
        if let SessionMode::Drawing(draft) = &mut self.session.mode {
            draft.refresh(&self.ctx);
        }
    }

    // ========================================================================
    // Persisted attrs
    // ========================================================================

    pub fn get_shapes_attr(&self) -> Vec<ShapeAttr> {
        self.store.iter().map(ShapeAttr::from).collect()
    }

    /// Replace every shape from persisted attrs.
    ///
    /// All attrs are validated first; on error nothing changes. Tag and
    /// description are kept and numeric measurements are recomputed.
    pub fn set_shapes_attr(&mut self, attrs: Vec<ShapeAttr>) -> Result<(), AttrError> {
        if let Err(e) = validate_attrs(&attrs) {
            log::warn!("Rejected shape attrs: {}", e);
            return Err(e);
        }
        let mut shapes = attrs
            .into_iter()
            .map(|attr| factory::reconstruct(attr, &self.ctx))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.session.is_idle() {
            self.cancel();
        }
        let stroke_width = self.ctx.stroke_width();
        for shape in &mut shapes {
            shape.style.stroke_width = stroke_width;
        }
        log::info!("Loaded {} shapes from attrs", shapes.len());
        let old = self.store.replace_all(shapes.clone());
        self.undo.push(Command::ReplaceAll { old, new: shapes });
        Ok(())
    }

    pub fn shapes_attr_json(&self) -> Result<String, AttrError> {
        Ok(serde_json::to_string_pretty(&self.get_shapes_attr())?)
    }

    pub fn set_shapes_attr_json(&mut self, json: &str) -> Result<(), AttrError> {
        let attrs = parse_attrs(json)?;
        self.set_shapes_attr(attrs)
    }

    // ========================================================================
    // Shape operations
    // ========================================================================

    /// Remove a shape on the host's behalf. No completion callback fires.
    pub fn destroy_shape(&mut self, id: &str) -> bool {
        if self.session.active_shape_id() == Some(id) {
            self.cancel();
        }
        let Some((index, shape)) = self.store.remove(id) else {
            return false;
        };
        log::info!("Destroyed {} {}", shape.kind().name(), id);
        self.undo.push(Command::RemoveShape { index, shape });
        true
    }

    /// Delete the selected shape and fire the delete notification.
    pub fn delete_selected(&mut self) -> bool {
        if !self.session.is_idle() {
            return false;
        }
        let Some(id) = self.store.selected().map(str::to_string) else {
            return false;
        };
        let Some((index, shape)) = self.store.remove(&id) else {
            return false;
        };
        log::info!("Deleted {} {}", shape.kind().name(), id);
        let attr = ShapeAttr::from(&shape);
        self.undo.push(Command::RemoveShape { index, shape });
        notify(&mut self.callbacks.delete_complete, &attr);
        true
    }

    pub fn set_description(&mut self, id: &str, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(shape) = self.store.get_mut(id) else {
            return false;
        };
        if shape.measurement.description == text {
            return false;
        }
        let old = shape.clone();
        shape.measurement.description = text;
        let new = shape.clone();
        self.undo.push(Command::ModifyShape { old, new });
        true
    }

    /// Ask the host editor for a new description and apply it.
    pub fn request_description_edit(&mut self, id: &str) -> bool {
        let Some(attr) = self.store.get(id).map(ShapeAttr::from) else {
            return false;
        };
        let Some(editor) = self.callbacks.edit_description.as_mut() else {
            log::debug!("No description editor registered");
            return false;
        };
        match editor(&attr) {
            Some(text) => self.set_description(id, text),
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        if !self.session.is_idle() {
            return false;
        }
        let done = undo::undo_command(&mut self.undo, &mut self.store);
        if done {
            self.refresh_after_history();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        if !self.session.is_idle() {
            return false;
        }
        let done = undo::redo_command(&mut self.undo, &mut self.store);
        if done {
            self.refresh_after_history();
        }
        done
    }

    /// Snapshots may come from another frame or pixel size.
    fn refresh_after_history(&mut self) {
        self.compensate_strokes();
        self.recompute_measurements();
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Handle a key forwarded by the host. Returns whether it was used.
    pub fn handle_key(&mut self, key: Key) -> bool {
        let Some(action) = self.ctx.config.keybindings.action_for(key) else {
            return false;
        };
        log::trace!("Key {:?} -> {:?}", key, action);
        match action {
            KeyAction::Cancel => self.cancel(),
            KeyAction::DeleteSelected => self.delete_selected(),
            KeyAction::FinishPolygon => self.finish_polygon(),
            KeyAction::Undo => self.undo(),
            KeyAction::Redo => self.redo(),
            KeyAction::SetMode(mode) => {
                self.set_draw_mode(mode);
                true
            }
        }
    }

    /// Abort the current gesture, rolling back any change it made.
    /// When idle, clears the selection instead.
    pub fn cancel(&mut self) -> bool {
        match self.session.take() {
            SessionMode::Idle => {
                let had_selection = self.store.selected().is_some();
                self.store.select(None);
                had_selection
            }
            SessionMode::Drawing(draft) => {
                log::debug!("Cancelled drawing {} {}", draft.kind().name(), draft.id());
                self.end_session();
                true
            }
            SessionMode::Dragging(drag) => {
                log::debug!("Cancelled drag on {}", drag.original.id);
                if let Some(shape) = self.store.get_mut(&drag.original.id) {
                    *shape = drag.original;
                }
                self.end_session();
                true
            }
        }
    }

    /// Close the polygon being drawn if it has enough vertices.
    pub fn finish_polygon(&mut self) -> bool {
        let ready = self.session.draft().is_some_and(|draft| {
            draft.kind() == ShapeKind::Polygon && draft.vertices().len() >= MIN_POLYGON_VERTICES
        });
        if !ready {
            return false;
        }
        let SessionMode::Drawing(draft) = self.session.take() else {
            return false;
        };
        let release = self.session.last_pointer_world.unwrap_or(Point::ZERO);
        self.commit_draft(draft, release)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        let Some(point) = self.to_world(event.position) else {
            return PointerResponse::PassThrough;
        };
        self.session.last_pointer_world = Some(point);
        match event.kind {
            PointerKind::Down => self.pointer_down(point),
            PointerKind::Move => self.pointer_move(point),
            PointerKind::Up => self.pointer_up(point),
            PointerKind::DoubleClick => self.double_click(point),
        }
    }

    fn to_world(&self, screen: Point) -> Option<Point> {
        if !self.viewport.is_open() {
            return None;
        }
        let point = self.viewport.world_point_from_pixel(screen);
        point.is_finite().then_some(point)
    }

    fn pointer_down(&mut self, point: Point) -> PointerResponse {
        let outcome = match &mut self.session.mode {
            SessionMode::Drawing(draft) if draft.kind() == ShapeKind::Polygon => {
                Some(draft.add_vertex(point, &self.ctx))
            }
            SessionMode::Drawing(_) | SessionMode::Dragging(_) => None,
            SessionMode::Idle => {
                return self.idle_pointer_down(point);
            }
        };
        match outcome {
            Some(VertexOutcome::Closed) => {
                if let SessionMode::Drawing(draft) = self.session.take() {
                    self.commit_draft(draft, point);
                }
            }
            Some(VertexOutcome::Added) => self.store.mark_dirty(),
            Some(VertexOutcome::Ignored) | None => {}
        }
        PointerResponse::Consumed
    }

    fn idle_pointer_down(&mut self, point: Point) -> PointerResponse {
        if let Some(kind) = self.draw_mode.armed_kind() {
            self.start_drawing(kind, point);
            return PointerResponse::Consumed;
        }
        match self.pick_drag_target(point) {
            Some((original, target, was_selected)) => {
                self.start_dragging(original, target, point, was_selected);
                PointerResponse::Consumed
            }
            None => {
                self.store.select(None);
                PointerResponse::PassThrough
            }
        }
    }

    fn start_drawing(&mut self, kind: ShapeKind, point: Point) {
        let id = self.store.next_id();
        let draft = ShapeDraft::create(id, kind, point, &self.ctx);
        self.store.select(None);
        self.session.mode = SessionMode::Drawing(draft);
        self.viewport.set_navigation_enabled(false);
        self.store.mark_dirty();
    }

    /// Anchors of the selected shape first, then its body, then the top-most hit.
    fn pick_drag_target(&self, point: Point) -> Option<(Shape, DragTarget, bool)> {
        if let Some(selected) = self.store.selected_shape().filter(|s| s.style.visible) {
            let anchors = anchor::anchors_for(selected, &self.ctx);
            if let Some(role) = anchor::hit_test_anchor(&anchors, point) {
                return Some((selected.clone(), DragTarget::Anchor(role), true));
            }
            if anchor::hit_test_shape(selected, point, &self.ctx) {
                return Some((selected.clone(), DragTarget::Body, true));
            }
        }
        self.store
            .hit_test(point, &self.ctx)
            .map(|shape| (shape.clone(), DragTarget::Body, false))
    }

    fn start_dragging(
        &mut self,
        original: Shape,
        target: DragTarget,
        point: Point,
        was_selected: bool,
    ) {
        log::debug!("Potential drag on {}, target={:?}", original.id, target);
        self.store.select(Some(original.id.clone()));
        self.session.mode = SessionMode::Dragging(DragState {
            target,
            start: point,
            original,
            moved: false,
            was_selected,
        });
        self.viewport.set_navigation_enabled(false);
    }

    fn pointer_move(&mut self, point: Point) -> PointerResponse {
        match &mut self.session.mode {
            SessionMode::Idle => {
                let hovered = self
                    .store
                    .hit_test(point, &self.ctx)
                    .map(|shape| shape.id.clone());
                self.store.set_hovered(hovered);
                PointerResponse::PassThrough
            }
            SessionMode::Drawing(draft) => {
                draft.update_from_drag(point, &self.ctx);
                self.store.mark_dirty();
                PointerResponse::Consumed
            }
            SessionMode::Dragging(drag) => {
                if !drag.moved {
                    if drag.start.distance_to(&point) < self.ctx.min_draw_distance() {
                        return PointerResponse::Consumed;
                    }
                    log::debug!("Dragging {} ({:?})", drag.original.id, drag.target);
                    drag.moved = true;
                }
                let geometry = match drag.target {
                    DragTarget::Body => Some(drag.original.geometry.translated(point - drag.start)),
                    DragTarget::Anchor(role) => {
                        anchor::apply_anchor_drag(&drag.original.geometry, role, point, &self.ctx)
                    }
                };
                let pixel_size = self.ctx.pixel_size();
                match (geometry, self.store.get_mut(&drag.original.id)) {
                    (Some(geometry), Some(shape)) => shape.set_geometry(geometry, pixel_size),
                    (_, None) => log::warn!("Drag target {} no longer exists", drag.original.id),
                    (None, Some(_)) => {}
                }
                PointerResponse::Consumed
            }
        }
    }

    fn pointer_up(&mut self, point: Point) -> PointerResponse {
        match self.session.take() {
            SessionMode::Idle => PointerResponse::PassThrough,
            // Polygon vertices are committed on pointer-down
            SessionMode::Drawing(draft) if draft.kind() == ShapeKind::Polygon => {
                self.session.mode = SessionMode::Drawing(draft);
                PointerResponse::Consumed
            }
            SessionMode::Drawing(draft) => {
                self.commit_draft(draft, point);
                PointerResponse::Consumed
            }
            SessionMode::Dragging(drag) => {
                self.end_session();
                self.finish_drag(drag, point);
                PointerResponse::Consumed
            }
        }
    }

    fn double_click(&mut self, point: Point) -> PointerResponse {
        match self.session.state() {
            SessionState::Drawing => {
                self.finish_polygon();
                PointerResponse::Consumed
            }
            SessionState::Dragging => PointerResponse::Consumed,
            SessionState::Idle if self.draw_mode == DrawMode::Move => {
                let hit = self
                    .store
                    .hit_test(point, &self.ctx)
                    .map(|shape| shape.id.clone());
                match hit {
                    Some(id) => {
                        self.request_description_edit(&id);
                        PointerResponse::Consumed
                    }
                    None => PointerResponse::PassThrough,
                }
            }
            SessionState::Idle => PointerResponse::Consumed,
        }
    }

    /// Leave Drawing/Dragging and hand input back to the viewport.
    fn end_session(&mut self) {
        self.session.mode = SessionMode::Idle;
        self.viewport.set_navigation_enabled(true);
        self.store.mark_dirty();
    }

    fn commit_draft(&mut self, draft: ShapeDraft, release: Point) -> bool {
        let id = draft.id().to_string();
        let kind = draft.kind();
        let completed = draft.complete(release, &self.ctx);
        self.end_session();

        let Some(shape) = completed else {
            log::debug!("{} {} rolled back", kind.name(), id);
            return false;
        };
        log::info!("Created {} {}", kind.name(), id);
        let attr = ShapeAttr::from(&shape);
        self.store.add(shape.clone());
        self.store.select(Some(id));
        self.undo.push(Command::AddShape { shape });
        notify(&mut self.callbacks.draw_complete, &attr);
        true
    }

    fn finish_drag(&mut self, drag: DragState, point: Point) {
        if !drag.moved {
            if drag.was_selected && drag.target == DragTarget::Body {
                self.cycle_selection(point, &drag.original.id);
            }
            return;
        }
        let Some(shape) = self.store.get(&drag.original.id).cloned() else {
            return;
        };
        if shape == drag.original {
            return;
        }
        log::info!("Finished editing {}", shape.id);
        let attr = ShapeAttr::from(&shape);
        self.undo.push(Command::ModifyShape {
            old: drag.original,
            new: shape,
        });
        match drag.target {
            DragTarget::Body => notify(&mut self.callbacks.drag_complete, &attr),
            DragTarget::Anchor(_) => notify(&mut self.callbacks.transform_complete, &attr),
        }
    }

    /// A click on the already selected shape selects the next shape below it.
    fn cycle_selection(&mut self, point: Point, current: &str) {
        let hits: Vec<&str> = self
            .store
            .iter()
            .filter(|shape| anchor::hit_test_shape(shape, point, &self.ctx))
            .map(|shape| shape.id.as_str())
            .collect();
        if hits.len() < 2 {
            return;
        }
        let pos = hits.iter().position(|id| *id == current).unwrap_or(0);
        let next = hits[(pos + hits.len() - 1) % hits.len()].to_string();
        log::debug!("Cycling selection to {} ({} overlapping)", next, hits.len());
        self.store.select(Some(next));
    }
}
