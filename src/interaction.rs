//! Pointer interaction with the crop overlay.
//!
//! The overlay is an explicit state machine: [`InteractionState::Idle`] or
//! [`InteractionState::Dragging`]. [`transition`] is a pure function from
//! `(state, event)` to `(state, effects)`; it never touches the crop model
//! itself. [`CropInteractionController`] wraps it, applies the resulting
//! [`CropCommand`]s to a [`CropModel`], and reports what changed.
//!
//! Pointer coordinates are in presentation space. The surface clamps
//! off-surface pointers before they get here, and the crop model enforces
//! every rectangle invariant, so no extra validation happens in this module.
//!
//! # Example
//!
//! ```
//! use frameslice::{
//!     CoordinateMapper, CropInteractionController, CropModel, MediaDimensions,
//!     Point, PointerEvent, Rect,
//! };
//!
//! let dimensions = MediaDimensions::new(200, 100, 5.0)?;
//! let mapper = CoordinateMapper::new(dimensions, 200.0, 100.0)?;
//! let mut model = CropModel::new(dimensions);
//! model.set_rect(Rect::new(50, 25, 100, 50));
//!
//! let mut controller = CropInteractionController::new();
//! controller.handle(PointerEvent::Down(Point::new(100.0, 50.0)), &mapper, &mut model);
//! controller.handle(PointerEvent::Move(Point::new(110.0, 55.0)), &mapper, &mut model);
//! controller.handle(PointerEvent::Up, &mapper, &mut model);
//!
//! assert_eq!(model.rect(), Rect::new(60, 30, 100, 50));
//! # Ok::<(), frameslice::SliceError>(())
//! ```

use crate::crop::{Corner, CropModel, Rect};
use crate::geometry::{CoordinateMapper, HANDLE_HIT, Point, SurfaceRect};

/// What an active drag does to the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate the rectangle.
    Move,
    /// Resize from a corner handle.
    Resize(Corner),
    /// Draw a fresh rectangle from the pointer-down point.
    NewSelection,
}

impl DragMode {
    /// Cursor shape that advertises this mode.
    pub fn cursor(self) -> CursorHint {
        match self {
            DragMode::Move => CursorHint::Move,
            DragMode::Resize(Corner::NorthWest) => CursorHint::ResizeNorthWest,
            DragMode::Resize(Corner::NorthEast) => CursorHint::ResizeNorthEast,
            DragMode::Resize(Corner::SouthWest) => CursorHint::ResizeSouthWest,
            DragMode::Resize(Corner::SouthEast) => CursorHint::ResizeSouthEast,
            DragMode::NewSelection => CursorHint::Crosshair,
        }
    }
}

/// Cursor affordance for the overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    ResizeNorthWest,
    ResizeNorthEast,
    ResizeSouthWest,
    ResizeSouthEast,
    Move,
    Crosshair,
}

impl CursorHint {
    /// CSS-style cursor name.
    pub fn name(self) -> &'static str {
        match self {
            CursorHint::ResizeNorthWest => "nw-resize",
            CursorHint::ResizeNorthEast => "ne-resize",
            CursorHint::ResizeSouthWest => "sw-resize",
            CursorHint::ResizeSouthEast => "se-resize",
            CursorHint::Move => "move",
            CursorHint::Crosshair => "crosshair",
        }
    }
}

/// An in-progress drag. Lives from pointer-down to pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Mode chosen at pointer-down.
    pub mode: DragMode,
    /// Pointer-down position, in presentation space.
    pub start_pointer: Point,
    /// Crop rectangle at pointer-down.
    pub start_rect: Rect,
}

/// Overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Pointer input in presentation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    /// The pointer left the surface.
    Leave,
}

/// A crop-model operation requested by a drag.
///
/// Deltas are in video pixels and always measured from the drag's start
/// point, so repeated moves never accumulate drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropCommand {
    Move {
        delta_x: f64,
        delta_y: f64,
        base: Rect,
    },
    Resize {
        corner: Corner,
        delta_x: f64,
        delta_y: f64,
        base: Rect,
    },
    NewSelection {
        pointer_down: Point,
        pointer_now: Point,
    },
}

impl CropCommand {
    /// Run the command against `model` and return the resulting rectangle.
    pub fn apply(self, model: &mut CropModel) -> Rect {
        match self {
            CropCommand::Move {
                delta_x,
                delta_y,
                base,
            } => model.apply_move(delta_x, delta_y, base),
            CropCommand::Resize {
                corner,
                delta_x,
                delta_y,
                base,
            } => model.apply_resize(corner, delta_x, delta_y, base),
            CropCommand::NewSelection {
                pointer_down,
                pointer_now,
            } => model.apply_new_selection(pointer_down, pointer_now),
        }
    }
}

/// Side effects produced by a [`transition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Show this cursor.
    Cursor(CursorHint),
    /// Apply this command to the crop model.
    Crop(CropCommand),
    /// A drag started in the given mode.
    DragStarted(DragMode),
    /// The active drag ended.
    DragEnded,
}

/// Classify a presentation-space point against the crop overlay.
///
/// Corner handles win over the interior, so a corner stays grabbable even
/// when the rectangle is small enough for the handle regions to overlap it.
/// Corners are tried NW, NE, SW, SE.
pub fn classify(point: Point, crop: &SurfaceRect) -> DragMode {
    let hit = Corner::ALL
        .into_iter()
        .zip(crop.corners())
        .find(|(_, corner)| {
            (point.x - corner.x).abs() <= HANDLE_HIT && (point.y - corner.y).abs() <= HANDLE_HIT
        });

    match hit {
        Some((corner, _)) => DragMode::Resize(corner),
        None if crop.contains(point) => DragMode::Move,
        None => DragMode::NewSelection,
    }
}

/// Compute the next overlay state and its effects.
///
/// `current_rect` is the crop rectangle at the time of the event; it is
/// captured into the session on pointer-down.
pub fn transition(
    state: InteractionState,
    event: PointerEvent,
    mapper: &CoordinateMapper,
    current_rect: Rect,
) -> (InteractionState, Vec<Effect>) {
    match (state, event) {
        (_, PointerEvent::Down(point)) => {
            let mode = classify(point, &mapper.rect_to_presentation(&current_rect));
            let session = DragSession {
                mode,
                start_pointer: point,
                start_rect: current_rect,
            };
            (
                InteractionState::Dragging(session),
                vec![Effect::DragStarted(mode), Effect::Cursor(mode.cursor())],
            )
        }
        (InteractionState::Idle, PointerEvent::Move(point)) => {
            let mode = classify(point, &mapper.rect_to_presentation(&current_rect));
            (InteractionState::Idle, vec![Effect::Cursor(mode.cursor())])
        }
        (InteractionState::Dragging(session), PointerEvent::Move(point)) => {
            let command = drag_command(&session, point, mapper);
            (state, vec![Effect::Crop(command)])
        }
        (InteractionState::Dragging(_), PointerEvent::Up | PointerEvent::Leave) => {
            (InteractionState::Idle, vec![Effect::DragEnded])
        }
        (InteractionState::Idle, PointerEvent::Up | PointerEvent::Leave) => {
            (InteractionState::Idle, Vec::new())
        }
    }
}

fn drag_command(session: &DragSession, point: Point, mapper: &CoordinateMapper) -> CropCommand {
    let start = mapper.to_video(session.start_pointer);
    let now = mapper.to_video(point);
    let (delta_x, delta_y) = (now.x - start.x, now.y - start.y);

    match session.mode {
        DragMode::Move => CropCommand::Move {
            delta_x,
            delta_y,
            base: session.start_rect,
        },
        DragMode::Resize(corner) => CropCommand::Resize {
            corner,
            delta_x,
            delta_y,
            base: session.start_rect,
        },
        DragMode::NewSelection => CropCommand::NewSelection {
            pointer_down: start,
            pointer_now: now,
        },
    }
}

/// What a handled event changed, for the caller to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Feedback {
    /// New cursor, if it should change.
    pub cursor: Option<CursorHint>,
    /// New crop rectangle, if a drag moved it.
    pub rect: Option<Rect>,
}

/// Drives a [`CropModel`] from pointer events.
#[derive(Debug, Clone, Default)]
pub struct CropInteractionController {
    state: InteractionState,
}

impl CropInteractionController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current overlay state.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging(_))
    }

    /// Feed one pointer event through the state machine and apply any crop
    /// commands it produces.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        mapper: &CoordinateMapper,
        model: &mut CropModel,
    ) -> Feedback {
        let (state, effects) = transition(self.state, event, mapper, model.rect());
        self.state = state;

        let mut feedback = Feedback::default();
        for effect in effects {
            match effect {
                Effect::Cursor(hint) => feedback.cursor = Some(hint),
                Effect::Crop(command) => feedback.rect = Some(command.apply(model)),
                Effect::DragStarted(mode) => log::trace!("Drag started: {mode:?}"),
                Effect::DragEnded => log::trace!("Drag ended at {}", model.rect()),
            }
        }
        feedback
    }

    /// Drop any active drag without applying anything.
    pub fn cancel(&mut self) {
        self.state = InteractionState::Idle;
    }
}
