use std::collections::VecDeque;

use image::RgbaImage;
use thiserror::Error;
use uuid::Uuid;

use crate::canvas::{self, Color, Snapshot, Surface, SurfaceError};
use crate::components::history::HistoryManager;
use crate::components::tools::{Tool, ToolProperties, ToolState};
use crate::io::{self, RasterError};
use crate::ops::flood_fill::{self, FillOutcome, FillRequest, NoOpReason};
use crate::ops::stroke;
use crate::settings::EditorSettings;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// What a surface-replacing request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Now,
    /// A stroke is in progress; the request runs right after it commits.
    Queued,
}

/// Requests that replace the whole surface and reseed history.
enum Replacement {
    Resize { width: u32, height: u32 },
    Clear,
    Import(RgbaImage),
}

impl Replacement {
    fn describe(&self) -> String {
        match self {
            Replacement::Resize { width, height } => format!("resize to {}×{}", width, height),
            Replacement::Clear => "clear".to_string(),
            Replacement::Import(img) => format!("import {}×{}", img.width(), img.height()),
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One editing session: the live surface, its history and the tool setup.
///
/// Every operation runs to completion under `&mut self`, so a fill or a
/// history step can never interleave with another mutation.
pub struct Session {
    pub id: Uuid,
    /// Display name, e.g. "Untitled-1".
    pub name: String,
    is_dirty: bool,
    surface: Surface,
    history: HistoryManager,
    tools: ToolState,
    default_size: (u32, u32),
    pending: VecDeque<Replacement>,
}

impl Session {
    pub fn new(settings: &EditorSettings) -> Result<Self, SessionError> {
        Self::new_untitled(1, settings)
    }

    pub fn new_untitled(untitled_counter: usize, settings: &EditorSettings) -> Result<Self, SessionError> {
        let surface = Surface::new(settings.canvas_width, settings.canvas_height, settings.background)?;
        let history = HistoryManager::new(surface.capture(), settings.max_history);
        let mut properties = ToolProperties { color: settings.brush_color, ..Default::default() };
        properties.set_size(settings.brush_size);

        let session = Self {
            id: Uuid::new_v4(),
            name: format!("Untitled-{}", untitled_counter),
            is_dirty: false,
            surface,
            history,
            tools: ToolState::new(properties),
            default_size: (settings.canvas_width, settings.canvas_height),
            pending: VecDeque::new(),
        };
        log::info!(
            "session {} created: {}×{}, history limit {}",
            session.id,
            settings.canvas_width,
            settings.canvas_height,
            session.history.max_entries()
        );
        Ok(session)
    }

    // ---- accessors ----------------------------------------------------------

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tool(&self) -> Tool {
        self.tools.active_tool
    }

    pub fn properties(&self) -> &ToolProperties {
        &self.tools.properties
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Title with dirty indicator.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn stroke_in_progress(&self) -> bool {
        self.tools.stroke_tracker.is_active
    }

    pub fn pending_replacements(&self) -> usize {
        self.pending.len()
    }

    // ---- tool configuration -------------------------------------------------

    pub fn select_tool(&mut self, tool: Tool) {
        self.tools.select(tool);
        log::debug!("tool: {}", self.tools.active_tool.label());
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.tools.properties.set_size(size);
    }

    /// Sets both the brush color and the fill replacement color.
    pub fn set_brush_color(&mut self, color: Color) {
        self.tools.properties.color = color;
    }

    // ---- strokes ------------------------------------------------------------

    /// Start a stroke and stamp a dot at the start point, so a click without
    /// motion still leaves a mark.
    pub fn begin_stroke(&mut self, x: f32, y: f32, color: Color, width: f32) {
        self.start_stroke(Tool::Brush, x, y, color, width);
    }

    fn start_stroke(&mut self, tool: Tool, x: f32, y: f32, color: Color, width: f32) {
        if self.tools.stroke_tracker.is_active {
            log::warn!("begin_stroke while a stroke is active; committing the previous one");
            self.end_stroke();
        }
        self.history.begin_edit();
        self.tools.stroke_tracker.start((x, y), &format!("{} Stroke", tool.label()));
        let painted = stroke::draw_dot(&mut self.surface, (x, y), width, color);
        self.tools.stroke_tracker.expand_bounds(painted);
    }

    /// Draw one connected segment of the active stroke. Ignored when no
    /// stroke is in progress.
    pub fn extend_stroke(&mut self, prev_x: f32, prev_y: f32, x: f32, y: f32, color: Color, width: f32) {
        if !self.tools.stroke_tracker.is_active {
            log::debug!("extend_stroke without an active stroke ignored");
            return;
        }
        let painted = stroke::draw_segment(&mut self.surface, (prev_x, prev_y), (x, y), width, color);
        self.tools.stroke_tracker.advance((x, y));
        self.tools.stroke_tracker.expand_bounds(painted);
    }

    /// Finish the active stroke and commit the surface to history. Any
    /// surface replacement queued during the stroke runs afterwards.
    pub fn end_stroke(&mut self) {
        let Some(event) = self.tools.stroke_tracker.finish() else {
            return;
        };
        self.history.commit(self.surface.capture());
        self.is_dirty = true;
        log::debug!(
            "{} committed: {} segment(s), bounds {:?}, history {}/{}",
            event.description,
            event.segments,
            event.bounds,
            self.history.position() + 1,
            self.history.len()
        );
        self.drain_pending();
    }

    // ---- fill ---------------------------------------------------------------

    /// Bucket-fill the region under `(x, y)` with `replacement`.
    ///
    /// The fill runs on a detached copy of the pixels and is written back in
    /// one restore, then committed. A seed outside the canvas does nothing.
    pub fn request_fill(&mut self, x: i64, y: i64, replacement: Color) -> Result<FillOutcome, SessionError> {
        if self.tools.stroke_tracker.is_active {
            self.end_stroke();
        }
        let mut work = self.surface.to_image();
        let Some(request) = FillRequest::sampled(&work, x, y, replacement) else {
            log::debug!("fill at ({}, {}) is outside the canvas", x, y);
            return Ok(FillOutcome::Unchanged(NoOpReason::SeedOutside));
        };

        self.history.begin_edit();
        let outcome = flood_fill::flood_fill(&mut work, &request);
        let snapshot = Snapshot::from_image(work);
        if outcome.changed() {
            if let Err(e) = self.surface.restore(&snapshot) {
                log::error!("fill write-back failed: {}", e);
                return Err(e.into());
            }
            self.is_dirty = true;
        }
        self.history.commit(snapshot);
        log::debug!(
            "fill ({}, {}) {} -> {}: {:?}",
            x,
            y,
            request.target,
            replacement,
            outcome
        );
        Ok(outcome)
    }

    // ---- history ------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one snapshot. Returns whether anything changed. A stroke in
    /// progress is committed first so it can be undone as a whole.
    pub fn request_undo(&mut self) -> Result<bool, SessionError> {
        if self.tools.stroke_tracker.is_active {
            self.end_stroke();
        }
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        if let Err(e) = self.surface.restore(snapshot) {
            log::error!("undo restore failed: {}", e);
            return Err(e.into());
        }
        self.is_dirty = true;
        log::debug!("undo -> {}/{}", self.history.position() + 1, self.history.len());
        Ok(true)
    }

    /// Step forward one snapshot. Returns whether anything changed.
    pub fn request_redo(&mut self) -> Result<bool, SessionError> {
        if self.tools.stroke_tracker.is_active {
            return Ok(false);
        }
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        if let Err(e) = self.surface.restore(snapshot) {
            log::error!("redo restore failed: {}", e);
            return Err(e.into());
        }
        self.is_dirty = true;
        log::debug!("redo -> {}/{}", self.history.position() + 1, self.history.len());
        Ok(true)
    }

    // ---- surface replacement ------------------------------------------------

    pub fn request_resize(&mut self, width: u32, height: u32) -> Result<Applied, SessionError> {
        canvas::check_dimensions(width, height)?;
        self.replace(Replacement::Resize { width, height })
    }

    /// Resize back to the size the session was created with.
    pub fn request_reset_dimensions(&mut self) -> Result<Applied, SessionError> {
        let (w, h) = self.default_size;
        self.request_resize(w, h)
    }

    pub fn request_clear(&mut self) -> Result<Applied, SessionError> {
        self.replace(Replacement::Clear)
    }

    /// Decode `bytes` and draw the image at the top-left corner of the canvas.
    /// Decoding happens first; on failure nothing is touched.
    pub fn request_import(&mut self, bytes: &[u8]) -> Result<Applied, SessionError> {
        let image = match io::decode_import(bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("import rejected: {}", e);
                return Err(e.into());
            }
        };
        self.replace(Replacement::Import(image))
    }

    fn replace(&mut self, replacement: Replacement) -> Result<Applied, SessionError> {
        if self.tools.stroke_tracker.is_active {
            log::debug!("{} queued behind the active stroke", replacement.describe());
            self.pending.push_back(replacement);
            return Ok(Applied::Queued);
        }
        self.apply(replacement)?;
        Ok(Applied::Now)
    }

    fn apply(&mut self, replacement: Replacement) -> Result<(), SurfaceError> {
        let what = replacement.describe();
        match replacement {
            Replacement::Resize { width, height } => self.surface.resize(width, height)?,
            Replacement::Clear => {
                let bg = self.surface.background();
                self.surface.clear(bg);
            }
            Replacement::Import(image) => self.surface.blit(&image, 0, 0),
        }
        self.history.reset(self.surface.capture());
        self.is_dirty = true;
        log::info!("{}: history reset", what);
        Ok(())
    }

    fn drain_pending(&mut self) {
        while let Some(replacement) = self.pending.pop_front() {
            if let Err(e) = self.apply(replacement) {
                log::error!("queued replacement failed: {}", e);
            }
        }
    }

    // ---- export -------------------------------------------------------------

    /// PNG encoding of the current surface. Does not touch history.
    pub fn export_raster(&self) -> Result<Vec<u8>, SessionError> {
        Ok(io::encode_png(self.surface.as_image())?)
    }

    // ---- pointer dispatch ---------------------------------------------------

    /// Pointer pressed on the canvas: starts a stroke or runs a fill,
    /// depending on the active tool.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<(), SessionError> {
        let props = self.tools.properties;
        match self.tools.active_tool {
            Tool::Brush => self.begin_stroke(x, y, props.color, props.size),
            Tool::Eraser => {
                let bg = self.surface.background();
                self.start_stroke(Tool::Eraser, x, y, bg, props.size);
            }
            Tool::Fill => {
                self.request_fill(x.floor() as i64, y.floor() as i64, props.color)?;
            }
            Tool::None => {}
        }
        Ok(())
    }

    /// Pointer moved: extends the stroke from its last point.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let tracker = &self.tools.stroke_tracker;
        if !tracker.is_active || !self.tools.active_tool.paints() {
            return;
        }
        let Some((px, py)) = tracker.last_point else { return };
        let props = self.tools.properties;
        let color = if self.tools.active_tool == Tool::Eraser {
            self.surface.background()
        } else {
            props.color
        };
        self.extend_stroke(px, py, x, y, color, props.size);
    }

    /// Pointer released anywhere: commits the stroke, if there is one.
    pub fn pointer_up(&mut self) {
        self.end_stroke();
    }
}
