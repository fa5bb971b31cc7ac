use serde::{Deserialize, Serialize};

use crate::canvas::{Color, PixelRect};

/// Default brush diameter in pixels.
pub const DEFAULT_BRUSH_SIZE: f32 = 9.0;

/// Largest brush diameter accepted from the toolbar slider.
pub const MAX_BRUSH_SIZE: f32 = 49.0;

// ============================================================================
// TOOL SELECTION
// ============================================================================

/// What a pointer press on the canvas does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Brush,
    Fill,
    /// Painting with the background color.
    Eraser,
    /// Pointer input is ignored.
    None,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Fill => "Fill",
            Tool::Eraser => "Eraser",
            Tool::None => "None",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Brush, Tool::Fill, Tool::Eraser, Tool::None]
    }

    /// Whether this tool draws strokes on pointer drag.
    pub fn paints(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser)
    }
}

// ============================================================================
// TOOL PROPERTIES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolProperties {
    /// Brush diameter in pixels.
    pub size: f32,
    /// Brush color; also the fill replacement color.
    pub color: Color,
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self { size: DEFAULT_BRUSH_SIZE, color: Color::BLACK }
    }
}

impl ToolProperties {
    pub fn set_size(&mut self, size: f32) {
        self.size = if size.is_finite() { size.clamp(1.0, MAX_BRUSH_SIZE) } else { DEFAULT_BRUSH_SIZE };
    }
}

// ============================================================================
// STROKE TRACKER
// ============================================================================

/// Summary of a finished stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeEvent {
    pub description: String,
    /// Union of everything painted, `None` if the stroke never touched the
    /// surface.
    pub bounds: Option<PixelRect>,
    pub segments: usize,
}

/// Tracks stroke state between pointer down and pointer up.
#[derive(Default)]
pub struct StrokeTracker {
    pub is_active: bool,
    /// Last point the stroke reached, where the next segment starts.
    pub last_point: Option<(f32, f32)>,
    pub bounds: Option<PixelRect>,
    pub segments: usize,
    /// e.g. "Brush Stroke", "Eraser Stroke"
    pub description: String,
}

impl StrokeTracker {
    pub fn start(&mut self, point: (f32, f32), description: &str) {
        self.is_active = true;
        self.last_point = Some(point);
        self.bounds = None;
        self.segments = 0;
        self.description = description.to_string();
    }

    /// Record a segment ending at `point`.
    pub fn advance(&mut self, point: (f32, f32)) {
        self.last_point = Some(point);
        self.segments += 1;
    }

    pub fn expand_bounds(&mut self, rect: Option<PixelRect>) {
        if let Some(rect) = rect {
            self.bounds = Some(match self.bounds {
                Some(existing) => existing.union(rect),
                None => rect,
            });
        }
    }

    pub fn finish(&mut self) -> Option<StrokeEvent> {
        if !self.is_active {
            return None;
        }
        let event = StrokeEvent {
            description: std::mem::take(&mut self.description),
            bounds: self.bounds,
            segments: self.segments,
        };
        self.cancel();
        Some(event)
    }

    pub fn cancel(&mut self) {
        self.is_active = false;
        self.last_point = None;
        self.bounds = None;
        self.segments = 0;
        self.description.clear();
    }
}

// ============================================================================
// TOOL STATE
// ============================================================================

/// Active tool plus its settings and the in-progress stroke.
#[derive(Default)]
pub struct ToolState {
    pub active_tool: Tool,
    pub properties: ToolProperties,
    pub stroke_tracker: StrokeTracker,
}

impl ToolState {
    pub fn new(properties: ToolProperties) -> Self {
        Self { properties, ..Default::default() }
    }

    /// Toolbar button behaviour: choosing the active tool again deselects it.
    pub fn select(&mut self, tool: Tool) {
        self.active_tool = if self.active_tool == tool { Tool::None } else { tool };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_active_tool_toggles_it_off() {
        let mut t = ToolState::default();
        assert_eq!(t.active_tool, Tool::Brush);
        t.select(Tool::Brush);
        assert_eq!(t.active_tool, Tool::None);
        t.select(Tool::Fill);
        assert_eq!(t.active_tool, Tool::Fill);
        t.select(Tool::Eraser);
        assert_eq!(t.active_tool, Tool::Eraser);
        t.select(Tool::None);
        assert_eq!(t.active_tool, Tool::None);
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut p = ToolProperties::default();
        assert_eq!(p.size, 9.0);
        p.set_size(0.0);
        assert_eq!(p.size, 1.0);
        p.set_size(500.0);
        assert_eq!(p.size, MAX_BRUSH_SIZE);
        p.set_size(f32::NAN);
        assert_eq!(p.size, DEFAULT_BRUSH_SIZE);
    }

    #[test]
    fn tool_state_serializes_for_embedders() {
        let props = ToolProperties { size: 12.0, color: Color::rgb(0, 0x80, 0xff) };
        let json = serde_json::to_string(&(Tool::Eraser, props)).unwrap();
        assert_eq!(json, r##"["Eraser",{"size":12.0,"color":"#0080ff"}]"##);
        let back: (Tool, ToolProperties) = serde_json::from_str(&json).unwrap();
        assert_eq!(back, (Tool::Eraser, props));
    }

    #[test]
    fn tracker_accumulates_until_finish() {
        let mut st = StrokeTracker::default();
        assert_eq!(st.finish(), None);

        st.start((1.0, 1.0), "Brush Stroke");
        st.expand_bounds(Some(PixelRect::point(1, 1)));
        st.advance((4.0, 2.0));
        st.expand_bounds(None);
        st.expand_bounds(Some(PixelRect::point(4, 2)));

        let ev = st.finish().unwrap();
        assert_eq!(ev.description, "Brush Stroke");
        assert_eq!(ev.segments, 1);
        assert_eq!(ev.bounds, Some(PixelRect { min_x: 1, min_y: 1, max_x: 4, max_y: 2 }));
        assert!(!st.is_active);
        assert_eq!(st.finish(), None);
    }
}
