//! Raster painting core: a pixel surface with brush strokes, bucket fill and
//! linear snapshot undo/redo.
//!
//! Embedders drive everything through [`Session`]; the UI layer only
//! translates its events into `Session` calls and reads back
//! [`Session::surface`] and the `can_undo` / `can_redo` predicates.

pub mod canvas;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod session;
pub mod settings;

pub use canvas::{Color, PixelRect, Snapshot, Surface, SurfaceError};
pub use components::history::{HistoryManager, MAX_HISTORY};
pub use components::tools::Tool;
pub use io::{DEFAULT_EXPORT_NAME, RasterError};
pub use ops::flood_fill::{FillOutcome, FillRequest, NoOpReason, flood_fill};
pub use session::{Applied, Session, SessionError};
pub use settings::EditorSettings;
