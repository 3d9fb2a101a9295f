pub mod canvas;
pub mod line;
pub mod palette;
pub mod pie;
pub mod types;

pub use line::{render_line, PLOT_MARGIN};
pub use palette::{color_for, PALETTE};
pub use pie::render_pie;
pub use types::{AxisScale, ChartImage, ChartKind, ChartStyle, LegendEntry, RenderError};
