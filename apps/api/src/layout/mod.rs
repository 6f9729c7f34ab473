// Page layout: font metrics and the flow that places rendered documents on
// an A4-wide canvas. Pure and CPU-bound; callers run it on the blocking pool.

pub mod flow;
pub mod font_metrics;

pub use flow::{layout_document, Scene, Shape, TextRun};
pub use font_metrics::{FontFamily, FontWeight};
