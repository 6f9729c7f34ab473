// Template rendering: turns a CV or a letter into a `RenderedDocument`,
// which the HTML preview and the PDF exporter both consume.

pub mod cv;
pub mod dates;
pub mod document;
pub mod html;
pub mod letter;
pub mod templates;

pub use cv::render_cv;
pub use document::RenderedDocument;
pub use html::to_html;
pub use letter::render_letter;
pub use templates::{catalog, Rgb, TemplateId};
