//! Content processing: HTML cleaning, Markdown conversion, text extraction,
//! and the pipeline that sequences them with per-stage timing and isolated
//! failure (spec §4.5–§4.8).

pub mod html;
pub mod markdown;
pub mod pipeline;
pub mod text;

pub use html::HtmlProcessorConfig;
pub use pipeline::{run, PipelineConfig, PipelineStats};
pub use text::TextProcessorConfig;
