// Job-description rendering: greedy line-fill over static font metrics,
// written out as a PDF. Rendering is CPU/IO-bound and runs inside
// tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod writer;

pub use font_metrics::{default_page_layout, PageLayout};
pub use writer::render;

/// Fixed file name of the rendered document inside a batch's job-description directory.
pub const JOB_DESCRIPTION_FILE: &str = "job_description.pdf";
