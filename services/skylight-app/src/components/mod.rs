pub mod boundary;
pub mod last_failure;

pub use boundary::{use_error_handler, with_error_boundary, ErrorHandler, RenderErrorBoundary};
