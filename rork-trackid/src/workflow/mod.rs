//! Pipeline wiring
//!
//! [`ImportSession`] runs the full pipeline for one set recording:
//! 1. Extract and deduplicate mentions from the description and comments
//! 2. Resolve each mention against the canonical store
//! 3. Return a new setlist, or fold the result into an existing one

pub mod import_session;

pub use import_session::ImportSession;
