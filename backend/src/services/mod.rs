//! Row-list ownership and batch submission

pub mod session;
pub mod submission;

pub use session::EntrySession;
pub use submission::{BatchOutcome, SubmissionPipeline};
