//! Session state shared between the restore and save phases

pub mod state;

pub use state::{SessionKey, SessionRecorder, SessionSetup, SessionState};
