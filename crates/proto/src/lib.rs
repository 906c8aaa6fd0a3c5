//! Shared wire types for watchreg IPC.
//!
//! This crate defines the messages exchanged between clients and the watchreg daemon
//! over Unix domain sockets. Frames are length-prefixed postcard.

#![warn(missing_docs)]

pub mod frame;
pub mod paths;
pub mod types;

pub use frame::{DEFAULT_MAX_FRAME, FrameError, read_frame, write_frame};
pub use types::*;
