//! Pipeline stages of a single conversion.
//!
//! Each submodule implements exactly one step and knows nothing about the
//! workflow state around it, so each can be tested alone.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ transfer ──▶ artifact
//! (validate)  (multipart)  (derive name, save)
//! ```
//!
//! 1. [`input`]    - candidate files and the acceptance rules
//! 2. [`transfer`] - the request/response contract with the conversion
//!    service; the only stage with network I/O
//! 3. [`artifact`] - wrap the returned bytes and save them under the
//!    derived name through a staged temp file

pub mod artifact;
pub mod input;
pub mod transfer;
