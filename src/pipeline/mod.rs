//! Pipeline stages for a ConvertHub conversion.
//!
//! Each submodule implements one step. Only [`poll`] and [`download`] do
//! network I/O of their own; the rest are pure and unit-tested in place.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ submit ──▶ poll ──▶ download
//! (base64)   (body,     (status   (filename,
//!             job id)    loop)     bytes)
//! ```
//!
//! 1. [`encode`]  : base64-wrap uploaded bytes
//! 2. [`submit`]  : build request bodies, derive output filenames, accept the job id
//! 3. [`poll`]    : bounded status loop until completion, failure, or timeout
//! 4. [`download`]: resolve the output filename and fetch the converted file
//!
//! [`classify`] turns any API error body into a message; every stage that
//! reads a response body goes through it.

pub mod classify;
pub mod download;
pub mod encode;
pub mod poll;
pub mod submit;
