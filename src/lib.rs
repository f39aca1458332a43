//! # imgtool
//!
//! A toolbox of independent image utilities: batch watermarking,
//! compression, cropping, resizing, rotation and screenshots.
//!
//! Every tool is the same shape: open a file, change a pixel buffer, save a
//! file. There is no shared pipeline between tools and no state kept between
//! runs beyond an optional preferences file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel work: watermark compositing, encode quality, crop/resize/rotate |
//! | [`batch`] | Watermarks a whole folder on a worker thread, reporting progress |
//! | [`selection`] | Pointer-driven rectangle selection and coordinate transforms |
//! | [`screenshot`] | Full-screen and region capture behind a grabber trait |
//! | [`config`] | TOML preferences, merged over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Trait
//!
//! Tools describe *what* to do with parameter structs and hand them to an
//! [`imaging::ImageBackend`]. The production backend is pure Rust on top of
//! the `image` crate; tests swap in a recording mock so tool logic can be
//! checked without decoding a single pixel.
//!
//! ## One Worker Thread
//!
//! Only the batch watermark runs off the calling thread. It processes files
//! sequentially and reports a percentage after each one over an `mpsc`
//! channel. There is no cancellation: a batch runs until it finishes or the
//! first image fails.
//!
//! ## Platform Capture Is External
//!
//! Screen grabbing is delegated to a configurable external command
//! (`grim`, `scrot`, `screencapture`, ...). The interesting part, mapping a
//! logical selection onto a HiDPI frame, lives in [`selection`] and is
//! platform-independent.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod screenshot;
pub mod selection;

#[cfg(test)]
pub(crate) mod test_helpers;
