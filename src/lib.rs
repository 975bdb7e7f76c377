//! # batchfit
//!
//! Batch image resizing with focal-point cover cropping. Load a set of
//! images, give each a target size, fit mode, focal point, optional crop and
//! quality, preview them all on one contact sheet, then encode the batch to
//! WebP, JPEG, PNG or AVIF.
//!
//! # Architecture
//!
//! ```text
//!  load ──► session ──► Editor ──► batch ──► export
//!                         │
//!                         ├──► layout ──► preview (contact sheet)
//!                         └──► optimize (quality for a size budget)
//! ```
//!
//! All geometry lives in [`imaging::fit_rect`] and [`layout::compute_layout`],
//! pure functions of sizes and settings. The sheet preview and the
//! full-resolution export both draw through [`imaging::render_fit`], so what
//! the sheet shows is what gets exported.
//!
//! Every user-facing change goes through [`editor::Editor::apply`] as an
//! [`editor::Edit`]. Whether an edit lands on the selected item or on the
//! batch-wide defaults is decided in that one place, by the explicit
//! [`editor::EditMode`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit geometry, parameter types, decode/encode backend, fit rendering |
//! | [`layout`] | Grid placement for the contact sheet, canvas clamping, hit-testing |
//! | [`queue`] | Per-image state and the ordered queue with its selection |
//! | [`editor`] | The reducer applying control changes to item or global defaults |
//! | [`optimize`] | Bounded binary search for a quality that meets a byte budget |
//! | [`batch`] | Sequential encode of the queue with progress events and cancellation |
//! | [`export`] | Writing results and `manifest.json` to an output directory |
//! | [`naming`] | Display names and export filenames |
//! | [`preview`] | Contact sheet and single-item preview rendering, redraw coalescing |
//! | [`load`] | Input discovery and parallel decoding |
//! | [`session`] | Replays config and per-item overrides onto a fresh editor |
//! | [`config`] | `batchfit.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |

pub mod batch;
pub mod config;
pub mod editor;
pub mod export;
pub mod imaging;
pub mod layout;
pub mod load;
pub mod naming;
pub mod optimize;
pub mod output;
pub mod preview;
pub mod queue;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
