//! # skiff-core — Editor core for skiff
//!
//! The fundamental building blocks of the editor, independent of any
//! terminal concern:
//!
//! - **[`row`]** — `Row`: raw bytes, tab-expanded render, per-byte highlight
//! - **[`document`]** — `Document`: the ordered row buffer, edit primitives,
//!   load/save, dirty tracking, syntax selection
//! - **[`search`]** — `Search`: incremental substring search with match
//!   overlay and restore
//!
//! Everything here is byte-oriented: columns are byte offsets, not
//! character or display widths. The terminal layer and the controller
//! live elsewhere and drive these types.

pub mod document;
pub mod row;
pub mod search;

pub use document::Document;
pub use row::{Row, TAB_STOP};
pub use search::{Direction as SearchDirection, Hit, Search, Step as SearchStep};
