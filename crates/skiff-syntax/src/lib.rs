//! # skiff-syntax — Syntax classification for skiff
//!
//! This crate answers one question for the rest of the editor: what class
//! is each rendered byte of a row? It provides:
//!
//! - **[`highlight`]** — the [`Highlight`](highlight::Highlight) class per
//!   rendered byte and the per-row [`scan`](highlight::scan) that assigns it
//! - **[`profile`]** — file-type [`Syntax`](profile::Syntax) profiles, the
//!   static registry, and filename matching
//!
//! Classification is a stateless per-row re-scan: no highlight state crosses
//! a row boundary, so a string literal spanning multiple lines is classified
//! wrong past its first row. That trade-off keeps every edit O(one row) and
//! the scanner trivially restartable.

pub mod highlight;
pub mod profile;

pub use highlight::{scan, Highlight};
pub use profile::{select, Syntax, SyntaxFlags, SYNTAXES};
