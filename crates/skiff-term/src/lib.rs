// SPDX-License-Identifier: MIT
//
// skiff-term — Terminal layer for skiff.
//
// Raw-mode control with guaranteed restoration, a byte-stream key decoder,
// terminal geometry queries, and buffered one-write frame output.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. The editor emits a handful of sequences and
// consumes a handful more; owning that protocol end-to-end is simpler
// than adapting an abstraction layer to it.

pub mod ansi;
pub mod input;
pub mod output;
pub mod terminal;
