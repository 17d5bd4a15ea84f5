// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode and geometry.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// `RawMode` owns the terminal's raw state: it saves the original termios,
// disables canonical mode / echo / signal keys / flow control / CR→NL
// translation, and arms the VMIN=0/VTIME=1 timeout-read mode the key
// decoder relies on. Restoration is guaranteed on every exit path — the
// `Drop` impl covers normal and error returns, and a panic hook re-applies
// the saved attributes from a global backup before the panic message
// prints, so the error lands on a working terminal.
//
// Geometry comes from `ioctl(TIOCGWINSZ)` when the terminal cooperates.
// When it doesn't (some serial consoles, odd PTY setups), the fallback
// pushes the cursor to the bottom-right corner and parses the terminal's
// cursor-position report off stdin.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::input::read_byte;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Query the terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// reported size is zero.
#[cfg(unix)]
fn ioctl_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
fn ioctl_size() -> Option<Size> {
    None
}

/// The terminal size, by ioctl or by cursor-report probe.
///
/// Prefers `ioctl(TIOCGWINSZ)`. If that fails or reports zero, falls back
/// to moving the cursor to the bottom-right corner and asking the terminal
/// where the cursor ended up. Requires raw mode for the fallback (the
/// report must be readable byte-by-byte with a timeout).
///
/// # Errors
///
/// Returns an error when both mechanisms fail — fatal for the editor.
pub fn window_size() -> io::Result<Size> {
    if let Some(size) = ioctl_size() {
        return Ok(size);
    }
    cursor_report_size()
}

/// Fallback geometry: bottom-right probe + cursor-position report.
fn cursor_report_size() -> io::Result<Size> {
    let mut stdout = io::stdout().lock();
    ansi::cursor_to_bottom_right(&mut stdout)?;
    ansi::query_cursor_position(&mut stdout)?;
    stdout.flush()?;
    drop(stdout);

    // Collect the report up to its `R` terminator. A timeout mid-report
    // ends collection; the parser decides whether what arrived is usable.
    let mut report = Vec::with_capacity(16);
    while report.len() < 32 {
        match read_byte()? {
            Some(b'R') | None => break,
            Some(byte) => report.push(byte),
        }
    }

    parse_cursor_report(&report).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal did not answer the cursor position query",
        )
    })
}

/// Parse `ESC [ rows ; cols` (the report minus its `R` terminator).
fn parse_cursor_report(report: &[u8]) -> Option<Size> {
    let rest = report.strip_prefix(b"\x1b[")?;
    let semicolon = rest.iter().position(|&b| b == b';')?;
    let rows = parse_decimal(&rest[..semicolon])?;
    let cols = parse_decimal(&rest[semicolon + 1..])?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(Size { cols, rows })
}

/// Parse a non-empty ASCII decimal field.
fn parse_decimal(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u16 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u16::from(byte - b'0'))?;
    }
    Some(value)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore cooked mode without the guard.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Minimal screen restore for emergency use: reset SGR attributes and
/// show the cursor. The screen contents are left alone so the panic
/// message remains readable.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock if the panic happened mid-frame), restores
/// termios, then delegates to the original panic handler.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode guard with RAII cleanup.
///
/// [`enable`](Self::enable) saves the current termios and switches the
/// terminal to raw mode; the original attributes are re-applied when the
/// guard is dropped — or by the panic hook if the process dies mid-frame.
/// When stdin is not a TTY (tests, pipes), enabling is a no-op.
pub struct RawMode {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original: Option<libc::termios>,
}

impl RawMode {
    /// Enter raw mode.
    ///
    /// Disables canonical input, echo, signal-generating keys, IEXTEN,
    /// input flow control (IXON), CR→NL translation (ICRNL), break/parity
    /// processing, and output post-processing; forces 8-bit characters;
    /// sets `VMIN = 0`, `VTIME = 1` so every read returns within 100 ms.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be read or
    /// applied — fatal for the editor.
    #[cfg(unix)]
    pub fn enable() -> io::Result<Self> {
        install_panic_hook();

        if !is_tty() {
            return Ok(Self { original: None });
        }

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            let original = termios;

            // Also save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }

            termios.c_iflag &=
                !(libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);

            // VMIN=0, VTIME=1: read() returns after at most a tenth of a
            // second, with or without data. The key decoder's escape
            // lookahead and the editor's quit path both depend on this.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                original: Some(original),
            })
        }
    }

    #[cfg(not(unix))]
    pub fn enable() -> io::Result<Self> {
        install_panic_hook();
        Ok(Self {})
    }

    /// Restore the original terminal attributes.
    ///
    /// Idempotent: restoring twice (or after a no-op enable) does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved attributes cannot be re-applied.
    #[cfg(unix)]
    pub fn restore(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
