// SPDX-License-Identifier: MIT
//
// skiff — a small terminal text editor.
//
// This is the main binary that wires together all the crates:
//
//   skiff-term   → raw mode, key decoding, ANSI output, frame buffering
//   skiff-core   → document rows, edit primitives, incremental search
//   skiff-syntax → per-row highlight classification, file-type profiles
//
// The Editor struct owns all editor state — cursor, scroll offsets,
// document, status message, quit countdown — and the loop in `run` drives
// it: read one key, dispatch it, redraw the whole frame. Each keypress
// flows through:
//
//   stdin → read_key → process_key → document/search mutation
//   render → OutputBuffer → one write to the terminal
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text rows                    │  ← rows - 2 (`~` past document end)
//   ├──────────────────────────────┤
//   │ status bar (inverse)         │  ← 1 row
//   ├──────────────────────────────┤
//   │ message bar                  │  ← 1 row
//   └──────────────────────────────┘

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use skiff_core::{Document, Row, Search, SearchDirection, SearchStep};
use skiff_syntax::{Highlight, Syntax};
use skiff_term::ansi;
use skiff_term::input::{self, Direction, Key};
use skiff_term::output::OutputBuffer;
use skiff_term::terminal::{self, RawMode, Size};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// ─── Tunables ───────────────────────────────────────────────────────────────

/// Ctrl-Q presses required to discard unsaved changes.
const QUIT_CONFIRMATIONS: u32 = 3;

/// How long a status message stays visible.
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Editor State ───────────────────────────────────────────────────────────

/// What the dispatcher tells the main loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A status message with its birth time (for the display window).
struct StatusMessage {
    text: String,
    set_at: Instant,
}

/// All editor state, owned in one place and passed explicitly — there are
/// no globals anywhere in skiff.
struct Editor {
    doc: Document,
    /// Cursor column — byte offset into the current row's `chars`.
    cx: usize,
    /// Cursor row — `doc.row_count()` means "past the last row".
    cy: usize,
    /// Derived render column (tab-aware). Recomputed by `scroll`.
    rx: usize,
    /// First visible row.
    row_offset: usize,
    /// First visible render column.
    col_offset: usize,
    /// Visible text rows (terminal height minus status + message bars).
    text_rows: usize,
    screen_cols: usize,
    message: Option<StatusMessage>,
    quit_times: u32,
}

impl Editor {
    fn new(size: Size, doc: Document) -> Self {
        Self {
            doc,
            cx: 0,
            cy: 0,
            rx: 0,
            row_offset: 0,
            col_offset: 0,
            text_rows: usize::from(size.rows).saturating_sub(2),
            screen_cols: usize::from(size.cols),
            message: None,
            quit_times: QUIT_CONFIRMATIONS,
        }
    }

    fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            set_at: Instant::now(),
        });
    }

    // ── Cursor movement ─────────────────────────────────────────────

    fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Up => {
                if self.cy > 0 {
                    self.cy -= 1;
                }
            }
            Direction::Down => {
                if self.cy < self.doc.row_count() {
                    self.cy += 1;
                }
            }
            Direction::Left => {
                if self.cx > 0 {
                    self.cx -= 1;
                } else if self.cy > 0 {
                    // Wrap to the end of the previous row.
                    self.cy -= 1;
                    self.cx = self.doc.row(self.cy).map_or(0, Row::len);
                }
            }
            Direction::Right => {
                if let Some(row) = self.doc.row(self.cy) {
                    if self.cx < row.len() {
                        self.cx += 1;
                    } else {
                        // Wrap to the start of the next row.
                        self.cy += 1;
                        self.cx = 0;
                    }
                }
            }
        }

        // The target row may be shorter than where the cursor came from.
        let len = self.doc.row(self.cy).map_or(0, Row::len);
        self.cx = self.cx.min(len);
    }

    fn page(&mut self, direction: Direction) {
        // Jump the cursor to the viewport edge, then move a whole screen.
        self.cy = match direction {
            Direction::Up => self.row_offset,
            _ => (self.row_offset + self.text_rows.saturating_sub(1)).min(self.doc.row_count()),
        };
        for _ in 0..self.text_rows {
            self.move_cursor(direction);
        }
    }

    fn jump_to_line_end(&mut self) {
        if let Some(row) = self.doc.row(self.cy) {
            self.cx = row.len();
        }
    }

    // ── Editing ─────────────────────────────────────────────────────

    fn insert_char(&mut self, byte: u8) {
        self.doc.insert_char(self.cy, self.cx, byte);
        self.cx += 1;
    }

    fn insert_newline(&mut self) {
        (self.cy, self.cx) = self.doc.insert_newline(self.cy, self.cx);
    }

    fn backspace(&mut self) {
        if let Some((y, x)) = self.doc.delete_char(self.cy, self.cx) {
            self.cy = y;
            self.cx = x;
        }
    }

    fn delete_forward(&mut self) {
        // Delete is backspace shifted one cell right.
        self.move_cursor(Direction::Right);
        self.backspace();
    }

    // ── Viewport ────────────────────────────────────────────────────

    /// Re-derive `rx` and pull the scroll offsets until the cursor is
    /// inside the visible window. Runs before every frame.
    fn scroll(&mut self) {
        self.rx = self.doc.row(self.cy).map_or(0, |row| row.cx_to_rx(self.cx));

        if self.cy < self.row_offset {
            self.row_offset = self.cy;
        }
        if self.cy >= self.row_offset + self.text_rows {
            self.row_offset = self.cy + 1 - self.text_rows;
        }
        if self.rx < self.col_offset {
            self.col_offset = self.rx;
        }
        if self.rx >= self.col_offset + self.screen_cols {
            self.col_offset = self.rx + 1 - self.screen_cols;
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Build one complete frame. Nothing is written to the terminal here;
    /// `refresh` sends the buffer in a single write.
    fn render(&mut self, out: &mut OutputBuffer) -> io::Result<()> {
        out.clear();
        self.scroll();

        ansi::cursor_hide(out)?;
        ansi::cursor_home(out)?;
        self.draw_rows(out)?;
        self.draw_status_bar(out)?;
        self.draw_message_bar(out)?;

        let x = u16::try_from(self.rx - self.col_offset).unwrap_or(u16::MAX);
        let y = u16::try_from(self.cy - self.row_offset).unwrap_or(u16::MAX);
        ansi::cursor_to(out, x, y)?;
        ansi::cursor_show(out)
    }

    fn refresh(&mut self, out: &mut OutputBuffer) -> io::Result<()> {
        self.render(out)?;
        out.flush_stdout()
    }

    fn draw_rows(&self, out: &mut OutputBuffer) -> io::Result<()> {
        for y in 0..self.text_rows {
            let file_row = y + self.row_offset;
            if let Some(row) = self.doc.row(file_row) {
                self.draw_row(row, out)?;
            } else if self.doc.row_count() == 0 && y == self.text_rows / 3 {
                self.draw_welcome(out)?;
            } else {
                out.write_all(b"~")?;
            }
            ansi::clear_line(out)?;
            out.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Emit the visible slice of one row, switching the foreground color
    /// only when the highlight class changes between adjacent bytes.
    fn draw_row(&self, row: &Row, out: &mut OutputBuffer) -> io::Result<()> {
        let render = row.render();
        let highlight = row.highlight();
        let start = self.col_offset.min(render.len());
        let end = (self.col_offset + self.screen_cols).min(render.len());

        let mut current: Option<u8> = None;
        for (&byte, &class) in render[start..end].iter().zip(&highlight[start..end]) {
            if class == Highlight::Normal {
                if current.is_some() {
                    ansi::fg_default(out)?;
                    current = None;
                }
            } else {
                let color = class.color();
                if current != Some(color) {
                    ansi::fg_color(out, color)?;
                    current = Some(color);
                }
            }
            out.write_all(&[byte])?;
        }
        ansi::fg_default(out)
    }

    fn draw_welcome(&self, out: &mut OutputBuffer) -> io::Result<()> {
        let welcome = format!("Skiff editor -- version {VERSION}");
        let text = &welcome.as_bytes()[..welcome.len().min(self.screen_cols)];
        let mut padding = (self.screen_cols - text.len()) / 2;
        if padding > 0 {
            out.write_all(b"~")?;
            padding -= 1;
        }
        for _ in 0..padding {
            out.write_all(b" ")?;
        }
        out.write_all(text)
    }

    fn draw_status_bar(&self, out: &mut OutputBuffer) -> io::Result<()> {
        ansi::status_attributes(out)?;

        let name = self
            .doc
            .filename()
            .map_or_else(|| "[No Name]".to_string(), |path| path.display().to_string());
        let modified = if self.doc.is_dirty() { " (modified)" } else { "" };
        let left = format!("{name:.20} - {} lines{modified}", self.doc.row_count());
        let file_type = self.doc.syntax().map_or("no ft", Syntax::name);
        let right = format!("{file_type} | {}:{}", self.cy + 1, self.cx + 1);

        let left = &left.as_bytes()[..left.len().min(self.screen_cols)];
        out.write_all(left)?;

        let mut len = left.len();
        while len < self.screen_cols {
            if self.screen_cols - len == right.len() {
                out.write_all(right.as_bytes())?;
                break;
            }
            out.write_all(b" ")?;
            len += 1;
        }

        ansi::sgr_reset(out)?;
        out.write_all(b"\r\n")
    }

    fn draw_message_bar(&self, out: &mut OutputBuffer) -> io::Result<()> {
        ansi::clear_line(out)?;
        if let Some(message) = &self.message {
            if message.set_at.elapsed() < MESSAGE_TIMEOUT {
                let text = message.text.as_bytes();
                out.write_all(&text[..text.len().min(self.screen_cols)])?;
            }
        }
        Ok(())
    }

    // ── Prompt ──────────────────────────────────────────────────────

    /// Collect a line of input on the message bar.
    ///
    /// The handler observes every keystroke together with the query so
    /// far — that's the hook incremental search hangs off. Enter with a
    /// non-empty query confirms; Escape cancels and returns `None`.
    fn prompt(
        &mut self,
        out: &mut OutputBuffer,
        label: &str,
        handler: &mut dyn PromptHandler,
    ) -> io::Result<Option<String>> {
        let mut query = String::new();
        loop {
            self.set_message(format!("{label}{query}"));
            self.refresh(out)?;

            let key = input::read_key()?;
            match key {
                Key::Backspace | Key::Ctrl(b'h') | Key::Delete => {
                    query.pop();
                }
                Key::Escape => {
                    self.set_message("");
                    handler.on_key(self, &query, key);
                    return Ok(None);
                }
                Key::Enter if !query.is_empty() => {
                    self.set_message("");
                    handler.on_key(self, &query, key);
                    return Ok(Some(query));
                }
                Key::Char(byte) if byte.is_ascii() && !byte.is_ascii_control() => {
                    query.push(char::from(byte));
                }
                _ => {}
            }
            handler.on_key(self, &query, key);
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    fn save(&mut self, out: &mut OutputBuffer) -> io::Result<()> {
        if self.doc.filename().is_none() {
            match self.prompt(out, "Save as: ", &mut SaveAsPrompt)? {
                Some(name) => self.doc.set_filename(PathBuf::from(name)),
                None => {
                    self.set_message("Save aborted");
                    return Ok(());
                }
            }
        }

        if self.doc.row_count() == 0 {
            self.set_message("Empty content");
            return Ok(());
        }

        match self.doc.save() {
            Ok(bytes) => {
                info!(bytes, "saved");
                self.set_message(format!("{bytes} bytes written to disk"));
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.set_message(format!("Can't save! I/O error: {err}"));
            }
        }
        Ok(())
    }

    fn find(&mut self, out: &mut OutputBuffer) -> io::Result<()> {
        let saved = (self.cx, self.cy, self.col_offset, self.row_offset);

        let mut handler = SearchPrompt {
            search: Search::new(),
        };
        let confirmed = self
            .prompt(out, "Search (ESC/arrows/Enter): ", &mut handler)?
            .is_some();

        if !confirmed {
            // Cancelled: put the cursor and viewport back where they were.
            (self.cx, self.cy, self.col_offset, self.row_offset) = saved;
        }
        Ok(())
    }

    // ── Dispatch ────────────────────────────────────────────────────

    fn process_key(&mut self, out: &mut OutputBuffer, key: Key) -> io::Result<Flow> {
        match key {
            Key::Enter => self.insert_newline(),
            Key::Ctrl(b'q') => {
                if self.doc.is_dirty() && self.quit_times > 0 {
                    self.set_message(format!(
                        "WARNING!!! File has unsaved changes. \
                         Press Ctrl-Q {} more times to quit.",
                        self.quit_times
                    ));
                    self.quit_times -= 1;
                    return Ok(Flow::Continue);
                }
                return Ok(Flow::Quit);
            }
            Key::Ctrl(b's') => self.save(out)?,
            Key::Ctrl(b'f') => self.find(out)?,
            Key::Arrow(direction) => self.move_cursor(direction),
            Key::Backspace | Key::Ctrl(b'h') => self.backspace(),
            Key::Delete => self.delete_forward(),
            Key::Home => self.cx = 0,
            Key::End => self.jump_to_line_end(),
            Key::PageUp => self.page(Direction::Up),
            Key::PageDown => self.page(Direction::Down),
            // Ctrl-L traditionally forces a redraw — every key does here.
            Key::Ctrl(b'l') | Key::Escape => {}
            Key::Char(byte) => self.insert_char(byte),
            Key::Ctrl(_) => {}
        }

        // Anything but Ctrl-Q rewinds the quit countdown.
        self.quit_times = QUIT_CONFIRMATIONS;
        Ok(Flow::Continue)
    }
}

// ─── Prompts ────────────────────────────────────────────────────────────────

/// Per-keystroke observer for [`Editor::prompt`].
///
/// One implementation per prompt use site: search reacts to every key,
/// save-as only cares about the final string.
trait PromptHandler {
    fn on_key(&mut self, editor: &mut Editor, query: &str, key: Key);
}

/// Save-as prompt: the returned string is all that matters.
struct SaveAsPrompt;

impl PromptHandler for SaveAsPrompt {
    fn on_key(&mut self, _editor: &mut Editor, _query: &str, _key: Key) {}
}

/// Incremental search prompt: every keystroke re-runs the search.
struct SearchPrompt {
    search: Search,
}

impl PromptHandler for SearchPrompt {
    fn on_key(&mut self, editor: &mut Editor, query: &str, key: Key) {
        let step = match key {
            Key::Enter | Key::Escape => {
                // Session over — drop the overlay and reset the anchor.
                self.search.finish(&mut editor.doc);
                return;
            }
            Key::Arrow(Direction::Right | Direction::Down) => {
                SearchStep::Move(SearchDirection::Forward)
            }
            Key::Arrow(Direction::Left | Direction::Up) => {
                SearchStep::Move(SearchDirection::Backward)
            }
            _ => SearchStep::Restart,
        };

        if let Some(hit) = self.search.step(&mut editor.doc, query.as_bytes(), step) {
            editor.cy = hit.y;
            editor.cx = hit.cx;
            // Park the offset past the end so the scroll step lands the
            // matched row at the top of the viewport.
            editor.row_offset = editor.doc.row_count();
        }
    }
}

// ─── Entry Point ────────────────────────────────────────────────────────────

/// Leveled diagnostics to `skiff.log`, gated on `SKIFF_LOG`.
///
/// A raw-mode TUI owns the terminal, so logs go to a file instead of
/// stderr. Without the environment variable nothing is initialized and
/// the tracing macros are no-ops.
fn init_logging() {
    if env::var_os("SKIFF_LOG").is_none() {
        return;
    }
    let filter = EnvFilter::try_from_env("SKIFF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = tracing_appender::rolling::never(".", "skiff.log");
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .init();
}

fn run(path: Option<PathBuf>) -> io::Result<()> {
    let mut raw = RawMode::enable()?;
    // Raw mode must be active before the size query: the ioctl fallback
    // reads the terminal's cursor report byte-by-byte with a timeout.
    let size = terminal::window_size()?;

    let doc = match path {
        Some(ref path) => {
            info!(path = %path.display(), "opening");
            Document::open(path)?
        }
        None => Document::new(),
    };

    let mut editor = Editor::new(size, doc);
    editor.set_message("HELP: Ctrl-S = save | Ctrl-Q = quit | Ctrl-F = find");

    let mut out = OutputBuffer::new();
    loop {
        editor.refresh(&mut out)?;
        let key = input::read_key()?;
        debug!(?key, "key");
        if editor.process_key(&mut out, key)? == Flow::Quit {
            break;
        }
    }

    // Leave a clean screen behind.
    let mut stdout = io::stdout().lock();
    ansi::clear_screen(&mut stdout)?;
    ansi::cursor_home(&mut stdout)?;
    stdout.flush()?;
    drop(stdout);

    raw.restore()
}

fn main() {
    let mut args = env::args_os().skip(1);
    let path = args.next().map(PathBuf::from);
    if args.next().is_some() {
        eprintln!("usage: skiff [file]");
        process::exit(2);
    }

    init_logging();

    if let Err(err) = run(path) {
        // Fatal class: clear the screen so the error is readable, then
        // report the underlying OS error and exit non-zero. RawMode has
        // already restored the terminal on the way out of `run`.
        let mut stdout = io::stdout().lock();
        let _ = ansi::clear_screen(&mut stdout);
        let _ = ansi::cursor_home(&mut stdout);
        let _ = stdout.flush();
        drop(stdout);

        eprintln!("skiff: {err}");
        process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
