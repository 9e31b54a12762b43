//! Vim key sequences injected by the translator
//!
//! The editor normally sits in insert mode. While a selection is open it is
//! in charwise visual mode with `selection=exclusive`, and the search and
//! line-jump prompts are ordinary command-line mode.

/// Leave insert mode, visual mode or a prompt
pub const ESCAPE: &[u8] = b"\x1b";

/// Enter insert mode before the cursor
pub const INSERT: &[u8] = b"i";

/// Start a charwise visual selection
pub const VISUAL: &[u8] = b"v";

/// Jump back to where insert mode was last left
pub const INSERT_POINT: &[u8] = b"`^";

/// Move one column right (relies on `virtualedit=onemore` at line end)
pub const NUDGE_RIGHT: &[u8] = b"l";

/// Delete the selection without touching any register
pub const DELETE_SELECTION: &[u8] = b"\"_d";

/// Yank the selection and select it again
pub const YANK: &[u8] = b"ygv";

/// Delete the selection into the unnamed register
pub const CUT: &[u8] = b"d";

/// Put the unnamed register before the cursor
pub const PUT: &[u8] = b"P";

/// Select the previous selection again
pub const RESELECT: &[u8] = b"gv";

/// Select the whole buffer
pub const SELECT_ALL: &[u8] = b"ggvG$";

/// Select the next search match, or extend the selection to it
pub const SELECT_MATCH: &[u8] = b"gn";

/// Open the search prompt
pub const SEARCH_PROMPT: &[u8] = b"/";

/// Open the command prompt for a line number
pub const LINE_PROMPT: &[u8] = b":";

/// Accept the current prompt
pub const CONFIRM: &[u8] = b"\r";

pub const SAVE: &[u8] = b":w\r";

pub const QUIT: &[u8] = b":q\r";

pub const UNDO: &[u8] = b"u";

pub const LINE_START: &[u8] = b"0";

pub const BUFFER_START: &[u8] = b"gg0";

/// Ctrl-R followed by a register name inserts it into a prompt
pub const INSERT_REGISTER: &[u8] = b"\x12";

/// The unnamed register, filled by both yank and cut
pub const UNNAMED_REGISTER: &[u8] = b"\"";
