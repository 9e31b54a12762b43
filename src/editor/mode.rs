//! Editor Mode State Machine
//!
//! Tracks what the editor is doing on behalf of the user (an open selection,
//! an open search or line-jump prompt) and decides, for every decoded key,
//! which vim commands to inject and whether the original bytes still go
//! through.
//!
//! Dispatch happens in two steps: [`classify`] maps `(key, shift, ctrl)` to a
//! [`Handler`], then the handler runs against the current [`ModeState`].
//! Compound gestures (Shift+Home) call the primitive handlers directly.

use tracing::{debug, warn};

use super::commands as cmd;
use super::cursor::CursorProbe;
use super::directive::Directive;
use crate::input::{Key, Keystroke};

/// Persistent editor mode flags for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeState {
    selecting: bool,
    searching: bool,
    jumping: bool,
    full_line_selection: bool,
}

impl ModeState {
    /// A fresh session: insert mode, nothing open
    pub fn new() -> Self {
        Self::default()
    }

    /// A visual selection is open in the editor
    pub fn selecting(&self) -> bool {
        self.selecting
    }

    /// The search prompt is open and waits for Enter
    pub fn searching(&self) -> bool {
        self.searching
    }

    /// The line-jump prompt is open and waits for Enter
    pub fn jumping(&self) -> bool {
        self.jumping
    }

    /// The last copy or cut captured whole lines
    pub fn full_line_selection(&self) -> bool {
        self.full_line_selection
    }

    /// Whether a prompt is waiting for confirmation
    fn prompting(&self) -> bool {
        self.searching || self.jumping
    }

    fn close_prompts(&mut self) {
        self.searching = false;
        self.jumping = false;
    }
}

/// Cursor motion keys that extend a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
    End,
    PageUp,
    PageDown,
}

impl Motion {
    fn of(key: Key) -> Option<Self> {
        match key {
            Key::Up => Some(Self::Up),
            Key::Down => Some(Self::Down),
            Key::Left => Some(Self::Left),
            Key::Right => Some(Self::Right),
            Key::End => Some(Self::End),
            Key::PageUp => Some(Self::PageUp),
            Key::PageDown => Some(Self::PageDown),
            _ => None,
        }
    }

    /// Moves towards the end of the buffer
    fn is_forward(self) -> bool {
        matches!(self, Self::Down | Self::Right | Self::End | Self::PageDown)
    }

    /// Plain motion in visual mode
    fn step(self) -> &'static [u8] {
        match self {
            Self::Up => b"k",
            Self::Down => b"j",
            Self::Left => b"h",
            Self::Right => b"l",
            Self::End => b"$",
            Self::PageUp => b"\x02",
            Self::PageDown => b"\x06",
        }
    }

    /// Word or paragraph granularity, used with Ctrl held
    fn leap(self) -> &'static [u8] {
        match self {
            Self::Up => b"{",
            Self::Down => b"}",
            Self::Left => b"b",
            Self::Right => b"w",
            Self::End => b"G$",
            Self::PageUp => b"gg",
            Self::PageDown => b"G",
        }
    }
}

/// Ctrl+letter commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    SelectAll,
    Copy,
    Search,
    NextMatch,
    Tab,
    JumpToLine,
    Quit,
    Save,
    Paste,
    Cut,
    Undo,
}

impl Chord {
    fn of(letter: u8) -> Option<Self> {
        match letter {
            b'a' => Some(Self::SelectAll),
            b'c' => Some(Self::Copy),
            b'f' => Some(Self::Search),
            b'g' => Some(Self::NextMatch),
            b'i' => Some(Self::Tab),
            b'l' => Some(Self::JumpToLine),
            b'q' => Some(Self::Quit),
            b's' => Some(Self::Save),
            b'v' => Some(Self::Paste),
            b'x' => Some(Self::Cut),
            b'z' => Some(Self::Undo),
            _ => None,
        }
    }
}

/// Which transition a keystroke triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Backspace or Delete without modifiers
    Erase { backspace: bool },
    /// `<` or `>`
    Indent,
    /// Shift + motion, Ctrl for word/paragraph steps
    Extend { motion: Motion, leap: bool },
    /// Motion without Shift
    Navigate,
    /// Ctrl+Up or Ctrl+Down without Shift
    Paragraph(Motion),
    /// Shift+Home, Ctrl for buffer start
    SelectToStart { ctrl: bool },
    /// Home without Shift
    Home,
    Enter,
    Escape,
    Chord(Chord),
    /// Nothing to translate
    Forward,
}

/// Classify a keystroke into the handler that processes it
pub fn classify(keystroke: &Keystroke) -> Handler {
    let shift = keystroke.modifiers.shift;
    let ctrl = keystroke.modifiers.ctrl;

    if let Some(motion) = Motion::of(keystroke.key) {
        return match (shift, ctrl, motion) {
            (true, leap, _) => Handler::Extend { motion, leap },
            (false, true, Motion::Up | Motion::Down) => Handler::Paragraph(motion),
            (false, _, _) => Handler::Navigate,
        };
    }

    match (keystroke.key, shift, ctrl) {
        (Key::Backspace, false, false) => Handler::Erase { backspace: true },
        (Key::Delete, false, false) => Handler::Erase { backspace: false },
        (Key::Less | Key::Greater, _, _) => Handler::Indent,
        (Key::Home, true, ctrl) => Handler::SelectToStart { ctrl },
        (Key::Home, false, _) => Handler::Home,
        (Key::Enter, _, _) => Handler::Enter,
        (Key::Escape, _, _) => Handler::Escape,
        (Key::Char(letter), false, true) => {
            Chord::of(letter).map_or(Handler::Forward, Handler::Chord)
        }
        _ => Handler::Forward,
    }
}

/// Run one transition
///
/// `keystroke` is `None` for input the decoder did not recognize. The probe
/// is only consulted by copy, cut, save and paste.
pub fn transition(
    state: &mut ModeState,
    keystroke: Option<&Keystroke>,
    probe: &mut dyn CursorProbe,
) -> Directive {
    let directive = match keystroke {
        Some(k) => match classify(k) {
            Handler::Erase { backspace } => erase(state, backspace),
            Handler::Indent => Directive::pass(),
            Handler::Extend { motion, leap } => extend_selection(state, motion, leap),
            Handler::Navigate => navigate(state),
            Handler::Paragraph(motion) => paragraph(state, motion),
            Handler::SelectToStart { ctrl } => select_to_start(state, ctrl),
            Handler::Home => home(state),
            Handler::Enter => enter(state),
            Handler::Escape => escape(state),
            Handler::Chord(chord) => run_chord(state, chord, probe),
            Handler::Forward => Directive::pass(),
        }
        None => literal(state),
    };

    debug_assert!(!(state.searching && state.jumping));
    directive
}

fn erase(state: &mut ModeState, backspace: bool) -> Directive {
    if !state.selecting {
        return Directive::pass();
    }

    debug!("erase over selection, closing it");
    state.selecting = false;
    if backspace {
        Directive::suppress().with_all(&[cmd::DELETE_SELECTION, cmd::INSERT])
    } else {
        // Visual <Del> is mapped to the same delete in the startup script
        Directive::pass()
    }
}

/// Shift + motion: open a selection if needed, then move
fn extend_selection(state: &mut ModeState, motion: Motion, leap: bool) -> Directive {
    let mut directive = Directive::suppress();

    if !state.selecting {
        directive.push(cmd::ESCAPE);
        // Leaving insert mode steps back one column; forward selections
        // must start at the insert point itself
        if motion.is_forward() {
            directive.push(cmd::INSERT_POINT);
        }
        directive.push(cmd::VISUAL);
        state.selecting = true;
        state.close_prompts();
    }

    directive.push(if leap { motion.leap() } else { motion.step() });
    directive
}

fn close_selection(state: &mut ModeState) -> Directive {
    state.selecting = false;
    Directive::pass().with_all(&[cmd::ESCAPE, cmd::INSERT])
}

fn navigate(state: &mut ModeState) -> Directive {
    if state.selecting {
        debug!("stop selecting");
        close_selection(state)
    } else {
        Directive::pass()
    }
}

fn paragraph(state: &mut ModeState, motion: Motion) -> Directive {
    state.selecting = false;
    state.close_prompts();
    Directive::suppress().with_all(&[cmd::ESCAPE, motion.leap(), cmd::INSERT])
}

/// Shift+Home is Shift+Left followed by a jump to the line start
fn select_to_start(state: &mut ModeState, ctrl: bool) -> Directive {
    let mut directive = extend_selection(state, Motion::Left, false);
    directive.push(if ctrl { cmd::BUFFER_START } else { cmd::LINE_START });
    directive
}

fn home(state: &mut ModeState) -> Directive {
    if !state.searching && state.selecting {
        close_selection(state)
    } else {
        Directive::pass()
    }
}

fn enter(state: &mut ModeState) -> Directive {
    if state.searching {
        state.searching = false;
        state.selecting = true;
        Directive::suppress().with_all(&[cmd::CONFIRM, cmd::VISUAL, cmd::SELECT_MATCH])
    } else if state.jumping {
        state.jumping = false;
        Directive::suppress().with_all(&[cmd::CONFIRM, cmd::INSERT])
    } else if state.selecting {
        // Typing over a selection replaces it
        state.selecting = false;
        Directive::pass().with_all(&[cmd::DELETE_SELECTION, cmd::INSERT])
    } else {
        Directive::pass()
    }
}

fn escape(state: &mut ModeState) -> Directive {
    if state.prompting() || state.selecting {
        state.selecting = false;
        state.close_prompts();
        Directive::suppress().with_all(&[cmd::ESCAPE, cmd::INSERT])
    } else {
        Directive::pass()
    }
}

fn literal(state: &mut ModeState) -> Directive {
    if state.selecting {
        debug!("literal input over selection, deleting it");
        state.selecting = false;
        Directive::pass().with_all(&[cmd::DELETE_SELECTION, cmd::INSERT])
    } else {
        Directive::pass()
    }
}

fn run_chord(state: &mut ModeState, chord: Chord, probe: &mut dyn CursorProbe) -> Directive {
    match chord {
        Chord::SelectAll => {
            state.selecting = true;
            state.close_prompts();
            Directive::suppress().with_all(&[cmd::ESCAPE, cmd::SELECT_ALL])
        }
        Chord::Copy => {
            if !state.selecting {
                return Directive::suppress();
            }
            state.full_line_selection = probe_line_start(probe, "copy") == Some(true);
            Directive::suppress().with(cmd::YANK)
        }
        Chord::Cut => {
            if !state.selecting {
                return Directive::suppress();
            }
            state.full_line_selection = probe_line_start(probe, "cut") == Some(true);
            state.selecting = false;
            Directive::suppress().with_all(&[cmd::CUT, cmd::INSERT])
        }
        Chord::Search => {
            state.selecting = false;
            state.jumping = false;
            state.searching = true;
            Directive::suppress().with_all(&[cmd::ESCAPE, cmd::SEARCH_PROMPT])
        }
        Chord::NextMatch => {
            let mut directive = Directive::suppress();
            if !state.selecting {
                directive.push(cmd::ESCAPE);
            }
            directive.push(cmd::SELECT_MATCH);
            state.selecting = true;
            state.close_prompts();
            directive
        }
        Chord::Tab => {
            if state.selecting {
                state.selecting = false;
                Directive::pass().with_all(&[cmd::DELETE_SELECTION, cmd::INSERT])
            } else {
                Directive::pass()
            }
        }
        Chord::JumpToLine => {
            state.selecting = false;
            state.searching = false;
            state.jumping = true;
            Directive::suppress().with_all(&[cmd::ESCAPE, cmd::LINE_PROMPT])
        }
        Chord::Quit => {
            state.selecting = false;
            state.close_prompts();
            Directive::suppress().with_all(&[cmd::ESCAPE, cmd::QUIT])
        }
        Chord::Save => save(state, probe),
        Chord::Paste => paste(state, probe),
        Chord::Undo => {
            state.selecting = false;
            state.close_prompts();
            Directive::suppress().with_all(&[cmd::ESCAPE, cmd::UNDO, cmd::INSERT])
        }
    }
}

fn save(state: &mut ModeState, probe: &mut dyn CursorProbe) -> Directive {
    if state.selecting {
        return Directive::suppress().with_all(&[cmd::ESCAPE, cmd::SAVE, cmd::RESELECT]);
    }

    // The cursor is on a prompt line while one is open; nothing to preserve
    let nudge = !state.prompting() && probe_line_start(probe, "save") == Some(false);
    state.close_prompts();

    let mut directive = Directive::suppress().with_all(&[cmd::ESCAPE, cmd::SAVE]);
    if nudge {
        directive.push(cmd::NUDGE_RIGHT);
    }
    directive.push(cmd::INSERT);
    directive
}

fn paste(state: &mut ModeState, probe: &mut dyn CursorProbe) -> Directive {
    if state.prompting() {
        return Directive::suppress().with_all(&[cmd::INSERT_REGISTER, cmd::UNNAMED_REGISTER]);
    }

    let mut directive = Directive::suppress();
    if state.selecting {
        // The cursor lands on the start of the deleted span
        state.selecting = false;
        directive.push(cmd::DELETE_SELECTION);
    } else {
        directive.push(cmd::ESCAPE);
        if probe_line_start(probe, "paste") == Some(false) {
            directive.push(cmd::NUDGE_RIGHT);
        }
    }

    directive.push(cmd::PUT);
    if !state.full_line_selection {
        directive.push(cmd::NUDGE_RIGHT);
    }
    directive.push(cmd::INSERT);
    directive
}

/// Ask the probe whether the cursor is in the first column
///
/// `None` when the query failed; callers then skip nudges and assume a
/// partial-line selection.
fn probe_line_start(probe: &mut dyn CursorProbe, purpose: &str) -> Option<bool> {
    match probe.cursor_position() {
        Ok(pos) => {
            debug!(row = pos.row, col = pos.col, purpose, "cursor position");
            Some(pos.at_line_start())
        }
        Err(e) => {
            warn!(purpose, "cursor query failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::cursor::{CursorPosition, NoProbe, ProbeError};
    use crate::input::Modifiers;

    /// Answers with a fixed column
    struct Column(u16);

    impl CursorProbe for Column {
        fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError> {
            Ok(CursorPosition::new(1, self.0))
        }
    }

    fn key(k: Key, modifiers: Modifiers) -> Keystroke {
        Keystroke::new(k, modifiers)
    }

    fn ctrl(letter: u8) -> Keystroke {
        key(Key::Char(letter), Modifiers::CTRL)
    }

    fn run(state: &mut ModeState, k: Keystroke) -> Directive {
        transition(state, Some(&k), &mut NoProbe)
    }

    fn selecting() -> ModeState {
        ModeState {
            selecting: true,
            ..ModeState::default()
        }
    }

    fn searching() -> ModeState {
        ModeState {
            searching: true,
            ..ModeState::default()
        }
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(
            classify(&key(Key::Left, Modifiers::SHIFT)),
            Handler::Extend {
                motion: Motion::Left,
                leap: false
            }
        );
        assert_eq!(
            classify(&key(Key::Right, Modifiers::CTRL_SHIFT)),
            Handler::Extend {
                motion: Motion::Right,
                leap: true
            }
        );
        assert_eq!(
            classify(&key(Key::Up, Modifiers::CTRL)),
            Handler::Paragraph(Motion::Up)
        );
        assert_eq!(classify(&key(Key::Left, Modifiers::CTRL)), Handler::Navigate);
        assert_eq!(classify(&key(Key::Home, Modifiers::NONE)), Handler::Home);
        assert_eq!(
            classify(&key(Key::Home, Modifiers::SHIFT)),
            Handler::SelectToStart { ctrl: false }
        );
        assert_eq!(classify(&ctrl(b's')), Handler::Chord(Chord::Save));
        assert_eq!(classify(&ctrl(b'b')), Handler::Forward);
        assert_eq!(
            classify(&key(Key::Char(b's'), Modifiers::CTRL_SHIFT)),
            Handler::Forward
        );
        assert_eq!(
            classify(&key(Key::Delete, Modifiers::SHIFT)),
            Handler::Forward
        );
    }

    #[test]
    fn test_shift_left_opens_selection() {
        let mut state = ModeState::new();
        let d = run(&mut state, key(Key::Left, Modifiers::SHIFT));
        assert!(state.selecting());
        assert!(!d.pass_through);
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::VISUAL, &b"h"[..]]);

        // Already selecting: only the motion
        let d = run(&mut state, key(Key::Left, Modifiers::SHIFT));
        assert_eq!(d.commands, vec![&b"h"[..]]);
    }

    #[test]
    fn test_shift_right_restores_insert_point() {
        let mut state = ModeState::new();
        let d = run(&mut state, key(Key::Right, Modifiers::SHIFT));
        assert_eq!(
            d.commands,
            vec![cmd::ESCAPE, cmd::INSERT_POINT, cmd::VISUAL, &b"l"[..]]
        );
    }

    #[test]
    fn test_ctrl_shift_uses_word_motion() {
        let mut state = ModeState::new();
        let d = run(&mut state, key(Key::Right, Modifiers::CTRL_SHIFT));
        assert_eq!(d.commands.last(), Some(&&b"w"[..]));
        let d = run(&mut state, key(Key::Down, Modifiers::CTRL_SHIFT));
        assert_eq!(d.commands, vec![&b"}"[..]]);
    }

    #[test]
    fn test_plain_arrow_closes_selection() {
        let mut state = selecting();
        let d = run(&mut state, key(Key::Down, Modifiers::NONE));
        assert!(!state.selecting());
        assert!(d.pass_through);
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::INSERT]);

        // Nothing open: untouched
        let d = run(&mut state, key(Key::Down, Modifiers::NONE));
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_backspace_over_selection() {
        let mut state = selecting();
        let d = run(&mut state, Keystroke::plain(Key::Backspace));
        assert!(!state.selecting());
        assert!(!d.pass_through);
        assert_eq!(d.commands, vec![cmd::DELETE_SELECTION, cmd::INSERT]);
    }

    #[test]
    fn test_delete_over_selection_passes() {
        let mut state = selecting();
        let d = run(&mut state, Keystroke::plain(Key::Delete));
        assert!(!state.selecting());
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_indent_keeps_selection() {
        let mut state = selecting();
        let d = run(&mut state, Keystroke::plain(Key::Greater));
        assert!(state.selecting());
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_shift_home_composes_left() {
        let mut state = ModeState::new();
        let d = run(&mut state, key(Key::Home, Modifiers::SHIFT));
        assert!(state.selecting());
        assert_eq!(
            d.commands,
            vec![cmd::ESCAPE, cmd::VISUAL, &b"h"[..], cmd::LINE_START]
        );

        let d = run(&mut state, key(Key::Home, Modifiers::CTRL_SHIFT));
        assert_eq!(d.commands, vec![&b"h"[..], cmd::BUFFER_START]);
    }

    #[test]
    fn test_home_while_searching_keeps_state() {
        let mut state = ModeState {
            selecting: true,
            searching: true,
            ..ModeState::default()
        };
        let d = run(&mut state, Keystroke::plain(Key::Home));
        assert!(state.selecting());
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_enter_confirms_search() {
        let mut state = searching();
        let d = run(&mut state, Keystroke::plain(Key::Enter));
        assert!(!state.searching());
        assert!(state.selecting());
        assert!(!d.pass_through);
        assert_eq!(d.commands, vec![cmd::CONFIRM, cmd::VISUAL, cmd::SELECT_MATCH]);
    }

    #[test]
    fn test_enter_confirms_jump() {
        let mut state = ModeState::new();
        run(&mut state, ctrl(b'l'));
        assert!(state.jumping());
        let d = run(&mut state, Keystroke::plain(Key::Enter));
        assert!(!state.jumping());
        assert_eq!(d.commands, vec![cmd::CONFIRM, cmd::INSERT]);
        assert!(!d.pass_through);
    }

    #[test]
    fn test_enter_replaces_selection() {
        let mut state = selecting();
        let d = run(&mut state, Keystroke::plain(Key::Enter));
        assert!(!state.selecting());
        assert!(d.pass_through);
        assert_eq!(d.commands, vec![cmd::DELETE_SELECTION, cmd::INSERT]);
    }

    #[test]
    fn test_escape_cancels_prompt() {
        let mut state = searching();
        let d = run(&mut state, Keystroke::plain(Key::Escape));
        assert!(!state.searching());
        assert!(!d.pass_through);

        let d = run(&mut state, Keystroke::plain(Key::Escape));
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_literal_over_selection() {
        let mut state = selecting();
        let d = transition(&mut state, None, &mut NoProbe);
        assert!(!state.selecting());
        assert!(d.pass_through);
        assert_eq!(d.commands, vec![cmd::DELETE_SELECTION, cmd::INSERT]);
    }

    #[test]
    fn test_search_and_jump_exclusive() {
        let mut state = ModeState::new();
        run(&mut state, ctrl(b'f'));
        assert!(state.searching() && !state.jumping());
        run(&mut state, ctrl(b'l'));
        assert!(state.jumping() && !state.searching());
        run(&mut state, ctrl(b'f'));
        assert!(state.searching() && !state.jumping());
    }

    #[test]
    fn test_search_clears_selection() {
        let mut state = selecting();
        let d = run(&mut state, ctrl(b'f'));
        assert!(!state.selecting());
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SEARCH_PROMPT]);
    }

    #[test]
    fn test_select_all() {
        let mut state = ModeState::new();
        let d = run(&mut state, ctrl(b'a'));
        assert!(state.selecting());
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SELECT_ALL]);
    }

    #[test]
    fn test_next_match_extends() {
        let mut state = ModeState::new();
        let d = run(&mut state, ctrl(b'g'));
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SELECT_MATCH]);
        let d = run(&mut state, ctrl(b'g'));
        assert_eq!(d.commands, vec![cmd::SELECT_MATCH]);
        assert!(state.selecting());
    }

    #[test]
    fn test_copy_records_full_line() {
        let mut state = selecting();
        let d = transition(&mut state, Some(&ctrl(b'c')), &mut Column(1));
        assert!(state.full_line_selection());
        assert!(state.selecting());
        assert_eq!(d.commands, vec![cmd::YANK]);

        let d = transition(&mut state, Some(&ctrl(b'c')), &mut Column(9));
        assert!(!state.full_line_selection());
        assert!(!d.pass_through);
    }

    #[test]
    fn test_copy_without_selection_is_swallowed() {
        let mut state = ModeState::new();
        let d = run(&mut state, ctrl(b'c'));
        assert_eq!(d, Directive::suppress());
    }

    #[test]
    fn test_copy_probe_failure_not_full_line() {
        let mut state = ModeState {
            selecting: true,
            full_line_selection: true,
            ..ModeState::default()
        };
        run(&mut state, ctrl(b'c'));
        assert!(!state.full_line_selection());
    }

    #[test]
    fn test_cut() {
        let mut state = selecting();
        let d = transition(&mut state, Some(&ctrl(b'x')), &mut Column(4));
        assert!(!state.selecting());
        assert_eq!(d.commands, vec![cmd::CUT, cmd::INSERT]);
    }

    #[test]
    fn test_save_nudges_away_from_line_start() {
        let mut state = ModeState::new();
        let d = transition(&mut state, Some(&ctrl(b's')), &mut Column(5));
        assert!(!d.pass_through);
        assert_eq!(
            d.commands,
            vec![cmd::ESCAPE, cmd::SAVE, cmd::NUDGE_RIGHT, cmd::INSERT]
        );

        let d = transition(&mut state, Some(&ctrl(b's')), &mut Column(1));
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SAVE, cmd::INSERT]);
    }

    #[test]
    fn test_save_skips_nudge_when_probe_fails() {
        let mut state = ModeState::new();
        let d = run(&mut state, ctrl(b's'));
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SAVE, cmd::INSERT]);
    }

    #[test]
    fn test_save_keeps_selection() {
        let mut state = selecting();
        let d = run(&mut state, ctrl(b's'));
        assert!(state.selecting());
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::SAVE, cmd::RESELECT]);
    }

    #[test]
    fn test_paste_at_cursor() {
        let mut state = ModeState::new();
        let d = transition(&mut state, Some(&ctrl(b'v')), &mut Column(3));
        assert_eq!(
            d.commands,
            vec![
                cmd::ESCAPE,
                cmd::NUDGE_RIGHT,
                cmd::PUT,
                cmd::NUDGE_RIGHT,
                cmd::INSERT
            ]
        );
    }

    #[test]
    fn test_paste_full_line_skips_trailing_nudge() {
        let mut state = ModeState {
            full_line_selection: true,
            ..ModeState::default()
        };
        let d = transition(&mut state, Some(&ctrl(b'v')), &mut Column(1));
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::PUT, cmd::INSERT]);
    }

    #[test]
    fn test_paste_over_selection() {
        let mut state = selecting();
        let d = run(&mut state, ctrl(b'v'));
        assert!(!state.selecting());
        assert_eq!(
            d.commands,
            vec![cmd::DELETE_SELECTION, cmd::PUT, cmd::NUDGE_RIGHT, cmd::INSERT]
        );
    }

    #[test]
    fn test_paste_into_prompt() {
        let mut state = searching();
        let d = run(&mut state, ctrl(b'v'));
        assert!(state.searching());
        assert_eq!(d.commands, vec![cmd::INSERT_REGISTER, cmd::UNNAMED_REGISTER]);
    }

    #[test]
    fn test_tab_replaces_selection() {
        let mut state = selecting();
        let d = run(&mut state, ctrl(b'i'));
        assert!(!state.selecting());
        assert!(d.pass_through);

        let d = run(&mut state, ctrl(b'i'));
        assert_eq!(d, Directive::pass());
    }

    #[test]
    fn test_quit_and_undo() {
        let mut state = selecting();
        let d = run(&mut state, ctrl(b'z'));
        assert!(!state.selecting());
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::UNDO, cmd::INSERT]);

        let d = run(&mut state, ctrl(b'q'));
        assert_eq!(d.commands, vec![cmd::ESCAPE, cmd::QUIT]);
        assert!(!d.pass_through);
    }

    #[test]
    fn test_ctrl_up_paragraph() {
        let mut state = selecting();
        let d = run(&mut state, key(Key::Up, Modifiers::CTRL));
        assert!(!state.selecting());
        assert_eq!(d.commands, vec![cmd::ESCAPE, &b"{"[..], cmd::INSERT]);
    }

    #[test]
    fn test_aliased_ctrl_arrow_selects() {
        // Under the aliased scheme Ctrl+Left arrives with Shift set too
        let mut state = ModeState::new();
        let d = run(&mut state, key(Key::Left, Modifiers::CTRL_SHIFT));
        assert!(state.selecting());
        assert_eq!(d.commands.last(), Some(&&b"b"[..]));
    }
}
