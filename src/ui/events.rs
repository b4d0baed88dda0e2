// ============================================================================
// Event handling
// ============================================================================
// Polls crossterm for key events with a timeout; no event means a Tick.
// The predicates below name the dashboard's controls, not raw keys.
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Tick,
}

pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Next event, blocking up to 250 ms. Key releases are filtered out;
    /// some platforms report both press and release.
    pub fn next(&self) -> Result<Event> {
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    Ok(Event::Key(key))
                }
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// 'l' or right arrow: next output section.
pub fn is_next_section_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab))
}

/// 'h' or left arrow: previous output section.
pub fn is_previous_section_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab))
}

/// 't': edit the ticker input.
pub fn is_ticker_input_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('t') | KeyCode::Char('T')))
}

/// 'b': edit the start ("begin") date filter.
pub fn is_start_date_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('b') | KeyCode::Char('B')))
}

/// 'e': edit the end date filter.
pub fn is_end_date_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('e') | KeyCode::Char('E')))
}

/// 'c': toggle the candlestick checkbox.
pub fn is_candlestick_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('c') | KeyCode::Char('C')))
}

/// 'v': the "picked one ticker" volume button.
pub fn is_volume_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('v') | KeyCode::Char('V')))
}

/// ']': next moving-average window.
pub fn is_next_ma_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(']')))
}

/// '[': previous moving-average window.
pub fn is_previous_ma_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('[')))
}

/// 'x': export the fetched table as CSV.
pub fn is_export_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('x') | KeyCode::Char('X')))
}

/// 'r': retry after a provider failure.
pub fn is_retry_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// '1'..'6': toggle a basket column in the comparison multi-select.
pub fn selection_index(event: &Event) -> Option<usize> {
    match key_code(event)? {
        KeyCode::Char(c @ '1'..='6') => Some(c as usize - '1' as usize),
        _ => None,
    }
}

/// Characters accepted by the modal input line: ticker symbols and dates.
pub fn is_input_char_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char(c)) if c.is_alphanumeric() || c == '-' || c == '.' || c == ' '
    )
}

pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event)? {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
