//! BBC Micro keyboard matrix.
//!
//! The keyboard is 10 columns by 8 rows. The System VIA puts a row number
//! on PA4-PA6 and a column number on PA0-PA3 and the keyboard answers on
//! PA7 (1 = key down). Row 0 holds SHIFT and CTRL on columns 0 and 1 and
//! the eight keyboard links on columns 2-9; nothing on row 0 raises the
//! keyboard interrupt.
//!
//! Key codes are `row << 4 | column`, the same value the OS writes to port
//! A to test a key.

use std::collections::VecDeque;

/// Columns on the Model B keyboard.
pub const COLUMNS: u8 = 10;

/// Rows 1-7: the keys that interrupt.
const INTERRUPT_ROWS: u8 = 0xFE;

/// What the System VIA needs from a keyboard.
pub trait KeyboardScanner {
    /// Select a key position. The result is read back with `key_down`.
    fn scan(&mut self, row: u8, column: u8);

    /// Whether the key selected by the last `scan` is down.
    fn key_down(&self) -> bool;

    /// Level for the keyboard interrupt line (System VIA CA2).
    ///
    /// In auto-scan mode any key on rows 1-7 interrupts; otherwise only
    /// keys on rows 1-7 of the last scanned column do.
    fn interrupt(&self, autoscan: bool) -> bool;

    /// Called on each timer 1 expiry so a paste injector can feed the
    /// next key event.
    fn paste_poll(&mut self) {}
}

/// Reference keyboard: a key matrix plus the keyboard links and a queue of
/// pasted key events.
#[derive(Debug, Clone, Default)]
pub struct KeyMatrix {
    /// `columns[c]` has bit `r` set if the key at row `r`, column `c` is down.
    columns: [u8; COLUMNS as usize],
    /// Keyboard links, bit 7 on column 2 through bit 0 on column 9.
    links: u8,
    /// Column selected by the last scan.
    scanned_column: u8,
    /// Result of the last scan.
    down: bool,
    /// Pending `(key code, pressed)` events, one applied per poll.
    paste: VecDeque<(u8, bool)>,
}

impl KeyMatrix {
    #[must_use]
    pub fn new(links: u8) -> Self {
        Self {
            links,
            ..Self::default()
        }
    }

    /// Split a key code into `(row, column)`.
    #[must_use]
    pub const fn decode(code: u8) -> (u8, u8) {
        ((code >> 4) & 0x07, code & 0x0F)
    }

    /// Set or clear the key at a row and column. Out-of-range positions
    /// are ignored.
    pub fn set_key(&mut self, row: u8, column: u8, pressed: bool) {
        if row >= 8 || column >= COLUMNS {
            return;
        }
        if pressed {
            self.columns[column as usize] |= 1 << row;
        } else {
            self.columns[column as usize] &= !(1 << row);
        }
    }

    /// Press the key with a row-column key code.
    pub fn press(&mut self, code: u8) {
        let (row, column) = Self::decode(code);
        self.set_key(row, column, true);
    }

    /// Release the key with a row-column key code.
    pub fn release(&mut self, code: u8) {
        let (row, column) = Self::decode(code);
        self.set_key(row, column, false);
    }

    /// Release every key. The links are not keys and stay as they are.
    pub fn release_all(&mut self) {
        self.columns = [0; COLUMNS as usize];
    }

    /// Whether the matrix reads the given position as closed. Row 0
    /// columns 2-9 read the links; columns past the matrix read open.
    #[must_use]
    pub fn is_down(&self, row: u8, column: u8) -> bool {
        if row >= 8 || column >= COLUMNS {
            return false;
        }
        if row == 0 && column >= 2 {
            return self.links & (1 << (9 - column)) != 0;
        }
        self.columns[column as usize] & (1 << row) != 0
    }

    /// Get the keyboard links.
    #[must_use]
    pub fn links(&self) -> u8 {
        self.links
    }

    /// Replace the keyboard links, as fitted at power-on.
    pub fn set_links(&mut self, links: u8) {
        self.links = links;
    }

    /// Queue key events to be applied one per `paste_poll`.
    pub fn queue_paste(&mut self, events: impl IntoIterator<Item = (u8, bool)>) {
        self.paste.extend(events);
    }

    /// Events still waiting to be pasted.
    #[must_use]
    pub fn paste_pending(&self) -> usize {
        self.paste.len()
    }
}

impl KeyboardScanner for KeyMatrix {
    fn scan(&mut self, row: u8, column: u8) {
        self.scanned_column = column;
        self.down = self.is_down(row, column);
        log::trace!("keyboard scan row {row} column {column} = {}", self.down);
    }

    fn key_down(&self) -> bool {
        self.down
    }

    fn interrupt(&self, autoscan: bool) -> bool {
        if autoscan {
            self.columns.iter().any(|&keys| keys & INTERRUPT_ROWS != 0)
        } else {
            self.columns
                .get(self.scanned_column as usize)
                .is_some_and(|&keys| keys & INTERRUPT_ROWS != 0)
        }
    }

    fn paste_poll(&mut self) {
        if let Some((code, pressed)) = self.paste.pop_front() {
            log::debug!("paste key {code:#04x} {}", if pressed { "down" } else { "up" });
            let (row, column) = Self::decode(code);
            self.set_key(row, column, pressed);
        }
    }
}
