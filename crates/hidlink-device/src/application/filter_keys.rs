//! Keyboard command filter: the both-shifts chord state machine.
//!
//! Holding **both Shift keys** with no other key is the command chord. The
//! chord and everything that follows it stay on this node; the PC never
//! sees chord traffic. Releasing the chord arms a one-key command:
//!
//! - `INSERT`  start new-password entry, finish with `ENTER`
//! - `DELETE`  erase the stored password
//! - `END`     lock the keyboard
//! - `ENTER`   (while locked) start password entry to unlock
//! - `ESC`     cancel
//!
//! While no password is stored yet, the command key is pressed *with* the
//! chord still held instead. While locked, every non-chord report is
//! swallowed, so the keyboard is dead to the PC until the password is
//! re-entered. Both shifts plus `HOME` is the reboot chord; it is honored
//! in every state and never forwarded.

use hidlink_core::report::keys;
use hidlink_core::KeyboardReport;
use tracing::{debug, info, warn};

/// Longest accepted password, in key codes. Further keys are ignored.
pub const MAX_PASSWORD_LEN: usize = 32;

/// Verdict for a single keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Pass the report on to the keyboard queue.
    Forward,
    /// Drop the report; the PC never sees it.
    Swallow,
}

/// Filter states. The `SeenChord` variants mean the chord is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// No password stored; reports pass through.
    Blank,
    /// Chord held while blank; a command key pressed with the chord acts
    /// immediately.
    BlankSeenChord,
    /// Password stored, unlocked; reports pass through.
    Normal,
    /// Chord held while unlocked.
    NormalSeenChord,
    /// Password stored, locked; the keyboard is dead to the PC.
    Locked,
    /// Chord held while locked.
    LockedSeenChord,
    /// Chord released; the next key press selects a command.
    ExpectingCommand {
        /// Whether the chord was entered from `Locked`.
        from_locked: bool,
    },
    /// Collecting a new password; `ENTER` stores it.
    EnteringNewPassword,
    /// Collecting an unlock attempt; `ENTER` compares it.
    EnteringUnlockPassword,
}

/// The keyboard command filter.
///
/// Pure state, no I/O beyond logging: feed every decoded keyboard report
/// through [`filter`](Self::filter) and honor the returned action.
pub struct KeyFilter {
    state: FilterState,
    password: Option<Vec<u8>>,
    entry: Vec<u8>,
}

impl KeyFilter {
    /// A filter with no stored password.
    pub fn new() -> Self {
        Self {
            state: FilterState::Blank,
            password: None,
            entry: Vec::new(),
        }
    }

    /// A filter with a password already stored, starting unlocked.
    pub fn with_password(mut password: Vec<u8>) -> Self {
        password.truncate(MAX_PASSWORD_LEN);
        Self {
            state: FilterState::Normal,
            password: Some(password),
            entry: Vec::new(),
        }
    }

    /// Current state, for logs and tests.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Classifies one keyboard report.
    pub fn filter(&mut self, report: &KeyboardReport) -> FilterAction {
        // The reboot chord outranks every state.
        if is_reboot_chord(report) {
            warn!("reboot chord received, swallowing");
            return FilterAction::Swallow;
        }

        match self.state {
            FilterState::Blank | FilterState::Normal => {
                if is_command_chord(report) {
                    let next = if self.state == FilterState::Blank {
                        FilterState::BlankSeenChord
                    } else {
                        FilterState::NormalSeenChord
                    };
                    self.set_state(next);
                    FilterAction::Swallow
                } else {
                    FilterAction::Forward
                }
            }

            FilterState::Locked => {
                if is_command_chord(report) {
                    self.set_state(FilterState::LockedSeenChord);
                }
                FilterAction::Swallow
            }

            FilterState::BlankSeenChord => {
                if is_command_chord(report) {
                    // Chord still held.
                } else if report.modifiers.is_both_shifts_only()
                    && report.first_key() == keys::INSERT
                {
                    info!("new password entry started");
                    self.entry.clear();
                    self.set_state(FilterState::EnteringNewPassword);
                } else if report.is_empty() {
                    self.set_state(FilterState::Blank);
                } else {
                    debug!("unrecognized chord command {:#04x}", report.first_key());
                    self.set_state(FilterState::Blank);
                }
                FilterAction::Swallow
            }

            FilterState::NormalSeenChord => {
                if is_command_chord(report) {
                    // Chord still held.
                } else if report.is_empty() {
                    self.set_state(FilterState::ExpectingCommand { from_locked: false });
                } else {
                    self.set_state(FilterState::Normal);
                }
                FilterAction::Swallow
            }

            FilterState::LockedSeenChord => {
                if is_command_chord(report) {
                    // Chord still held.
                } else if report.is_empty() {
                    self.set_state(FilterState::ExpectingCommand { from_locked: true });
                } else {
                    self.set_state(FilterState::Locked);
                }
                FilterAction::Swallow
            }

            FilterState::ExpectingCommand { from_locked } => {
                self.on_command(report, from_locked);
                FilterAction::Swallow
            }

            FilterState::EnteringNewPassword => {
                self.on_new_password_key(report);
                FilterAction::Swallow
            }

            FilterState::EnteringUnlockPassword => {
                self.on_unlock_key(report);
                FilterAction::Swallow
            }
        }
    }

    fn on_command(&mut self, report: &KeyboardReport, from_locked: bool) {
        let key = report.first_key();
        if key == 0 {
            // Still waiting for the command press.
            return;
        }

        if from_locked {
            match key {
                keys::ESCAPE => {
                    debug!("command cancelled");
                    self.set_state(FilterState::Locked);
                }
                keys::ENTER => {
                    info!("unlock password entry started");
                    self.entry.clear();
                    self.set_state(FilterState::EnteringUnlockPassword);
                }
                other => {
                    debug!("unrecognized command {other:#04x} while locked");
                    self.set_state(FilterState::Locked);
                }
            }
            return;
        }

        match key {
            keys::ESCAPE => {
                debug!("command cancelled");
                self.set_state(FilterState::Normal);
            }
            keys::INSERT => {
                info!("new password entry started");
                self.entry.clear();
                self.set_state(FilterState::EnteringNewPassword);
            }
            keys::DELETE => {
                info!("stored password erased");
                self.password = None;
                self.set_state(FilterState::Blank);
            }
            keys::END => {
                info!("keyboard locked");
                self.set_state(FilterState::Locked);
            }
            keys::EQUAL | keys::SPACE | keys::F12 | keys::PRINT_SCREEN => {
                info!("command key {key:#04x} recognized but not implemented");
                self.set_state(FilterState::Normal);
            }
            other => {
                debug!("unrecognized command {other:#04x}");
                self.set_state(FilterState::Normal);
            }
        }
    }

    fn on_new_password_key(&mut self, report: &KeyboardReport) {
        let key = report.first_key();
        if key == 0 {
            return;
        }
        if key == keys::ENTER {
            if self.entry.is_empty() {
                info!("empty password, entry cancelled");
                let next = self.base_state();
                self.set_state(next);
            } else {
                info!("password stored ({} keys)", self.entry.len());
                self.password = Some(std::mem::take(&mut self.entry));
                self.set_state(FilterState::Normal);
            }
            return;
        }
        if self.entry.len() < MAX_PASSWORD_LEN {
            self.entry.push(key);
        }
    }

    fn on_unlock_key(&mut self, report: &KeyboardReport) {
        let key = report.first_key();
        if key == 0 {
            return;
        }
        if key == keys::ENTER {
            let attempt = std::mem::take(&mut self.entry);
            if self.password.as_deref() == Some(attempt.as_slice()) {
                info!("password accepted, keyboard unlocked");
                self.set_state(FilterState::Normal);
            } else {
                warn!("wrong password, keyboard stays locked");
                self.set_state(FilterState::Locked);
            }
            return;
        }
        if self.entry.len() < MAX_PASSWORD_LEN {
            self.entry.push(key);
        }
    }

    /// Unlocked state matching the stored password: `Normal` when one is
    /// set, `Blank` otherwise.
    fn base_state(&self) -> FilterState {
        if self.password.is_some() {
            FilterState::Normal
        } else {
            FilterState::Blank
        }
    }

    fn set_state(&mut self, next: FilterState) {
        if self.state != next {
            debug!("key filter: {:?} -> {next:?}", self.state);
            self.state = next;
        }
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Both shifts held and nothing else: the command chord.
fn is_command_chord(report: &KeyboardReport) -> bool {
    report.modifiers.is_both_shifts_only() && report.keys.iter().all(|&k| k == 0)
}

/// Both shifts plus `HOME`: the reboot chord, honored in every state.
fn is_reboot_chord(report: &KeyboardReport) -> bool {
    report.modifiers.is_both_shifts_only() && report.first_key() == keys::HOME
}
