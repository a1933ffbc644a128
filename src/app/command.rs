//! Mutual exclusion between user commands
//!
//! At most one command runs at a time. A command starts by taking a
//! [`CommandGuard`] from the [`CommandGate`]; the gate returns to idle when the
//! guard is dropped, including on early returns and errors.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Command currently holding the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Idle,
    Adding,
    Removing,
    Syncing,
    RefreshingOne,
    RefreshingAll,
    Saving,
}

impl CommandState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandState::Idle => "idle",
            CommandState::Adding => "add",
            CommandState::Removing => "remove",
            CommandState::Syncing => "sync",
            CommandState::RefreshingOne => "refresh",
            CommandState::RefreshingAll => "refresh all",
            CommandState::Saving => "save",
        }
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a command is attempted while another one is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Can't start {requested} while {running} is running")]
pub struct BusyError {
    pub requested: CommandState,
    pub running: CommandState,
}

#[derive(Debug, Default)]
pub struct CommandGate {
    state: Mutex<CommandState>,
}

impl CommandGate {
    pub fn new() -> Self {
        Self::default()
    }

    // The state is a plain enum, so a panic elsewhere cannot leave it half-written
    fn lock_state(&self) -> MutexGuard<'_, CommandState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CommandState {
        *self.lock_state()
    }

    /// Starts `command` if no other command is running
    pub fn try_begin(&self, command: CommandState) -> Result<CommandGuard<'_>, BusyError> {
        let mut state = self.lock_state();
        if *state != CommandState::Idle {
            return Err(BusyError {
                requested: command,
                running: *state,
            });
        }

        debug!("Starting {} command", command);
        *state = command;
        Ok(CommandGuard { gate: self, command })
    }
}

/// Holds the gate for one command
#[must_use = "the command ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CommandGuard<'a> {
    gate: &'a CommandGate,
    command: CommandState,
}

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        debug!("Finished {} command", self.command);
        *self.gate.lock_state() = CommandState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_begin_rejects_second_command_until_guard_drops() {
        let gate = CommandGate::new();

        let guard = gate.try_begin(CommandState::RefreshingAll).unwrap();
        assert_eq!(gate.state(), CommandState::RefreshingAll);

        let rejected = gate.try_begin(CommandState::Saving);
        assert_eq!(
            rejected.unwrap_err(),
            BusyError {
                requested: CommandState::Saving,
                running: CommandState::RefreshingAll,
            }
        );

        drop(guard);
        assert_eq!(gate.state(), CommandState::Idle);
        assert!(gate.try_begin(CommandState::Saving).is_ok());
    }

    #[test]
    fn guard_releases_gate_on_early_return() {
        fn failing_command(gate: &CommandGate) -> Result<(), BusyError> {
            let _guard = gate.try_begin(CommandState::Adding)?;
            Err(BusyError {
                requested: CommandState::Adding,
                running: CommandState::Idle,
            })
        }

        let gate = CommandGate::new();
        assert!(failing_command(&gate).is_err());

        assert_eq!(gate.state(), CommandState::Idle);
    }
}
