//! The command queue.
//!
//! An append-only vector with a read cursor.  Dequeuing is non-destructive,
//! so jumps can move the cursor anywhere, including backwards.  Commands are
//! addressed by [`CommandId`], their index, which never changes once
//! enqueued.

use std::fmt;

use super::command::{Command, CommandKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    items: Vec<Command>,
    cursor: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command`.  The cursor does not move.
    pub fn enqueue(&mut self, command: Command) -> CommandId {
        self.items.push(command);
        CommandId(self.items.len() - 1)
    }

    /// The command at the cursor, advancing past it; `None` once the end is
    /// reached, however many times it is called.
    pub fn dequeue(&mut self) -> Option<(CommandId, &Command)> {
        let id = CommandId(self.cursor);
        let cmd = self.items.get(self.cursor)?;
        self.cursor += 1;
        Some((id, cmd))
    }

    /// Every command of `kind`, in queue order, ignoring the cursor.
    pub fn find_commands(&self, kind: CommandKind) -> Vec<CommandId> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is(kind))
            .map(|(i, _)| CommandId(i))
            .collect()
    }

    /// The first command of `kind` at or after the cursor.
    pub fn find_next(&self, kind: CommandKind) -> Option<CommandId> {
        self.items[self.cursor.min(self.items.len())..]
            .iter()
            .position(|c| c.is(kind))
            .map(|i| CommandId(self.cursor + i))
    }

    /// Move the cursor to `target`.  Returns false and leaves the cursor
    /// alone if no such command exists.
    pub fn seek(&mut self, target: CommandId) -> bool {
        if target.0 < self.items.len() {
            self.cursor = target.0;
            true
        } else {
            false
        }
    }

    /// Visit every command in order without touching the cursor.
    pub fn each(&self, mut action: impl FnMut(CommandId, &Command)) {
        for (i, c) in self.items.iter().enumerate() {
            action(CommandId(i), c);
        }
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.items.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: CommandId) -> Option<&mut Command> {
        self.items.get_mut(id.0)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.items.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
