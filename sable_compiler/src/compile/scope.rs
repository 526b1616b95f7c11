//! Lexical scopes mapping names to slots.
use sable_core::bytecode::Slot;
use smol_str::SmolStr;

#[derive(Debug, Default)]
struct Frame {
    names: Vec<(SmolStr, Slot)>,
    /// Locks acquired by the block that opened this frame.
    sync_locks: u16,
}

/// Stack of nested block scopes of one function.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a stack holding the function's outermost scope.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Open the scope of a sync block holding `locks` locks.
    pub fn push_sync(&mut self, locks: u16) {
        self.frames.push(Frame {
            names: Vec::new(),
            sync_locks: locks,
        });
    }

    pub fn pop(&mut self) {
        // The function scope stays.
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind a name in the innermost scope.
    ///
    /// Returns `false` if the innermost scope already has that name.
    pub fn declare(&mut self, name: &str, slot: Slot) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };

        if frame.names.iter().any(|(existing, _)| existing == name) {
            return false;
        }
        frame.names.push((SmolStr::new(name), slot));
        true
    }

    pub fn is_declared_here(&self, name: &str) -> bool {
        self.frames
            .last()
            .map(|frame| frame.names.iter().any(|(existing, _)| existing == name))
            .unwrap_or(false)
    }

    /// Find the innermost binding of a name.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.names.iter().find(|(existing, _)| existing == name))
            .map(|(_, slot)| *slot)
    }

    /// Total locks held by every enclosing sync block.
    pub fn sync_depth(&self) -> u16 {
        self.frames.iter().map(|frame| frame.sync_locks).sum()
    }
}
