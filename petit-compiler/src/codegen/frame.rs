// petit-compiler/src/codegen/frame.rs
// Per-function stack frame: local name -> offset below the frame base

use std::collections::HashMap;

/// Bytes reserved below the frame base by every prologue.
///
/// The reservation does not grow with the number of locals: a function with
/// more than `FRAME_SIZE / SLOT_SIZE` locals writes past it.
pub const FRAME_SIZE: usize = 64;

/// Width of one local slot.
pub const SLOT_SIZE: usize = 8;

#[derive(Debug, Default)]
pub struct StackFrame {
    slots: HashMap<String, usize>,
    next_offset: usize,
}

impl StackFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `name`, creating it on first sight.
    ///
    /// Offsets are positive distances below the frame base: 8, 16, 24, ...
    pub fn allocate(&mut self, name: &str) -> usize {
        if let Some(offset) = self.slots.get(name) {
            return *offset;
        }
        self.next_offset += SLOT_SIZE;
        self.slots.insert(name.to_string(), self.next_offset);
        self.next_offset
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
        self.next_offset = 0;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bytes below the frame base actually addressed by this frame.
    pub fn used_bytes(&self) -> usize {
        self.next_offset
    }

    /// True once the locals no longer fit in the fixed reservation.
    pub fn overflows(&self) -> bool {
        self.next_offset > FRAME_SIZE
    }
}
