//! Key to polyphony-slot allocation.
//!
//! First-free scan, no voice stealing, no re-trigger. A key occupies at most
//! one slot; a note-on for a held key and a note-off for an unknown key
//! change nothing and invoke no callback.

/// Highest accepted MIDI key.
pub const MAX_KEY: u8 = 127;

/// Outcome of [`NoteAllocator::note_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOn {
    /// Key now occupies `slot`.
    Assigned {
        /// Allocated slot.
        slot: usize,
    },
    /// Key already occupied `slot`; nothing changed.
    AlreadyHeld {
        /// Slot the key holds.
        slot: usize,
    },
    /// Every slot is busy; the note was discarded.
    Dropped,
    /// Key outside `0..=MAX_KEY`.
    Rejected,
}

/// Outcome of a note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOff {
    /// `slot` was freed.
    Released {
        /// Freed slot.
        slot: usize,
    },
    /// Hold is on; `slot` keeps sounding until hold is released.
    Sustained {
        /// Held slot.
        slot: usize,
    },
    /// Key held no slot; nothing changed.
    NotHeld,
    /// Key outside `0..=MAX_KEY`.
    Rejected,
}

/// Fixed pool of `N` polyphony slots.
///
/// Assignment changes are reported through a callback taking
/// `(Some(key), slot)` on note-on and `(None, slot)` on note-off, which the
/// engine uses to push or clear frequencies.
///
/// ## Example
///
/// ```rust
/// use wavestack_synth::{NoteAllocator, NoteOn};
///
/// let mut alloc: NoteAllocator<2> = NoteAllocator::new();
/// let mut pushes = Vec::new();
///
/// assert_eq!(alloc.note_on(60, |k, s| pushes.push((k, s))), NoteOn::Assigned { slot: 0 });
/// assert_eq!(alloc.note_on(60, |k, s| pushes.push((k, s))), NoteOn::AlreadyHeld { slot: 0 });
/// assert_eq!(pushes, vec![(Some(60), 0)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAllocator<const N: usize> {
    slots: [Option<u8>; N],
}

impl<const N: usize> Default for NoteAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NoteAllocator<N> {
    /// Create an allocator with every slot free.
    pub fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Assign `key` to the first free slot.
    pub fn note_on(&mut self, key: u8, mut push: impl FnMut(Option<u8>, usize)) -> NoteOn {
        if key > MAX_KEY {
            return NoteOn::Rejected;
        }
        if let Some(slot) = self.slot_of(key) {
            return NoteOn::AlreadyHeld { slot };
        }

        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(key);
                push(Some(key), slot);
                NoteOn::Assigned { slot }
            }
            None => NoteOn::Dropped,
        }
    }

    /// Free the slot held by `key`.
    pub fn note_off(&mut self, key: u8, mut push: impl FnMut(Option<u8>, usize)) -> NoteOff {
        if key > MAX_KEY {
            return NoteOff::Rejected;
        }

        match self.slot_of(key) {
            Some(slot) => {
                push(None, slot);
                self.slots[slot] = None;
                NoteOff::Released { slot }
            }
            None => NoteOff::NotHeld,
        }
    }

    /// Slot held by `key`, if any.
    pub fn slot_of(&self, key: u8) -> Option<usize> {
        self.slots.iter().position(|&k| k == Some(key))
    }

    /// Key held in `slot`, if any.
    pub fn key_in(&self, slot: usize) -> Option<u8> {
        self.slots.get(slot).copied().flatten()
    }

    /// Every slot, `None` where free.
    pub fn slots(&self) -> &[Option<u8>; N] {
        &self.slots
    }

    /// Iterate over `(slot, key)` pairs of occupied slots.
    pub fn held(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| key.map(|k| (slot, k)))
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|k| k.is_some()).count()
    }

    /// True if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// True if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Free every slot without callbacks.
    pub fn clear(&mut self) {
        self.slots = [None; N];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(_: Option<u8>, _: usize) {}

    #[test]
    fn test_first_free_slot() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        assert_eq!(alloc.note_on(60, ignore), NoteOn::Assigned { slot: 0 });
        assert_eq!(alloc.note_on(64, ignore), NoteOn::Assigned { slot: 1 });
        assert_eq!(alloc.note_on(67, ignore), NoteOn::Assigned { slot: 2 });

        alloc.note_off(64, ignore);
        assert_eq!(alloc.note_on(72, ignore), NoteOn::Assigned { slot: 1 });
    }

    #[test]
    fn test_note_on_is_idempotent() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        let mut calls = 0;
        alloc.note_on(60, |_, _| calls += 1);
        let before = alloc.clone();
        assert_eq!(alloc.note_on(60, |_, _| calls += 1), NoteOn::AlreadyHeld { slot: 0 });
        assert_eq!(alloc, before);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_full_buffer_drops() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        for key in 60..68 {
            alloc.note_on(key, ignore);
        }
        assert!(alloc.is_full());
        let before = alloc.clone();

        let mut called = false;
        assert_eq!(alloc.note_on(80, |_, _| called = true), NoteOn::Dropped);
        assert!(!called);
        assert_eq!(alloc, before);
    }

    #[test]
    fn test_note_off_unknown_key() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        alloc.note_on(60, ignore);
        let before = alloc.clone();

        let mut called = false;
        assert_eq!(alloc.note_off(61, |_, _| called = true), NoteOff::NotHeld);
        assert!(!called);
        assert_eq!(alloc, before);
    }

    #[test]
    fn test_note_off_pushes_none() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        alloc.note_on(60, ignore);
        alloc.note_on(62, ignore);

        let mut pushed = None;
        assert_eq!(
            alloc.note_off(62, |k, s| pushed = Some((k, s))),
            NoteOff::Released { slot: 1 }
        );
        assert_eq!(pushed, Some((None, 1)));
        assert_eq!(alloc.key_in(1), None);
        assert_eq!(alloc.occupied(), 1);
    }

    #[test]
    fn test_out_of_range_keys_rejected() {
        let mut alloc: NoteAllocator<8> = NoteAllocator::new();
        assert_eq!(alloc.note_on(128, ignore), NoteOn::Rejected);
        assert_eq!(alloc.note_on(255, ignore), NoteOn::Rejected);
        assert_eq!(alloc.note_off(200, ignore), NoteOff::Rejected);
        assert!(alloc.is_empty());
    }

    #[test]
    fn test_held_iterates_occupied() {
        let mut alloc: NoteAllocator<4> = NoteAllocator::new();
        alloc.note_on(10, ignore);
        alloc.note_on(20, ignore);
        alloc.note_on(30, ignore);
        alloc.note_off(20, ignore);

        let held: Vec<_> = alloc.held().collect();
        assert_eq!(held, vec![(0, 10), (2, 30)]);
    }

    #[test]
    fn test_clear() {
        let mut alloc: NoteAllocator<4> = NoteAllocator::new();
        alloc.note_on(10, ignore);
        alloc.clear();
        assert!(alloc.is_empty());
        assert_eq!(alloc.slot_of(10), None);
    }
}
