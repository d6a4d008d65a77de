use std::sync::atomic::{AtomicU8, Ordering};

/// Thread-safe source of 8-bit identifiers.
///
/// Yields consecutive values and wraps from 255 back to 0. Used for packet
/// identifiers and for the ident bytes of CHAP and MS-CHAP attributes. Share
/// it through an `Arc` to draw from one sequence in several places.
#[derive(Debug, Default)]
pub struct IdSequence {
    next: AtomicU8,
}

impl IdSequence {
    /// Sequence starting at a random value
    pub fn new() -> Self {
        Self::starting_at(rand::random())
    }

    pub fn starting_at(first: u8) -> Self {
        IdSequence {
            next: AtomicU8::new(first),
        }
    }

    pub fn next(&self) -> u8 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
