//! Triple buffer between the simulation and render threads.
//!
//! Three slots rotate between a writer, a reader and a shared free slot.
//! The writer always has a slot to fill and the reader always has a slot to
//! draw from; neither ever blocks on the other beyond a brief mutex on the
//! free-slot exchange. Each slot carries the frame timestamp it was written
//! at, so the reader always advances to the newest completed frame and
//! never observes a partial write.
//!
//! If the writer outpaces the reader, intermediate frames are dropped; if
//! the reader outpaces the writer, the same frame is read again. Neither is
//! an error.

use std::sync::{Arc, Mutex, PoisonError};

struct FreeSlot<T> {
    item: Box<T>,
    timestamp: u64,
}

struct Shared<T> {
    free: Mutex<FreeSlot<T>>,
}

/// Writer half; owned by the simulation thread
pub struct TripleBufferWriter<T> {
    slot: Box<T>,
    frame_count: u64,
    shared: Arc<Shared<T>>,
}

/// Reader half; owned by the render thread
pub struct TripleBufferReader<T> {
    slot: Box<T>,
    timestamp: u64,
    shared: Arc<Shared<T>>,
}

/// Create the writer/reader pair, all three slots holding `initial`
pub fn triple_buffer<T: Clone>(initial: T) -> (TripleBufferWriter<T>, TripleBufferReader<T>) {
    let shared = Arc::new(Shared {
        free: Mutex::new(FreeSlot {
            item: Box::new(initial.clone()),
            timestamp: 0,
        }),
    });

    (
        TripleBufferWriter {
            slot: Box::new(initial.clone()),
            frame_count: 0,
            shared: Arc::clone(&shared),
        },
        TripleBufferReader {
            slot: Box::new(initial),
            timestamp: 0,
            shared,
        },
    )
}

impl<T> TripleBufferWriter<T> {
    /// The slot being staged; contents persist from two frames ago and are
    /// the caller's to reset
    pub fn writable(&mut self) -> &mut T {
        &mut self.slot
    }

    /// Publish the staged slot and take over the free slot for the next
    /// frame
    pub fn write_complete(&mut self) {
        self.frame_count += 1;

        let mut free = self
            .shared
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::swap(&mut self.slot, &mut free.item);
        free.timestamp = self.frame_count;
    }
}

impl<T> TripleBufferReader<T> {
    /// The newest state obtained by the last `read_complete`
    pub fn readable(&self) -> &T {
        &self.slot
    }

    /// Exchange for the free slot if it holds a newer frame
    ///
    /// Before the writer's first `write_complete` this keeps the initial
    /// state.
    pub fn read_complete(&mut self) {
        let mut free = self
            .shared
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if free.timestamp > self.timestamp {
            std::mem::swap(&mut self.slot, &mut free.item);
            std::mem::swap(&mut self.timestamp, &mut free.timestamp);
        }
    }
}

#[cfg(test)]
#[path = "triple_buffer_tests.rs"]
mod tests;
