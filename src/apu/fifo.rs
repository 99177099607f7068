//! Direct-sound FIFO: a 32-byte signed ring buffer fed by 32-bit CPU/DMA
//! writes and drained one byte per timer-overflow pulse.

use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct DirectSoundFifo {
    queue: VecDeque<i8>,
    pub current_sample: i8,
}

const CAPACITY: usize = 32;

impl DirectSoundFifo {
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current_sample = 0;
    }

    pub fn push_word(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            if self.queue.len() >= CAPACITY {
                self.queue.pop_front();
            }
            self.queue.push_back(byte as i8);
        }
    }

    pub fn pop(&mut self) {
        if let Some(b) = self.queue.pop_front() {
            self.current_sample = b;
        }
    }

    pub fn needs_refill(&self) -> bool {
        self.queue.len() <= 16
    }
}
