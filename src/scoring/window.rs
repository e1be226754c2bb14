use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub ok: bool,
    pub err_cents: f64,
}

/// Recent in-tune judgments for the best-matching target, used to debounce detector noise.
#[derive(Clone, Debug)]
pub struct StabilityWindow {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl StabilityWindow {
    pub fn new(capacity: usize) -> Self {
        StabilityWindow {
            frames: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a frame, dropping the oldest once the window is full.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn ok_count(&self) -> usize {
        self.frames.iter().filter(|f| f.ok).count()
    }

    pub fn is_stable(&self, required_ok: usize) -> bool {
        self.ok_count() >= required_ok
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
