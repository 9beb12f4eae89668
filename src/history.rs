use crate::error::Error;
use crate::frame::DepthFrame;

/// Fixed-capacity ring of depth frames with a wrapping write cursor.
///
/// Slots are pre-filled with all-zero frames so that reads before the first
/// wrap-around return a deterministic empty frame instead of garbage.
pub struct DepthHistory {
    slots: Vec<DepthFrame>,
    cursor: usize,
    written: usize,
}

impl DepthHistory {
    pub fn new(capacity: usize, width: usize, height: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");

        Self {
            slots: vec![DepthFrame::zeros(width, height); capacity],
            cursor: 0,
            written: 0,
        }
    }

    /// Stores `frame` at the cursor and advances it. O(1), overwrites the
    /// oldest slot once the ring is full.
    pub fn push(&mut self, frame: DepthFrame) {
        self.slots[self.cursor] = frame;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.written = self.written.saturating_add(1);
    }

    /// The frame `delay` pushes in the past; `delay == 0` is the most recent.
    pub fn frame_at(&self, delay: usize) -> Result<&DepthFrame, Error> {
        let n = self.slots.len();
        if delay >= n {
            return Err(Error::OutOfRange {
                index: delay,
                limit: n,
            });
        }

        let idx = (self.cursor + n - 1 - delay) % n;
        Ok(&self.slots[idx])
    }

    #[inline]
    pub fn latest(&self) -> &DepthFrame {
        self.frame_at(0).expect("capacity is non-zero")
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of frames pushed so far, saturating at the ring capacity.
    #[inline]
    pub fn len(&self) -> usize {
        self.written.min(self.slots.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// True until the ring has wrapped once; older slots still hold the
    /// cold-start filler frames.
    #[inline]
    pub fn is_warming_up(&self) -> bool {
        self.written < self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: u16, w: usize, h: usize) -> DepthFrame {
        DepthFrame::from_raw(w, h, vec![value; w * h]).unwrap()
    }

    #[test]
    fn frame_at_zero_is_last_push() {
        let mut history = DepthHistory::new(4, 2, 2);
        for v in 1..=9u16 {
            history.push(flat(v, 2, 2));
            assert_eq!(history.frame_at(0).unwrap().get(0, 0), Some(v));
        }
    }

    #[test]
    fn delay_at_capacity_is_out_of_range() {
        let mut history = DepthHistory::new(4, 2, 2);
        history.push(flat(1, 2, 2));

        assert!(matches!(
            history.frame_at(4),
            Err(Error::OutOfRange { index: 4, limit: 4 })
        ));
        assert!(history.frame_at(3).is_ok());
    }

    #[test]
    fn cold_start_slots_are_zero_frames() {
        let mut history = DepthHistory::new(8, 2, 2);
        history.push(flat(42, 2, 2));

        assert!(history.is_warming_up());
        for delay in 1..8 {
            assert!(history.frame_at(delay).unwrap().is_empty());
        }
    }

    #[test]
    fn ramp_then_spike_scenario() {
        // Fill a capacity-1024 ring with a ramp, then push one all-500 frame.
        let cap = 1024;
        let mut history = DepthHistory::new(cap, 4, 4);
        for v in 0..cap as u16 {
            history.push(flat(v, 4, 4));
        }

        history.push(flat(500, 4, 4));

        assert_eq!(history.frame_at(0).unwrap().get(0, 0), Some(500));
        assert_eq!(
            history.frame_at(1).unwrap().get(0, 0),
            Some((cap - 1) as u16)
        );
    }

    #[test]
    fn len_saturates_at_capacity() {
        let mut history = DepthHistory::new(3, 1, 1);
        assert!(history.is_empty());

        for _ in 0..10 {
            history.push(flat(1, 1, 1));
        }

        assert_eq!(history.len(), 3);
        assert!(!history.is_warming_up());
    }
}
