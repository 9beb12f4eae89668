use ndarray::Array2;

/// One raw depth frame: millimeter samples, row-major, 0 = no data.
///
/// Frames are immutable once pushed into the history buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    data: Array2<u16>,
}

impl DepthFrame {
    #[inline]
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: Array2::zeros((height, width)),
        }
    }

    /// Builds a frame from a row-major sample buffer.
    ///
    /// Returns `None` when the buffer length does not match `width * height`.
    pub fn from_raw(width: usize, height: usize, samples: Vec<u16>) -> Option<Self> {
        let data = Array2::from_shape_vec((height, width), samples).ok()?;
        Some(Self { data })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        self.data.get((y, x)).copied()
    }

    #[inline]
    pub fn samples(&self) -> &Array2<u16> {
        &self.data
    }

    /// True when the frame carries no depth at all (cold-start filler
    /// or a fully occluded view).
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&d| d == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(DepthFrame::from_raw(4, 4, vec![0; 15]).is_none());
        assert!(DepthFrame::from_raw(4, 4, vec![0; 16]).is_some());
    }

    #[test]
    fn get_is_row_major() {
        let mut samples = vec![0u16; 12];
        samples[1 + 2 * 4] = 77; // x=1, y=2, width=4
        let frame = DepthFrame::from_raw(4, 3, samples).unwrap();
        assert_eq!(frame.get(1, 2), Some(77));
        assert_eq!(frame.get(2, 1), Some(0));
        assert_eq!(frame.get(4, 0), None);
    }

    #[test]
    fn zeros_is_empty() {
        assert!(DepthFrame::zeros(8, 8).is_empty());
    }
}
