use ndarray::{ArrayView3, ArrayViewMut3};

/// A single still image or camera frame: contiguous RGB bytes, row-major.
///
/// Frames are always 3-channel RGB; format conversion happens in the
/// imaging adapter, never in the detection layer. `index` is the frame's
/// position within a live stream (0 for uploaded images).
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

/// RGB channel count. Frames never carry alpha.
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The RGB triple at `(x, y)`. Panics when out of bounds, so callers
    /// clamp first.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y * self.width + x) as usize) * CHANNELS;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_data_mut_allows_modification() {
        let data = vec![0u8; 6]; // 2x1x3
        let mut frame = Frame::new(data, 2, 1, 0);
        frame.data_mut()[0] = 255;
        assert_eq!(frame.data()[0], 255);
    }

    #[test]
    fn test_clone_is_independent() {
        let data = vec![100u8; 12];
        let frame = Frame::new(data, 2, 2, 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 0);
    }

    #[test]
    fn test_pixel_access() {
        // 2x2 RGB: set pixel (x=0, y=1) to red
        let mut data = vec![0u8; 12];
        data[6] = 255; // row 1, col 0, R
        let frame = Frame::new(data, 2, 2, 0);
        assert_eq!(frame.pixel(0, 1), [255, 0, 0]);
        assert_eq!(frame.pixel(1, 1), [0, 0, 0]);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let data = vec![0u8; 12]; // 2x2x3
        let mut frame = Frame::new(data, 2, 2, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128; // row=0, col=1, B channel
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
        assert_eq!(frame.pixel(1, 0), [0, 0, 128]);
    }

    #[test]
    fn test_into_data_returns_buffer() {
        let data = vec![9u8; 12];
        let frame = Frame::new(data.clone(), 2, 2, 0);
        assert_eq!(frame.into_data(), data);
    }
}
