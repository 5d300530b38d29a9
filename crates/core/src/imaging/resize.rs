use crate::shared::frame::Frame;

/// Target dimensions after bounding: the longer side lands exactly on
/// `max_dimension`, the shorter side scales proportionally (never below 1).
/// Frames already within the bound keep their dimensions.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / longer as f64;
    let scaled = |v: u32| (((v as f64) * scale).round() as u32).clamp(1, max_dimension);
    if width >= height {
        (max_dimension, scaled(height))
    } else {
        (scaled(width), max_dimension)
    }
}

/// Proportionally downscale a frame so `max(width, height) <= max_dimension`.
///
/// Small frames pass through unchanged; upscaling never happens.
pub fn bounded(frame: &Frame, max_dimension: u32) -> Frame {
    let (new_w, new_h) = bounded_dimensions(frame.width(), frame.height(), max_dimension);
    if (new_w, new_h) == (frame.width(), frame.height()) {
        return frame.clone();
    }

    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");
    let resized = image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Triangle);
    Frame::new(resized.into_raw(), new_w, new_h, frame.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![128u8; (width * height * 3) as usize], width, height, 0)
    }

    #[rstest]
    #[case::wide(1600, 900, 800, (800, 450))]
    #[case::tall(900, 1600, 800, (450, 800))]
    #[case::square(2000, 2000, 800, (800, 800))]
    #[case::within_bound(640, 480, 800, (640, 480))]
    #[case::exactly_bound(800, 600, 800, (800, 600))]
    #[case::barely_over(801, 600, 800, (800, 599))]
    #[case::extreme_aspect(8000, 2, 800, (800, 1))]
    fn test_bounded_dimensions(
        #[case] w: u32,
        #[case] h: u32,
        #[case] max: u32,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(bounded_dimensions(w, h, max), expected);
    }

    #[test]
    fn test_bounded_dimensions_never_exceed_max() {
        for (w, h) in [(1234, 777), (777, 1234), (4032, 3024), (800, 801)] {
            let (nw, nh) = bounded_dimensions(w, h, 800);
            assert!(nw.max(nh) <= 800, "{w}x{h} -> {nw}x{nh}");
        }
    }

    #[test]
    fn test_bounded_resizes_oversized_frame() {
        let frame = gray_frame(1600, 1200);
        let out = bounded(&frame, 800);
        assert_eq!(out.width(), 800);
        assert_eq!(out.height(), 600);
        assert_eq!(out.data().len(), 800 * 600 * 3);
    }

    #[test]
    fn test_bounded_preserves_small_frame() {
        let frame = gray_frame(320, 240);
        let out = bounded(&frame, 800);
        assert_eq!(out.width(), 320);
        assert_eq!(out.height(), 240);
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn test_bounded_preserves_uniform_color() {
        let frame = gray_frame(1000, 500);
        let out = bounded(&frame, 800);
        // Triangle filter over a uniform image stays uniform
        assert!(out.data().iter().all(|&v| v == 128));
    }

    #[test]
    fn test_bounded_keeps_frame_index() {
        let frame = Frame::new(vec![0u8; 1000 * 900 * 3], 1000, 900, 42);
        assert_eq!(bounded(&frame, 800).index(), 42);
    }
}
