#![allow(dead_code)]

use imutab::core::{ChannelType, Frame, Label, Xyz};

/// Frame stamped with the full 11-bit timestamp `full`
pub fn frame_at(full: u16, unit: u8, ty: ChannelType, len: usize) -> Frame {
    let samples = (0..len as i16).map(|i| Xyz::new(i, 2 * i, -i)).collect();
    Frame::new(
        (full % 256) as u8,
        Label::compose((full / 256) as u8, unit, ty),
        samples,
    )
}
