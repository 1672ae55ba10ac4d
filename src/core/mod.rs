pub mod channel;
pub mod frame;

pub use channel::{ChannelId, ChannelState, ChannelType};
pub use frame::{Frame, FrameError, Label, Xyz, FRAME_HEADER_BYTES, SAMPLE_BYTES};
