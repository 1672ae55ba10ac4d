pub mod async_demux;
pub mod channel;
pub mod demux;

pub use async_demux::{AsyncDemultiplexer, AsyncFileWriter, ChannelWriter, WriterFactory};
pub use channel::{route, ChannelProcessor, Step};
pub use demux::{Demultiplexer, FrameOutcome, RunSummary};
