pub mod reader;
pub mod sink;

pub use reader::{FrameReader, MappedLog};
pub use sink::{output_file_name, scale_samples, ChannelSink, FileSink, MemorySink};
