//! Outbound chunking, inbound reassembly, and the stream id allocator that
//! ties them together.

mod chunker;
mod opts;
mod reader;
mod reassembler;
mod stream_id;

pub(crate) use chunker::{OutboundFrame, build_frames};
pub use opts::{DEFAULT_CHUNK_SIZE, StreamOpts, StreamResult};
pub use reader::{StreamHandle, StreamReader};
pub(crate) use reader::reader_channel;
pub use reassembler::StreamCallback;
pub(crate) use reassembler::Reassembler;
pub(crate) use stream_id::{StreamIdAllocator, is_valid_inbound_parity};
