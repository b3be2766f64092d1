//! Packet construction and zero-copy reads.

mod builder;
mod handle;
mod header;
mod reader;

pub use builder::PacketBuilder;
pub use handle::PacketHandle;
pub use header::{Header, PACKET_DEP_KEY, PACKET_ID_KEY};
pub use reader::{HeaderView, PacketReader, PayloadView};
