mod transport;

pub use transport::{PacketSink, SessionTransport};
