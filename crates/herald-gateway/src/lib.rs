pub mod connection;
pub mod registry;

pub use registry::{ChannelHandle, ConnId, ConnectionRegistry, PushError};
