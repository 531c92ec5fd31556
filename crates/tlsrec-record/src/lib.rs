#![forbid(unsafe_code)]
#![doc = "TLS/SSL record protection with blocking stream and non-blocking engine front ends."]

pub mod alert;
pub mod config;
pub mod debug;
pub mod engine;
pub mod handshake;
pub mod record;
pub mod session;
pub mod stream;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use config::{RecordConfig, RecordConfigBuilder};
pub use debug::{DebugFlags, DebugSink};
pub use engine::buffer::Buffer;
pub use engine::{EngineResult, HandshakeStatus, RecordEngine, Status};
pub use record::{ContentType, Epoch, EpochKeys, InboundRecord};
pub use session::{CachedSession, SessionCache};
pub use stream::RecordStream;
pub use tlsrec_types::{ProtocolVersion, TlsError};
