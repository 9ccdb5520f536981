pub mod session;
pub mod store;
pub mod transcript;

pub use session::Session;
pub use store::{MemorySessionStore, SessionRef, SessionStore};
pub use transcript::{PairingMode, Transcript, TranscriptExporter, TranscriptPair};
