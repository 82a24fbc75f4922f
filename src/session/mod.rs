// External session websocket
pub mod payload;
pub mod socket;

pub use payload::{FinalMessage, SessionEvent, StreamingUpdate, UserMessage};
pub use socket::{CloseOutcome, SessionSocket, SessionSummary};
