pub mod chat_client;
pub mod controller;
pub mod formatter;
pub mod transcript;

pub use chat_client::{ChatBackend, ChatClient};
pub use controller::{
    SessionClosed, SessionCommand, SessionController, SessionEvent, SessionHandle,
    SessionOptions, SessionSnapshot, SubmissionPolicy,
};
pub use formatter::{classify, segment, FormattedMessage, MenuSegment};
pub use transcript::Transcript;
