//! Message Router
//!
//! Routes a request [`Message`] to the handler registered for its
//! `(module id, command id)` pair. Handlers validate the exact command size
//! and the available response space before touching any payload, which keeps
//! every command a fixed-size, bounds-checked record.

mod error;
mod message;
mod payload;
mod router;

pub use error::RouterError;
pub use message::{
    CommandId, Message, MessageBuffer, MessageHeader, MessageId, ModuleId, ResponseCode,
    MESSAGE_DATA_MAX_SIZE,
};
pub use payload::{respond_with, try_respond_with, Payload, PayloadReader, PayloadWriter};
pub use router::{
    CommandTableItem, MessageHandler, MessageRouter, MessageRouterConfig, ModuleTable,
};
