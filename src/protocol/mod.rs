//! TNS wire protocol module
//!
//! Just enough of the protocol to frame packets, tell their methods apart
//! and follow a server-initiated redirect. Payloads are otherwise opaque.

mod method;
mod packet;
mod redirect;

pub use method::{Method, METHOD_OFFSET};
pub use packet::{declared_length, read_packet, read_ready_packet, FramingMode, Packet, HEADER_LEN};
pub use redirect::{connect_descriptor, extract_redirect, RedirectTarget};
