pub mod outbound;
pub mod stdio;
pub mod wire;

pub use outbound::ChannelOutbound;
pub use stdio::{pump_inbound, pump_outbound};
pub use wire::{encode_outbound_message, parse_inbound_message};
