//! ANT+ FE-C (Fitness Equipment Control) broadcast engine.
//!
//! Implements the transmit side of the FE-C device profile: page encoding,
//! the pattern-C page rotation, and decoding of control pages sent back by
//! a paired head unit or app. The radio itself stays behind the
//! [`PageTransport`] trait.

pub mod broadcaster;
pub mod commands;
pub mod pages;
pub mod scheduler;

pub use broadcaster::FecBroadcaster;
pub use commands::{decode, ControlCommand};
pub use pages::{Page, TrainerState};
pub use scheduler::{page_for_tick, PageKind};

use thiserror::Error;

/// ANT+ device type for fitness equipment.
pub const FITNESS_EQUIPMENT_TYPE: u8 = 17;

/// Channel period in 1/32768 s counts (8192 = 0.25 s broadcast cadence).
pub const CHANNEL_PERIOD: u16 = 8192;

/// RF frequency offset from 2400 MHz.
pub const RF_FREQUENCY: u8 = 57;

/// Errors from the radio transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Broadcast could not be handed to the radio
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Inbound poll failed
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Radio channel is closed or unassigned
    #[error("channel closed")]
    ChannelClosed,
}

/// Seam for the physical radio/USB transport.
///
/// Implementations hand fully encoded 8-byte pages to an open ANT channel
/// and surface acknowledged data pages received from the peer.
pub trait PageTransport: Send {
    /// Queue one broadcast page for the current channel period.
    fn send_broadcast(&mut self, page: Page) -> Result<(), TransportError>;

    /// Fetch the next inbound page, if any arrived since the last poll.
    fn poll_inbound(&mut self) -> Result<Option<Page>, TransportError>;
}
