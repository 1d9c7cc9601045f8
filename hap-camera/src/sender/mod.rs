//! The external media sender that turns a negotiated session into RTP packets.
//!
//! The stream controller only ever calls [`MediaSender::start`] and
//! [`MediaSender::stop`]; what runs behind them is opaque to it.

pub mod ffmpeg;
#[cfg(test)]
pub(crate) mod mock;

use std::fmt;
use std::net::IpAddr;

use bytes::Bytes;
use shared::error::Result;

use crate::session::SessionId;
use crate::stream::AudioParameters;

/// A running media sender process, attached to a session while it streams.
pub trait StreamProcess: fmt::Debug + Send {
    /// Operating system id, when there is one.
    fn id(&self) -> Option<u32>;

    /// Requests termination.
    ///
    /// Must be idempotent: once it has succeeded, further calls return `Ok`.
    fn kill(&mut self) -> Result<()>;
}

pub trait MediaSender {
    /// Spawns a process sending to the controller described by `command`.
    fn start(&mut self, command: &StreamCommand) -> Result<Box<dyn StreamProcess>>;

    /// Terminates a process returned by [`MediaSender::start`].
    fn stop(&mut self, process: &mut dyn StreamProcess) -> Result<()> {
        process.kill()
    }
}

/// Effective parameters of one video stream, defaults and clamps applied.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamCommand {
    pub session_id: SessionId,
    pub peer_address: IpAddr,
    pub peer_port: u16,
    pub local_port: u16,
    /// SRTP master key followed by master salt; `None` sends plain RTP.
    pub key_material: Option<Bytes>,
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub bit_rate_kbps: u16,
    pub payload_type: u8,
    pub ssrc: u32,
    pub max_mtu: u16,
    pub audio: Option<AudioParameters>,
}
