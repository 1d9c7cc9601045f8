//! Wire constants for the camera RTP stream management characteristics.
//!
//! Tag numbers are grouped per nesting level; enumerated values carried
//! inside items are typed enums.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

/// Top level of a setup endpoints write and its response.
pub mod setup {
    pub const SESSION_ID: u8 = 0x01;
    pub const STATUS: u8 = 0x02;
    pub const ADDRESS: u8 = 0x03;
    pub const VIDEO_SRTP_PARAMS: u8 = 0x04;
    pub const AUDIO_SRTP_PARAMS: u8 = 0x05;
    pub const VIDEO_SSRC: u8 = 0x06;
    pub const AUDIO_SSRC: u8 = 0x07;
}

/// Controller or accessory address block.
pub mod address {
    pub const IP_VERSION: u8 = 0x01;
    pub const ADDRESS: u8 = 0x02;
    pub const VIDEO_RTP_PORT: u8 = 0x03;
    pub const AUDIO_RTP_PORT: u8 = 0x04;
}

/// SRTP parameter block.
pub mod srtp {
    pub const CRYPTO_SUITE: u8 = 0x01;
    pub const MASTER_KEY: u8 = 0x02;
    pub const MASTER_SALT: u8 = 0x03;
}

/// Supported RTP configuration.
pub mod rtp_config {
    pub const CRYPTO_SUITE: u8 = 0x02;
}

/// Streaming status characteristic.
pub mod status {
    pub const STATUS: u8 = 0x01;
}

/// Selected RTP stream configuration, top level.
pub mod selected {
    pub const SESSION: u8 = 0x01;
    pub const VIDEO: u8 = 0x02;
    pub const AUDIO: u8 = 0x03;
}

/// Session control block of a selected configuration.
pub mod session_control {
    pub const SESSION_ID: u8 = 0x01;
    pub const COMMAND: u8 = 0x02;
}

/// Supported video configuration list marker.
pub mod video_config {
    pub const CONFIGURATION: u8 = 0x01;
}

/// Video codec configuration block.
pub mod video {
    pub const CODEC: u8 = 0x01;
    pub const CODEC_PARAMS: u8 = 0x02;
    pub const ATTRIBUTES: u8 = 0x03;
    pub const RTP_PARAMS: u8 = 0x04;
}

/// H.264 codec parameters.
pub mod video_codec_params {
    pub const PROFILE_ID: u8 = 0x01;
    pub const LEVEL: u8 = 0x02;
    pub const PACKETIZATION_MODE: u8 = 0x03;
    pub const CVO_ENABLED: u8 = 0x04;
    pub const CVO_ID: u8 = 0x05;
}

/// Video attributes (one resolution).
pub mod video_attributes {
    pub const IMAGE_WIDTH: u8 = 0x01;
    pub const IMAGE_HEIGHT: u8 = 0x02;
    pub const FRAME_RATE: u8 = 0x03;
}

/// RTP parameters, shared by the video and audio blocks.
pub mod rtp_params {
    pub const PAYLOAD_TYPE: u8 = 0x01;
    pub const SSRC: u8 = 0x02;
    pub const MAX_BIT_RATE: u8 = 0x03;
    pub const RTCP_SEND_INTERVAL: u8 = 0x04;
    pub const MAX_MTU: u8 = 0x05;
    pub const COMFORT_NOISE_PAYLOAD_TYPE: u8 = 0x06;
}

/// Supported audio configuration, top level.
pub mod audio_config {
    pub const CODEC_CONFIGURATION: u8 = 0x01;
    pub const COMFORT_NOISE_SUPPORT: u8 = 0x02;
}

/// Audio codec configuration block.
pub mod audio {
    pub const CODEC: u8 = 0x01;
    pub const CODEC_PARAMS: u8 = 0x02;
    pub const RTP_PARAMS: u8 = 0x03;
    pub const COMFORT_NOISE: u8 = 0x04;
}

/// Audio codec parameters.
pub mod audio_codec_params {
    pub const CHANNELS: u8 = 0x01;
    pub const BIT_RATE: u8 = 0x02;
    pub const SAMPLE_RATE: u8 = 0x03;
    pub const PACKET_TIME: u8 = 0x04;
}

/// Result code of a setup endpoints response.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SetupStatus {
    Success = 0,
    Busy = 1,
    Error = 2,
}

/// Address family tag of an address block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IpVersion {
    V4 = 0,
    V6 = 1,
}

impl IpVersion {
    pub fn of(addr: &std::net::IpAddr) -> Self {
        if addr.is_ipv4() {
            IpVersion::V4
        } else {
            IpVersion::V6
        }
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(IpVersion::V4),
            1 => Ok(IpVersion::V6),
            _ => Err(Error::ErrInvalidFieldValue {
                name: "ip version",
                value: v.to_string(),
            }),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CryptoSuite {
    AesCm128HmacSha1_80 = 0,
    AesCm256HmacSha1_80 = 1,
    None = 2,
}

impl TryFrom<u8> for CryptoSuite {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(CryptoSuite::AesCm128HmacSha1_80),
            1 => Ok(CryptoSuite::AesCm256HmacSha1_80),
            2 => Ok(CryptoSuite::None),
            _ => Err(Error::ErrInvalidFieldValue {
                name: "crypto suite",
                value: v.to_string(),
            }),
        }
    }
}

impl fmt::Display for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            CryptoSuite::AesCm128HmacSha1_80 => "AES_CM_128_HMAC_SHA1_80",
            CryptoSuite::AesCm256HmacSha1_80 => "AES_CM_256_HMAC_SHA1_80",
            CryptoSuite::None => "NONE",
        };
        write!(f, "{s}")
    }
}

/// Process-wide streaming status published on the streaming status characteristic.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamingStatus {
    #[default]
    Available = 0,
    Streaming = 1,
    InUse = 2,
}

impl fmt::Display for StreamingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            StreamingStatus::Available => "available",
            StreamingStatus::Streaming => "streaming",
            StreamingStatus::InUse => "in use",
        };
        write!(f, "{s}")
    }
}

/// Command byte of the session control block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    Stop = 0,
    Start = 1,
    Reconfigure = 4,
}

impl TryFrom<u8> for RequestKind {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(RequestKind::Stop),
            1 => Ok(RequestKind::Start),
            4 => Ok(RequestKind::Reconfigure),
            _ => Err(Error::ErrUnsupportedRequestKind(v)),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RequestKind::Stop => "stop",
            RequestKind::Start => "start",
            RequestKind::Reconfigure => "reconfigure",
        };
        write!(f, "{s}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum VideoCodec {
    H264 = 0,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum H264Profile {
    Baseline = 0,
    Main = 1,
    High = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum H264Level {
    #[serde(rename = "3.1")]
    Level3_1 = 0,
    #[serde(rename = "3.2")]
    Level3_2 = 1,
    #[serde(rename = "4.0")]
    Level4_0 = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketizationMode {
    NonInterleaved = 0,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioCodec {
    Pcmu = 0,
    Pcma = 1,
    AacEld = 2,
    Opus = 3,
}

impl AudioCodec {
    /// Codecs a controller accepts for live streams.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("OPUS") {
            Some(AudioCodec::Opus)
        } else if name.eq_ignore_ascii_case("AAC-ELD") {
            Some(AudioCodec::AacEld)
        } else {
            None
        }
    }
}

impl TryFrom<u8> for AudioCodec {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(AudioCodec::Pcmu),
            1 => Ok(AudioCodec::Pcma),
            2 => Ok(AudioCodec::AacEld),
            3 => Ok(AudioCodec::Opus),
            _ => Err(Error::ErrInvalidFieldValue {
                name: "audio codec",
                value: v.to_string(),
            }),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioBitRate {
    Variable = 0,
    Constant = 1,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioSampleRate {
    Khz8 = 0,
    Khz16 = 1,
    Khz24 = 2,
}

impl AudioSampleRate {
    pub fn from_khz(khz: u32) -> Option<Self> {
        match khz {
            8 => Some(AudioSampleRate::Khz8),
            16 => Some(AudioSampleRate::Khz16),
            24 => Some(AudioSampleRate::Khz24),
            _ => None,
        }
    }

    pub fn khz(&self) -> u32 {
        match *self {
            AudioSampleRate::Khz8 => 8,
            AudioSampleRate::Khz16 => 16,
            AudioSampleRate::Khz24 => 24,
        }
    }
}

impl TryFrom<u8> for AudioSampleRate {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(AudioSampleRate::Khz8),
            1 => Ok(AudioSampleRate::Khz16),
            2 => Ok(AudioSampleRate::Khz24),
            _ => Err(Error::ErrInvalidFieldValue {
                name: "audio sample rate",
                value: v.to_string(),
            }),
        }
    }
}
