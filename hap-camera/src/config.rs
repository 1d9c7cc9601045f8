//! Configuration of a camera accessory's stream management.
//!
//! [`CameraConfig`] describes what the camera can stream and where it streams
//! from. It is immutable once handed to
//! [`CameraStreamManagement::new`](crate::CameraStreamManagement::new), and is
//! deserializable so it can live in a JSON file:
//!
//! ```rust
//! use hap_camera::CameraConfig;
//!
//! let config: CameraConfig = serde_json::from_str(r#"{
//!     "address": "192.168.1.20",
//!     "srtp": true,
//!     "video": {
//!         "profiles": ["baseline", "main"],
//!         "levels": ["3.1"],
//!         "resolutions": [[1280, 720, 30], [640, 360, 30]]
//!     },
//!     "audio": {
//!         "codecs": [{ "codec": "OPUS", "sample_rate": 24 }],
//!         "comfort_noise": false
//!     }
//! }"#).unwrap();
//!
//! assert!(config.srtp);
//! assert_eq!(config.video.resolutions.len(), 2);
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::message::{H264Level, H264Profile};

/// Width used when a selected configuration does not carry one.
pub const DEFAULT_WIDTH: u16 = 1280;
/// Height used when a selected configuration does not carry one.
pub const DEFAULT_HEIGHT: u16 = 720;
/// Video bit rate in kbps used when a selected configuration does not carry one.
pub const DEFAULT_VIDEO_BIT_RATE: u16 = 300;
/// Frame rates above this are clamped.
pub const MAX_FRAME_RATE: u8 = 30;

/// One advertised video resolution: `(width, height, frame rate)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution(pub u16, pub u16, pub u8);

impl Resolution {
    pub fn width(&self) -> u16 {
        self.0
    }

    pub fn height(&self) -> u16 {
        self.1
    }

    pub fn frame_rate(&self) -> u8 {
        self.2
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub profiles: Vec<H264Profile>,
    pub levels: Vec<H264Level>,
    pub resolutions: Vec<Resolution>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            profiles: vec![H264Profile::Baseline, H264Profile::Main, H264Profile::High],
            levels: vec![H264Level::Level3_1, H264Level::Level3_2, H264Level::Level4_0],
            resolutions: vec![
                Resolution(1920, 1080, 30),
                Resolution(1280, 720, 30),
                Resolution(640, 360, 30),
                Resolution(320, 240, 15),
            ],
        }
    }
}

/// A requested audio codec entry.
///
/// `codec` is matched by name; entries the encoder cannot advertise are
/// skipped with a warning rather than rejected here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCodecConfig {
    pub codec: String,
    /// Sample rate in kHz.
    pub sample_rate: u32,
}

impl AudioCodecConfig {
    pub fn new(codec: &str, sample_rate: u32) -> Self {
        Self {
            codec: codec.to_string(),
            sample_rate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub codecs: Vec<AudioCodecConfig>,
    pub comfort_noise: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            codecs: vec![AudioCodecConfig::new("OPUS", 24)],
            comfort_noise: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Address the accessory streams from, advertised in setup responses.
    pub address: IpAddr,

    /// Whether SRTP is offered and negotiated.
    pub srtp: bool,

    pub video: VideoConfig,

    pub audio: AudioConfig,

    /// Sessions allowed to stream at once; `None` means unlimited.
    ///
    /// Once reached, the streaming status reads `InUse` and further start
    /// requests fail with `ErrStreamingBusy`.
    pub max_concurrent_streams: Option<usize>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            srtp: true,
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            max_concurrent_streams: None,
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_srtp(mut self, srtp: bool) -> Self {
        self.srtp = srtp;
        self
    }

    pub fn with_video(mut self, video: VideoConfig) -> Self {
        self.video = video;
        self
    }

    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_max_concurrent_streams(mut self, max: usize) -> Self {
        self.max_concurrent_streams = Some(max);
        self
    }
}
