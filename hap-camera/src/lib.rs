//! # hap-camera
//!
//! A sans-I/O implementation of camera RTP stream management for smart-home
//! accessories.
//!
//! A controller (typically a phone) talks to a camera accessory through a
//! handful of characteristics whose values are base64 encoded TLV8 blobs.
//! This crate implements what happens behind them:
//!
//! - **Capability advertisement**: the supported SRTP, video and audio
//!   configurations, built once from a [`CameraConfig`]
//! - **Endpoint negotiation**: answering SetupEndpoints writes with this
//!   accessory's address, the agreed SRTP keys and fresh SSRCs
//! - **Stream control**: starting, reconfiguring and stopping a
//!   [`MediaSender`] process per session, and publishing the streaming status
//!
//! ## Sans-I/O Design
//!
//! [`CameraStreamManagement`] implements [`sansio::Protocol`]. It never owns
//! the accessory transport; the caller is responsible for:
//!
//! 1. Passing characteristic writes to `handle_read()`
//! 2. Publishing the values returned by `poll_write()`
//! 3. Processing events from `poll_event()`
//!
//! The only side effects happen in the [`MediaSender`] it is given, which
//! keeps the state machine testable with a mock sender.
//!
//! ## Quick Start
//!
//! ```rust
//! use hap_camera::{CameraConfig, CameraStreamManagement, Characteristic, FfmpegSender};
//! use sansio::Protocol;
//!
//! let config = CameraConfig::default()
//!     .with_address("192.168.1.20".parse().unwrap())
//!     .with_srtp(true);
//! let mut camera = CameraStreamManagement::new(config, FfmpegSender::new());
//!
//! // Publish the capability values before any controller connects.
//! while let Some(value) = camera.poll_write() {
//!     println!("{} = {}", value.characteristic, value.value);
//! }
//!
//! assert_eq!(
//!     camera.value(Characteristic::StreamingStatus).as_deref(),
//!     Some("AQEA")
//! );
//! ```
//!
//! ## Threading
//!
//! All methods take `&mut self`. Hosts that dispatch characteristic writes
//! from several threads wrap one instance per accessory in a
//! [`Mutex`](std::sync::Mutex), so that two start requests for the same
//! session can never both attach a process.

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod capability;
pub mod config;
pub mod endpoint;
pub mod message;
pub(crate) mod proto;
pub mod sender;
pub mod session;
pub mod snapshot;
pub mod stream;

pub use capability::{
    Capabilities, CapabilityWarning, build_audio_options, build_transport_security_options,
    build_video_options,
};
pub use config::{AudioCodecConfig, AudioConfig, CameraConfig, Resolution, VideoConfig};
pub use endpoint::{EndpointNegotiator, Negotiated};
pub use proto::{
    CameraEvent, CameraStreamManagement, Characteristic, CharacteristicValue, CharacteristicWrite,
};
pub use sender::ffmpeg::FfmpegSender;
pub use sender::{MediaSender, StreamCommand, StreamProcess};
pub use session::{SessionId, SessionRecord, SessionState, SessionStore, SrtpKeys};
pub use snapshot::{FileSnapshot, SnapshotProvider};
pub use stream::{StreamController, StreamTransition};

pub use shared::error::{Error, Result};
