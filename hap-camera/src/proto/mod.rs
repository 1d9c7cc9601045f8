//! Sans-I/O camera RTP stream management.
//!
//! [`CameraStreamManagement`] answers the writes a controller makes to the
//! stream management characteristics and queues every value the accessory has
//! to publish in return. It performs no I/O of its own apart from what its
//! [`MediaSender`] does. The caller is responsible for:
//!
//! 1. **Inbound writes**: passing each characteristic write to `handle_read()`
//! 2. **Outbound values**: publishing everything `poll_write()` yields
//! 3. **Events**: observing session transitions through `poll_event()`
//!
//! # Session lifecycle
//!
//! 1. The controller writes SetupEndpoints; a session is stored and the
//!    response is queued as a new SetupEndpoints value.
//! 2. The controller writes SelectedRTPStreamConfiguration with a start
//!    request; the media sender is started and the streaming status published.
//! 3. Reconfigure requests restart the sender with new parameters.
//! 4. A stop request terminates the sender and forgets the session.
//!
//! ```rust
//! use hap_camera::{CameraConfig, CameraStreamManagement, Characteristic, FfmpegSender};
//! use sansio::Protocol;
//!
//! let mut camera = CameraStreamManagement::new(CameraConfig::default(), FfmpegSender::new());
//!
//! // Capability values and the initial status are published up front.
//! let mut published = vec![];
//! while let Some(value) = camera.poll_write() {
//!     published.push(value.characteristic);
//! }
//! assert_eq!(
//!     published,
//!     vec![
//!         Characteristic::SupportedRtpConfiguration,
//!         Characteristic::SupportedVideoStreamConfiguration,
//!         Characteristic::SupportedAudioStreamConfiguration,
//!         Characteristic::StreamingStatus,
//!     ]
//! );
//! ```

#[cfg(test)]
mod proto_test;

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use shared::error::{Error, Result};
use shared::util::{from_base64, to_base64};

use crate::capability::Capabilities;
use crate::config::CameraConfig;
use crate::endpoint::{EndpointNegotiator, Negotiated};
use crate::message::StreamingStatus;
use crate::sender::MediaSender;
use crate::session::{SessionId, SessionStore};
use crate::snapshot::SnapshotProvider;
use crate::stream::{StreamController, StreamTransition};

/// Stream management characteristics this layer reads or writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Characteristic {
    StreamingStatus,
    SupportedRtpConfiguration,
    SupportedVideoStreamConfiguration,
    SupportedAudioStreamConfiguration,
    SelectedRtpStreamConfiguration,
    SetupEndpoints,
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Characteristic::StreamingStatus => "StreamingStatus",
            Characteristic::SupportedRtpConfiguration => "SupportedRTPConfiguration",
            Characteristic::SupportedVideoStreamConfiguration => {
                "SupportedVideoStreamConfiguration"
            }
            Characteristic::SupportedAudioStreamConfiguration => {
                "SupportedAudioStreamConfiguration"
            }
            Characteristic::SelectedRtpStreamConfiguration => "SelectedRTPStreamConfiguration",
            Characteristic::SetupEndpoints => "SetupEndpoints",
        };
        write!(f, "{s}")
    }
}

/// A characteristic value as it travels over the accessory transport:
/// base64 text of a TLV8 blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacteristicValue {
    pub characteristic: Characteristic,
    pub value: String,
}

impl CharacteristicValue {
    pub fn new(characteristic: Characteristic, raw: &[u8]) -> Self {
        Self {
            characteristic,
            value: to_base64(raw),
        }
    }

    /// Decodes the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        from_base64(&self.value)
    }
}

/// Observable outcomes of handled writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraEvent {
    SessionConfigured(SessionId),
    StreamStarted(SessionId),
    StreamReconfigured(SessionId),
    StreamStopped(SessionId),
    StreamingStatusChanged(StreamingStatus),
}

/// Camera RTP stream management for one accessory.
pub struct CameraStreamManagement<S: MediaSender> {
    config: CameraConfig,
    capabilities: Capabilities,
    negotiator: EndpointNegotiator,
    controller: StreamController<S>,
    sessions: SessionStore,
    snapshot: Option<Box<dyn SnapshotProvider>>,

    /// Last value of each write-triggered characteristic.
    setup_response: Option<String>,
    selected_configuration: Option<String>,

    write_outs: VecDeque<CharacteristicValue>,
    event_outs: VecDeque<CameraEvent>,
    closed: bool,
}

impl<S: MediaSender> CameraStreamManagement<S> {
    /// Builds the capability values from `config` and queues them, followed
    /// by the initial streaming status.
    pub fn new(config: CameraConfig, sender: S) -> Self {
        let capabilities = Capabilities::new(&config);
        let negotiator = EndpointNegotiator::new(config.srtp, config.address);
        let controller = StreamController::new(sender, config.max_concurrent_streams);

        let mut write_outs = VecDeque::new();
        write_outs.push_back(CharacteristicValue::new(
            Characteristic::SupportedRtpConfiguration,
            &capabilities.transport_security,
        ));
        write_outs.push_back(CharacteristicValue::new(
            Characteristic::SupportedVideoStreamConfiguration,
            &capabilities.video,
        ));
        write_outs.push_back(CharacteristicValue::new(
            Characteristic::SupportedAudioStreamConfiguration,
            &capabilities.audio,
        ));
        write_outs.push_back(CharacteristicValue::new(
            Characteristic::StreamingStatus,
            &controller.get_streaming_status(),
        ));

        Self {
            config,
            capabilities,
            negotiator,
            controller,
            sessions: SessionStore::new(),
            snapshot: None,
            setup_response: None,
            selected_configuration: None,
            write_outs,
            event_outs: VecDeque::new(),
            closed: false,
        }
    }

    pub fn with_snapshot_provider(mut self, provider: Box<dyn SnapshotProvider>) -> Self {
        self.snapshot = Some(provider);
        self
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sender(&self) -> &S {
        self.controller.sender()
    }

    pub fn sender_mut(&mut self) -> &mut S {
        self.controller.sender_mut()
    }

    pub fn streaming_status(&self) -> StreamingStatus {
        self.controller.status()
    }

    /// Encoded streaming status blob.
    pub fn get_streaming_status(&self) -> Bytes {
        self.controller.get_streaming_status()
    }

    /// Current base64 value of `characteristic`, as a read would return it.
    pub fn value(&self, characteristic: Characteristic) -> Option<String> {
        match characteristic {
            Characteristic::StreamingStatus => Some(to_base64(&self.get_streaming_status())),
            Characteristic::SupportedRtpConfiguration => {
                Some(to_base64(&self.capabilities.transport_security))
            }
            Characteristic::SupportedVideoStreamConfiguration => {
                Some(to_base64(&self.capabilities.video))
            }
            Characteristic::SupportedAudioStreamConfiguration => {
                Some(to_base64(&self.capabilities.audio))
            }
            Characteristic::SelectedRtpStreamConfiguration => self.selected_configuration.clone(),
            Characteristic::SetupEndpoints => self.setup_response.clone(),
        }
    }

    /// Runs one setup endpoints exchange on a raw TLV8 request.
    ///
    /// The response is returned and also queued as the new SetupEndpoints value.
    pub fn negotiate(&mut self, request: &[u8]) -> Result<Bytes> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        let before = self.controller.status();
        let Negotiated {
            session_id,
            response,
        } = self.negotiator.negotiate(request, &mut self.sessions)?;

        let value = CharacteristicValue::new(Characteristic::SetupEndpoints, &response);
        self.setup_response = Some(value.value.clone());
        self.write_outs.push_back(value);
        self.event_outs
            .push_back(CameraEvent::SessionConfigured(session_id));

        // setup over a streaming session drops its sender
        if self.controller.refresh_status(&self.sessions) != before {
            self.publish_status();
        }
        Ok(response)
    }

    /// Handles one selected stream configuration write on a raw TLV8 value.
    pub fn handle_selected_configuration(&mut self, value: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        let before = self.controller.status();
        let result = self
            .controller
            .handle_selected_configuration(value, &mut self.sessions);

        match result {
            Ok(transition) => {
                self.event_outs.push_back(match transition {
                    StreamTransition::Started(id) => CameraEvent::StreamStarted(id),
                    StreamTransition::Reconfigured(id) => CameraEvent::StreamReconfigured(id),
                    StreamTransition::Stopped(id) => CameraEvent::StreamStopped(id),
                });
                self.publish_status();
                Ok(())
            }
            Err(err) => {
                if self.controller.status() != before {
                    self.publish_status();
                }
                Err(err)
            }
        }
    }

    /// Still image for the requested size from the configured provider.
    pub fn get_snapshot(&mut self, width: u16, height: u16) -> Result<Bytes> {
        match self.snapshot.as_mut() {
            Some(provider) => provider.snapshot(width, height),
            None => Err(Error::ErrNoSnapshotProvider),
        }
    }

    fn publish_status(&mut self) {
        let status = self.controller.status();
        log::debug!("streaming status {status}");
        self.write_outs.push_back(CharacteristicValue::new(
            Characteristic::StreamingStatus,
            &self.controller.get_streaming_status(),
        ));
        self.event_outs
            .push_back(CameraEvent::StreamingStatusChanged(status));
    }
}

/// A write to one of the stream management characteristics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacteristicWrite {
    pub characteristic: Characteristic,
    /// Base64 text of a TLV8 blob.
    pub value: String,
}

impl<S: MediaSender> sansio::Protocol<CharacteristicWrite, (), ()> for CameraStreamManagement<S> {
    type Rout = ();
    type Wout = CharacteristicValue;
    type Eout = CameraEvent;
    type Error = Error;
    type Time = Instant;

    /// Routes a controller write to the negotiator or the stream controller.
    ///
    /// Only SetupEndpoints and SelectedRTPStreamConfiguration are writable;
    /// writes to the read-only characteristics are rejected.
    fn handle_read(&mut self, msg: CharacteristicWrite) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        let raw = from_base64(&msg.value)?;
        match msg.characteristic {
            Characteristic::SetupEndpoints => {
                self.negotiate(&raw)?;
            }
            Characteristic::SelectedRtpStreamConfiguration => {
                self.selected_configuration = Some(msg.value);
                self.handle_selected_configuration(&raw)?;
            }
            other => {
                return Err(Error::Other(format!("{other} is not writable")));
            }
        }
        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    fn handle_write(&mut self, _msg: ()) -> Result<()> {
        Ok(())
    }

    /// Next characteristic value to publish.
    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.write_outs.pop_front()
    }

    fn handle_event(&mut self, _evt: ()) -> Result<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.event_outs.pop_front()
    }

    /// Nothing in stream management is timer driven.
    fn handle_timeout(&mut self, _now: Self::Time) -> Result<()> {
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        None
    }

    /// Stops every running stream and forgets all sessions.
    ///
    /// The final `Available` status stays queued so it can still be
    /// published; later writes fail with [`Error::ErrClosed`].
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.controller.stop_all(&mut self.sessions);
        self.event_outs.clear();
        self.publish_status();
        result
    }
}
