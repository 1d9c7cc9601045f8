#[cfg(test)]
mod session_test;

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::util::to_hex;

use crate::message::IpVersion;
use crate::sender::StreamProcess;

/// Opaque identifier chosen by the controller, used verbatim as a store key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Bytes);

impl SessionId {
    pub fn new(raw: impl AsRef<[u8]>) -> Self {
        SessionId(Bytes::copy_from_slice(raw.as_ref()))
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl From<Bytes> for SessionId {
    fn from(raw: Bytes) -> Self {
        SessionId(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex(&self.0))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

/// SRTP master key and salt supplied by the controller for one media stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SrtpKeys {
    pub master_key: Bytes,
    pub master_salt: Bytes,
}

impl SrtpKeys {
    /// Key followed by salt, the form media senders take as SRTP parameters.
    pub fn key_material(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.master_key.len() + self.master_salt.len());
        out.put_slice(&self.master_key);
        out.put_slice(&self.master_salt);
        out.freeze()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Endpoints negotiated, nothing sending.
    Configured,
    /// A media sender process is attached.
    Streaming,
}

/// Everything negotiated for one controller session.
pub struct SessionRecord {
    pub peer_address: IpAddr,
    pub ip_version: IpVersion,
    pub video_port: u16,
    pub audio_port: u16,
    /// `None` when streaming without SRTP.
    pub video_srtp: Option<SrtpKeys>,
    pub audio_srtp: Option<SrtpKeys>,
    pub video_ssrc: u32,
    pub audio_ssrc: u32,
    process: Option<Box<dyn StreamProcess>>,
}

impl SessionRecord {
    pub fn new(
        peer_address: IpAddr,
        video_port: u16,
        audio_port: u16,
        video_srtp: Option<SrtpKeys>,
        audio_srtp: Option<SrtpKeys>,
        video_ssrc: u32,
        audio_ssrc: u32,
    ) -> Self {
        Self {
            ip_version: IpVersion::of(&peer_address),
            peer_address,
            video_port,
            audio_port,
            video_srtp,
            audio_srtp,
            video_ssrc,
            audio_ssrc,
            process: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.process.is_some() {
            SessionState::Streaming
        } else {
            SessionState::Configured
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.process.is_some()
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }

    /// Attaches a running process; a record holds at most one.
    pub(crate) fn attach(&mut self, process: Box<dyn StreamProcess>) -> Option<Box<dyn StreamProcess>> {
        self.process.replace(process)
    }

    pub(crate) fn detach(&mut self) -> Option<Box<dyn StreamProcess>> {
        self.process.take()
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("peer_address", &self.peer_address)
            .field("video_port", &self.video_port)
            .field("audio_port", &self.audio_port)
            .field("srtp", &self.video_srtp.is_some())
            .field("video_ssrc", &self.video_ssrc)
            .field("audio_ssrc", &self.audio_ssrc)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for SessionRecord {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take()
            && let Err(err) = process.kill()
        {
            log::warn!("failed to release media sender of dropped session: {err}");
        }
    }
}

/// Keyed store of negotiated sessions.
///
/// Records are replaced wholesale on insert; an overwritten record releases
/// its attached process when dropped.
#[derive(Default, Debug)]
pub struct SessionStore {
    sessions: HashMap<SessionId, SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, returning whatever was stored under `id` before.
    pub fn insert(&mut self, id: SessionId, record: SessionRecord) -> Option<SessionRecord> {
        self.sessions.insert(id, record)
    }

    pub fn lookup(&self, id: &SessionId) -> Result<&SessionRecord> {
        self.sessions
            .get(id)
            .ok_or_else(|| Error::ErrUnknownSession(id.to_string()))
    }

    pub fn lookup_mut(&mut self, id: &SessionId) -> Result<&mut SessionRecord> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| Error::ErrUnknownSession(id.to_string()))
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<SessionRecord> {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn streaming_count(&self) -> usize {
        self.sessions.values().filter(|r| r.is_streaming()).count()
    }

    /// Whether any stored session already uses `ssrc` for either stream.
    pub fn ssrc_in_use(&self, ssrc: u32) -> bool {
        self.sessions
            .values()
            .any(|r| r.video_ssrc == ssrc || r.audio_ssrc == ssrc)
    }
}
