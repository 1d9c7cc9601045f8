
use std::net::IpAddr;

use bytes::Bytes;
use shared::error::{Error, Result};
use shared::util::random_ssrc;
use tlv8::Tlv8;

use crate::message::{CryptoSuite, IpVersion, SetupStatus, address, setup, srtp};
use crate::session::{SessionId, SessionRecord, SessionStore, SrtpKeys};

/// Peer transport endpoint proposed by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerAddress {
    pub ip_version: IpVersion,
    pub address: IpAddr,
    pub video_port: u16,
    pub audio_port: u16,
}

impl PeerAddress {
    fn decode(block: &Tlv8) -> Result<Self> {
        let ip_version = IpVersion::try_from(block.get_u8(address::IP_VERSION, "ip version")?)?;
        let text = String::from_utf8(block.get(address::ADDRESS, "address")?.to_vec())?;
        let address: IpAddr = text.trim().parse()?;
        if IpVersion::of(&address) != ip_version {
            log::warn!("peer address {address} does not match ip version {ip_version:?}");
        }

        Ok(Self {
            ip_version,
            address,
            video_port: block.get_u16_le(address::VIDEO_RTP_PORT, "video rtp port")?,
            audio_port: block.get_u16_le(address::AUDIO_RTP_PORT, "audio rtp port")?,
        })
    }

    fn encode(&self) -> Tlv8 {
        Tlv8::new()
            .with(address::IP_VERSION, [self.ip_version as u8])
            .with(address::ADDRESS, self.address.to_string())
            .with(address::VIDEO_RTP_PORT, self.video_port.to_le_bytes())
            .with(address::AUDIO_RTP_PORT, self.audio_port.to_le_bytes())
    }
}

/// Decoded setup endpoints write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupEndpointsRequest {
    pub session_id: SessionId,
    pub peer: PeerAddress,
    pub video_srtp: SrtpParams,
    pub audio_srtp: SrtpParams,
}

/// SRTP parameter block as sent by the controller; key and salt are empty
/// when it asked for no encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SrtpParams {
    pub crypto_suite: CryptoSuite,
    pub master_key: Bytes,
    pub master_salt: Bytes,
}

impl SrtpParams {
    fn decode(block: &Tlv8) -> Result<Self> {
        let crypto_suite = CryptoSuite::try_from(block.get_u8(srtp::CRYPTO_SUITE, "crypto suite")?)?;
        Ok(Self {
            crypto_suite,
            master_key: block.find(srtp::MASTER_KEY)?.cloned().unwrap_or_default(),
            master_salt: block.find(srtp::MASTER_SALT)?.cloned().unwrap_or_default(),
        })
    }
}

impl SetupEndpointsRequest {
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let tlv = Tlv8::decode(raw)?;
        Ok(Self {
            session_id: SessionId::from(tlv.get(setup::SESSION_ID, "session id")?.clone()),
            peer: PeerAddress::decode(&tlv.nested(setup::ADDRESS, "address")?)?,
            video_srtp: SrtpParams::decode(&tlv.nested(setup::VIDEO_SRTP_PARAMS, "video srtp params")?)?,
            audio_srtp: SrtpParams::decode(&tlv.nested(setup::AUDIO_SRTP_PARAMS, "audio srtp params")?)?,
        })
    }
}

/// Block sent back for both streams when SRTP is disabled.
pub const NO_SRTP: [u8; 7] = [
    srtp::CRYPTO_SUITE,
    0x01,
    CryptoSuite::None as u8,
    srtp::MASTER_KEY,
    0x00,
    srtp::MASTER_SALT,
    0x00,
];

/// Outcome of a successful setup exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Negotiated {
    pub session_id: SessionId,
    /// Encoded setup endpoints response.
    pub response: Bytes,
}

/// Answers setup endpoints writes on behalf of one accessory.
#[derive(Clone, Debug)]
pub struct EndpointNegotiator {
    srtp: bool,
    address: IpAddr,
}

impl EndpointNegotiator {
    /// `address` is the accessory's own stream address returned to controllers.
    pub fn new(srtp: bool, address: IpAddr) -> Self {
        Self { srtp, address }
    }

    /// Runs one setup exchange, storing the resulting session.
    ///
    /// Nothing is stored when the request fails to decode.
    pub fn negotiate(&self, raw: &[u8], sessions: &mut SessionStore) -> Result<Negotiated> {
        let request = SetupEndpointsRequest::decode(raw).inspect_err(|err| {
            log::error!("rejecting setup endpoints request: {err}");
        })?;
        log::debug!(
            "setup endpoints for session {}: peer {} video port {} audio port {} video suite {} audio suite {}",
            request.session_id,
            request.peer.address,
            request.peer.video_port,
            request.peer.audio_port,
            request.video_srtp.crypto_suite,
            request.audio_srtp.crypto_suite,
        );

        let video_keys = self.keys(&request.video_srtp, "video srtp params")?;
        let audio_keys = self.keys(&request.audio_srtp, "audio srtp params")?;

        let video_ssrc = random_ssrc(|ssrc| sessions.ssrc_in_use(ssrc));
        let audio_ssrc = random_ssrc(|ssrc| ssrc == video_ssrc || sessions.ssrc_in_use(ssrc));

        let own = PeerAddress {
            ip_version: IpVersion::of(&self.address),
            address: self.address,
            video_port: request.peer.video_port,
            audio_port: request.peer.audio_port,
        };
        let response = Tlv8::new()
            .with(setup::SESSION_ID, request.session_id.as_bytes())
            .with(setup::STATUS, [SetupStatus::Success as u8])
            .with_nested(setup::ADDRESS, &own.encode())
            .with(setup::VIDEO_SRTP_PARAMS, Self::srtp_block(video_keys.as_ref()))
            .with(setup::AUDIO_SRTP_PARAMS, Self::srtp_block(audio_keys.as_ref()))
            .with(setup::VIDEO_SSRC, video_ssrc.to_le_bytes())
            .with(setup::AUDIO_SSRC, audio_ssrc.to_le_bytes())
            .encode();

        let record = SessionRecord::new(
            request.peer.address,
            request.peer.video_port,
            request.peer.audio_port,
            video_keys,
            audio_keys,
            video_ssrc,
            audio_ssrc,
        );
        if let Some(previous) = sessions.insert(request.session_id.clone(), record) {
            log::info!(
                "session {} set up again, replacing {:?}",
                request.session_id,
                previous
            );
        }

        Ok(Negotiated {
            session_id: request.session_id,
            response,
        })
    }

    fn keys(&self, params: &SrtpParams, name: &'static str) -> Result<Option<SrtpKeys>> {
        if !self.srtp || params.crypto_suite == CryptoSuite::None {
            return Ok(None);
        }
        for (typ, value) in [
            (srtp::MASTER_KEY, &params.master_key),
            (srtp::MASTER_SALT, &params.master_salt),
        ] {
            if value.is_empty() {
                return Err(Error::ErrMissingRequiredField { name, typ });
            }
        }
        Ok(Some(SrtpKeys {
            master_key: params.master_key.clone(),
            master_salt: params.master_salt.clone(),
        }))
    }

    fn srtp_block(keys: Option<&SrtpKeys>) -> Bytes {
        match keys {
            Some(keys) => Tlv8::new()
                .with(srtp::CRYPTO_SUITE, [CryptoSuite::AesCm128HmacSha1_80 as u8])
                .with(srtp::MASTER_KEY, &keys.master_key)
                .with(srtp::MASTER_SALT, &keys.master_salt)
                .encode(),
            None => Bytes::from_static(&NO_SRTP),
        }
    }
}
