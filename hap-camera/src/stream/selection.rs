use bytes::Bytes;
use shared::error::Result;
use tlv8::Tlv8;
use tlv8::value::read_f32_le;

use crate::config::{DEFAULT_HEIGHT, DEFAULT_VIDEO_BIT_RATE, DEFAULT_WIDTH, MAX_FRAME_RATE};
use crate::message::*;
use crate::sender::StreamCommand;
use crate::session::{SessionId, SessionRecord};

/// Payload type used when the controller does not pick one.
pub const DEFAULT_PAYLOAD_TYPE: u8 = 99;
/// Largest RTP packet sent when the controller does not cap it.
pub const DEFAULT_MAX_MTU: u16 = 1378;

/// RTP parameters shared by the video and audio blocks.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct RtpParameters {
    pub payload_type: Option<u8>,
    pub ssrc: Option<u32>,
    pub max_bit_rate: Option<u16>,
    /// Seconds between RTCP reports.
    pub rtcp_interval: Option<f32>,
    pub max_mtu: Option<u16>,
    pub comfort_noise_payload_type: Option<u8>,
}

impl RtpParameters {
    fn decode(block: &Tlv8) -> Result<Self> {
        Ok(Self {
            payload_type: block.find_u8(rtp_params::PAYLOAD_TYPE, "payload type")?,
            ssrc: block.find_u32_le(rtp_params::SSRC, "ssrc")?,
            max_bit_rate: block.find_u16_le(rtp_params::MAX_BIT_RATE, "max bit rate")?,
            rtcp_interval: block
                .find(rtp_params::RTCP_SEND_INTERVAL)?
                .map(|raw| read_f32_le("rtcp send interval", raw))
                .transpose()?,
            max_mtu: block.find_u16_le(rtp_params::MAX_MTU, "max mtu")?,
            comfort_noise_payload_type: block.find_u8(
                rtp_params::COMFORT_NOISE_PAYLOAD_TYPE,
                "comfort noise payload type",
            )?,
        })
    }
}

/// Video block of a selected stream configuration; every field is optional.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct VideoParameters {
    pub profile: Option<u8>,
    pub level: Option<u8>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub frame_rate: Option<u8>,
    pub rtp: RtpParameters,
}

impl VideoParameters {
    fn decode(block: &Tlv8) -> Result<Self> {
        let mut params = Self::default();

        if let Some(codec) = block.find_nested(video::CODEC_PARAMS)? {
            params.profile = codec.find_u8(video_codec_params::PROFILE_ID, "profile id")?;
            params.level = codec.find_u8(video_codec_params::LEVEL, "level")?;
        }
        if let Some(attrs) = block.find_nested(video::ATTRIBUTES)? {
            params.width = attrs.find_u16_le(video_attributes::IMAGE_WIDTH, "image width")?;
            params.height = attrs.find_u16_le(video_attributes::IMAGE_HEIGHT, "image height")?;
            params.frame_rate = attrs.find_u8(video_attributes::FRAME_RATE, "frame rate")?;
        }
        if let Some(rtp) = block.find_nested(video::RTP_PARAMS)? {
            params.rtp = RtpParameters::decode(&rtp)?;
        }
        Ok(params)
    }

    /// Requested width, or the default when absent or zero.
    pub fn effective_width(&self) -> u16 {
        self.width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH)
    }

    pub fn effective_height(&self) -> u16 {
        self.height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT)
    }

    /// Requested frame rate clamped to [`MAX_FRAME_RATE`].
    pub fn effective_frame_rate(&self) -> u8 {
        self.frame_rate
            .filter(|fps| *fps > 0)
            .map_or(MAX_FRAME_RATE, |fps| fps.min(MAX_FRAME_RATE))
    }

    /// Max bit rate in kbps.
    pub fn effective_bit_rate(&self) -> u16 {
        self.rtp
            .max_bit_rate
            .filter(|b| *b > 0)
            .unwrap_or(DEFAULT_VIDEO_BIT_RATE)
    }
}

/// Audio block of a selected stream configuration.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct AudioParameters {
    pub codec: Option<AudioCodec>,
    pub channels: Option<u8>,
    pub bit_rate: Option<AudioBitRate>,
    pub sample_rate: Option<AudioSampleRate>,
    /// Milliseconds of audio per packet.
    pub packet_time: Option<u8>,
    pub rtp: RtpParameters,
    pub comfort_noise: Option<bool>,
}

impl AudioParameters {
    fn decode(block: &Tlv8) -> Result<Self> {
        let mut params = Self {
            codec: block
                .find_u8(audio::CODEC, "audio codec")?
                .map(AudioCodec::try_from)
                .transpose()?,
            comfort_noise: block
                .find_u8(audio::COMFORT_NOISE, "comfort noise")?
                .map(|flag| flag != 0),
            ..Default::default()
        };

        if let Some(codec) = block.find_nested(audio::CODEC_PARAMS)? {
            params.channels = codec.find_u8(audio_codec_params::CHANNELS, "channels")?;
            params.bit_rate = codec
                .find_u8(audio_codec_params::BIT_RATE, "bit rate mode")?
                .map(|mode| match mode {
                    0 => AudioBitRate::Variable,
                    _ => AudioBitRate::Constant,
                });
            params.sample_rate = codec
                .find_u8(audio_codec_params::SAMPLE_RATE, "sample rate")?
                .map(AudioSampleRate::try_from)
                .transpose()?;
            params.packet_time = codec.find_u8(audio_codec_params::PACKET_TIME, "packet time")?;
        }
        if let Some(rtp) = block.find_nested(audio::RTP_PARAMS)? {
            params.rtp = RtpParameters::decode(&rtp)?;
        }
        Ok(params)
    }
}

/// Decoded selected RTP stream configuration write.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedConfiguration {
    pub session_id: SessionId,
    pub kind: RequestKind,
    pub video: Option<VideoParameters>,
    pub audio: Option<AudioParameters>,
}

impl SelectedConfiguration {
    /// Decodes the session block first; media blocks are only parsed for
    /// start and reconfigure requests.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let tlv = Tlv8::decode(raw)?;
        let session = tlv.nested(selected::SESSION, "session control")?;
        let session_id = SessionId::from(
            session
                .get(session_control::SESSION_ID, "session id")?
                .clone(),
        );
        let kind = RequestKind::try_from(session.get_u8(session_control::COMMAND, "command")?)?;

        let (video, audio) = match kind {
            RequestKind::Stop => (None, None),
            RequestKind::Start | RequestKind::Reconfigure => (
                tlv.find_nested(selected::VIDEO)?
                    .map(|block| VideoParameters::decode(&block))
                    .transpose()?,
                tlv.find_nested(selected::AUDIO)?
                    .map(|block| AudioParameters::decode(&block))
                    .transpose()?,
            ),
        };

        Ok(Self {
            session_id,
            kind,
            video,
            audio,
        })
    }
}

impl StreamCommand {
    /// Combines a session's negotiated transport with the requested parameters.
    pub fn new(
        session_id: SessionId,
        record: &SessionRecord,
        video: Option<&VideoParameters>,
        audio: Option<&AudioParameters>,
    ) -> Self {
        let defaults = VideoParameters::default();
        let video = video.unwrap_or(&defaults);

        Self {
            session_id,
            peer_address: record.peer_address,
            peer_port: record.video_port,
            local_port: record.video_port,
            key_material: record.video_srtp.as_ref().map(|keys| keys.key_material()),
            width: video.effective_width(),
            height: video.effective_height(),
            frame_rate: video.effective_frame_rate(),
            bit_rate_kbps: video.effective_bit_rate(),
            payload_type: video.rtp.payload_type.unwrap_or(DEFAULT_PAYLOAD_TYPE),
            ssrc: video.rtp.ssrc.unwrap_or(record.video_ssrc),
            max_mtu: video
                .rtp
                .max_mtu
                .filter(|mtu| *mtu > 0)
                .unwrap_or(DEFAULT_MAX_MTU),
            audio: audio.cloned(),
        }
    }
}

/// Encodes a streaming status value as published on the status characteristic.
pub fn encode_streaming_status(value: StreamingStatus) -> Bytes {
    Tlv8::new().with(status::STATUS, [value as u8]).encode()
}
