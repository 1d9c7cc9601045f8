
use std::fmt;

use bytes::Bytes;
use shared::error::Error;
use tlv8::Tlv8;

use crate::config::{AudioConfig, CameraConfig, VideoConfig};
use crate::message::*;

/// Something the audio advertisement left out or substituted.
///
/// Every warning is also logged at `warn` level when it is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapabilityWarning {
    UnsupportedCodec(String),
    UnsupportedSampleRate { codec: String, sample_rate: u32 },
    /// No requested codec survived filtering; OPUS 24 kHz was advertised instead.
    FallbackCodec,
}

impl fmt::Display for CapabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityWarning::UnsupportedCodec(codec) => write!(f, "unsupported codec {codec}"),
            CapabilityWarning::UnsupportedSampleRate { codec, sample_rate } => {
                write!(f, "unsupported sample rate {sample_rate} kHz for {codec}")
            }
            CapabilityWarning::FallbackCodec => write!(
                f,
                "no requested audio codec is supported by controllers, advertising OPUS 24 kHz"
            ),
        }
    }
}

impl From<CapabilityWarning> for Error {
    fn from(warning: CapabilityWarning) -> Self {
        Error::ErrUnsupportedCapability(warning.to_string())
    }
}

/// The three write-once capability values, as raw TLV8.
#[derive(Clone, Debug)]
pub struct Capabilities {
    pub transport_security: Bytes,
    pub video: Bytes,
    pub audio: Bytes,
    pub warnings: Vec<CapabilityWarning>,
}

impl Capabilities {
    pub fn new(config: &CameraConfig) -> Self {
        let (audio, warnings) = build_audio_options(&config.audio);
        Capabilities {
            transport_security: build_transport_security_options(config.srtp),
            video: build_video_options(&config.video),
            audio,
            warnings,
        }
    }
}

/// Supported RTP configuration: the single SRTP suite the accessory offers.
pub fn build_transport_security_options(supports_srtp: bool) -> Bytes {
    let suite = if supports_srtp {
        CryptoSuite::AesCm128HmacSha1_80
    } else {
        CryptoSuite::None
    };
    Tlv8::new()
        .with(rtp_config::CRYPTO_SUITE, [suite as u8])
        .encode()
}

/// Supported video stream configuration: one H.264 codec block listing every
/// profile, level and resolution.
pub fn build_video_options(config: &VideoConfig) -> Bytes {
    let mut codec_params = Tlv8::new().with(
        video_codec_params::PACKETIZATION_MODE,
        [PacketizationMode::NonInterleaved as u8],
    );
    for profile in &config.profiles {
        codec_params.push(video_codec_params::PROFILE_ID, [*profile as u8]);
    }
    for level in &config.levels {
        codec_params.push(video_codec_params::LEVEL, [*level as u8]);
    }

    let mut configuration = Tlv8::new()
        .with(video::CODEC, [VideoCodec::H264 as u8])
        .with_nested(video::CODEC_PARAMS, &codec_params);
    for resolution in &config.resolutions {
        let attributes = Tlv8::new()
            .with(
                video_attributes::IMAGE_WIDTH,
                resolution.width().to_le_bytes(),
            )
            .with(
                video_attributes::IMAGE_HEIGHT,
                resolution.height().to_le_bytes(),
            )
            .with(video_attributes::FRAME_RATE, [resolution.frame_rate()]);
        configuration = configuration.with_nested(video::ATTRIBUTES, &attributes);
    }

    Tlv8::new()
        .with_nested(video_config::CONFIGURATION, &configuration)
        .encode()
}

fn audio_codec_configuration(codec: AudioCodec, sample_rate: AudioSampleRate) -> Tlv8 {
    let params = Tlv8::new()
        .with(audio_codec_params::CHANNELS, [1])
        .with(audio_codec_params::BIT_RATE, [AudioBitRate::Variable as u8])
        .with(audio_codec_params::SAMPLE_RATE, [sample_rate as u8]);
    Tlv8::new()
        .with(audio::CODEC, [codec as u8])
        .with_nested(audio::CODEC_PARAMS, &params)
}

/// Supported audio stream configuration.
///
/// Only OPUS and AAC-ELD at 8, 16 or 24 kHz are advertised. Anything else is
/// skipped with a warning, and if nothing is left a single OPUS 24 kHz entry is
/// advertised so the list is never empty.
pub fn build_audio_options(config: &AudioConfig) -> (Bytes, Vec<CapabilityWarning>) {
    let mut warnings = vec![];
    let mut tlv = Tlv8::new();

    for entry in &config.codecs {
        let Some(codec) = AudioCodec::from_name(&entry.codec) else {
            let warning = CapabilityWarning::UnsupportedCodec(entry.codec.clone());
            log::warn!("{warning}");
            warnings.push(warning);
            continue;
        };
        let Some(sample_rate) = AudioSampleRate::from_khz(entry.sample_rate) else {
            let warning = CapabilityWarning::UnsupportedSampleRate {
                codec: entry.codec.clone(),
                sample_rate: entry.sample_rate,
            };
            log::warn!("{warning}");
            warnings.push(warning);
            continue;
        };
        tlv = tlv.with_nested(
            audio_config::CODEC_CONFIGURATION,
            &audio_codec_configuration(codec, sample_rate),
        );
    }

    if tlv.is_empty() {
        let warning = CapabilityWarning::FallbackCodec;
        log::warn!("{warning}");
        warnings.push(warning);
        tlv = tlv.with_nested(
            audio_config::CODEC_CONFIGURATION,
            &audio_codec_configuration(AudioCodec::Opus, AudioSampleRate::Khz24),
        );
    }

    let tlv = tlv.with(
        audio_config::COMFORT_NOISE_SUPPORT,
        [config.comfort_noise as u8],
    );
    (tlv.encode(), warnings)
}
