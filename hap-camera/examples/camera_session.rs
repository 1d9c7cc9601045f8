//! Camera Session Example
//!
//! This example drives the sans-I/O hap-camera stream management through a
//! simulated controller: setup endpoints, start, reconfigure and stop.
//!
//! # Usage
//!
//! With a logging media sender:
//! ```
//! cargo run --package hap-camera --example camera_session
//! ```
//!
//! Streaming a V4L2 camera through ffmpeg to a local port:
//! ```
//! cargo run --package hap-camera --example camera_session -- --ffmpeg --config camera.json
//! ```

use std::fs;
use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use clap::Parser;
use hap_camera::message::{
    CryptoSuite, IpVersion, address, selected, session_control, setup, srtp, video,
    video_attributes,
};
use hap_camera::{
    CameraConfig, CameraStreamManagement, Characteristic, CharacteristicWrite, FfmpegSender,
    MediaSender, StreamCommand, StreamProcess,
};
use sansio::Protocol;
use shared::error::Result;
use shared::util::{to_base64, to_hex};
use tlv8::Tlv8;

#[derive(Parser, Debug)]
#[command(name = "Camera Session")]
#[command(version = "0.1.0")]
#[command(about = "An example of camera stream negotiation using sans-I/O hap-camera")]
struct Args {
    /// JSON camera configuration file
    #[arg(long)]
    config: Option<String>,

    /// Spawn ffmpeg instead of logging stream commands
    #[arg(long)]
    ffmpeg: bool,

    /// Address the simulated controller receives on
    #[arg(long, default_value = "127.0.0.1")]
    peer: IpAddr,

    /// Video RTP port of the simulated controller
    #[arg(long, default_value = "50100")]
    port: u16,

    /// Seconds to stream before reconfiguring and again before stopping
    #[arg(long, default_value = "5")]
    duration: u64,
}

#[derive(Debug)]
struct LoggedProcess {
    id: u32,
}

impl StreamProcess for LoggedProcess {
    fn id(&self) -> Option<u32> {
        Some(self.id)
    }

    fn kill(&mut self) -> Result<()> {
        log::info!("stream {} killed", self.id);
        Ok(())
    }
}

#[derive(Default)]
struct LoggingSender {
    started: u32,
}

impl MediaSender for LoggingSender {
    fn start(&mut self, command: &StreamCommand) -> Result<Box<dyn StreamProcess>> {
        self.started += 1;
        log::info!(
            "stream {} -> {}:{} {}x{}@{} {}kbps srtp={}",
            self.started,
            command.peer_address,
            command.peer_port,
            command.width,
            command.height,
            command.frame_rate,
            command.bit_rate_kbps,
            command.key_material.is_some(),
        );
        Ok(Box::new(LoggedProcess { id: self.started }))
    }
}

fn setup_request(session: &[u8], args: &Args) -> Tlv8 {
    let srtp_params = Tlv8::new()
        .with(srtp::CRYPTO_SUITE, [CryptoSuite::AesCm128HmacSha1_80 as u8])
        .with(srtp::MASTER_KEY, [0x5a; 16])
        .with(srtp::MASTER_SALT, [0xa5; 14]);
    Tlv8::new()
        .with(setup::SESSION_ID, session)
        .with_nested(
            setup::ADDRESS,
            &Tlv8::new()
                .with(address::IP_VERSION, [IpVersion::of(&args.peer) as u8])
                .with(address::ADDRESS, args.peer.to_string())
                .with(address::VIDEO_RTP_PORT, args.port.to_le_bytes())
                .with(address::AUDIO_RTP_PORT, (args.port + 2).to_le_bytes()),
        )
        .with_nested(setup::VIDEO_SRTP_PARAMS, &srtp_params)
        .with_nested(setup::AUDIO_SRTP_PARAMS, &srtp_params)
}

fn selection(session: &[u8], kind: u8, width: u16, height: u16, fps: u8) -> Tlv8 {
    Tlv8::new()
        .with_nested(
            selected::SESSION,
            &Tlv8::new()
                .with(session_control::SESSION_ID, session)
                .with(session_control::COMMAND, [kind]),
        )
        .with_nested(
            selected::VIDEO,
            &Tlv8::new().with_nested(
                video::ATTRIBUTES,
                &Tlv8::new()
                    .with(video_attributes::IMAGE_WIDTH, width.to_le_bytes())
                    .with(video_attributes::IMAGE_HEIGHT, height.to_le_bytes())
                    .with(video_attributes::FRAME_RATE, [fps]),
            ),
        )
}

fn write(
    camera: &mut CameraStreamManagement<impl MediaSender>,
    characteristic: Characteristic,
    tlv: &Tlv8,
) -> Result<()> {
    camera.handle_read(CharacteristicWrite {
        characteristic,
        value: to_base64(&tlv.encode()),
    })?;

    while let Some(value) = camera.poll_write() {
        log::info!("publish {} = {}", value.characteristic, value.value);
    }
    while let Some(event) = camera.poll_event() {
        log::info!("event {event:?}");
    }
    Ok(())
}

fn run(mut camera: CameraStreamManagement<impl MediaSender>, args: &Args) -> Result<()> {
    while let Some(value) = camera.poll_write() {
        log::info!("publish {} = {}", value.characteristic, value.value);
    }
    for warning in &camera.capabilities().warnings {
        log::warn!("capability warning: {warning}");
    }

    let session = [0x0c; 16];
    log::info!("controller session {}", to_hex(&session));
    let pause = Duration::from_secs(args.duration);

    write(
        &mut camera,
        Characteristic::SetupEndpoints,
        &setup_request(&session, args),
    )?;
    write(
        &mut camera,
        Characteristic::SelectedRtpStreamConfiguration,
        &selection(&session, 1, 1280, 720, 30),
    )?;
    thread::sleep(pause);

    write(
        &mut camera,
        Characteristic::SelectedRtpStreamConfiguration,
        &selection(&session, 4, 640, 360, 15),
    )?;
    thread::sleep(pause);

    write(
        &mut camera,
        Characteristic::SelectedRtpStreamConfiguration,
        &selection(&session, 0, 0, 0, 0),
    )?;

    camera.close()?;
    while let Some(value) = camera.poll_write() {
        log::info!("publish {} = {}", value.characteristic, value.value);
    }
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config: CameraConfig = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => CameraConfig::default(),
    };
    log::info!("camera config {}", serde_json::to_string(&config)?);

    if args.ffmpeg {
        run(CameraStreamManagement::new(config, FfmpegSender::new()), &args)?;
    } else {
        run(
            CameraStreamManagement::new(config, LoggingSender::default()),
            &args,
        )?;
    }
    Ok(())
}
