use std::io;
use std::net::IpAddr;
use std::process::{Child, Command, Stdio};

use shared::error::{Error, Result};
use shared::util::to_base64;

use super::{MediaSender, StreamCommand, StreamProcess};

const SRTP_SUITE: &str = "AES_CM_128_HMAC_SHA1_80";

/// Media sender that streams a V4L2 H.264 camera through an `ffmpeg` child process.
///
/// Input arguments may reference `{width}`, `{height}` and `{fps}`, which are
/// replaced with the effective stream parameters.
#[derive(Clone, Debug)]
pub struct FfmpegSender {
    program: String,
    input_args: Vec<String>,
}

impl Default for FfmpegSender {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            input_args: [
                "-f",
                "video4linux2",
                "-input_format",
                "h264",
                "-video_size",
                "{width}x{height}",
                "-framerate",
                "{fps}",
                "-i",
                "/dev/video0",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FfmpegSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn with_input_args(mut self, input_args: Vec<String>) -> Self {
        self.input_args = input_args;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one stream, program name excluded.
    pub fn command_args(&self, command: &StreamCommand) -> Vec<String> {
        let mut args: Vec<String> = self
            .input_args
            .iter()
            .map(|arg| {
                arg.replace("{width}", &command.width.to_string())
                    .replace("{height}", &command.height.to_string())
                    .replace("{fps}", &command.frame_rate.to_string())
            })
            .collect();

        let bit_rate = format!("{}k", command.bit_rate_kbps);
        args.extend(
            [
                "-vcodec",
                "copy",
                "-an",
                "-b:v",
                &bit_rate,
                "-bufsize",
                &bit_rate,
                "-payload_type",
                &command.payload_type.to_string(),
                // ffmpeg parses the ssrc as a signed 32-bit integer
                "-ssrc",
                &(command.ssrc as i32).to_string(),
                "-f",
                "rtp",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let scheme = match &command.key_material {
            Some(key_material) => {
                args.push("-srtp_out_suite".to_string());
                args.push(SRTP_SUITE.to_string());
                args.push("-srtp_out_params".to_string());
                args.push(to_base64(key_material));
                "srtp"
            }
            None => "rtp",
        };

        let host = match command.peer_address {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        };
        args.push(format!(
            "{scheme}://{host}:{port}?rtcpport={port}&localrtcpport={local}&pkt_size={mtu}",
            port = command.peer_port,
            local = command.local_port,
            mtu = command.max_mtu,
        ));
        args
    }
}

impl MediaSender for FfmpegSender {
    fn start(&mut self, command: &StreamCommand) -> Result<Box<dyn StreamProcess>> {
        let args = self.command_args(command);
        log::debug!("starting {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|err| {
                Error::ErrStreamProcessFailure(format!("spawn {}: {err}", self.program))
            })?;
        log::info!(
            "{} started for session {} with pid {}",
            self.program,
            command.session_id,
            child.id()
        );

        Ok(Box::new(FfmpegProcess { child: Some(child) }))
    }
}

#[derive(Debug)]
pub struct FfmpegProcess {
    child: Option<Child>,
}

impl StreamProcess for FfmpegProcess {
    fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn kill(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        match child.kill() {
            Ok(()) => {}
            // already exited
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => {
                let pid = child.id();
                self.child = Some(child);
                return Err(Error::ErrStreamProcessFailure(format!("kill {pid}: {err}")));
            }
        }

        if let Err(err) = child.wait() {
            log::warn!("failed to reap media sender {}: {err}", child.id());
        }
        Ok(())
    }
}
