use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;

use mcuspi_frame::{CodecConfig, LengthPolicy, Message, PreambleCheck, SerialCheck};
use mcuspi_session::SessionConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::{from_hex, OutputFormat};

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message into a frame file.
    Encode(EncodeArgs),
    /// Decode frames from a file and print their messages.
    Decode(DecodeArgs),
    /// Transmit one message to a device node.
    Send(SendArgs),
    /// Receive frames from a device node and print queued messages.
    ///
    /// Ctrl-C is checked between frames. A blocked read is restarted after
    /// the signal, so on an idle device the command exits once the next
    /// frame arrives.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Receive-side validation flags.
#[derive(Args, Debug, Default, Clone)]
pub struct CodecArgs {
    /// Reject frames whose preamble byte is not 0xAA.
    #[arg(long)]
    pub preamble_check: bool,
    /// Reject frames whose serial does not follow the previous one.
    #[arg(long)]
    pub serial_check: bool,
    /// Clamp oversized payload lengths instead of rejecting the frame.
    #[arg(long)]
    pub clamp_length: bool,
}

impl CodecArgs {
    pub fn codec_config(&self) -> CodecConfig {
        let mut config = CodecConfig::default();
        if self.preamble_check {
            config = config.with_preamble(PreambleCheck::Require);
        }
        if self.serial_check {
            config = config.with_serial(SerialCheck::Sequential);
        }
        if self.clamp_length {
            config = config.with_length(LengthPolicy::Clamp);
        }
        config
    }
}

/// Message content flags shared by `encode` and `send`.
#[derive(Args, Debug, Default, Clone)]
pub struct PayloadArgs {
    /// Descriptor bytes as hex (up to 64 bytes).
    #[arg(long, value_name = "HEX")]
    pub descriptor: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Payload bytes as hex.
    #[arg(long, value_name = "HEX", conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn descriptor_bytes(&self) -> CliResult<Vec<u8>> {
        match &self.descriptor {
            Some(text) => from_hex(text)
                .ok_or_else(|| CliError::new(USAGE, "--descriptor is not valid hex")),
            None => Ok(Vec::new()),
        }
    }

    pub fn payload_bytes(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(text) = &self.hex {
            return from_hex(text).ok_or_else(|| CliError::new(USAGE, "--hex is not valid hex"));
        }
        if let Some(path) = &self.file {
            return fs::read(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            });
        }
        Ok(Vec::new())
    }

    /// Build a message, clamping oversized input the way the buffers do.
    pub fn message(&self) -> CliResult<Message> {
        let descriptor = self.descriptor_bytes()?;
        let payload = self.payload_bytes()?;
        let mut message = Message::new();
        let kept = message.write_descriptor(0, &descriptor);
        if kept < descriptor.len() {
            tracing::warn!(given = descriptor.len(), kept, "descriptor truncated");
        }
        let kept = message.write_payload(0, &payload);
        if kept < payload.len() {
            tracing::warn!(given = payload.len(), kept, "payload truncated");
        }
        Ok(message)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// File to write the frame to (default: stdout).
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
    /// Serial number to stamp on the frame.
    #[arg(long, default_value = "0")]
    pub serial: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding one or more concatenated frames.
    pub path: PathBuf,
    #[command(flatten)]
    pub codec: CodecArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device node (or file) to write the frame to.
    pub path: PathBuf,
    /// Payload chunk size used to fill the outbound buffer.
    #[arg(long, default_value = "256")]
    pub chunk: usize,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Device node (or capture file) to read frames from.
    pub path: PathBuf,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Message queue capacity.
    #[arg(long, default_value = "1024")]
    pub queue_capacity: usize,
    /// Print receive counters on exit.
    #[arg(long)]
    pub stats: bool,
    #[command(flatten)]
    pub codec: CodecArgs,
}

impl ListenArgs {
    pub fn session_config(&self) -> SessionConfig {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SessionConfig::default().name);
        SessionConfig {
            name,
            codec: self.codec.codec_config(),
            queue_capacity: self.queue_capacity,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
