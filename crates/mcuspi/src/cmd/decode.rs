use std::fs;

use mcuspi_frame::{Packet, PacketDecoder};
use mcuspi_transport::FRAME_SIZE;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.path)
        .map_err(|err| io_error(&format!("failed reading {}", args.path.display()), err))?;
    let source = args.path.display().to_string();

    for packet in decode_all(&bytes, PacketDecoder::new(args.codec.codec_config()))? {
        print_message(&packet.message, Some(packet.serial), &source, format);
    }
    Ok(SUCCESS)
}

/// Decode back-to-back frames, stopping at the first invalid one.
fn decode_all(bytes: &[u8], mut decoder: PacketDecoder) -> CliResult<Vec<Packet>> {
    if bytes.is_empty() || bytes.len() % FRAME_SIZE != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "input is {} bytes, not a whole number of {FRAME_SIZE}-byte frames",
                bytes.len()
            ),
        ));
    }

    bytes
        .chunks_exact(FRAME_SIZE)
        .enumerate()
        .map(|(index, frame)| {
            decoder
                .decode(frame)
                .map_err(|err| frame_error(&format!("frame {index}"), err))
        })
        .collect()
}
