use std::fs;

use mcuspi_frame::encode_packet;
use mcuspi_transport::FRAME_SIZE;
use tracing::info;

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::print_raw;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let message = args.payload.message()?;
    let mut frame = [0u8; FRAME_SIZE];
    encode_packet(args.serial, &message, &mut frame);

    match &args.out {
        Some(path) => {
            fs::write(path, frame)
                .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
            info!(
                path = %path.display(),
                serial = args.serial,
                len = message.payload_len(),
                "frame encoded"
            );
        }
        None => print_raw(&frame),
    }
    Ok(SUCCESS)
}
