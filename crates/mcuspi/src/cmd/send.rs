use mcuspi_frame::MAX_PAYLOAD;
use mcuspi_session::Session;
use mcuspi_transport::{StreamTransport, Transport};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{session_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    if args.chunk == 0 {
        return Err(CliError::new(USAGE, "--chunk must be greater than zero"));
    }

    let descriptor = args.payload.descriptor_bytes()?;
    let payload = args.payload.payload_bytes()?;

    let transport =
        StreamTransport::open(&args.path).map_err(|err| transport_error("open failed", err))?;
    let session = Session::new(transport);

    session.write_descriptor(0, &descriptor);
    let written = fill_outbound(&session, &payload, args.chunk);
    if written < payload.len() {
        tracing::warn!(given = payload.len(), written, "payload truncated");
    }

    let serial = session
        .transmit()
        .map_err(|err| session_error("transmit failed", err))?;
    info!(path = %args.path.display(), serial, len = written, "message sent");
    Ok(SUCCESS)
}

/// Fill the outbound payload in `chunk`-sized writes; returns bytes taken.
///
/// Pieces are cut at [`MAX_PAYLOAD`] up front, since an append past the end
/// slides back over bytes already written.
fn fill_outbound<T: Transport>(session: &Session<T>, payload: &[u8], chunk: usize) -> usize {
    let mut written = 0usize;
    for piece in payload.chunks(chunk) {
        let room = MAX_PAYLOAD - written;
        if room == 0 {
            break;
        }
        let piece = &piece[..piece.len().min(room)];
        written += session.write_payload(written, piece);
    }
    written
}

#[cfg(test)]
mod tests {
    use mcuspi_transport::LoopbackTransport;

    use super::*;

    #[test]
    fn chunked_fill_matches_single_write() {
        let session = Session::new(LoopbackTransport::new());
        let payload: Vec<u8> = (0..700u32).map(|n| n as u8).collect();
        assert_eq!(fill_outbound(&session, &payload, 64), 700);
        assert_eq!(session.outbound().payload(), &payload[..]);
    }

    #[test]
    fn chunked_fill_stops_at_capacity() {
        let session = Session::new(LoopbackTransport::new());
        let payload: Vec<u8> = (0..1500u32).map(|n| (n % 251) as u8).collect();
        assert_eq!(fill_outbound(&session, &payload, 300), 1024);
        assert_eq!(session.outbound().payload(), &payload[..1024]);
    }
}
