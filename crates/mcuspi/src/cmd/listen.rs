use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mcuspi_session::{ReceiveOutcome, Session};
use mcuspi_transport::{StreamTransport, Transport, TransportError};
use tracing::{debug, info};

use crate::cmd::ListenArgs;
use crate::exit::{transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, print_stats, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let transport =
        StreamTransport::open(&args.path).map_err(|err| transport_error("open failed", err))?;
    let session = Session::with_config(transport, args.session_config());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let source = args.path.display().to_string();
    let printed = pump(&session, &running, args.count, |message| {
        print_message(message, None, &source, format);
    })?;

    let dropped = session.close();
    let stats = session.stats();
    info!(
        session = %session.name(),
        printed,
        received = stats.received,
        dropped = stats.dropped(),
        unread = dropped,
        "listen finished"
    );
    if args.stats {
        print_stats(&stats, format);
    }
    Ok(SUCCESS)
}

/// Treat every readable frame as one notification, printing each message
/// as it reaches the inbound buffer.
///
/// Stops at end of stream, after `count` messages, or once `running` is
/// cleared. Returns the number of messages handed to `emit`.
fn pump<T, F>(
    session: &Session<T>,
    running: &AtomicBool,
    count: Option<usize>,
    mut emit: F,
) -> CliResult<usize>
where
    T: Transport,
    F: FnMut(&mcuspi_frame::Message),
{
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match session.on_notify() {
            ReceiveOutcome::ReadFailed(TransportError::ConnectionClosed) => {
                debug!(session = %session.name(), "end of stream");
                break;
            }
            ReceiveOutcome::ReadFailed(err) => {
                return Err(transport_error("receive failed", err));
            }
            // Already logged and counted by the session.
            _ => {}
        }

        while session.advance().is_ok() {
            emit(&session.inbound());
            printed = printed.saturating_add(1);
            if count.is_some_and(|count| printed >= count) {
                return Ok(printed);
            }
        }
    }
    Ok(printed)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use mcuspi_frame::{encode_packet, Message, FRAME_SIZE};

    use super::*;

    fn capture(count: u8, corrupt: Option<u8>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut frame = [0u8; FRAME_SIZE];
        for n in 0..count {
            encode_packet(n, &Message::from_parts(&[n], b"tick"), &mut frame);
            if corrupt == Some(n) {
                frame[70] ^= 0xFF;
            }
            out.extend_from_slice(&frame);
        }
        out
    }

    #[test]
    fn pumps_until_end_of_stream() {
        let session = Session::new(StreamTransport::new(Cursor::new(capture(3, Some(1)))));
        let running = AtomicBool::new(true);
        let mut descriptors = Vec::new();

        let printed = pump(&session, &running, None, |m| descriptors.push(m.descriptor()[0]))
            .unwrap();

        assert_eq!(printed, 2);
        assert_eq!(descriptors, vec![0, 2]);
        let stats = session.stats();
        assert_eq!(stats.dropped_checksum, 1);
        assert_eq!(stats.read_failures, 1);
    }

    #[test]
    fn stops_after_count() {
        let session = Session::new(StreamTransport::new(Cursor::new(capture(5, None))));
        let running = AtomicBool::new(true);
        let printed = pump(&session, &running, Some(2), |_| {}).unwrap();
        assert_eq!(printed, 2);
        assert_eq!(session.stats().received, 2);
    }

    #[test]
    fn cleared_flag_stops_immediately() {
        let session = Session::new(StreamTransport::new(Cursor::new(capture(1, None))));
        let running = AtomicBool::new(false);
        assert_eq!(pump(&session, &running, None, |_| {}).unwrap(), 0);
        assert_eq!(session.stats().received, 0);
    }
}
