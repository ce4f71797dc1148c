//! Loopback demo: transmit a few messages, feed them back through the
//! receive path on a worker thread, and read them out again.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::{mpsc, Arc};

use mcuspi::session::{spawn_receiver, Session, SessionConfig};
use mcuspi::transport::LoopbackTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = LoopbackTransport::new();
    let session = Arc::new(Session::with_config(
        transport.clone(),
        SessionConfig::named("loopback0"),
    ));

    let (notify, notifications) = mpsc::channel();
    let receiver = spawn_receiver(Arc::clone(&session), notifications)?;

    for word in ["alpha", "bravo", "charlie"] {
        session.write_descriptor(0, b"demo");
        session.write_payload(0, word.as_bytes());
        let serial = session.transmit()?;
        eprintln!("Sent {word:?} as serial {serial}");

        // The "microcontroller" echoes the frame and raises its data-ready line.
        transport.loop_back();
        notify.send(())?;
    }
    drop(notify);

    let stats = receiver
        .join()
        .map_err(|_| "receiver thread panicked")?;
    eprintln!("Receiver stats: {stats:?}");

    while session.advance().is_ok() {
        let mut buf = [0u8; 64];
        let n = session.read_payload(0, &mut buf);
        eprintln!(
            "Received {} bytes: {}",
            session.inbound_len(),
            String::from_utf8_lossy(&buf[..n])
        );
    }

    Ok(())
}
