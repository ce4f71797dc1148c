use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use mcuspi_transport::Transport;
use tracing::{debug, info};

use crate::session::Session;
use crate::stats::ReceiveStats;

/// Run the receive callback on a dedicated thread.
///
/// Each `()` received on `notifications` stands for one edge from the
/// device's data-ready line and triggers exactly one
/// [`Session::on_notify`]. The thread exits once every sender is dropped
/// and returns the session's final receive counters.
pub fn spawn_receiver<T>(
    session: Arc<Session<T>>,
    notifications: Receiver<()>,
) -> io::Result<JoinHandle<ReceiveStats>>
where
    T: Transport + Send + 'static,
{
    let name = format!("{}-rx", session.name());
    thread::Builder::new().name(name).spawn(move || {
        debug!(session = %session.name(), "receiver started");
        for () in notifications.iter() {
            session.on_notify();
        }
        let stats = session.stats();
        info!(
            session = %session.name(),
            received = stats.received,
            queued = stats.queued,
            dropped = stats.dropped(),
            "receiver stopped"
        );
        stats
    })
}
