#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Best-effort UDP syslog ingest.
//!
//! At startup the application activates the listener that the database
//! describes. Activation is advisory: when no record is active, or the record
//! cannot be honored, the application continues without ingest and the reason
//! lands in the logs.

use std::net::SocketAddr;

use patchbay_data::Store;
use patchbay_data::syslog::{self, NewSyslogMessage};
use patchbay_telemetry::Metrics;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Largest datagram the listener accepts.
const MAX_DATAGRAM: usize = 8 * 1024;

/// Decoded priority prefix of a syslog datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    /// Facility number, 0 through 23.
    pub facility: i16,
    /// Severity number, 0 through 7.
    pub severity: i16,
}

/// Activate the UDP listener described by the active server record.
///
/// Returns `None` when no record is active or when the lookup, the address,
/// or the bind cannot be honored. Every declined activation is logged and
/// never blocks startup.
pub async fn activate(store: Store, telemetry: Metrics) -> Option<SyslogHandle> {
    let record = match syslog::fetch_active_syslog_server(store.pool()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("no active syslog server configured");
            return None;
        }
        Err(err) => {
            warn!(error = %err, "syslog server lookup failed; continuing without ingest");
            return None;
        }
    };

    let Ok(port) = u16::try_from(record.port) else {
        warn!(
            port = record.port,
            "syslog server port is out of range; continuing without ingest"
        );
        return None;
    };

    let socket = match UdpSocket::bind((record.bind_addr.as_str(), port)).await {
        Ok(socket) => socket,
        Err(err) => {
            warn!(
                error = %err,
                bind_addr = %record.bind_addr,
                port,
                "syslog listener bind failed; continuing without ingest"
            );
            return None;
        }
    };
    let local_addr = match socket.local_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(error = %err, "syslog listener address lookup failed; continuing without ingest");
            return None;
        }
    };

    info!(addr = %local_addr, "syslog listener active");
    let worker = tokio::spawn(listen(socket, store, telemetry));
    Some(SyslogHandle { local_addr, worker })
}

/// Handle to the spawned syslog listener.
#[derive(Debug)]
pub struct SyslogHandle {
    local_addr: SocketAddr,
    worker: JoinHandle<()>,
}

impl SyslogHandle {
    /// Address the listener actually bound, with any ephemeral port resolved.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the listener has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Abort the listener and wait for the task to wind down.
    pub async fn shutdown(self) {
        if !self.worker.is_finished() {
            self.worker.abort();
        }
        if let Err(err) = self.worker.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "syslog listener join failed");
        }
    }
}

async fn listen(socket: UdpSocket, store: Store, telemetry: Metrics) {
    let mut buffer = vec![0u8; MAX_DATAGRAM];
    loop {
        let (length, peer) = match socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(err) => {
                warn!(error = %err, "syslog receive failed");
                continue;
            }
        };
        ingest(&store, &telemetry, &buffer[..length], peer).await;
    }
}

async fn ingest(store: &Store, telemetry: &Metrics, datagram: &[u8], peer: SocketAddr) {
    let text = String::from_utf8_lossy(datagram);
    let (priority, content) = split_priority(&text);
    let source = peer.ip().to_string();
    let message = NewSyslogMessage {
        source: &source,
        facility: priority.map(|p| p.facility),
        severity: priority.map(|p| p.severity),
        content,
    };
    if let Err(err) = syslog::insert_syslog_message(store.pool(), &message).await {
        warn!(error = %err, source = %source, "failed to store syslog message");
        return;
    }
    telemetry.inc_syslog_message();
    debug!(source = %source, bytes = datagram.len(), "syslog message stored");
}

/// Split the RFC 3164 priority prefix off a datagram.
///
/// Datagrams without a well-formed `<PRI>` prefix are kept whole with no
/// facility or severity.
#[must_use]
pub fn split_priority(text: &str) -> (Option<Priority>, &str) {
    let Some(rest) = text.strip_prefix('<') else {
        return (None, text);
    };
    let Some((digits, content)) = rest.split_once('>') else {
        return (None, text);
    };
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (None, text);
    }
    let Ok(value) = digits.parse::<i16>() else {
        return (None, text);
    };
    if value > 191 {
        return (None, text);
    }
    (
        Some(Priority {
            facility: value / 8,
            severity: value % 8,
        }),
        content,
    )
}
