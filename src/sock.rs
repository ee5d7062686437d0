//! Socket creation, tuning, and the shared transfer-loop arithmetic.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use tracing::warn;

/// Send/receive buffer size applied to every socket, and the cap on the
/// transfer unit used by both roles.
pub const DEFAULT_SOCKET_BUFFER: usize = 4 * 1024 * 1024;

/// Transfers at or below this size skip progress logging entirely.
const PROGRESS_MIN_BYTES: u64 = 1_000_000;

/// Create a blocking IPv4 TCP socket.
pub fn stream_socket() -> io::Result<Socket> {
    Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
}

/// Apply performance-oriented options to a socket: send and receive buffers
/// sized to `buffer_size` and TCP_NODELAY on.
///
/// Best-effort: each option is attempted independently, failures are logged,
/// and the socket stays usable with whatever options did take. Accepts both
/// owned `Socket` values and `SockRef`s borrowed from a `TcpStream`.
pub fn tune(socket: &Socket, buffer_size: usize) {
    if let Err(e) = socket.set_send_buffer_size(buffer_size) {
        warn!(error = %e, buffer_size, "failed to set send buffer");
    }
    if let Err(e) = socket.set_recv_buffer_size(buffer_size) {
        warn!(error = %e, buffer_size, "failed to set receive buffer");
    }
    if let Err(e) = socket.set_nodelay(true) {
        warn!(error = %e, "failed to set TCP_NODELAY");
    }
}

/// Transfer unit for a trial of `n` bytes: the whole payload when it fits
/// under `cap`, otherwise `cap`, and never zero.
pub fn chunk_size(n: u64, cap: usize) -> usize {
    n.clamp(1, cap as u64) as usize
}

/// Decile progress predicate: fires on exact multiples of `n / 10` only.
/// Increments that do not land on a multiple skip that decile, so gaps are
/// expected. The size guard also keeps `n / 10` nonzero.
pub fn decile_reached(total: u64, n: u64) -> bool {
    n > PROGRESS_MIN_BYTES && total % (n / 10) == 0
}
