//! Receiver role: serves exactly one connection per trial and streams the
//! payload to it in bounded chunks.

use crate::config::Config;
use crate::sock;
use socket2::SockRef;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Byte used to fill every outgoing chunk.
const FILL: u8 = b'0';

/// Run the receiver role for a trial of `n` bytes.
///
/// Returns the number of bytes actually sent. Setup failures log and return
/// zero without starting a transfer; a mid-transfer send failure stops the
/// loop early but the sockets are still closed and the partial total is
/// returned. No retries anywhere.
pub fn run(config: &Config, n: u64) -> u64 {
    debug!(n, "receiver starting");

    let mut stream = match serve_one(config) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, port = config.port, "receiver setup failed");
            return 0;
        }
    };

    let chunk = sock::chunk_size(n, config.socket_buffer);
    let payload = vec![FILL; chunk];
    let mut total_sent: u64 = 0;

    while total_sent < n {
        let want = (n - total_sent).min(chunk as u64) as usize;
        match stream.write(&payload[..want]) {
            Ok(sent) => {
                total_sent += sent as u64;
                if sock::decile_reached(total_sent, n) {
                    info!(percent = total_sent * 100 / n, "receiver progress");
                }
            }
            Err(e) => {
                error!(error = %e, total_sent, "receiver send failed");
                break;
            }
        }
    }

    info!(total_sent, "receiver finished");
    total_sent
}

/// Bind to the wildcard address, listen with a backlog of one, and accept a
/// single connection, tuning both sockets along the way.
fn serve_one(config: &Config) -> io::Result<TcpStream> {
    let socket = sock::stream_socket()?;
    sock::tune(&socket, config.socket_buffer);
    socket.set_reuse_address(true)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    socket.bind(&addr.into())?;
    socket.listen(1)?;

    let listener: TcpListener = socket.into();
    debug!(port = config.port, "receiver waiting for connection");

    let (stream, peer) = listener.accept()?;
    debug!(%peer, "receiver accepted connection");
    sock::tune(&SockRef::from(&stream), config.socket_buffer);

    Ok(stream)
}
