//! Sender role: connects to the receiver, drains the trial payload, and
//! times the whole transfer including connection establishment.

use crate::config::Config;
use crate::sock;
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Result of one fully received trial.
#[derive(Debug, Clone)]
pub struct TrialReport {
    pub bytes: u64,
    pub elapsed: Duration,
    pub mb_per_sec: f64,
}

/// Run the sender role for a trial of `n` bytes.
///
/// Prints the throughput line to stdout and returns a report only when all
/// `n` bytes arrive. A connect failure, a read error, or the peer closing
/// early all log, suppress the throughput line, and return `None`. The
/// clock starts immediately before the connection attempt, so connection
/// latency counts against the measured duration.
pub fn run(config: &Config, n: u64) -> Option<TrialReport> {
    debug!(n, "sender starting");

    let socket = match sock::stream_socket() {
        Ok(socket) => socket,
        Err(e) => {
            error!(error = %e, "sender socket creation failed");
            return None;
        }
    };
    sock::tune(&socket, config.socket_buffer);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    debug!(%addr, "sender connecting");

    let start = Instant::now();
    if let Err(e) = socket.connect(&addr.into()) {
        error!(error = %e, %addr, "sender connection failed");
        return None;
    }
    let mut stream: TcpStream = socket.into();
    debug!("sender connected");

    let buffer_size = sock::chunk_size(n, config.socket_buffer);
    let mut buffer = vec![0u8; buffer_size];
    let mut total_received: u64 = 0;

    while total_received < n {
        let want = (n - total_received).min(buffer_size as u64) as usize;
        match stream.read(&mut buffer[..want]) {
            Ok(0) => {
                info!(total_received, "connection closed by receiver");
                return None;
            }
            Ok(received) => {
                total_received += received as u64;
                if sock::decile_reached(total_received, n) {
                    info!(percent = total_received * 100 / n, "sender progress");
                }
            }
            Err(e) => {
                error!(error = %e, total_received, "sender receive failed");
                return None;
            }
        }
    }

    let elapsed = start.elapsed();
    let mb_per_sec = (n as f64 / (1024.0 * 1024.0)) / elapsed.as_secs_f64();
    println!("{} bytes: {:.2} MB/s", n, mb_per_sec);
    info!(total_received, ?elapsed, "sender finished");

    Some(TrialReport {
        bytes: total_received,
        elapsed,
        mb_per_sec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn test_config(port: u16) -> Config {
        Config {
            port,
            socket_buffer: 4 * 1024 * 1024,
            trials: 1,
            settle: Duration::from_millis(50),
            log_level: "info".to_string(),
        }
    }

    fn free_port() -> u16 {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    }

    #[test]
    fn test_connect_failure_yields_no_report() {
        // Nothing is listening on this port, loopback refuses immediately
        assert!(run(&test_config(free_port()), 1000).is_none());
    }

    #[test]
    fn test_peer_closing_early_suppresses_report() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let short_server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&[b'0'; 500]).unwrap();
            // Drop closes the connection with half the payload missing
        });

        assert!(run(&test_config(port), 1000).is_none());
        short_server.join().unwrap();
    }

    #[test]
    fn test_full_trial_transfers_exact_byte_count() {
        let config = test_config(free_port());
        let receiver = thread::spawn({
            let config = config.clone();
            move || receiver::run(&config, 1000)
        });

        thread::sleep(config.settle);
        let report = run(&config, 1000).expect("trial should complete");

        assert_eq!(receiver.join().unwrap(), 1000);
        assert_eq!(report.bytes, 1000);
        assert!(report.mb_per_sec > 0.0);
    }

    #[test]
    fn test_single_byte_trial_still_reports() {
        let config = test_config(free_port());
        let receiver = thread::spawn({
            let config = config.clone();
            move || receiver::run(&config, 1)
        });

        thread::sleep(config.settle);
        let report = run(&config, 1).expect("one byte trial should complete");

        assert_eq!(receiver.join().unwrap(), 1);
        assert_eq!(report.bytes, 1);
    }
}
