//! Trial orchestrator: runs one receiver/sender pair per payload size,
//! strictly sequentially.

use crate::config::Config;
use crate::receiver;
use crate::sender::{self, TrialReport};
use std::io;
use std::thread;
use tracing::{error, info, warn};

/// Run every trial in the configured series.
///
/// Each trial spawns the receiver on its own worker thread, waits out the
/// settle delay (a blind grace period, there is no readiness handshake),
/// runs the sender on the calling thread, and joins the receiver before the
/// next trial begins. Only thread-spawn failure is fatal; a trial whose
/// transfer fails contributes no report and the run continues.
pub fn run(config: &Config) -> io::Result<Vec<TrialReport>> {
    let mut reports = Vec::new();

    for n in config.trial_sizes() {
        info!(n, "starting trial");

        let worker_config = config.clone();
        let receiver = thread::Builder::new()
            .name(format!("receiver-{n}"))
            .spawn(move || receiver::run(&worker_config, n))
            .map_err(|e| {
                error!(error = %e, n, "failed to spawn receiver thread");
                e
            })?;

        thread::sleep(config.settle);
        let report = sender::run(config, n);

        match receiver.join() {
            Ok(total_sent) => info!(total_sent, "receiver thread finished"),
            Err(_) => warn!(n, "receiver thread terminated abnormally"),
        }

        if let Some(report) = report {
            reports.push(report);
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    fn test_config(port: u16, trials: u32) -> Config {
        Config {
            port,
            socket_buffer: 4 * 1024 * 1024,
            trials,
            settle: Duration::from_millis(50),
            log_level: "info".to_string(),
        }
    }

    fn free_port() -> u16 {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    }

    #[test]
    fn test_runs_every_trial_in_the_series() {
        let config = test_config(free_port(), 4);
        let reports = run(&config).unwrap();

        let bytes: Vec<u64> = reports.iter().map(|r| r.bytes).collect();
        assert_eq!(bytes, vec![1, 10, 100, 1000]);
    }

    #[test]
    fn test_repeat_runs_on_the_same_port_are_isolated() {
        // Back to back runs rebind the same port; SO_REUSEADDR covers the
        // TIME_WAIT left behind by the previous trial
        let config = test_config(free_port(), 3);

        let first = run(&config).unwrap();
        let second = run(&config).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.bytes, b.bytes);
        }
    }
}
