//! Network probes: local port occupancy and HTTP reachability.
//!
//! Both probes use short fixed timeouts so a slow target cannot stall the
//! run beyond the poller's budget.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use ureq::Agent;

const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const HTTP_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// True when something is already listening on `localhost:port`.
pub fn port_in_use(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, PORT_PROBE_TIMEOUT).is_ok()
}

/// Agent for readiness probes with a bounded per-request timeout.
pub fn probe_agent() -> Agent {
    Agent::config_builder()
        .timeout_global(Some(HTTP_PROBE_TIMEOUT))
        .build()
        .into()
}

/// Single bounded reachability check; any transport or HTTP error counts as
/// not ready.
pub fn url_reachable(agent: &Agent, url: &str) -> bool {
    agent.get(url).call().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn port_in_use_sees_a_live_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        assert!(port_in_use(port));
    }

    #[test]
    fn url_probe_fails_for_unreachable_target() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);
        let agent = probe_agent();
        assert!(!url_reachable(&agent, &format!("http://127.0.0.1:{port}/health")));
    }
}
