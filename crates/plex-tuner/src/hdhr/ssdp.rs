//! SSDP M-SEARCH responder: listens on UDP :1900 and unicasts a discovery reply so Plex can
//! find the tuner without a manual entry.

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SSDP_PORT: u16 = 1900;
const SEARCH_TARGETS: &[&str] = &[
    "ssdp:all",
    "urn:schemas-upnp-org:device:MediaServer",
    "urn:schemas-upnp-org:device:MediaServer:1",
];

/// Run the SSDP responder until `cancel` fires. Does nothing (after logging why) if
/// `base_url` is empty or fails to parse, since Plex would have nowhere to fetch
/// `device.xml` from anyway.
pub async fn run(base_url: &str, device_id: &str, cancel: CancellationToken) {
    if base_url.is_empty() || url::Url::parse(base_url).is_err() {
        warn!(base_url, "SSDP disabled: BaseURL is empty or unparsable; Plex requires manual tuner entry");
        return;
    }

    let socket = match UdpSocket::bind(("0.0.0.0", SSDP_PORT)).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SSDP disabled: failed to bind UDP :1900");
            return;
        }
    };

    info!(port = SSDP_PORT, "SSDP responder listening");
    let location = format!("{base_url}/device.xml");
    let mut buf = [0u8; 2048];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("SSDP responder shutting down");
                return;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, peer)) => {
                        if let Some(reply) = handle_datagram(&buf[..len], &location, device_id) {
                            if let Err(e) = socket.send_to(reply.as_bytes(), peer).await {
                                debug!(error = %e, %peer, "failed to send SSDP reply");
                            }
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "SSDP recv error");
                    }
                }
            }
        }
    }
}

fn handle_datagram(datagram: &[u8], location: &str, device_id: &str) -> Option<String> {
    let text = String::from_utf8_lossy(datagram);
    if !text.contains("M-SEARCH") {
        return None;
    }
    if !SEARCH_TARGETS.iter().any(|target| text.contains(target)) {
        return None;
    }
    Some(build_reply(location, device_id))
}

fn build_reply(location: &str, device_id: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=300\r\n\
         EXT:\r\n\
         LOCATION: {location}\r\n\
         SERVER: Plex-Tuner/1.0\r\n\
         ST: urn:schemas-upnp-org:device:MediaServer:1\r\n\
         USN: uuid:{device_id}::urn:schemas-upnp-org:device:MediaServer:1\r\n\
         \r\n"
    )
}
