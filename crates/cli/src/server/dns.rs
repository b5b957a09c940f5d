use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};
use warmcache_infrastructure::dns::DnsServerHandler;

const MAX_DATAGRAM: usize = 65_535;

pub async fn start_dns_server(bind_addr: String, handler: DnsServerHandler) -> anyhow::Result<()> {
    let socket_addr = SocketAddr::from_str(&bind_addr)?;

    info!(bind_address = %socket_addr, "Starting DNS server");

    let socket = Arc::new(UdpSocket::bind(socket_addr).await?);
    let handler = Arc::new(handler);
    info!(
        protocol = "UDP",
        server = handler.server_label(),
        "DNS server listening"
    );

    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "UDP receive failed");
                continue;
            }
        };
        let packet = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let handler = Arc::clone(&handler);

        tokio::spawn(async move {
            let Some(reply) = handler.handle_datagram(&packet, peer).await else {
                return;
            };
            if let Err(e) = socket.send_to(&reply, peer).await {
                debug!(error = %e, peer = %peer, "Failed to send reply");
            }
        });
    }
}
