use axum::{
    extract::{connect_info::ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use crate::state::AppState;

/// Resolves the client address of a request.
///
/// Proxy headers are only honored when the transport peer is one of
/// `trusted_proxies`. `X-Forwarded-For` is read right to left and the first
/// hop that is not itself a trusted proxy wins, since entries to its left are
/// client supplied. Without a peer (e.g. in tests) the loopback address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted_proxies: &[IpAddr]) -> IpAddr {
    let fallback = IpAddr::from([127, 0, 0, 1]);
    let Some(peer) = peer else { return fallback };
    if !trusted_proxies.contains(&peer) {
        return peer;
    }

    if let Some(h) = headers.get("x-forwarded-for").and_then(|hv| hv.to_str().ok()) {
        let hops: Vec<IpAddr> = h.split(',').filter_map(|hop| hop.trim().parse::<IpAddr>().ok()).collect();
        if let Some(ip) = hops.iter().rev().find(|ip| !trusted_proxies.contains(ip)) {
            return *ip;
        }
    }
    if let Some(h) = headers.get("x-real-ip").and_then(|hv| hv.to_str().ok()) {
        if let Ok(ip) = h.trim().parse::<IpAddr>() {
            return ip;
        }
    }
    peer
}

/// Client address of the request, see [`client_ip`]. Never rejects.
#[derive(Clone, Copy, Debug)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(client_ip(&parts.headers, peer, &state.config.server.trusted_proxies)))
    }
}
