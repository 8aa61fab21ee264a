use std::net::{IpAddr, Ipv4Addr};

/// Address writes are counted against.
///
/// Forwarding headers are client-controlled, so they are only read when the
/// deployment says a proxy sets them. Otherwise the socket peer is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIp(pub IpAddr);

impl ClientIp {
    /// With `trust_forwarded` set, prefers the first hop of
    /// `X-Forwarded-For`, then `X-Real-IP`, then the peer.
    pub fn resolve(
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
        peer: Option<IpAddr>,
        trust_forwarded: bool,
    ) -> Self {
        let from_headers = trust_forwarded
            .then(|| {
                let forwarded = forwarded_for
                    .and_then(|value| value.split(',').next())
                    .and_then(|first| first.trim().parse().ok());
                forwarded.or_else(|| real_ip.and_then(|value| value.trim().parse().ok()))
            })
            .flatten();

        Self(
            from_headers
                .or(peer)
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        )
    }

    pub fn localhost() -> Self {
        Self(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}
