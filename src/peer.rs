//! Remote node addresses.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;

use crate::error::AddressError;

/// A Lightning node reachable at `host:port`.
///
/// The textual form is `<node_id>@<host>:<port>`, where `node_id` is the
/// node's compressed secp256k1 public key as 66 hex characters.
///
/// ```
/// use ln_network::peer::PeerAddress;
///
/// let addr: PeerAddress =
///     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798@127.0.0.1:9735"
///         .parse()
///         .unwrap();
/// assert_eq!(addr.port, 9735);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    pub node_id: PublicKey,
    pub host: String,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(node_id: PublicKey, host: impl Into<String>, port: u16) -> Self {
        Self {
            node_id,
            host: host.into(),
            port,
        }
    }

    /// `host:port`, ready for a socket connect.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node_id, host_port) = s.split_once('@').ok_or(AddressError::MissingNodeId)?;

        // rsplit so IPv6 hosts keep their own colons
        let (host, port) = host_port.rsplit_once(':').ok_or(AddressError::MissingPort)?;
        if host.is_empty() {
            return Err(AddressError::EmptyHost);
        }
        let port = port.parse::<u16>()?;

        if node_id.len() != 66 {
            return Err(AddressError::NodeIdLength(node_id.len()));
        }
        let node_id = PublicKey::from_slice(&hex::decode(node_id)?)?;

        Ok(Self::new(node_id, host, port))
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}",
            hex::encode(self.node_id.serialize()),
            self.host,
            self.port
        )
    }
}
