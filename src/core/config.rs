//! Runtime knobs supplied by the embedding application.

/// Configuration for a router instance.
///
/// Interface and route definitions are constructed directly by the embedder;
/// this only carries the tunable behavior.
#[derive(Clone, Debug)]
pub struct Config {
    /// Enables NAT rewriting on the forward path.
    pub nat_enabled: bool,
    /// Name of the externally facing interface. Required when NAT is enabled.
    pub external_iface: Option<String>,
    /// Idle seconds before an ICMP mapping expires.
    pub icmp_timeout: u64,
    /// Idle seconds before an established TCP mapping expires.
    pub tcp_established_timeout: u64,
    /// Idle seconds before a transitory TCP mapping expires.
    pub tcp_transitory_timeout: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            nat_enabled: false,
            external_iface: None,
            icmp_timeout: 60,
            tcp_established_timeout: 7440,
            tcp_transitory_timeout: 300,
        }
    }
}
