//! Known network table
//!
//! Static declaration-ordered registry of the chains this device signs for.
//! Substrate-like networks are keyed by genesis hash (hex, no 0x prefix),
//! Ethereum-like networks by decimal chain id. Resolver fallback iterates
//! in declaration order, so ordering here is a tie-breaker.

use crate::types::NetworkFamily;

/// SS58 prefix for generic/unregistered Substrate chains.
pub const SUBSTRATE_GENERIC_PREFIX: u16 = 42;

/// One entry of the known-network table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Genesis hash hex for Substrate chains, decimal chain id for EVM chains.
    pub key: &'static str,
    pub title: &'static str,
    pub family: NetworkFamily,
    /// SS58 address prefix; meaningful for the Substrate family only.
    pub ss58_prefix: u16,
    pub symbol: &'static str,
    pub decimals: u8,
}

pub static NETWORKS: &[NetworkSpec] = &[
    NetworkSpec {
        key: "91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3",
        title: "Polkadot",
        family: NetworkFamily::Substrate,
        ss58_prefix: 0,
        symbol: "DOT",
        decimals: 10,
    },
    NetworkSpec {
        key: "b0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe",
        title: "Kusama",
        family: NetworkFamily::Substrate,
        ss58_prefix: 2,
        symbol: "KSM",
        decimals: 12,
    },
    NetworkSpec {
        key: "e143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e",
        title: "Westend",
        family: NetworkFamily::Substrate,
        ss58_prefix: SUBSTRATE_GENERIC_PREFIX,
        symbol: "WND",
        decimals: 12,
    },
    NetworkSpec {
        key: "1",
        title: "Ethereum",
        family: NetworkFamily::Ethereum,
        ss58_prefix: 0,
        symbol: "ETH",
        decimals: 18,
    },
    NetworkSpec {
        key: "5",
        title: "Görli",
        family: NetworkFamily::Ethereum,
        ss58_prefix: 0,
        symbol: "ETH",
        decimals: 18,
    },
    NetworkSpec {
        key: "61",
        title: "Ethereum Classic",
        family: NetworkFamily::Ethereum,
        ss58_prefix: 0,
        symbol: "ETC",
        decimals: 18,
    },
];

/// Look up a network by its key.
pub fn get(key: &str) -> Option<&'static NetworkSpec> {
    NETWORKS.iter().find(|n| n.key == key)
}

/// Networks of one family, in declaration order.
pub fn by_family(family: NetworkFamily) -> impl Iterator<Item = &'static NetworkSpec> {
    NETWORKS.iter().filter(move |n| n.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_genesis_hash() {
        let net = get("b0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe").unwrap();
        assert_eq!(net.title, "Kusama");
        assert_eq!(net.ss58_prefix, 2);
    }

    #[test]
    fn lookup_by_chain_id() {
        assert_eq!(get("1").unwrap().title, "Ethereum");
        assert_eq!(get("61").unwrap().symbol, "ETC");
        assert!(get("999").is_none());
    }

    #[test]
    fn family_iteration_preserves_declaration_order() {
        let substrate: Vec<_> = by_family(NetworkFamily::Substrate).map(|n| n.title).collect();
        assert_eq!(substrate, vec!["Polkadot", "Kusama", "Westend"]);
    }
}
