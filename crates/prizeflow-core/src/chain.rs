use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Networks the prize protocol is deployed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Optimism,
    Base,
    Arbitrum,
    Ethereum,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Optimism, Chain::Base, Chain::Arbitrum, Chain::Ethereum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Optimism => "optimism",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Ethereum => "ethereum",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimism" | "op" => Ok(Chain::Optimism),
            "base" => Ok(Chain::Base),
            "arbitrum" | "arb" => Ok(Chain::Arbitrum),
            "ethereum" | "mainnet" | "eth" => Ok(Chain::Ethereum),
            _ => Err(AnalyticsError::UnknownChain(s.to_string())),
        }
    }
}
