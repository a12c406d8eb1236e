use serde::{Deserialize, Serialize};

/// Current on-chain balance of one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub wallet: String,
    pub balance: f64,
}

/// Outcome of one prize draw on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub draw: u32,
    pub winners: u32,
    pub total_payout: f64,
    #[serde(default)]
    pub completed_at: Option<i64>,
}
