// Time bucketing and per-category aggregation
pub mod aggregate;
pub mod bucket;
pub mod tvl;

// Wallet-level analyses
pub mod ledger;
pub mod winless;

// Cross-chain views
pub mod crosschain;
pub mod multichain;

// Pipeline and execution
pub mod analysis;
pub mod ingest;
pub mod tasks;

// Binary support
pub mod config;
pub mod report;
pub mod telemetry;

pub use prizeflow_core::*;

pub use analysis::{analyze_chain, AnalysisMode, AnalysisOptions, ChainReport, ReusableState};
pub use bucket::{Boundaries, LowerBound};
pub use crosschain::{merge_chains, CrossChainDataset};
pub use multichain::{moving_users, multichain_distribution, MovingUsers, MultichainDistribution};
pub use tasks::{AnalysisRequest, AnalysisResponse, TaskError, TaskRunner};
