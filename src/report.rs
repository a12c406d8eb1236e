/// Protocol-wide report and its terminal rendering

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::analysis::ChainReport;
use crate::crosschain::CrossChainDataset;
use crate::multichain::{MovingUsers, MultichainDistribution};

const TOP_HOLDERS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolReport {
    pub generated_at: DateTime<Utc>,
    pub chains: Vec<ChainReport>,
    pub crosschain: CrossChainDataset,
    pub distribution: MultichainDistribution,
    pub moving_users: Vec<MovingUsers>,
}

pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| format!("@{ts}"))
}

pub fn format_amount(amount: f64) -> String {
    let whole = amount.floor() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn print_chain(report: &ChainReport) {
    let totals = &report.totals;
    println!("\n{} {}", "⛓️ ", report.chain.as_str().to_uppercase().bold());
    println!("{}", "-".repeat(70));
    println!(
        "   Window: {} → {} ({} buckets)",
        format_timestamp(report.boundaries.first()),
        format_timestamp(report.boundaries.last()),
        report.boundaries.len()
    );
    println!("   TVL: {}", format_amount(totals.tvl).green().bold());
    println!(
        "   Deposited: {}   Withdrawn: {}",
        format_amount(totals.deposited),
        format_amount(totals.withdrawn)
    );
    println!(
        "   Prizes claimed: {}   Yield contributed: {}",
        format_amount(totals.claimed),
        format_amount(totals.yield_contributed)
    );
    println!(
        "   Depositors: {}   Winners: {}   Delegated TVL: {}",
        totals.depositors,
        totals.winners,
        format_amount(totals.delegated_tvl)
    );
    if totals.winless_wallets > 0 {
        println!(
            "   {} {} wallets withdrew everything without winning",
            "⚠️ ",
            totals.winless_wallets.to_string().yellow()
        );
    }
}

pub fn print_summary(report: &ProtocolReport) {
    println!("\n{} {}", "🏆", "PRIZE PROTOCOL SUMMARY".bold());
    println!("{}", "=".repeat(70));
    println!("   Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    for chain in &report.chains {
        print_chain(chain);
    }

    let distribution = &report.distribution;
    println!("\n{}", "🌐 MULTICHAIN PRESENCE:".bold());
    println!(
        "   1 chain: {}   2 chains: {}   3 chains: {}   4 chains: {}   total: {}",
        distribution.one_chain,
        distribution.two_chains,
        distribution.three_chains,
        distribution.four_chains,
        distribution.total_users.to_string().bold()
    );

    if !report.crosschain.balances.is_empty() {
        println!("\n{}", "💰 TOP HOLDERS:".bold());
        for holder in report.crosschain.balances.iter().take(TOP_HOLDERS) {
            let chains: Vec<&str> = holder.chains.iter().map(|c| c.as_str()).collect();
            println!(
                "   {}  {}  [{}]",
                holder.wallet,
                format_amount(holder.balance),
                chains.join(", ")
            );
        }
    }

    println!("\n{}", "🔀 MOVING USERS:".bold());
    for movement in &report.moving_users {
        let moved: u64 = movement.destinations.iter().map(|d| d.wallets).sum();
        println!(
            "   {}: {} withdrawing wallets, {} redeposited elsewhere",
            movement.origin, movement.withdrawing_wallets, moved
        );
        for destination in movement.destinations.iter().filter(|d| d.wallets > 0) {
            println!(
                "      → {} {} wallets, {}",
                destination.chain,
                destination.wallets,
                format_amount(destination.amount)
            );
        }
    }
    println!("{}", "=".repeat(70));
}
