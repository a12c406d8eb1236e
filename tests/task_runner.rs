use std::sync::Arc;

use prizeflow::{
    AnalysisOptions, AnalysisRequest, AnalysisResponse, Chain, ChainDataset, Deposit, TaskRunner,
    WalletBalance, Withdrawal,
};

fn dataset(chain: Chain, deposits: &[(&str, i64, f64)], withdrawals: &[(&str, i64)]) -> Arc<ChainDataset> {
    let mut dataset = ChainDataset::empty(chain);
    dataset.deposits = deposits
        .iter()
        .enumerate()
        .map(|(i, &(wallet, ts, amount))| Deposit {
            tx_hash: format!("0x{chain}d{i}"),
            block_number: i as u64,
            timestamp: Some(ts),
            wallet: wallet.to_string(),
            amount,
        })
        .collect();
    dataset.withdrawals = withdrawals
        .iter()
        .enumerate()
        .map(|(i, &(wallet, ts))| Withdrawal {
            tx_hash: format!("0x{chain}w{i}"),
            block_number: i as u64,
            timestamp: Some(ts),
            wallet: wallet.to_string(),
            amount: 1.0,
        })
        .collect();
    dataset.balances = deposits
        .iter()
        .map(|&(wallet, _, amount)| WalletBalance {
            wallet: wallet.to_string(),
            balance: amount,
        })
        .collect();
    Arc::new(dataset)
}

fn four_chains() -> Vec<Arc<ChainDataset>> {
    vec![
        dataset(Chain::Optimism, &[("0xa", 10, 50.0), ("0xb", 20, 5.0)], &[("0xa", 30), ("0xb", 40)]),
        dataset(Chain::Base, &[("0xa", 35, 20.0)], &[]),
        dataset(Chain::Arbitrum, &[("0xa", 50, 1.0), ("0xb", 15, 9.0)], &[]),
        dataset(Chain::Ethereum, &[("0xa", 60, 2.0)], &[]),
    ]
}

#[tokio::test]
async fn per_chain_tasks_run_concurrently_and_release_inputs() {
    let datasets = four_chains();
    let runner = TaskRunner::new(2);

    let handles: Vec<_> = datasets
        .iter()
        .map(|dataset| {
            let runner = runner.clone();
            let dataset = Arc::clone(dataset);
            tokio::spawn(async move {
                runner
                    .dispatch(AnalysisRequest::ChainAnalysis {
                        dataset,
                        options: AnalysisOptions::default(),
                        previous: None,
                    })
                    .await
            })
        })
        .collect();

    let mut chains = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AnalysisResponse::ChainAnalysis(report) => chains.push(report.chain),
            other => panic!("unexpected response {other:?}"),
        }
    }

    assert_eq!(chains, Chain::ALL.to_vec());
    for dataset in &datasets {
        assert_eq!(Arc::strong_count(dataset), 1);
    }
}

#[tokio::test]
async fn cross_chain_tasks_after_per_chain_work() {
    let datasets = four_chains();
    let runner = TaskRunner::default();

    let merged = match runner
        .dispatch(AnalysisRequest::CrossChainMerge {
            datasets: datasets.clone(),
        })
        .await
        .unwrap()
    {
        AnalysisResponse::CrossChainMerge(merged) => merged,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(merged.chains, Chain::ALL.to_vec());
    assert_eq!(merged.balances[0].wallet, "0xa");
    assert_eq!(merged.balances[0].balance, 73.0);

    let distribution = runner.multichain_distribution(datasets.clone()).await.unwrap();
    assert_eq!(distribution.four_chains, 1);
    assert_eq!(distribution.two_chains, 1);
    assert_eq!(distribution.total_users, 2);

    let movement = runner
        .moving_users(Chain::Optimism, datasets.clone(), Some(55))
        .await
        .unwrap();
    let by_chain: Vec<(Chain, u64, f64)> = movement
        .destinations
        .iter()
        .map(|d| (d.chain, d.wallets, d.amount))
        .collect();
    // 0xa left at 30, 0xb at 40; the 0xb arbitrum deposit predates its withdrawal
    assert_eq!(
        by_chain,
        vec![
            (Chain::Base, 1, 20.0),
            (Chain::Arbitrum, 1, 1.0),
            (Chain::Ethereum, 0, 0.0),
        ]
    );

    for dataset in &datasets {
        assert_eq!(Arc::strong_count(dataset), 1);
    }
}
