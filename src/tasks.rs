/// Message-passing task runner
///
/// Every analysis runs on the blocking pool and reports back through a
/// oneshot channel. Inputs are moved into the task; datasets are shared as
/// `Arc<ChainDataset>` and the task drops its handle when it finishes.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, info, instrument, warn};

use prizeflow_core::{AnalyticsError, Chain, ChainDataset};

use crate::analysis::{analyze_chain, AnalysisOptions, ChainReport, ReusableState};
use crate::crosschain::{merge_chains, CrossChainDataset};
use crate::multichain::{moving_users, multichain_distribution, MovingUsers, MultichainDistribution};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalyticsError),
    #[error("Origin chain {0} has no dataset")]
    UnknownOrigin(Chain),
    #[error("Task {0} panicked")]
    Panicked(&'static str),
    #[error("Task {0} was dropped before reporting a result")]
    Dropped(&'static str),
}

#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    ChainAnalysis {
        dataset: Arc<ChainDataset>,
        options: AnalysisOptions,
        previous: Option<ReusableState>,
    },
    CrossChainMerge {
        datasets: Vec<Arc<ChainDataset>>,
    },
    MultichainDistribution {
        datasets: Vec<Arc<ChainDataset>>,
    },
    MovingUsers {
        origin: Chain,
        datasets: Vec<Arc<ChainDataset>>,
        until: Option<i64>,
    },
}

impl AnalysisRequest {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisRequest::ChainAnalysis { .. } => "chain_analysis",
            AnalysisRequest::CrossChainMerge { .. } => "cross_chain_merge",
            AnalysisRequest::MultichainDistribution { .. } => "multichain_distribution",
            AnalysisRequest::MovingUsers { .. } => "moving_users",
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnalysisResponse {
    ChainAnalysis(Box<ChainReport>),
    CrossChainMerge(Box<CrossChainDataset>),
    MultichainDistribution(MultichainDistribution),
    MovingUsers(MovingUsers),
}

#[derive(Debug, Clone)]
pub struct TaskRunner {
    permits: Arc<Semaphore>,
}

impl Default for TaskRunner {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map_or(4, |n| n.get());
        Self::new(workers)
    }
}

impl TaskRunner {
    pub fn new(max_concurrent: usize) -> Self {
        debug!(max_concurrent, "Task runner initialized");
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    async fn run<T, F>(&self, name: &'static str, job: F) -> Result<T, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| TaskError::Dropped(name))?;

        let (tx, rx) = oneshot::channel();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            // The receiver is gone only if the caller stopped waiting
            let _ = tx.send(job());
        });

        match rx.await {
            Ok(result) => Ok(result),
            Err(_) => match handle.await {
                Err(e) if e.is_panic() => {
                    warn!(task = name, "Task panicked");
                    Err(TaskError::Panicked(name))
                }
                _ => Err(TaskError::Dropped(name)),
            },
        }
    }

    #[instrument(skip_all, fields(chain = %dataset.chain))]
    pub async fn chain_analysis(
        &self,
        dataset: Arc<ChainDataset>,
        options: AnalysisOptions,
        previous: Option<ReusableState>,
    ) -> Result<ChainReport, TaskError> {
        let report = self
            .run("chain_analysis", move || analyze_chain(&dataset, &options, previous))
            .await??;
        Ok(report)
    }

    #[instrument(skip_all, fields(chains = datasets.len()))]
    pub async fn cross_chain_merge(
        &self,
        datasets: Vec<Arc<ChainDataset>>,
    ) -> Result<CrossChainDataset, TaskError> {
        self.run("cross_chain_merge", move || merge_chains(&datasets)).await
    }

    #[instrument(skip_all, fields(chains = datasets.len()))]
    pub async fn multichain_distribution(
        &self,
        datasets: Vec<Arc<ChainDataset>>,
    ) -> Result<MultichainDistribution, TaskError> {
        self.run("multichain_distribution", move || {
            let snapshots: Vec<_> = datasets
                .iter()
                .map(|d| (d.chain, d.balances.as_slice()))
                .collect();
            multichain_distribution(&snapshots)
        })
        .await
    }

    #[instrument(skip_all, fields(origin = %origin))]
    pub async fn moving_users(
        &self,
        origin: Chain,
        datasets: Vec<Arc<ChainDataset>>,
        until: Option<i64>,
    ) -> Result<MovingUsers, TaskError> {
        let source = datasets
            .iter()
            .find(|d| d.chain == origin)
            .cloned()
            .ok_or(TaskError::UnknownOrigin(origin))?;

        self.run("moving_users", move || {
            let destinations: Vec<_> = datasets
                .iter()
                .map(|d| (d.chain, d.deposits.as_slice()))
                .collect();
            moving_users(origin, &source.withdrawals, &destinations, until)
        })
        .await
    }

    pub async fn dispatch(&self, request: AnalysisRequest) -> Result<AnalysisResponse, TaskError> {
        info!(task = request.name(), "Dispatching analysis task");
        let response = match request {
            AnalysisRequest::ChainAnalysis {
                dataset,
                options,
                previous,
            } => AnalysisResponse::ChainAnalysis(Box::new(
                self.chain_analysis(dataset, options, previous).await?,
            )),
            AnalysisRequest::CrossChainMerge { datasets } => {
                AnalysisResponse::CrossChainMerge(Box::new(self.cross_chain_merge(datasets).await?))
            }
            AnalysisRequest::MultichainDistribution { datasets } => {
                AnalysisResponse::MultichainDistribution(self.multichain_distribution(datasets).await?)
            }
            AnalysisRequest::MovingUsers {
                origin,
                datasets,
                until,
            } => AnalysisResponse::MovingUsers(self.moving_users(origin, datasets, until).await?),
        };
        Ok(response)
    }
}
