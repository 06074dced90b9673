use std::sync::Arc;

use super::view::{ChartSnapshot, ChartView};
use crate::domain::errors::{ApplicationError, StorageError};
use crate::domain::models::{Granularity, HistoryStore};
use crate::domain::session::SessionContext;
use crate::infrastructure::backend_records::HistoryPayload;
use crate::infrastructure::memory::InMemoryHistory;
use chrono::{FixedOffset, Offset, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use typed_builder::TypedBuilder;

/// Settings shared by every chart the application renders.
#[derive(Clone, Debug, TypedBuilder)]
pub struct ChartConfig {
    /// Time zone clock labels and grouping keys are rendered in
    #[builder(default = Utc.fix())]
    pub display_zone: FixedOffset,
    /// Granularity of a chart nobody asked a granularity for yet
    #[builder(default)]
    pub default_granularity: Granularity,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Add to the stored history
    Append,
    /// Drop the stored history first
    Replace,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct IngestReport {
    /// Transactions added to the history
    pub stored: usize,
    /// Transactions skipped because their id was already stored
    pub duplicates: usize,
    /// Why each rejected record was rejected
    pub rejected: Vec<String>,
}

#[async_trait::async_trait]
pub trait Application {
    async fn ingest_history(
        &self,
        session: SessionContext,
        payload: HistoryPayload,
        mode: IngestMode,
    ) -> Result<IngestReport, ApplicationError>;
    async fn chart(
        &self,
        session: SessionContext,
        granularity: Option<Granularity>,
    ) -> Result<ChartSnapshot, ApplicationError>;
    async fn zoom(
        &self,
        session: SessionContext,
        left: String,
        right: String,
    ) -> Result<ChartSnapshot, ApplicationError>;
    async fn reset(&self, session: SessionContext) -> Result<ChartSnapshot, ApplicationError>;
}

pub struct App<D> {
    database: Arc<D>,
    // account -> chart currently shown to it
    views: DashMap<String, ChartView>,
    // account -> serializes the store reads and writes behind its view
    locks: DashMap<String, Arc<Mutex<()>>>,
    config: ChartConfig,
}

impl App<InMemoryHistory> {
    pub fn new(config: ChartConfig) -> Self {
        Self::with_database(Arc::new(InMemoryHistory::default()), config)
    }
}

impl<D> App<D>
where
    D: HistoryStore + Send + Sync + 'static,
{
    pub fn with_database(database: Arc<D>, config: ChartConfig) -> Self {
        Self {
            database,
            views: DashMap::new(),
            locks: DashMap::new(),
            config,
        }
    }

    /// Waits until no other operation works on `account`'s history or view.
    async fn lock_account(&self, account: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(account.to_string()).or_default());
        lock.lock_owned().await
    }

    /// Builds a fresh, unzoomed view from the stored history.
    async fn build_view(
        &self,
        account: &str,
        granularity: Granularity,
    ) -> Result<(), ApplicationError> {
        let transactions = self.database.get_transactions(account.to_string()).await?;
        tracing::debug!(
            "Charting {} transactions for account {} by {:?}",
            transactions.len(),
            account,
            granularity
        );
        let view = ChartView::build(
            &transactions,
            granularity,
            account,
            &self.config.display_zone,
        );
        self.views.insert(account.to_string(), view);
        Ok(())
    }

    /// Makes sure the account has a view at `granularity`, or at whatever it
    /// currently shows when `None`. An existing view that matches is kept.
    async fn ensure_view(
        &self,
        account: &str,
        granularity: Option<Granularity>,
    ) -> Result<(), ApplicationError> {
        let current = self.views.get(account).map(|view| view.granularity());
        let wanted = granularity
            .or(current)
            .unwrap_or(self.config.default_granularity);
        if current == Some(wanted) {
            return Ok(());
        }
        self.build_view(account, wanted).await
    }

    fn snapshot(&self, account: &str) -> Result<ChartSnapshot, ApplicationError> {
        self.views
            .get(account)
            .map(|view| view.snapshot())
            .ok_or_else(|| StorageError::AccountNotFound(account.to_string()).into())
    }
}

#[async_trait::async_trait]
impl<D> Application for App<D>
where
    D: HistoryStore + Send + Sync + 'static,
{
    async fn ingest_history(
        &self,
        session: SessionContext,
        payload: HistoryPayload,
        mode: IngestMode,
    ) -> Result<IngestReport, ApplicationError> {
        let account = session.authorize()?.to_string();
        tracing::info!(
            "Ingesting {} history records for account {} ({:?})",
            payload.len(),
            account,
            mode
        );

        let normalized = payload.normalize();
        let _guard = self.lock_account(&account).await;
        if mode == IngestMode::Replace {
            if let Err(e) = self.database.clear(account.clone()).await {
                tracing::debug!("Nothing to replace: {}", e);
            }
        }

        let accepted = normalized.transactions.len();
        let stored = self
            .database
            .store_transactions(account.clone(), normalized.transactions)
            .await?;

        // New history always brings the chart back to its full extent.
        let granularity = self
            .views
            .get(&account)
            .map(|view| view.granularity())
            .unwrap_or(self.config.default_granularity);
        self.build_view(&account, granularity).await?;

        Ok(IngestReport {
            stored,
            duplicates: accepted.saturating_sub(stored),
            rejected: normalized.rejected.iter().map(|e| e.to_string()).collect(),
        })
    }

    async fn chart(
        &self,
        session: SessionContext,
        granularity: Option<Granularity>,
    ) -> Result<ChartSnapshot, ApplicationError> {
        let account = session.authorize()?;
        tracing::info!("Getting chart for account {} ...", account);
        let _guard = self.lock_account(account).await;
        self.ensure_view(account, granularity).await?;
        self.snapshot(account)
    }

    async fn zoom(
        &self,
        session: SessionContext,
        left: String,
        right: String,
    ) -> Result<ChartSnapshot, ApplicationError> {
        let account = session.authorize()?;
        tracing::info!("Zooming chart for account {} between {} and {}", account, left, right);
        let _guard = self.lock_account(account).await;
        self.ensure_view(account, None).await?;
        let mut view = self
            .views
            .get_mut(account)
            .ok_or_else(|| StorageError::AccountNotFound(account.to_string()))?;
        view.zoom_labels(&left, &right);
        Ok(view.snapshot())
    }

    async fn reset(&self, session: SessionContext) -> Result<ChartSnapshot, ApplicationError> {
        let account = session.authorize()?;
        tracing::info!("Resetting chart for account {}", account);
        let _guard = self.lock_account(account).await;
        self.ensure_view(account, None).await?;
        let mut view = self
            .views
            .get_mut(account)
            .ok_or_else(|| StorageError::AccountNotFound(account.to_string()))?;
        view.reset();
        Ok(view.snapshot())
    }
}
