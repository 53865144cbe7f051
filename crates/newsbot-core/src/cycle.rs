//! One digest cycle: fetch → pack → paginate → send → commit.
//!
//! Triggers never interleave. A run that starts while another is in flight
//! gets `Error::Busy` and leaves no trace.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    aggregator::Aggregator,
    categories::CategoryConfig,
    delivery::{port::DeliveryPort, progress::ProgressSink},
    domain::{ArticleRecord, RecordOutcome},
    errors::Error,
    packer::{group_by_category, pack},
    paginator::{paginate, PageTemplate},
    store::SeenStore,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Packing,
    Sending,
    Committing,
    /// Last run was abandoned; cleared when the next run starts.
    Error,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleState::Idle => "idle",
            CycleState::Fetching => "fetching",
            CycleState::Packing => "packing",
            CycleState::Sending => "sending",
            CycleState::Committing => "committing",
            CycleState::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    NoNewArticles,
    /// Articles were found but none survived grouping.
    NothingToSend { articles: usize },
    Delivered {
        articles: usize,
        pages: usize,
        committed: usize,
        commit_failures: usize,
    },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoNewArticles => write!(f, "no new articles"),
            CycleOutcome::NothingToSend { articles } => {
                write!(f, "{articles} articles, nothing to send")
            }
            CycleOutcome::Delivered {
                articles,
                pages,
                committed,
                commit_failures,
            } => {
                write!(f, "{articles} articles in {pages} pages, {committed} recorded")?;
                if *commit_failures > 0 {
                    write!(f, ", {commit_failures} failed to record")?;
                }
                Ok(())
            }
        }
    }
}

/// How the last finished run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub finished_at: DateTime<Local>,
    pub outcome: std::result::Result<CycleOutcome, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleStatus {
    pub state: CycleState,
    pub last: Option<CycleReport>,
}

struct Tracker {
    state: CycleState,
    last: Option<CycleReport>,
}

pub struct DigestCycle {
    aggregator: Aggregator,
    categories: CategoryConfig,
    store: Arc<dyn SeenStore>,
    delivery: Arc<dyn DeliveryPort>,
    template: PageTemplate,
    run_lock: Mutex<()>,
    tracker: Mutex<Tracker>,
}

impl DigestCycle {
    pub fn new(
        aggregator: Aggregator,
        categories: CategoryConfig,
        store: Arc<dyn SeenStore>,
        delivery: Arc<dyn DeliveryPort>,
        template: PageTemplate,
    ) -> Self {
        Self {
            aggregator,
            categories,
            store,
            delivery,
            template,
            run_lock: Mutex::new(()),
            tracker: Mutex::new(Tracker {
                state: CycleState::Idle,
                last: None,
            }),
        }
    }

    pub async fn status(&self) -> CycleStatus {
        let t = self.tracker.lock().await;
        CycleStatus {
            state: t.state,
            last: t.last.clone(),
        }
    }

    /// Run one full cycle, echoing progress to `progress`.
    pub async fn run(&self, progress: &dyn ProgressSink) -> Result<CycleOutcome> {
        let Ok(_running) = self.run_lock.try_lock() else {
            return Err(Error::Busy);
        };

        progress.report("Checking for new articles...").await;
        let result = self.run_locked(progress).await;

        let report = match &result {
            Ok(outcome) => {
                info!(%outcome, "digest cycle finished");
                self.set_state(CycleState::Idle).await;
                Ok(outcome.clone())
            }
            Err(e) => {
                error!("digest cycle failed: {e}");
                self.set_state(CycleState::Error).await;
                progress.report(&format!("Error occurred: {e}")).await;
                Err(e.to_string())
            }
        };
        self.tracker.lock().await.last = Some(CycleReport {
            finished_at: Local::now(),
            outcome: report,
        });

        result
    }

    async fn run_locked(&self, progress: &dyn ProgressSink) -> Result<CycleOutcome> {
        self.set_state(CycleState::Fetching).await;
        let batch = self.aggregator.fetch_all(&self.categories).await;
        if batch.articles.is_empty() {
            progress.report("No new articles found.").await;
            return Ok(CycleOutcome::NoNewArticles);
        }
        progress
            .report(&format!(
                "Found {} new articles. Posting...",
                batch.articles.len()
            ))
            .await;

        self.deliver(batch.articles, progress).await
    }

    /// Packing, Sending and Committing for an already fetched batch.
    async fn deliver(
        &self,
        articles: Vec<ArticleRecord>,
        progress: &dyn ProgressSink,
    ) -> Result<CycleOutcome> {
        self.set_state(CycleState::Packing).await;
        let found = articles.len();
        let caps = self.delivery.capabilities();
        let groups = group_by_category(&self.categories, articles);
        let delivered: Vec<ArticleRecord> = groups
            .iter()
            .flat_map(|g| g.articles.iter().cloned())
            .collect();
        let blocks = pack(&groups, caps.style, &caps.limits);
        let pages = paginate(blocks, Local::now().date_naive(), &self.template, &caps.limits);
        if pages.is_empty() {
            progress.report("No category fields available to share.").await;
            return Ok(CycleOutcome::NothingToSend { articles: found });
        }

        self.set_state(CycleState::Sending).await;
        for page in &pages {
            self.delivery.send(page).await?;
            info!(page = page.page, of = pages.len(), blocks = page.blocks.len(), "page sent");
        }

        self.set_state(CycleState::Committing).await;
        let mut committed = 0;
        let mut commit_failures = 0;
        for article in &delivered {
            match self.store.record(&article.seen_record()).await {
                Ok(RecordOutcome::Inserted) => committed += 1,
                Ok(RecordOutcome::AlreadyPresent) => {}
                Err(e) => {
                    warn!(link = %article.link, "failed to record delivered article: {e}");
                    commit_failures += 1;
                }
            }
        }

        Ok(CycleOutcome::Delivered {
            articles: delivered.len(),
            pages: pages.len(),
            committed,
            commit_failures,
        })
    }

    async fn set_state(&self, state: CycleState) {
        self.tracker.lock().await.state = state;
    }
}
