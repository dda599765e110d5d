//! Cron-based scheduler for the daily eBird hybrids report

use async_trait::async_trait;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::commands::CommandDispatcher;
use crate::format::{paginate_lines, MAX_MESSAGE_LEN};

/// Where scheduled reports are delivered, e.g. a Discord channel.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(
        &self,
        channel_id: u64,
        message: String,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Posts the hybrids report to the global `report_channel` on each cron tick
pub struct ReportScheduler {
    dispatcher: Arc<CommandDispatcher>,
    sink: Arc<dyn ReportSink>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl ReportScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `dispatcher` - Source of the report and the settings naming its channel
    /// * `sink` - Delivers the report
    /// * `cron_expr` - Cron expression with a leading seconds field
    pub fn new(
        dispatcher: Arc<CommandDispatcher>,
        sink: Arc<dyn ReportSink>,
        cron_expr: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let schedule = Schedule::from_str(cron_expr).map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid cron expression '{}': {}", cron_expr, e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        info!(cron = %cron_expr, "ReportScheduler: created");

        Ok(Self {
            dispatcher,
            sink,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    /// Build and send one report. Returns the number of messages sent.
    pub async fn run_once(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        send_report(&self.dispatcher, self.sink.as_ref()).await
    }

    /// Start the scheduler
    pub async fn start(&self) {
        let dispatcher = self.dispatcher.clone();
        let sink = self.sink.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("ReportScheduler: started, waiting for cron schedule...");

            loop {
                let mut upcoming = schedule.upcoming(chrono::Utc);
                if let Some(next_tick) = upcoming.next() {
                    let now = chrono::Utc::now();
                    if next_tick > now {
                        let duration = (next_tick - now).to_std().unwrap_or_default();
                        tokio::time::sleep(duration).await;
                    }
                } else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                }

                match send_report(&dispatcher, sink.as_ref()).await {
                    Ok(sent) => debug!(messages = sent, "ReportScheduler: report sent"),
                    Err(e) => error!(error = %e, "ReportScheduler: report failed"),
                }
            }
        });

        *self.handle.write().await = Some(handle);
        info!("ReportScheduler: started successfully");
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("ReportScheduler: stopped");
        }
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}

async fn send_report(
    dispatcher: &CommandDispatcher,
    sink: &dyn ReportSink,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let global = dispatcher.settings().global().await?;
    let Some(channel_id) = global.report_channel else {
        debug!("ReportScheduler: no report channel set, skipping");
        return Ok(0);
    };

    let lines = dispatcher.hybrids_report().await?;
    let pages = paginate_lines(&lines, MAX_MESSAGE_LEN);
    let sent = pages.len();
    for page in pages {
        sink.send(channel_id, page).await?;
    }
    info!(channel_id, messages = sent, "ReportScheduler: hybrids report posted");
    Ok(sent)
}
