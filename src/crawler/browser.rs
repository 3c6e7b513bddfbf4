//! Crawl orchestrator
//!
//! The [`Browser`] owns both work queues, the downloader, the archive store
//! and the record sink, and drives the three phases:
//!
//! 1. **browse**: breadth-first walk over listing pages. Harvestable links go
//!    to the harvest queue, browsable links back into the browse queue.
//! 2. **harvest**: drains the harvest queue and archives every page body.
//! 3. **extract**: drains the archive store and writes parsed records.
//!
//! Browse and harvest pause with exponential backoff when their queue hands
//! out nothing, and race a cancellation token at every suspension point.

use crate::archive::{open_store, ArchiveStore, MemoryArchiveStore};
use crate::config::Config;
use crate::crawler::backoff::Backoff;
use crate::crawler::report::{Phase, PhaseReport};
use crate::download::{is_retryable, DownloadOutcome, Downloader, HttpDownloader};
use crate::extract::{Page, PageHandler, SelectorHandler};
use crate::queue::{open_queues, MemoryQueue, WorkQueue};
use crate::sink::{open_sink, MemorySink, RecordSink};
use crate::state::PhaseState;
use crate::url::{resolve_link, shorten_url};
use crate::{Result, TrawlError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

/// Default number of consecutive empty dequeues before a phase gives up
const DEFAULT_MAX_IDLE_PAUSES: u32 = 10;

/// Links and stop decision read from one downloaded page
struct PageLinks {
    harvestable: Vec<String>,
    browsable: Vec<String>,
    stop: bool,
}

/// Which queue a download loop drains
#[derive(Clone, Copy)]
enum DrainTarget {
    Browse,
    Harvest,
}

/// Moves `state` to `next`, rejecting transitions the phase machine forbids
fn transition(state: &mut PhaseState, next: PhaseState) -> Result<()> {
    if !state.can_transition_to(next) {
        return Err(TrawlError::InvalidTransition {
            from: *state,
            to: next,
        });
    }
    *state = next;
    Ok(())
}

/// Crawl orchestrator for one site
pub struct Browser {
    base_url: Url,
    handler: Box<dyn PageHandler>,
    downloader: Box<dyn Downloader>,
    browse_queue: Box<dyn WorkQueue>,
    harvest_queue: Box<dyn WorkQueue>,
    archive: Box<dyn ArchiveStore>,
    sink: Box<dyn RecordSink>,
    backoff: Backoff,
    max_idle_pauses: u32,
    cancel: CancellationToken,
    span: Span,
}

impl Browser {
    /// Creates a browser with in-memory queues, archive and sink
    ///
    /// Use the `with_*` methods to plug in durable collaborators.
    pub fn new(
        base_url: Url,
        handler: Box<dyn PageHandler>,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        let span = tracing::info_span!("browser", base_url = %base_url);
        Self {
            base_url,
            handler,
            downloader,
            browse_queue: Box::new(MemoryQueue::new("browse")),
            harvest_queue: Box::new(MemoryQueue::new("harvest")),
            archive: Box::new(MemoryArchiveStore::new()),
            sink: Box::new(MemorySink::new()),
            backoff: Backoff::new(Duration::from_millis(300), Duration::from_secs(30 * 60)),
            max_idle_pauses: DEFAULT_MAX_IDLE_PAUSES,
            cancel: CancellationToken::new(),
            span,
        }
    }

    /// Builds a browser and all its collaborators from a configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `cancel` - Token that stops the running phase when cancelled
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let base_url = config.base_url()?;
        let handler = SelectorHandler::new(&config.rules)?;
        let downloader = HttpDownloader::new(base_url.clone(), config.download.clone())?;
        let (browse_queue, harvest_queue) = open_queues(&config.queue)?;
        let archive = open_store(&config.archive)?;
        let sink = open_sink(&config.sink)?;

        Ok(Self::new(base_url, Box::new(handler), Box::new(downloader))
            .with_queues(browse_queue, harvest_queue)
            .with_archive(Box::new(archive))
            .with_sink(sink)
            .with_backoff(
                Backoff::from_config(&config.backoff),
                config.backoff.max_idle_pauses,
            )
            .with_cancellation(cancel))
    }

    pub fn with_queues(mut self, browse: Box<dyn WorkQueue>, harvest: Box<dyn WorkQueue>) -> Self {
        self.browse_queue = browse;
        self.harvest_queue = harvest;
        self
    }

    pub fn with_archive(mut self, archive: Box<dyn ArchiveStore>) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the pause policy and how many consecutive pauses end a phase
    pub fn with_backoff(mut self, backoff: Backoff, max_idle_pauses: u32) -> Self {
        self.backoff = backoff;
        self.max_idle_pauses = max_idle_pauses;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the tracing span phases are instrumented with
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Token that stops the running phase when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn browse_queue_mut(&mut self) -> &mut dyn WorkQueue {
        self.browse_queue.as_mut()
    }

    pub fn harvest_queue_mut(&mut self) -> &mut dyn WorkQueue {
        self.harvest_queue.as_mut()
    }

    pub fn archive_mut(&mut self) -> &mut dyn ArchiveStore {
        self.archive.as_mut()
    }

    /// Runs the browse phase until the stop predicate fires, the browse
    /// queue is exhausted or the phase is cancelled
    ///
    /// # Arguments
    ///
    /// * `initial` - Where to start, resolved against the base URL;
    ///   defaults to the base URL itself
    pub async fn browse(&mut self, initial: Option<&str>) -> Result<PhaseReport> {
        let span = self.span.clone();
        async move {
            tracing::info!("Start browsing");
            let seed = match initial {
                Some(initial) => self.base_url.join(initial)?.to_string(),
                None => self.base_url.to_string(),
            };
            if self.browse_queue.enqueue(&seed)? {
                tracing::info!("Seeded browse queue with {}", shorten_url(&seed));
            }

            let report = self.drain(DrainTarget::Browse).await?;
            tracing::info!("Finished browsing: {}", report);
            Ok::<_, TrawlError>(report)
        }
        .instrument(span)
        .await
    }

    /// Runs the harvest phase until the harvest queue is exhausted or the
    /// phase is cancelled
    pub async fn harvest(&mut self) -> Result<PhaseReport> {
        let span = self.span.clone();
        async move {
            tracing::info!("Start harvesting");
            let report = self.drain(DrainTarget::Harvest).await?;
            tracing::info!("Finished harvesting: {}", report);
            Ok::<_, TrawlError>(report)
        }
        .instrument(span)
        .await
    }

    /// Runs the extract phase until the archive store is empty
    ///
    /// A page the handler fails to parse is logged and skipped; a sink or
    /// archive failure ends the phase with an error.
    pub fn extract(&mut self) -> Result<PhaseReport> {
        let _guard = self.span.clone().entered();
        tracing::info!("Start extracting");

        let mut report = PhaseReport::new(Phase::Extract);
        let mut state = PhaseState::Seeded;

        while !self.archive.is_empty() {
            if self.cancel.is_cancelled() {
                tracing::info!("Extract phase cancelled");
                report.cancelled = true;
                break;
            }
            transition(&mut state, PhaseState::Running)?;

            let (id, body) = self.archive.get()?;
            report.extracted += 1;
            tracing::info!("Parsing {}", id);

            let parsed = {
                let page = Page::from_archive(&body);
                self.handler.parse(&page)
            };

            match parsed {
                Ok(records) if records.is_empty() => {
                    tracing::debug!("No record found in {}", id);
                }
                Ok(records) => {
                    let inserted = self.sink.write(&records)?;
                    report.records_written += inserted;
                    tracing::info!("Inserted {}", inserted);
                }
                Err(e) => {
                    report.parse_failures += 1;
                    tracing::warn!("Skipping {}: {}", id, e);
                }
            }
        }

        transition(&mut state, PhaseState::Stopped)?;
        report.state = state;
        tracing::info!("Finished extracting: {}", report);
        Ok(report)
    }

    /// Runs browse, harvest and extract in sequence
    ///
    /// Later phases are skipped once a phase reports cancellation.
    pub async fn run(&mut self, initial: Option<&str>) -> Result<Vec<PhaseReport>> {
        let mut reports = Vec::with_capacity(3);

        let browse = self.browse(initial).await?;
        let cancelled = browse.cancelled;
        reports.push(browse);
        if cancelled {
            return Ok(reports);
        }

        let harvest = self.harvest().await?;
        let cancelled = harvest.cancelled;
        reports.push(harvest);
        if cancelled {
            return Ok(reports);
        }

        reports.push(self.extract()?);
        Ok(reports)
    }

    /// Shared dequeue / download / classify loop of browse and harvest
    async fn drain(&mut self, target: DrainTarget) -> Result<PhaseReport> {
        let phase = match target {
            DrainTarget::Browse => Phase::Browse,
            DrainTarget::Harvest => Phase::Harvest,
        };
        let mut report = PhaseReport::new(phase);
        let mut state = PhaseState::Seeded;
        let cancel = self.cancel.clone();
        self.backoff.reset();

        loop {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if self.queue(target).is_empty()? {
                break;
            }

            let current = match self.queue(target).dequeue()? {
                Some(current) => current,
                None => {
                    if self.backoff.pauses() >= self.max_idle_pauses {
                        tracing::info!(
                            "No item after {} pauses, giving up",
                            self.backoff.pauses()
                        );
                        break;
                    }
                    transition(&mut state, PhaseState::Paused)?;
                    let pause = self.backoff.next_delay();
                    report.pauses += 1;
                    tracing::info!("Empty message received from queue, pausing for {:?}", pause);

                    let cancelled = tokio::select! {
                        _ = cancel.cancelled() => true,
                        _ = tokio::time::sleep(pause) => false,
                    };
                    if cancelled {
                        report.cancelled = true;
                        break;
                    }
                    continue;
                }
            };

            transition(&mut state, PhaseState::Running)?;
            self.backoff.reset();
            report.dequeued += 1;

            tracing::info!("Downloading {}", shorten_url(&current));
            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                outcome = self.downloader.download(&current) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                // Not processed, keep it for the next run
                self.queue(target).re_enqueue(&current)?;
                report.cancelled = true;
                break;
            };

            let mut stop = false;
            match outcome {
                DownloadOutcome::Allowed(body) => {
                    report.downloaded += 1;
                    stop = match target {
                        DrainTarget::Browse => {
                            self.process_listing(&current, &body, &mut report)?
                        }
                        DrainTarget::Harvest => {
                            self.store_page(&current, &body)?;
                            report.archived += 1;
                            false
                        }
                    };
                }
                DownloadOutcome::Denied => {
                    report.denied += 1;
                    tracing::info!("Forbidden to fetch {}, skipping", shorten_url(&current));
                }
                DownloadOutcome::Failed(status) if is_retryable(status) => {
                    report.retried += 1;
                    tracing::info!(
                        "Transient failure ({}) for {}, re-enqueueing",
                        describe_status(status),
                        shorten_url(&current)
                    );
                    self.queue(target).re_enqueue(&current)?;
                }
                DownloadOutcome::Failed(status) => {
                    report.dropped += 1;
                    tracing::warn!(
                        "Dropping {} after {}",
                        shorten_url(&current),
                        describe_status(status)
                    );
                }
            }

            // Every fetch is paced, including the one that ends browsing
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = self.downloader.sleep() => false,
            };
            if cancelled {
                report.cancelled = true;
                break;
            }
            if stop {
                tracing::info!("Reached last page to browse, stopping");
                break;
            }
        }

        transition(&mut state, PhaseState::Stopped)?;
        report.state = state;
        Ok(report)
    }

    fn queue(&mut self, target: DrainTarget) -> &mut dyn WorkQueue {
        match target {
            DrainTarget::Browse => self.browse_queue.as_mut(),
            DrainTarget::Harvest => self.harvest_queue.as_mut(),
        }
    }

    /// Parses a listing page and reads its links
    ///
    /// Kept synchronous: the parsed document must not live across an await.
    fn read_links(&self, url: &str, body: &[u8]) -> Result<PageLinks> {
        let page_url = Url::parse(url).or_else(|_| self.base_url.join(url))?;
        let page = Page::new(page_url.clone(), body);

        let resolve = |hrefs: Vec<String>| -> Vec<String> {
            hrefs
                .iter()
                .filter_map(|href| resolve_link(href, &page_url))
                .collect()
        };

        let harvestable = resolve(self.handler.get_harvestable(&page));
        let stop = self.handler.stop_test(&page);
        let browsable = if stop {
            Vec::new()
        } else {
            resolve(self.handler.get_browsable(&page))
        };

        Ok(PageLinks {
            harvestable,
            browsable,
            stop,
        })
    }

    /// Queues the links of a listing page; returns true if browsing must stop
    fn process_listing(&mut self, url: &str, body: &[u8], report: &mut PhaseReport) -> Result<bool> {
        tracing::debug!("Parsing HTML of {}", shorten_url(url));
        let links = self.read_links(url, body)?;

        for link in &links.harvestable {
            if self.harvest_queue.enqueue(link)? {
                report.discovered += 1;
                tracing::info!("Found to harvest {}", shorten_url(link));
            }
        }

        if links.stop {
            return Ok(true);
        }

        for link in &links.browsable {
            if self.browse_queue.enqueue(link)? {
                report.discovered += 1;
                tracing::info!("Found to browse next {}", shorten_url(link));
            }
        }

        Ok(false)
    }

    fn store_page(&mut self, url: &str, body: &[u8]) -> Result<()> {
        let id = self.handler.get_page_id(url);
        tracing::info!("Storing {}", shorten_url(url));
        self.archive.put(&id, body)?;
        Ok(())
    }
}

fn describe_status(status: Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}
