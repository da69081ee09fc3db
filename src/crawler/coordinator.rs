//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of a run:
//! - Depth-first traversal of every configured site from its seeds
//! - Fetching, language gating, extraction, chunking and translation of each page
//! - Appending records and the optional emission ledger
//! - Harvesting JSON feeds through the same pipeline
//! - Handling interrupts and writing the visited-URL file

use crate::chunk::Chunker;
use crate::config::{Config, FeedEntry, SiteEntry};
use crate::crawler::feed::FeedPager;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_links;
use crate::extract::{language_sample, DateSource, Extractor, PageDocument};
use crate::frontier::{CrawlTarget, Frontier, Worklist};
use crate::language::LanguageDetector;
use crate::output::{
    ensure_parent_dir, write_visited_urls, CrawlStats, EmissionLedger, OutputRecord,
    RecordBuffer, RunStatus,
};
use crate::state::{FailureKind, PageState, SkipReason};
use crate::translate::TranslationPipeline;
use crate::url::{normalize_parsed, normalize_url, site_key};
use crate::{ExtractError, HarvestError, UrlError};
use rand::Rng;
use scraper::Html;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// What a fetched HTML page yielded, computed without holding the DOM across awaits
struct AnalyzedPage {
    links: Vec<String>,
    language_supported: bool,
    document: Result<PageDocument, ExtractError>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    extractor: Extractor,
    detector: LanguageDetector,
    chunker: Chunker,
    translation: TranslationPipeline,
    frontier: Frontier,
    buffer: RecordBuffer,
    records_path: PathBuf,
    ledger: Option<EmissionLedger>,
    stats: CrawlStats,
    shutdown: Arc<AtomicBool>,
    config_hash: String,
    pages_processed: u64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client, extractor, chunker, translator or ledger cannot be built
    /// from the configuration.
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(&config.http)?;
        let extractor = Extractor::new(&config.extract)?;
        let chunker = Chunker::from_config(&config.chunk)?;
        let translation =
            TranslationPipeline::from_config(&config.translate, fetcher.client().clone())?;

        let ledger = match &config.output.ledger_path {
            Some(path) => {
                let path = Path::new(path);
                ensure_parent_dir(path)?;
                Some(EmissionLedger::open(path)?)
            }
            None => None,
        };

        Ok(Self {
            detector: LanguageDetector::from_config(&config.language),
            frontier: Frontier::new(&config.http.excluded_extensions),
            records_path: PathBuf::from(&config.output.records_path),
            fetcher,
            extractor,
            chunker,
            translation,
            buffer: RecordBuffer::new(),
            ledger,
            stats: CrawlStats::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            config_hash: String::new(),
            pages_processed: 0,
            config,
        })
    }

    /// Sets the configuration hash stored with the ledger run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Flag that stops the crawl between pages when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl: every seed of every site, then every feed
    ///
    /// Per-page problems are logged and counted; only output setup errors abort the run.
    pub async fn run(&mut self) -> Result<CrawlStats, HarvestError> {
        self.start_run()?;
        let start_time = Instant::now();

        tracing::info!(
            "Crawling {} site(s) from {} seed(s), max depth {}",
            self.config.sites.len(),
            self.config.seed_count(),
            self.config.crawler.max_depth
        );
        if !self.translation.is_enabled() {
            tracing::info!("Translation disabled, chunks are written as extracted");
        }

        let sites = self.config.sites.clone();
        for site in &sites {
            if self.is_shutdown() {
                break;
            }
            self.crawl_site(site).await;
        }

        let feeds = self.config.feeds.clone();
        for feed in &feeds {
            if self.is_shutdown() {
                break;
            }
            self.harvest_feed(feed).await;
        }

        self.finish()?;

        tracing::info!(
            "Crawl completed: {} pages persisted, {} chunks written in {:?}",
            self.stats.pages_persisted,
            self.stats.chunks_written,
            start_time.elapsed()
        );

        Ok(self.stats.clone())
    }

    /// Extracts the pages listed in a file, one URL per line, without following links
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub async fn extract_url_list(&mut self, path: &Path) -> Result<CrawlStats, HarvestError> {
        let content = std::fs::read_to_string(path)?;
        self.start_run()?;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if self.is_shutdown() {
                break;
            }

            let target = match listed_target(line, 1) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("Skipping listed URL {}: {}", line, e);
                    continue;
                }
            };
            self.process_target(&target, None, false).await;
        }

        self.finish()?;
        Ok(self.stats.clone())
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn start_run(&mut self) -> Result<(), HarvestError> {
        if let Some(ledger) = &mut self.ledger {
            let run_id = ledger.start_run(&self.config_hash)?;
            tracing::info!("Started ledger run {}", run_id);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), HarvestError> {
        if let Some(path) = &self.config.output.visited_path {
            let count = write_visited_urls(Path::new(path), self.frontier.visited().iter())?;
            tracing::info!("Wrote {} visited URLs to {}", count, path);
        }

        let status = if self.is_shutdown() {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        if let Some(ledger) = &mut self.ledger {
            ledger.finish_run(status, &self.stats)?;
        }
        Ok(())
    }

    /// Depth-first crawl of one site, seed by seed
    async fn crawl_site(&mut self, site: &SiteEntry) {
        self.frontier.set_exclude_prefixes(&site.exclude_urls);
        let base_override = site.base_url.as_deref().and_then(|b| Url::parse(b).ok());

        for seed in &site.seeds {
            let target = match listed_target(seed, self.config.crawler.max_depth) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed, e);
                    continue;
                }
            };

            tracing::info!("Crawling from seed {}", target.url);
            let mut worklist = Worklist::seeded(target);

            while let Some(target) = worklist.pop() {
                if self.is_shutdown() {
                    tracing::info!(
                        "Shutdown requested, {} pages left unvisited",
                        worklist.len() + 1
                    );
                    return;
                }
                let children = self
                    .process_target(&target, base_override.as_ref(), true)
                    .await;
                worklist.push_children(children);
            }
        }
    }

    /// Moves a page through the pipeline, returning the children to visit
    async fn process_target(
        &mut self,
        target: &CrawlTarget,
        base_override: Option<&Url>,
        discover_links: bool,
    ) -> Vec<CrawlTarget> {
        let url = &target.url;
        let mut state = PageState::Pending;

        if target.depth_remaining == 0 {
            self.transition(&mut state, PageState::Skipped(SkipReason::DepthExhausted), url);
            return Vec::new();
        }
        if !self.frontier.record_visited(url) {
            self.transition(&mut state, PageState::Skipped(SkipReason::AlreadyVisited), url);
            return Vec::new();
        }

        self.transition(&mut state, PageState::Fetching, url);
        self.politeness_delay().await;

        let fetched = match self.fetcher.fetch(&target.location).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Failed to fetch {} ({}): {}", url, e.kind().as_str(), e);
                self.transition(&mut state, PageState::Failed(FailureKind::Fetch), url);
                return Vec::new();
            }
        };
        self.stats.pages_fetched += 1;
        self.report_progress();

        let final_url = normalize_parsed(fetched.final_url.clone())
            .unwrap_or_else(|_| fetched.final_url.clone());
        if site_key(&final_url).as_deref() != Some(target.domain.as_str()) {
            tracing::debug!("{} redirected off-site to {}", url, final_url);
            self.transition(&mut state, PageState::Skipped(SkipReason::OffSite), url);
            return Vec::new();
        }
        if final_url != *url && !self.frontier.record_visited(&final_url) {
            tracing::debug!("{} redirected to already visited {}", url, final_url);
            self.transition(&mut state, PageState::Skipped(SkipReason::AlreadyVisited), url);
            return Vec::new();
        }

        if !fetched.is_html() {
            tracing::debug!(
                "Skipping {} with content type {:?}",
                url,
                fetched.content_type
            );
            self.transition(&mut state, PageState::Skipped(SkipReason::ContentMismatch), url);
            return Vec::new();
        }

        // Links resolve against the URL as served; the normalized form may have lost a
        // directory's trailing slash
        let page_url = &fetched.final_url;
        let page = self.analyze(&fetched.body, page_url, base_override);

        if !page.language_supported {
            tracing::debug!("Skipping {} (unsupported language)", url);
            self.transition(
                &mut state,
                PageState::Skipped(SkipReason::UnsupportedLanguage),
                url,
            );
            if !discover_links || self.config.crawler.gate_link_discovery {
                return Vec::new();
            }
            return self.discover(&mut state, &page.links, page_url, base_override, target);
        }

        if self.already_emitted(final_url.as_str()) {
            tracing::debug!("Skipping {} (already emitted)", url);
            self.transition(&mut state, PageState::Skipped(SkipReason::AlreadyEmitted), url);
            if !discover_links {
                return Vec::new();
            }
            return self.discover(&mut state, &page.links, page_url, base_override, target);
        }

        let document = match page.document {
            Ok(document) => PageDocument {
                url: final_url.to_string(),
                ..document
            },
            Err(e) => {
                tracing::warn!("Failed to extract {}: {}", url, e);
                self.transition(&mut state, PageState::Failed(FailureKind::Parse), url);
                return Vec::new();
            }
        };
        self.transition(&mut state, PageState::Extracted, url);

        if !self.emit_document(&mut state, document).await || !discover_links {
            return Vec::new();
        }

        self.discover(&mut state, &page.links, page_url, base_override, target)
    }

    /// Parses the body once and pulls out everything later stages need
    fn analyze(&self, body: &str, page_url: &Url, base_override: Option<&Url>) -> AnalyzedPage {
        let html = Html::parse_document(body);
        AnalyzedPage {
            links: extract_links(&html),
            language_supported: self.detector.is_supported(&language_sample(&html)),
            document: self.extractor.extract(&html, page_url, base_override),
        }
    }

    fn already_emitted(&self, url: &str) -> bool {
        match &self.ledger {
            Some(ledger) => ledger.contains(url).unwrap_or_else(|e| {
                tracing::warn!("Ledger lookup failed for {}: {}", url, e);
                false
            }),
            None => false,
        }
    }

    /// Chunks, translates and persists a document
    ///
    /// Returns false when the records could not be written.
    async fn emit_document(&mut self, state: &mut PageState, document: PageDocument) -> bool {
        let source = document.url.clone();
        if document.date_source == DateSource::CrawlTime {
            tracing::debug!("No page date for {}, using crawl date", source);
        }

        let chunks = self.chunker.chunk(&document.raw_text);
        self.transition(state, PageState::Chunked, &source);

        let title = self.translation.translate_title(&document.title).await;
        let translated = self.translation.translate_chunks(chunks).await;
        self.stats.chunks_dropped += translated.dropped as u64;
        self.stats.chunks_untranslated += translated.kept_original as u64;
        self.transition(state, PageState::Translated, &source);

        for (ordinal, chunk) in translated.chunks.into_iter().enumerate() {
            self.buffer.append(OutputRecord::new(
                ordinal,
                source.as_str(),
                title.as_str(),
                chunk,
                document.extracted_date.as_str(),
            ));
        }

        match self.buffer.flush(&self.records_path) {
            Ok(written) => {
                self.stats.chunks_written += written as u64;
                if let Some(ledger) = &mut self.ledger {
                    if let Err(e) = ledger.record_emitted(&source, &title, written) {
                        tracing::warn!("Failed to record {} in ledger: {}", source, e);
                    }
                }
                tracing::debug!("Wrote {} chunks for {}", written, source);
                self.transition(state, PageState::Persisted, &source);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to write records for {}: {}", source, e);
                self.buffer.discard();
                self.transition(state, PageState::Failed(FailureKind::Write), &source);
                false
            }
        }
    }

    /// Admits the page's links through the frontier, in document order
    fn discover(
        &mut self,
        state: &mut PageState,
        links: &[String],
        page_url: &Url,
        base_override: Option<&Url>,
        target: &CrawlTarget,
    ) -> Vec<CrawlTarget> {
        self.transition(state, PageState::LinkDiscovery, page_url);

        let mut seen = HashSet::new();
        let children: Vec<CrawlTarget> = links
            .iter()
            .filter_map(|href| {
                self.frontier
                    .should_visit(href, page_url, base_override, &target.domain)
            })
            .filter(|link| seen.insert(link.url.clone()))
            .map(|link| CrawlTarget {
                url: link.url,
                location: link.location,
                domain: target.domain.clone(),
                depth_remaining: target.depth_remaining - 1,
            })
            .collect();

        tracing::trace!("{} links queued from {}", children.len(), page_url);
        self.stats.links_queued += children.len() as u64;
        children
    }

    /// Harvests every page of a JSON feed
    async fn harvest_feed(&mut self, feed: &FeedEntry) {
        tracing::info!("Harvesting feed {}", feed.url_template);
        let mut pager = FeedPager::new(feed.url_template.as_str());

        while !self.is_shutdown() {
            let Some(posts) = pager.next_batch(&self.fetcher).await else {
                break;
            };
            for post in posts {
                if self.is_shutdown() {
                    break;
                }
                self.stats.feed_items += 1;
                self.process_feed_document(post.into_document()).await;
            }
        }
    }

    async fn process_feed_document(&mut self, mut document: PageDocument) {
        let mut state = PageState::Pending;

        if let Ok(url) = normalize_url(&document.url) {
            if !self.frontier.record_visited(&url) {
                self.transition(&mut state, PageState::Skipped(SkipReason::AlreadyVisited), &url);
                return;
            }
            document.url = url.to_string();
        }

        let source = document.url.clone();
        self.transition(&mut state, PageState::Fetching, &source);
        if self.already_emitted(&source) {
            self.transition(&mut state, PageState::Skipped(SkipReason::AlreadyEmitted), &source);
            return;
        }

        self.transition(&mut state, PageState::Extracted, &source);
        self.emit_document(&mut state, document).await;
    }

    /// Advances the page state, counting terminal outcomes
    fn transition(&mut self, state: &mut PageState, next: PageState, url: impl std::fmt::Display) {
        match state.advance(next) {
            Ok(()) => {
                tracing::trace!("{}: {}", url, next);
                if next.is_terminal() {
                    tracing::debug!("{} finished as {}", url, next);
                }
                self.stats.record_state(next);
            }
            Err(e) => tracing::error!("{} for {}", e, url),
        }
    }

    async fn politeness_delay(&self) {
        let max = self.config.crawler.politeness_jitter_ms;
        if max == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(0..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    fn report_progress(&mut self) {
        self.pages_processed += 1;
        if self.pages_processed % 10 == 0 {
            tracing::info!(
                "Progress: {} pages fetched, {} visited, {} chunks written",
                self.stats.pages_fetched,
                self.frontier.visited().len(),
                self.stats.chunks_written
            );
        }
    }
}

/// Builds the target for a seed or a listed URL
///
/// The URL is requested as written (minus its fragment) and deduplicated by its normalized form.
fn listed_target(raw: &str, depth_remaining: u32) -> Result<CrawlTarget, UrlError> {
    let mut location = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    location.set_fragment(None);
    let url = normalize_parsed(location.clone())?;
    let domain = site_key(&url).ok_or(UrlError::MissingDomain)?;
    Ok(CrawlTarget {
        url,
        location,
        domain,
        depth_remaining,
    })
}

/// Builds a coordinator for `config` and runs it to completion
///
/// # Example
///
/// ```no_run
/// # use page_harvest::config::load_config;
/// # use page_harvest::crawler::run_crawl;
/// # use std::path::Path;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} chunks written", stats.chunks_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStats, HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
