use crate::config::CatalogConfig;
use crate::deep_link::{DetailLink, DetailView};
use crate::error::CatalogError;
use crate::merge::merge_apps;
use crate::models::{App, SearchRecord, SortMode};
use crate::normalizer::normalize;
use crate::render::{CatalogItem, RenderSink};
use crate::repo_fetch::{RealRepoClient, RepoClient, RepoFetcher};
use crate::search_index::SearchIndex;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::cmp::Ordering;

/// Outcome of one catalog load, per source.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    /// (source reference, number of apps it contributed)
    pub loaded: Vec<(String, usize)>,
    /// (source reference, error text)
    pub failed: Vec<(String, String)>,
}

impl LoadReport {
    pub fn total_apps(&self) -> usize {
        self.loaded.iter().map(|(_, n)| n).sum()
    }
}

async fn fetch_source<C: RepoClient>(
    fetcher: &RepoFetcher<C>,
    source_ref: &str,
) -> Result<Vec<App>, CatalogError> {
    let doc = fetcher.fetch(source_ref).await?;
    normalize(&doc.data, &doc.url)
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sorts in place. Version modes order by the parsed date of each item's
/// leading release; undated items go last when newest-first and first when
/// oldest-first. Ties fall back to name order.
pub fn sort_items(items: &mut Vec<CatalogItem>, mode: SortMode) {
    let mut keyed: Vec<(Option<DateTime<Utc>>, CatalogItem)> = std::mem::take(items)
        .into_iter()
        .map(|item| (item.release_date(), item))
        .collect();

    keyed.sort_by(|(da, a), (db, b)| match mode {
        SortMode::NameAsc => compare_names(a.name(), b.name()),
        SortMode::NameDesc => compare_names(b.name(), a.name()),
        SortMode::VersionDesc => match (da, db) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| compare_names(a.name(), b.name())),
        SortMode::VersionAsc => match (da, db) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| compare_names(a.name(), b.name())),
    });

    *items = keyed.into_iter().map(|(_, item)| item).collect();
}

/// Field-level body of `Catalog::fill_first_batch`, callable while other
/// fields of the catalog are borrowed.
fn fill_first_batch<S: RenderSink>(
    visible: &[CatalogItem],
    cursor: &mut usize,
    batch_size: usize,
    sink: &mut S,
) {
    let end = visible.len().min(batch_size.max(1));
    if *cursor < end {
        sink.append(&visible[*cursor..end]);
        *cursor = end;
    }
}

/// Session state for one catalog view: the merged app set, the active query
/// and sort mode, and how many result items have been handed to the renderer.
pub struct Catalog<C: RepoClient> {
    config: CatalogConfig,
    fetcher: RepoFetcher<C>,
    index: SearchIndex,
    apps: Vec<App>,
    query: String,
    sort_mode: SortMode,
    visible: Vec<CatalogItem>,
    cursor: usize,
}

impl Catalog<RealRepoClient> {
    pub fn from_config(config: CatalogConfig) -> Self {
        let client = RealRepoClient::new(&config);
        Self::new(client, config)
    }
}

impl<C: RepoClient> Catalog<C> {
    pub fn new(client: C, config: CatalogConfig) -> Self {
        let fetcher = RepoFetcher::new(client, &config.repo_base_url);
        Self {
            config,
            fetcher,
            index: SearchIndex::new(),
            apps: Vec::new(),
            query: String::new(),
            sort_mode: SortMode::default(),
            visible: Vec::new(),
            cursor: 0,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn apps(&self) -> &[App] {
        &self.apps
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Items produced by the last filter/sort pass.
    pub fn visible(&self) -> &[CatalogItem] {
        &self.visible
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.visible.len()
    }

    /// Fetches every source concurrently and rebuilds the catalog.
    ///
    /// Each source's apps go to the search index as soon as they arrive, and
    /// to the renderer too while no query is active. A failing source is
    /// logged and skipped. Once all sources have settled the accumulated apps
    /// are merged and the view is redrawn from the merged set.
    pub async fn load<S: RenderSink>(&mut self, sources: &[String], sink: &mut S) -> LoadReport {
        self.apps.clear();
        self.index.reset();
        self.visible.clear();
        self.cursor = 0;
        sink.reset();

        let mut report = LoadReport::default();
        let mut collected: Vec<App> = Vec::new();
        let offer_incrementally = !self.has_query();

        let fetcher = &self.fetcher;
        let mut pending: FuturesUnordered<_> = sources
            .iter()
            .map(|source_ref| async move {
                (source_ref.clone(), fetch_source(fetcher, source_ref).await)
            })
            .collect();

        while let Some((source_ref, result)) = pending.next().await {
            match result {
                Ok(apps) => {
                    log::info!("Loaded {} apps from {}", apps.len(), source_ref);
                    self.index.add_apps(&apps);
                    if offer_incrementally {
                        self.visible
                            .extend(apps.iter().cloned().map(CatalogItem::App));
                        fill_first_batch(
                            &self.visible,
                            &mut self.cursor,
                            self.config.batch_size,
                            sink,
                        );
                    }
                    report.loaded.push((source_ref, apps.len()));
                    collected.extend(apps);
                }
                Err(e) => {
                    if e.is_transport() {
                        log::warn!("Source {} unreachable: {}", source_ref, e);
                    } else {
                        log::warn!("Source {} returned an unusable catalog: {}", source_ref, e);
                    }
                    report.failed.push((source_ref, e.to_string()));
                }
            }
        }
        drop(pending);

        self.apps = merge_apps(collected);
        self.index.build(&self.apps);
        log::info!(
            "Catalog ready: {} apps from {} sources ({} failed)",
            self.apps.len(),
            report.loaded.len(),
            report.failed.len()
        );

        self.refresh(sink);
        report
    }

    /// Filter, sort and redraw from empty, then render the first batch.
    pub fn refresh<S: RenderSink>(&mut self, sink: &mut S) {
        let mut items: Vec<CatalogItem> = if self.has_query() {
            let records = SearchRecord::flatten(&self.apps);
            self.index
                .search(&self.query, Some(&records), self.config.search_limit)
                .into_iter()
                .map(CatalogItem::Version)
                .collect()
        } else {
            self.apps.iter().cloned().map(CatalogItem::App).collect()
        };

        if self.sort_mode.is_version_based() {
            items.retain(|item| item.release_date().is_some());
        }
        sort_items(&mut items, self.sort_mode);

        self.visible = items;
        self.cursor = 0;
        sink.reset();
        self.append_next_batch(sink);
    }

    /// Tops the rendered items up to one batch while sources are still
    /// arriving; anything beyond waits for `append_next_batch`.
    #[allow(dead_code)]
    fn fill_first_batch<S: RenderSink>(&mut self, sink: &mut S) {
        fill_first_batch(&self.visible, &mut self.cursor, self.config.batch_size, sink);
    }

    /// Renders the next batch after the cursor. Returns how many items were
    /// appended; 0 once everything is on screen.
    pub fn append_next_batch<S: RenderSink>(&mut self, sink: &mut S) -> usize {
        let end = (self.cursor + self.config.batch_size.max(1)).min(self.visible.len());
        if self.cursor >= end {
            return 0;
        }
        sink.append(&self.visible[self.cursor..end]);
        let appended = end - self.cursor;
        self.cursor = end;
        appended
    }

    pub fn render_all<S: RenderSink>(&mut self, sink: &mut S) -> usize {
        let mut total = 0;
        loop {
            let n = self.append_next_batch(sink);
            if n == 0 {
                return total;
            }
            total += n;
        }
    }

    pub fn set_query<S: RenderSink>(&mut self, query: &str, sink: &mut S) {
        self.query = query.trim().to_string();
        self.refresh(sink);
    }

    pub fn set_sort_mode<S: RenderSink>(&mut self, mode: SortMode, sink: &mut S) {
        self.sort_mode = mode;
        self.refresh(sink);
    }

    /// Looks up a loaded app by bundle identifier.
    pub fn find_app(&self, bundle_id: &str) -> Option<&App> {
        let bundle_id = bundle_id.trim();
        self.apps.iter().find(|a| a.bundle_id == bundle_id)
    }

    /// Rebuilds one app's detail view from its deep link, consulting only the
    /// linked source. `Ok(None)` means the bundle is not in that source.
    pub async fn open_detail(&self, link: &DetailLink) -> Result<Option<DetailView>, CatalogError> {
        let apps = merge_apps(fetch_source(&self.fetcher, &link.source).await?);
        let bundle_id = link.bundle_id.trim();
        let found = apps.into_iter().find(|a| a.bundle_id == bundle_id);
        if found.is_none() {
            log::info!("{} not found in {}", bundle_id, link.source);
        }
        Ok(found.map(|app| DetailView::new(app, link.version.as_deref())))
    }

    /// Drops cached responses, the index and all session state.
    pub fn reset(&mut self) {
        self.fetcher.clear_cache();
        self.index.reset();
        self.apps.clear();
        self.query.clear();
        self.sort_mode = SortMode::default();
        self.visible.clear();
        self.cursor = 0;
    }
}
