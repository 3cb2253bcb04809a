#![warn(clippy::all)]

//! LCZ Workbench - a web-based Local Climate Zone and urban heat island viewer.
//!
//! This application loads yearly LCZ/ICU datasets for the regional park,
//! caches them in the browser, and shows area statistics per class, per heat
//! island bucket, or compared between two datasets.

mod state;
mod ui;

use eframe::egui;
use lcz_workbench::config::WorkbenchConfig;
use lcz_workbench::dataset::{
    platform_loader, CacheTaskChannel, CacheTaskResult, DatasetKey, LoadChannel, LoadEvent,
    LoadOutcome, LoadSource, PlatformLoader, COMMUNE_ATTRIBUTE,
};
use lcz_workbench::geo::FeatureCollection;
use state::{AppState, Summary, ViewMode, ViewState};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "LCZ Workbench",
        native_options,
        Box::new(|cc| Ok(Box::new(WorkbenchApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("app_canvas")
            .expect("Failed to find app_canvas")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("app_canvas was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(WorkbenchApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct WorkbenchApp {
    /// UI-facing state
    state: AppState,

    config: WorkbenchConfig,

    /// Cache-first dataset loader (IndexedDB on WASM)
    loader: PlatformLoader,

    /// Channel for background dataset loads
    load_channel: LoadChannel<DatasetKey>,

    /// Channel for cache clearing, sizing and preloading
    cache_tasks: CacheTaskChannel,

    /// Loader events, fed into the session statistics
    events: Receiver<LoadEvent>,

    /// Datasets loaded this session
    datasets: HashMap<DatasetKey, Arc<FeatureCollection>>,

    /// Loads in flight
    pending: HashSet<DatasetKey>,

    /// Loads that failed, with their message; not retried automatically
    failed: HashMap<DatasetKey, String>,

    /// Municipality names of the dataset they were read from
    communes: Option<(DatasetKey, Vec<String>)>,

    /// Statistics for the view they were computed for
    summary: Option<(ViewState, Summary)>,

    /// App start, for delaying the preload
    started: web_time::Instant,
    preload_started: bool,
}

impl WorkbenchApp {
    /// Creates a new WorkbenchApp instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = WorkbenchConfig::load();
        // Persist so a deployment can adjust the stored settings
        config.save();

        let (sender, events) = channel();
        let loader = platform_loader(&config).with_observer(Arc::new(move |event: &LoadEvent| {
            let _ = sender.send(event.clone());
        }));

        // Opens the store and fills in the cache size for the top bar
        let cache_tasks = CacheTaskChannel::new();
        let ctx = cc.egui_ctx.clone();
        cache_tasks.size(loader.clone(), move || ctx.request_repaint());

        log::info!("LCZ Workbench started with data root {}", config.data_root);

        Self {
            state: AppState::new(),
            config,
            loader,
            load_channel: LoadChannel::new(),
            cache_tasks,
            events,
            datasets: HashMap::new(),
            pending: HashSet::new(),
            failed: HashMap::new(),
            communes: None,
            summary: None,
            started: web_time::Instant::now(),
            preload_started: false,
        }
    }

    /// Starts a background load for `key`.
    fn request_dataset(&mut self, ctx: &egui::Context, key: DatasetKey) {
        log::info!("Requesting dataset {}", key);
        self.pending.insert(key);
        self.state.status_message = format!("Loading {}...", key);

        let ctx = ctx.clone();
        self.load_channel.request(
            self.loader.clone(),
            key,
            self.config.request(&key),
            move || ctx.request_repaint(),
        );
    }

    fn handle_load_outcome(&mut self, ctx: &egui::Context, outcome: LoadOutcome<DatasetKey>) {
        let key = outcome.tag;
        self.pending.remove(&key);

        match outcome.result {
            Ok(loaded) => {
                let from = match loaded.source {
                    LoadSource::Cache => "cache".to_string(),
                    LoadSource::Network { codec } => format!("network, {}", codec),
                };
                self.state.status_message = format!(
                    "Loaded {} ({} features, {})",
                    key,
                    loaded.collection.len(),
                    from
                );

                // A network load grew the cache
                if matches!(loaded.source, LoadSource::Network { .. }) {
                    let ctx = ctx.clone();
                    self.cache_tasks
                        .size(self.loader.clone(), move || ctx.request_repaint());
                }

                self.datasets.insert(key, Arc::new(loaded.collection));
                self.summary = None;
                self.communes = None;
            }
            Err(e) => {
                log::error!("Failed to load {} ({}): {}", key, outcome.cache_key, e);
                self.state.status_message = format!("Failed to load {}", key);
                self.failed.insert(key, e.to_string());
            }
        }
    }

    fn handle_cache_task(&mut self, result: CacheTaskResult) {
        match result {
            CacheTaskResult::Cleared(Ok(())) => {
                self.state.status_message = "Cache cleared".to_string();
                self.failed.clear();
            }
            CacheTaskResult::Cleared(Err(e)) => {
                log::error!("Failed to clear cache: {}", e);
                self.state.status_message = format!("Failed to clear cache: {}", e);
            }
            CacheTaskResult::Size(Ok(size)) => {
                self.state.session_stats.cache_size = Some(size);
            }
            CacheTaskResult::Size(Err(e)) => {
                log::warn!("Cache size unavailable: {}", e);
            }
            CacheTaskResult::Preloaded(count) => {
                log::info!("Preloaded {} dataset(s)", count);
            }
        }
    }

    /// Preloads the other datasets once the startup delay has passed.
    fn maybe_preload(&mut self, ctx: &egui::Context) {
        if self.preload_started {
            return;
        }

        let delay = std::time::Duration::from_millis(self.config.preload_delay_ms);
        let elapsed = self.started.elapsed();
        if elapsed < delay {
            ctx.request_repaint_after(delay - elapsed);
            return;
        }

        self.preload_started = true;
        let requests: Vec<_> = DatasetKey::known()
            .iter()
            .filter(|key| !self.datasets.contains_key(*key) && !self.pending.contains(*key))
            .map(|key| self.config.request(key))
            .collect();

        if !requests.is_empty() {
            let ctx = ctx.clone();
            let gap = std::time::Duration::from_millis(self.config.preload_gap_ms);
            self.cache_tasks.preload(self.loader.clone(), requests, gap, move || {
                ctx.request_repaint()
            });
        }
    }

    /// Municipality names for the selector, recomputed when the source changes.
    fn communes(&mut self) -> Vec<String> {
        let source = self.state.view.commune_source();
        let Some(collection) = self.datasets.get(&source) else {
            return Vec::new();
        };

        match &self.communes {
            Some((key, names)) if *key == source => names.clone(),
            _ => {
                let names = collection.distinct_text_values(COMMUNE_ATTRIBUTE);
                self.communes = Some((source, names.clone()));
                names
            }
        }
    }

    /// Statistics for the current view, if its datasets are loaded.
    fn summary(&mut self) -> Option<&Summary> {
        let view = &self.state.view;
        let fresh = matches!(&self.summary, Some((computed_for, _)) if computed_for == view);

        if !fresh {
            let commune = view.commune.as_deref();
            let summary = match view.mode {
                ViewMode::Lcz => {
                    let collection = self.datasets.get(&view.primary)?;
                    state::summarize_lcz(collection, view.primary, commune)
                }
                ViewMode::Icu => {
                    let collection = self.datasets.get(&view.primary)?;
                    state::summarize_icu(
                        collection,
                        view.primary,
                        commune,
                        &self.config.icu_ranges,
                    )
                }
                ViewMode::Compare => {
                    let left = self.datasets.get(&view.left)?;
                    let right = self.datasets.get(&view.right)?;
                    state::summarize_compare(
                        (left.as_ref(), view.left),
                        (right.as_ref(), view.right),
                        commune,
                    )
                }
            };
            self.summary = Some((view.clone(), summary));
        }

        self.summary.as_ref().map(|(_, summary)| summary)
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Fold loader events into the session statistics
        while let Ok(event) = self.events.try_recv() {
            self.state.session_stats.record(&event);
        }

        // Check for completed dataset loads
        while let Some(outcome) = self.load_channel.try_recv() {
            self.handle_load_outcome(ctx, outcome);
        }

        // Check for completed cache tasks
        while let Some(result) = self.cache_tasks.try_recv() {
            self.handle_cache_task(result);
        }

        // Handle cache clear request
        if self.state.clear_cache_requested {
            self.state.clear_cache_requested = false;
            let ctx = ctx.clone();
            self.cache_tasks
                .clear(self.loader.clone(), move || ctx.request_repaint());
        }

        // Request whatever the current view needs
        for key in self.state.view.required_datasets() {
            if !self.datasets.contains_key(&key)
                && !self.pending.contains(&key)
                && !self.failed.contains_key(&key)
            {
                self.request_dataset(ctx, key);
            }
        }

        self.maybe_preload(ctx);

        let errors: Vec<String> = self
            .state
            .view
            .required_datasets()
            .iter()
            .filter_map(|key| self.failed.get(key).map(|e| format!("{}: {}", key, e)))
            .collect();
        let loading = !self.pending.is_empty();
        let communes = self.communes();

        ui::render_top_bar(ctx, &self.state);
        ui::render_left_panel(ctx, &mut self.state, &communes, loading);

        let view = self.state.view.clone();
        ui::render_stats_panel(ctx, &view, self.summary(), &errors);
    }
}
