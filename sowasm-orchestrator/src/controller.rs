//! Session orchestration logic
//!
//! The controller owns the [`SessionState`] and is the only thing that
//! mutates it. Events are applied synchronously by [`SessionController::handle`];
//! they may arm debounce timers or start conversions and loads. Those run as
//! futures owned by the controller and are folded back into the state when
//! they complete, in completion order. Nothing in flight is ever cancelled.

use crate::diagnostics::SessionError;
use crate::editor::{Clipboard, MarkerAnnotator, TextEditor};
use crate::loader::{LoadOptions, LoadedDocument, RemoteLoader, Transport};
use crate::permalink;
use crate::pipeline::{ConvertPipeline, ConvertRequest, Converter, Detector, GuessPipeline};
use crate::scheduler::Scheduler;
use crate::state::{FormatMode, OutputRegion, SessionState};
use crate::SessionConfig;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

/// Something the user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Picked an input format by hand
    InputFormatSelected(String),
    AutoDetectToggled(bool),
    /// The input buffer now holds this text
    InputEdited(String),
    /// The remote URL field now holds this text
    UrlEdited(String),
    OutputFormatSelected(String),
    AutoConvertToggled(bool),
    CorsProxyToggled(bool),
    /// The manual convert action
    ConvertRequested,
    LoadRequested,
    PermalinkRequested,
}

/// Debounced actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Task {
    Guess,
    Convert,
}

/// Result of an in-flight future
enum Completion {
    Converted(Result<String, SessionError>),
    Loaded {
        url: String,
        result: Result<LoadedDocument, SessionError>,
    },
}

/// External capabilities the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub detector: Arc<dyn Detector>,
    pub converter: Arc<dyn Converter>,
    pub transport: Arc<dyn Transport>,
    pub editor: Arc<dyn TextEditor>,
    pub markers: Arc<dyn MarkerAnnotator>,
    pub clipboard: Arc<dyn Clipboard>,
}

/// Session controller
pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
    guesser: GuessPipeline,
    converter: ConvertPipeline,
    loader: RemoteLoader,
    editor: Arc<dyn TextEditor>,
    markers: Arc<dyn MarkerAnnotator>,
    clipboard: Arc<dyn Clipboard>,
    scheduler: Scheduler<Task>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    loads_in_flight: usize,
}

impl SessionController {
    /// Create a controller over a default session
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let loader = RemoteLoader::from_config(collaborators.transport, &config);
        Self {
            state: SessionState::default(),
            guesser: GuessPipeline::new(collaborators.detector),
            converter: ConvertPipeline::new(collaborators.converter),
            loader,
            editor: collaborators.editor,
            markers: collaborators.markers,
            clipboard: collaborators.clipboard,
            scheduler: Scheduler::new(),
            in_flight: FuturesUnordered::new(),
            loads_in_flight: 0,
            config,
        }
    }

    /// Page load: seed the session from a permalink query, then start
    /// whatever the decoded state implies.
    pub fn open(config: SessionConfig, collaborators: Collaborators, query: &str) -> Self {
        let mut controller = Self::new(config, collaborators);
        controller.state = permalink::decode_state(query);
        info!(
            auto_detect = controller.state.is_auto_detect(),
            auto_convert = controller.state.auto_convert_enabled,
            input_len = controller.state.input_text.len(),
            has_url = !controller.state.remote_url.is_empty(),
            "Opened session"
        );

        if !controller.state.input_text.is_empty() {
            controller.editor.set_value(&controller.state.input_text);
        }
        if !controller.state.input_format.is_empty() {
            controller.editor.set_highlight_mode(&controller.state.input_format);
        }

        controller.ensure_consistency();
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// No timer armed and nothing in flight
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.in_flight.is_empty()
    }

    /// Apply one event
    pub fn handle(&mut self, event: SessionEvent) {
        debug!(event = ?event, "Handling session event");

        match event {
            SessionEvent::InputFormatSelected(format) => {
                self.state.input_format_mode = FormatMode::Manual;
                self.set_input_format(format);
                if self.state.auto_convert_enabled {
                    self.schedule(Task::Convert);
                }
            }
            SessionEvent::AutoDetectToggled(true) => {
                self.state.input_format_mode = FormatMode::Auto;
                self.schedule(Task::Guess);
                if self.state.auto_convert_enabled {
                    self.schedule(Task::Convert);
                }
            }
            SessionEvent::AutoDetectToggled(false) => {
                self.state.input_format_mode = FormatMode::Manual;
                self.scheduler.cancel(Task::Guess);
            }
            SessionEvent::InputEdited(text) => {
                self.state.input_text = text;
                self.state.last_input_error = None;
                self.input_changed(false);
            }
            SessionEvent::UrlEdited(url) => {
                self.state.remote_url = url;
                self.state.url_synced = false;
                if self.state.auto_convert_enabled {
                    self.schedule(Task::Convert);
                }
            }
            SessionEvent::OutputFormatSelected(format) => {
                self.state.output_format = format;
                self.start_conversion();
            }
            SessionEvent::AutoConvertToggled(enabled) => {
                self.state.auto_convert_enabled = enabled;
                if enabled {
                    self.start_conversion();
                } else {
                    self.scheduler.cancel(Task::Convert);
                }
            }
            SessionEvent::CorsProxyToggled(enabled) => {
                self.state.cors_proxy_enabled = enabled;
            }
            SessionEvent::ConvertRequested => {
                if self.state.convert_action_enabled() {
                    self.start_conversion();
                } else {
                    debug!("Convert requested while auto-convert is on, ignoring");
                }
            }
            SessionEvent::LoadRequested => {
                if self.state.load_action_enabled() {
                    self.start_load();
                } else {
                    debug!("Load requested without a URL, ignoring");
                }
            }
            SessionEvent::PermalinkRequested => self.copy_permalink(),
        }
    }

    /// Shareable URL for the current session
    pub fn permalink(&self) -> Result<Url, url::ParseError> {
        permalink::permalink(&self.config.app_base_url, &self.state)
    }

    /// Drive timers and in-flight work until the session is idle
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            tokio::select! {
                biased;
                Some(done) = self.in_flight.next(), if !self.in_flight.is_empty() => self.complete(done),
                due = self.scheduler.expired() => self.fire(due),
            }
        }
    }

    /// Process events until the sender side is dropped.
    ///
    /// Pending timers are cancelled on exit; the final state is returned.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> SessionState {
        loop {
            tokio::select! {
                biased;
                Some(done) = self.in_flight.next(), if !self.in_flight.is_empty() => self.complete(done),
                due = self.scheduler.expired() => self.fire(due),
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        self.scheduler.cancel_all();
        info!(in_flight = self.in_flight.len(), "Session closed");
        self.state
    }

    /// Page-load consistency pass
    fn ensure_consistency(&mut self) {
        if !self.state.input_text.is_empty() {
            self.input_changed(false);
        } else if !self.state.remote_url.is_empty() {
            self.start_load();
        }
    }

    fn input_changed(&mut self, synced: bool) {
        self.state.url_synced = synced && !self.state.remote_url.is_empty();
        if self.state.is_auto_detect() {
            self.schedule(Task::Guess);
        }
        if self.state.auto_convert_enabled {
            self.schedule(Task::Convert);
        }
    }

    fn schedule(&mut self, task: Task) {
        let delay = match task {
            Task::Guess => self.config.guess_delay(),
            Task::Convert => self.config.convert_delay(),
        };
        self.scheduler.schedule(task, delay);
    }

    fn fire(&mut self, due: Vec<Task>) {
        for task in due {
            match task {
                Task::Guess => self.run_guess(),
                Task::Convert => {
                    // a conversion must not read a format that is about to be re-guessed
                    if self.scheduler.cancel(Task::Guess) {
                        debug!("Running pending guess ahead of conversion");
                        self.run_guess();
                    }
                    self.start_conversion();
                }
            }
        }
    }

    fn run_guess(&mut self) {
        if !self.state.is_auto_detect() {
            debug!("Input format is manual, skipping guess");
            return;
        }
        let format = self.guesser.guess(&self.state.input_text);
        self.set_input_format(format);
    }

    fn set_input_format(&mut self, format: String) {
        if format != self.state.input_format {
            self.editor.set_highlight_mode(&format);
            self.state.input_format = format;
        }
    }

    fn start_conversion(&mut self) {
        let request = ConvertRequest::from_state(&self.state, &self.config.default_base_iri);
        if let Err(err) = request.check() {
            debug!("No input format, not converting");
            self.markers.set_markers(&[]);
            self.state.output = OutputRegion::Failed(err);
            return;
        }

        info!(
            input_format = %request.input_format,
            output_format = %request.output_format,
            "Starting conversion"
        );
        self.state.output = OutputRegion::Pending;
        let pipeline = self.converter.clone();
        self.in_flight
            .push(async move { Completion::Converted(pipeline.convert(request).await) }.boxed());
    }

    fn start_load(&mut self) {
        let url = self.state.remote_url.clone();
        let options = LoadOptions {
            via_proxy: self.state.cors_proxy_enabled,
            accept: None,
        };

        self.loads_in_flight += 1;
        self.state.loading = true;
        self.state.last_input_error = None;

        let loader = self.loader.clone();
        self.in_flight.push(
            async move {
                let result = loader.load(&url, &options).await;
                Completion::Loaded { url, result }
            }
            .boxed(),
        );
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Converted(result) => self.finish_conversion(result),
            Completion::Loaded { url, result } => self.finish_load(url, result),
        }
    }

    fn finish_conversion(&mut self, result: Result<String, SessionError>) {
        match result {
            Ok(output) => {
                self.markers.set_markers(&[]);
                self.state.output = OutputRegion::Converted(output);
            }
            Err(err) => {
                match err.marker() {
                    Some(marker) => self.markers.set_markers(std::slice::from_ref(marker)),
                    None => self.markers.set_markers(&[]),
                }
                self.state.output = OutputRegion::Failed(err);
            }
        }
    }

    fn finish_load(&mut self, url: String, result: Result<LoadedDocument, SessionError>) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        self.state.loading = self.loads_in_flight > 0;

        match result {
            Ok(doc) => {
                info!(url = %url, format_hint = ?doc.format_hint, "Replacing input with loaded document");
                self.editor.set_value(&doc.body);
                self.state.input_text = doc.body;
                match doc.format_hint {
                    Some(format) => {
                        self.state.input_format_mode = FormatMode::Manual;
                        self.set_input_format(format);
                    }
                    None => self.state.input_format_mode = FormatMode::Auto,
                }
                // the URL field may have been edited while fetching
                let synced = url == self.state.remote_url;
                self.input_changed(synced);
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Load failed");
                self.state.url_synced = false;
                self.state.last_input_error = Some(err);
            }
        }
    }

    fn copy_permalink(&self) {
        match self.permalink() {
            Ok(link) => {
                info!(
                    len = link.as_str().len(),
                    includes_input = self.state.input_is_shareable(),
                    "Copying permalink"
                );
                self.clipboard.write_text(link.as_str());
            }
            Err(e) => {
                warn!(base = %self.config.app_base_url, error = %e, "Cannot build permalink");
            }
        }
    }
}
