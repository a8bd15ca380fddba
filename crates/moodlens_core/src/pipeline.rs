//! The per-batch upload pipeline.
//!
//! A batch is processed as an explicit fold over its files: each file runs
//! through decode, predict, classify and render, and its [`FileOutcome`] is
//! folded into a [`BatchReport`] that decides whether the next file runs.
//!
//! Each file has exactly two suspension points: the image decode and the
//! prediction round-trip. After each one the batch checks its
//! [`BatchTicket`]; if a newer batch has started in the meantime, the
//! result is dropped instead of being rendered into the new batch's
//! container.
//!
//! The browser specifics sit behind four traits:
//! - [`ImageDecoder`]: file to fixed-size preview snapshot
//! - [`Predictor`]: file to score
//! - [`ResultSink`]: clears and appends result blocks
//! - [`Notifier`]: blocking user-facing alerts

use std::future::Future;
use std::ops::ControlFlow;

use web_time::Instant;

use crate::config::{ClientConfig, FailurePolicy};
use crate::error::{PipelineError, PredictError};
use crate::generation::{BatchTicket, BatchTracker};
use crate::prediction::Prediction;
use crate::verdict::{PreviewEntry, Verdict};

/// A file handed over by drag-drop or the file picker.
pub trait SelectedFile {
    /// Original filename, sent along with the upload.
    fn name(&self) -> String;

    /// MIME type as reported by the browser (may be empty).
    fn mime_type(&self) -> String;

    /// Size in bytes.
    fn size(&self) -> u64;
}

/// Loads a file as an image and stretches it onto the square preview surface.
pub trait ImageDecoder<F> {
    /// Resized image handed to the [`ResultSink`].
    type Snapshot;

    /// Decode `file` and draw it onto the preview surface, ignoring aspect ratio.
    fn decode(&self, file: &F) -> impl Future<Output = Result<Self::Snapshot, PipelineError>>;
}

/// Sends the original, unresized file to the prediction service.
pub trait Predictor<F> {
    fn predict(&self, file: &F) -> impl Future<Output = Result<Prediction, PredictError>>;
}

/// The shared results container.
pub trait ResultSink<S> {
    /// Remove every rendered result block.
    fn clear(&self);

    /// Append one result block after the existing ones.
    fn append(&self, entry: PreviewEntry<S>) -> Result<(), String>;
}

/// Blocking user-facing alerts.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    /// A result block was appended
    Rendered {
        name: String,
        verdict: Verdict,
        score: f64,
    },
    /// The file failed; an alert has been shown
    Failed(PipelineError),
    /// A newer batch started while this file was in flight; nothing rendered
    Stale { name: String },
}

impl FileOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every file was attempted
    Completed,
    /// The file at `index` failed and the rest of the batch was dropped
    Aborted { index: usize },
    /// A newer batch took over while the file at `index` was in flight
    Superseded { index: usize },
}

/// Accumulated result of one batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Generation this batch ran under
    pub generation: u64,
    /// Number of files submitted
    pub total: usize,
    /// Outcomes of the files that were attempted, in input order
    pub files: Vec<FileOutcome>,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    fn new(generation: u64, total: usize) -> Self {
        Self {
            generation,
            total,
            files: Vec::with_capacity(total),
            outcome: BatchOutcome::Completed,
        }
    }

    /// Number of result blocks this batch appended.
    pub fn rendered(&self) -> usize {
        self.files.iter().filter(|f| f.is_rendered()).count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Failed(_)))
            .count()
    }

    /// Fold one file's outcome in and decide whether the batch continues.
    fn record(
        &mut self,
        index: usize,
        outcome: FileOutcome,
        policy: FailurePolicy,
    ) -> ControlFlow<()> {
        let flow = match (&outcome, policy) {
            (FileOutcome::Rendered { .. }, _) => ControlFlow::Continue(()),
            (FileOutcome::Failed(_), FailurePolicy::SkipFile) => ControlFlow::Continue(()),
            (FileOutcome::Failed(_), FailurePolicy::AbortBatch) => {
                self.outcome = BatchOutcome::Aborted { index };
                ControlFlow::Break(())
            }
            (FileOutcome::Stale { .. }, _) => {
                self.outcome = BatchOutcome::Superseded { index };
                ControlFlow::Break(())
            }
        };
        self.files.push(outcome);
        flow
    }
}

/// Runs batches of files through decode, predict and render.
pub struct BatchPipeline<D, P, S, N> {
    decoder: D,
    predictor: P,
    sink: S,
    notifier: N,
    tracker: BatchTracker,
    policy: FailurePolicy,
    sad_threshold: f64,
    alert_message: String,
    decode_alert_message: String,
}

impl<D, P, S, N> BatchPipeline<D, P, S, N> {
    pub fn new(decoder: D, predictor: P, sink: S, notifier: N, config: &ClientConfig) -> Self {
        Self {
            decoder,
            predictor,
            sink,
            notifier,
            tracker: BatchTracker::new(),
            policy: config.failure_policy,
            sad_threshold: config.sad_threshold,
            alert_message: config.alert_message.clone(),
            decode_alert_message: config.decode_alert_message.clone(),
        }
    }

    /// Share a generation counter with something else (e.g. a second pipeline).
    pub fn with_tracker(mut self, tracker: BatchTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &BatchTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Process one batch.
    ///
    /// Clears the container, then handles `files` strictly one after another
    /// in the order given. Never returns an error: failures are alerted and
    /// recorded in the report.
    pub async fn run<F>(&self, files: Vec<F>) -> BatchReport
    where
        F: SelectedFile,
        D: ImageDecoder<F>,
        P: Predictor<F>,
        S: ResultSink<D::Snapshot>,
        N: Notifier,
    {
        let ticket = self.tracker.begin();
        self.sink.clear();

        let started = Instant::now();
        log::info!(
            "Batch {} started with {} file(s)",
            ticket.generation(),
            files.len()
        );

        let mut report = BatchReport::new(ticket.generation(), files.len());
        for (index, file) in files.iter().enumerate() {
            let outcome = self.process_file(&ticket, file).await;

            match &outcome {
                FileOutcome::Failed(err) => {
                    log::error!("{}", err);
                    if err.is_decode() {
                        self.notifier.alert(&self.decode_alert_message);
                    } else {
                        self.notifier.alert(&self.alert_message);
                    }
                }
                FileOutcome::Stale { name } => {
                    log::warn!(
                        "Batch {} superseded, dropping result for '{}'",
                        ticket.generation(),
                        name
                    );
                }
                FileOutcome::Rendered { .. } => {}
            }

            if report.record(index, outcome, self.policy).is_break() {
                break;
            }
        }

        log::info!(
            "Batch {} finished: {}/{} rendered, {} failed ({:?}) in {:?}",
            report.generation,
            report.rendered(),
            report.total,
            report.failed(),
            report.outcome,
            started.elapsed()
        );
        report
    }

    async fn process_file<F>(&self, ticket: &BatchTicket, file: &F) -> FileOutcome
    where
        F: SelectedFile,
        D: ImageDecoder<F>,
        P: Predictor<F>,
        S: ResultSink<D::Snapshot>,
    {
        let name = file.name();
        let started = Instant::now();
        log::debug!(
            "Processing '{}' ({}, {} bytes)",
            name,
            file.mime_type(),
            file.size()
        );

        let decoded = self.decoder.decode(file).await;
        if !ticket.is_current() {
            return FileOutcome::Stale { name };
        }
        let snapshot = match decoded {
            Ok(snapshot) => snapshot,
            Err(err) => return FileOutcome::Failed(err),
        };
        log::debug!("Decoded '{}' in {:?}", name, started.elapsed());

        let predicted = self.predictor.predict(file).await;
        if !ticket.is_current() {
            return FileOutcome::Stale { name };
        }
        let prediction = match predicted {
            Ok(prediction) => prediction,
            Err(source) => return FileOutcome::Failed(PipelineError::Predict { name, source }),
        };

        let entry = PreviewEntry::new(snapshot, prediction.score, self.sad_threshold);
        let verdict = entry.verdict;
        log::info!("Prediction: {} ({})", verdict, prediction.score);

        if let Err(reason) = self.sink.append(entry) {
            return FileOutcome::Failed(PipelineError::render(name, reason));
        }
        log::debug!("Rendered '{}' in {:?}", name, started.elapsed());

        FileOutcome::Rendered {
            name,
            verdict,
            score: prediction.score,
        }
    }
}
