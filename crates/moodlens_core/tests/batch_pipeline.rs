//! Batch pipeline behaviour with scripted collaborators.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::io::Cursor;
use std::rc::Rc;

use image::{ImageFormat, Rgba, RgbaImage};
use moodlens_core::{
    BatchOutcome, BatchPipeline, BatchTracker, ClientConfig, FailurePolicy, FileOutcome,
    ImageCrateDecoder, ImageDecoder, InMemoryFile, Notifier, PipelineError, PredictError,
    Prediction, Predictor, PreviewEntry, ResultSink, SelectedFile, Verdict,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Image,
    Broken,
    /// A new drop arrives while this file is being decoded
    SupersedesWhileDecoding,
}

#[derive(Debug, Clone)]
struct FakeFile {
    name: String,
    kind: FileKind,
}

impl FakeFile {
    fn image(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FileKind::Image,
        }
    }

    fn broken(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FileKind::Broken,
        }
    }

    fn superseding(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FileKind::SupersedesWhileDecoding,
        }
    }
}

impl SelectedFile for FakeFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> String {
        "image/png".to_string()
    }

    fn size(&self) -> u64 {
        1024
    }
}

/// Log of everything the collaborators saw, in call order.
type Journal = Rc<RefCell<Vec<String>>>;

struct FakeDecoder {
    journal: Journal,
    tracker: BatchTracker,
}

impl ImageDecoder<FakeFile> for FakeDecoder {
    type Snapshot = String;

    fn decode(&self, file: &FakeFile) -> impl Future<Output = Result<String, PipelineError>> {
        self.journal.borrow_mut().push(format!("decode {}", file.name));
        let result = match file.kind {
            FileKind::Image => Ok(format!("thumb:{}", file.name)),
            FileKind::Broken => Err(PipelineError::decode(&file.name, "image failed to load")),
            FileKind::SupersedesWhileDecoding => {
                self.tracker.begin();
                Ok(format!("thumb:{}", file.name))
            }
        };
        std::future::ready(result)
    }
}

enum Reply {
    Score(f64),
    Fail(PredictError),
    /// Simulates a new drop arriving while this request is in flight
    SupersedeThen(f64),
}

struct ScriptedPredictor {
    journal: Journal,
    replies: RefCell<VecDeque<Reply>>,
    tracker: BatchTracker,
}

impl<F: SelectedFile> Predictor<F> for ScriptedPredictor {
    fn predict(&self, file: &F) -> impl Future<Output = Result<Prediction, PredictError>> {
        self.journal
            .borrow_mut()
            .push(format!("predict {}", file.name()));
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .expect("unexpected predict call");
        let result = match reply {
            Reply::Score(score) => Ok(Prediction { score }),
            Reply::Fail(err) => Err(err),
            Reply::SupersedeThen(score) => {
                self.tracker.begin();
                Ok(Prediction { score })
            }
        };
        std::future::ready(result)
    }
}

#[derive(Default)]
struct RecordingSink {
    journal: Journal,
    blocks: RefCell<Vec<PreviewEntry<String>>>,
}

impl ResultSink<String> for RecordingSink {
    fn clear(&self) {
        self.journal.borrow_mut().push("clear".to_string());
        self.blocks.borrow_mut().clear();
    }

    fn append(&self, entry: PreviewEntry<String>) -> Result<(), String> {
        self.journal
            .borrow_mut()
            .push(format!("append {}", entry.snapshot));
        self.blocks.borrow_mut().push(entry);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

type TestPipeline =
    BatchPipeline<FakeDecoder, ScriptedPredictor, RecordingSink, RecordingNotifier>;

fn pipeline_with(replies: Vec<Reply>, config: &ClientConfig) -> (TestPipeline, Journal) {
    let journal: Journal = Rc::default();
    let tracker = BatchTracker::new();
    let pipeline = BatchPipeline::new(
        FakeDecoder {
            journal: journal.clone(),
            tracker: tracker.clone(),
        },
        ScriptedPredictor {
            journal: journal.clone(),
            replies: RefCell::new(replies.into()),
            tracker: tracker.clone(),
        },
        RecordingSink {
            journal: journal.clone(),
            ..Default::default()
        },
        RecordingNotifier::default(),
        config,
    )
    .with_tracker(tracker);
    (pipeline, journal)
}

fn transport_failure() -> Reply {
    Reply::Fail(PredictError::Transport("TypeError: Failed to fetch".to_string()))
}

fn labels(pipeline: &TestPipeline) -> Vec<String> {
    pipeline
        .sink()
        .blocks
        .borrow()
        .iter()
        .map(|entry| entry.label_text())
        .collect()
}

#[test]
fn renders_every_file_in_order() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(
        vec![Reply::Score(0.3), Reply::Score(0.5), Reply::Score(0.87)],
        &config,
    );
    let files = vec![
        FakeFile::image("a.png"),
        FakeFile::image("b.png"),
        FakeFile::image("c.png"),
    ];

    let report = pollster::block_on(pipeline.run(files));

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.rendered(), 3);
    assert_eq!(
        labels(&pipeline),
        vec!["Happy (30.0%)", "Happy (50.0%)", "Sad (87.0%)"]
    );
    let blocks = pipeline.sink().blocks.borrow();
    assert_eq!(blocks[0].emoji(), ":)");
    assert_eq!(blocks[0].bar_width(), "30.0%");
    assert_eq!(blocks[2].emoji(), ":(");
    assert_eq!(blocks[2].snapshot, "thumb:c.png");
    assert!(pipeline.notifier().alerts.borrow().is_empty());

    assert_eq!(
        *journal.borrow(),
        vec![
            "clear",
            "decode a.png",
            "predict a.png",
            "append thumb:a.png",
            "decode b.png",
            "predict b.png",
            "append thumb:b.png",
            "decode c.png",
            "predict c.png",
            "append thumb:c.png",
        ]
    );
}

#[test]
fn second_file_failure_keeps_first_block_and_alerts_once() {
    let config = ClientConfig::default();
    let (pipeline, _journal) = pipeline_with(vec![Reply::Score(0.2), transport_failure()], &config);

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::image("first.png"),
        FakeFile::image("second.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Aborted { index: 1 });
    assert_eq!(labels(&pipeline), vec!["Happy (20.0%)"]);
    assert_eq!(
        *pipeline.notifier().alerts.borrow(),
        vec![config.alert_message.clone()]
    );
    assert!(matches!(
        &report.files[1],
        FileOutcome::Failed(PipelineError::Predict { name, .. }) if name == "second.png"
    ));
}

#[test]
fn failure_stops_before_next_file_is_fetched() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(
        vec![
            Reply::Score(0.1),
            Reply::Fail(PredictError::Status {
                status: 500,
                message: Some("Model not loaded".to_string()),
            }),
        ],
        &config,
    );

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::image("1.png"),
        FakeFile::image("2.png"),
        FakeFile::image("3.png"),
        FakeFile::image("4.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Aborted { index: 1 });
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.rendered(), 1);
    let journal = journal.borrow();
    assert!(!journal.iter().any(|entry| entry.contains("3.png")));
    assert!(!journal.iter().any(|entry| entry.contains("4.png")));
}

#[test]
fn skip_file_policy_continues_past_failures() {
    let config = ClientConfig {
        failure_policy: FailurePolicy::SkipFile,
        ..ClientConfig::default()
    };
    let (pipeline, _journal) = pipeline_with(
        vec![Reply::Score(0.9), transport_failure(), Reply::Score(0.4)],
        &config,
    );

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::image("1.png"),
        FakeFile::image("2.png"),
        FakeFile::image("3.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(report.rendered(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(labels(&pipeline), vec!["Sad (90.0%)", "Happy (40.0%)"]);
    assert_eq!(pipeline.notifier().alerts.borrow().len(), 1);
}

#[test]
fn decode_failure_alerts_without_fetching() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(vec![Reply::Score(0.3)], &config);

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::broken("corrupt.png"),
        FakeFile::image("fine.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Aborted { index: 0 });
    assert_eq!(report.rendered(), 0);
    assert_eq!(
        *pipeline.notifier().alerts.borrow(),
        vec![config.decode_alert_message.clone()]
    );
    assert!(!journal.borrow().iter().any(|entry| entry.starts_with("predict")));
}

#[test]
fn new_batch_clears_previous_blocks_first() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(
        vec![Reply::Score(0.1), Reply::Score(0.2), Reply::Score(0.95)],
        &config,
    );

    pollster::block_on(pipeline.run(vec![FakeFile::image("a.png"), FakeFile::image("b.png")]));
    assert_eq!(labels(&pipeline).len(), 2);

    let report = pollster::block_on(pipeline.run(vec![FakeFile::image("c.png")]));

    assert_eq!(report.generation, 2);
    assert_eq!(labels(&pipeline), vec!["Sad (95.0%)"]);
    let journal = journal.borrow();
    let second_clear = journal.iter().rposition(|entry| entry == "clear").unwrap();
    let first_c = journal.iter().position(|entry| entry == "decode c.png").unwrap();
    assert!(second_clear < first_c);
}

#[test]
fn superseded_batch_drops_in_flight_result() {
    let config = ClientConfig::default();
    let (pipeline, _journal) = pipeline_with(
        vec![Reply::Score(0.3), Reply::SupersedeThen(0.8)],
        &config,
    );

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::image("old-1.png"),
        FakeFile::image("old-2.png"),
        FakeFile::image("old-3.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Superseded { index: 1 });
    assert_eq!(report.rendered(), 1);
    assert_eq!(labels(&pipeline), vec!["Happy (30.0%)"]);
    assert!(pipeline.notifier().alerts.borrow().is_empty());
    assert_eq!(pipeline.tracker().current(), report.generation + 1);
}

#[test]
fn missing_score_renders_nan_without_alert() {
    let config = ClientConfig::default();
    let (pipeline, _journal) = pipeline_with(vec![Reply::Score(f64::NAN)], &config);

    let report = pollster::block_on(pipeline.run(vec![FakeFile::image("a.png")]));

    assert_eq!(report.rendered(), 1);
    assert_eq!(labels(&pipeline), vec!["Happy (NaN%)"]);
    assert!(matches!(
        report.files[0],
        FileOutcome::Rendered {
            verdict: Verdict::Happy,
            ..
        }
    ));
    assert!(pipeline.notifier().alerts.borrow().is_empty());
}

#[test]
fn empty_batch_only_clears() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(vec![], &config);

    let report = pollster::block_on(pipeline.run(Vec::<FakeFile>::new()));

    assert_eq!(report.total, 0);
    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(*journal.borrow(), vec!["clear"]);
}

#[test]
fn superseded_while_decoding_skips_fetch_and_render() {
    let config = ClientConfig::default();
    let (pipeline, journal) = pipeline_with(vec![Reply::Score(0.3)], &config);

    let report = pollster::block_on(pipeline.run(vec![
        FakeFile::image("old-1.png"),
        FakeFile::superseding("old-2.png"),
        FakeFile::image("old-3.png"),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Superseded { index: 1 });
    assert!(matches!(
        &report.files[1],
        FileOutcome::Stale { name } if name == "old-2.png"
    ));
    assert_eq!(labels(&pipeline), vec!["Happy (30.0%)"]);
    assert!(pipeline.notifier().alerts.borrow().is_empty());
    assert_eq!(
        *journal.borrow(),
        vec![
            "clear",
            "decode old-1.png",
            "predict old-1.png",
            "append thumb:old-1.png",
            "decode old-2.png",
        ]
    );
}

/// Records what the native decoder produced for each appended block.
#[derive(Default)]
struct ThumbnailSink {
    blocks: RefCell<Vec<((u32, u32), String)>>,
}

impl ResultSink<RgbaImage> for ThumbnailSink {
    fn clear(&self) {
        self.blocks.borrow_mut().clear();
    }

    fn append(&self, entry: PreviewEntry<RgbaImage>) -> Result<(), String> {
        let label = entry.label_text();
        self.blocks
            .borrow_mut()
            .push((entry.snapshot.dimensions(), label));
        Ok(())
    }
}

fn png_file(name: &str, width: u32, height: u32) -> InMemoryFile {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 120, 200, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    InMemoryFile::new(name, bytes)
}

fn native_pipeline(
    replies: Vec<Reply>,
    config: &ClientConfig,
) -> (
    BatchPipeline<ImageCrateDecoder, ScriptedPredictor, ThumbnailSink, RecordingNotifier>,
    Journal,
) {
    let journal: Journal = Rc::default();
    let pipeline = BatchPipeline::new(
        ImageCrateDecoder::new(config.thumbnail_size),
        ScriptedPredictor {
            journal: journal.clone(),
            replies: RefCell::new(replies.into()),
            tracker: BatchTracker::new(),
        },
        ThumbnailSink::default(),
        RecordingNotifier::default(),
        config,
    );
    (pipeline, journal)
}

#[test]
fn real_images_are_stretched_and_rendered_in_order() {
    let config = ClientConfig::default();
    let (pipeline, journal) =
        native_pipeline(vec![Reply::Score(0.25), Reply::Score(0.75)], &config);

    let report = pollster::block_on(pipeline.run(vec![
        png_file("wide.png", 640, 120),
        png_file("tall.png", 12, 90),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(
        *pipeline.sink().blocks.borrow(),
        vec![
            ((256, 256), "Happy (25.0%)".to_string()),
            ((256, 256), "Sad (75.0%)".to_string()),
        ]
    );
    assert_eq!(*journal.borrow(), vec!["predict wide.png", "predict tall.png"]);
}

#[test]
fn undecodable_bytes_alert_and_stop_the_batch() {
    let config = ClientConfig::default();
    let (pipeline, journal) = native_pipeline(vec![Reply::Score(0.1)], &config);

    let report = pollster::block_on(pipeline.run(vec![
        png_file("ok.png", 32, 32),
        InMemoryFile::new("notes.png", b"not an image".to_vec()),
        png_file("never.png", 32, 32),
    ]));

    assert_eq!(report.outcome, BatchOutcome::Aborted { index: 1 });
    assert!(matches!(
        &report.files[1],
        FileOutcome::Failed(err) if err.is_decode()
    ));
    assert_eq!(pipeline.sink().blocks.borrow().len(), 1);
    assert_eq!(
        *pipeline.notifier().alerts.borrow(),
        vec![config.decode_alert_message.clone()]
    );
    assert_eq!(*journal.borrow(), vec!["predict ok.png"]);
}
