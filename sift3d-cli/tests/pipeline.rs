//! Integration tests for the extraction pipeline
//!
//! Test doubles record every acquisition and release in a shared ledger so
//! the tests can check that each failing stage stops the run and that every
//! resource acquired before it is released exactly once.

use sift3d_algorithms::{ExtractorConfig, DESC_NUMEL};
use sift3d_cli::{ExtractionPipeline, PipelineError, Stage};
use sift3d_core::{
    Descriptor, DescriptorExtractor, DescriptorStore, DescriptorWriter, Error, ExtractorFactory,
    KeypointStore, Result, VolumeReader,
};
use sift3d_io::{BlankLines, DescriptorCsvWriter, ImageVolumeReader, KeypointCsvOptions};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

type Ledger = Rc<RefCell<Vec<&'static str>>>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    Init,
    ReadImage,
    Extract,
    ShortExtract,
    Write,
}

struct FakeVolume {
    ledger: Ledger,
}

impl Drop for FakeVolume {
    fn drop(&mut self) {
        self.ledger.borrow_mut().push("volume released");
    }
}

struct FakeReader {
    ledger: Ledger,
    fail: bool,
}

impl VolumeReader for FakeReader {
    type Volume = FakeVolume;

    fn read_volume(&self, _path: &Path) -> Result<FakeVolume> {
        if self.fail {
            return Err(Error::Image("cannot decode".to_string()));
        }
        self.ledger.borrow_mut().push("volume read");
        Ok(FakeVolume {
            ledger: self.ledger.clone(),
        })
    }
}

struct FakeExtractor {
    ledger: Ledger,
    fail_at: FailAt,
}

impl Drop for FakeExtractor {
    fn drop(&mut self) {
        self.ledger.borrow_mut().push("extractor released");
    }
}

impl DescriptorExtractor for FakeExtractor {
    type Volume = FakeVolume;

    fn extract_raw(
        &mut self,
        _volume: &FakeVolume,
        keypoints: &KeypointStore,
    ) -> Result<DescriptorStore> {
        match self.fail_at {
            FailAt::Extract => Err(Error::Algorithm("no descriptor".to_string())),
            FailAt::ShortExtract => Ok(DescriptorStore::new()),
            _ => Ok(keypoints
                .iter()
                .map(|k| Descriptor::new(k.position, k.scale, vec![0.5; 4]))
                .collect()),
        }
    }
}

struct FakeFactory {
    ledger: Ledger,
    fail_at: FailAt,
}

impl ExtractorFactory for FakeFactory {
    type Extractor = FakeExtractor;

    fn create(&self) -> Result<FakeExtractor> {
        if self.fail_at == FailAt::Init {
            return Err(Error::InvalidConfig("bad option".to_string()));
        }
        self.ledger.borrow_mut().push("extractor created");
        Ok(FakeExtractor {
            ledger: self.ledger.clone(),
            fail_at: self.fail_at,
        })
    }
}

struct FakeWriter {
    ledger: Ledger,
    fail: bool,
    written: Rc<Cell<Option<usize>>>,
}

impl DescriptorWriter for FakeWriter {
    fn write_descriptors(&self, _path: &Path, descriptors: &DescriptorStore) -> Result<()> {
        if self.fail {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.ledger.borrow_mut().push("written");
        self.written.set(Some(descriptors.len()));
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "fake"
    }
}

struct Harness {
    _dir: TempDir,
    ledger: Ledger,
    written: Rc<Cell<Option<usize>>>,
    image: PathBuf,
    keypoints: PathBuf,
    output: PathBuf,
}

impl Harness {
    fn new(keypoints: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let keypoints_path = dir.path().join("keypoints.csv");
        if let Some(content) = keypoints {
            fs::write(&keypoints_path, content).unwrap();
        }
        Self {
            image: dir.path().join("image.nii"),
            keypoints: keypoints_path,
            output: dir.path().join("descriptors.csv"),
            ledger: Rc::new(RefCell::new(Vec::new())),
            written: Rc::new(Cell::new(None)),
            _dir: dir,
        }
    }

    fn pipeline(&self, fail_at: FailAt) -> ExtractionPipeline<FakeReader, FakeFactory, FakeWriter> {
        ExtractionPipeline::new(
            FakeReader {
                ledger: self.ledger.clone(),
                fail: fail_at == FailAt::ReadImage,
            },
            FakeFactory {
                ledger: self.ledger.clone(),
                fail_at,
            },
            FakeWriter {
                ledger: self.ledger.clone(),
                fail: fail_at == FailAt::Write,
                written: self.written.clone(),
            },
        )
    }

    fn run(&self, fail_at: FailAt) -> std::result::Result<(), PipelineError> {
        self.pipeline(fail_at)
            .run(&self.image, &self.keypoints, &self.output)
    }

    fn events(&self) -> Vec<&'static str> {
        self.ledger.borrow().clone()
    }
}

#[test]
fn test_successful_run_writes_every_descriptor() {
    let h = Harness::new(Some("0,0,0\n1,1,1\n"));
    h.run(FailAt::Nothing).unwrap();

    assert_eq!(h.written.get(), Some(2));
    assert_eq!(
        h.events(),
        vec![
            "extractor created",
            "volume read",
            "written",
            "volume released",
            "extractor released",
        ]
    );
}

#[test]
fn test_init_failure_acquires_nothing() {
    let h = Harness::new(Some("0,0,0\n"));
    let err = h.run(FailAt::Init).unwrap_err();

    assert_eq!(err.stage(), Stage::Init);
    assert!(matches!(err, PipelineError::Init(Error::InvalidConfig(_))));
    assert!(h.events().is_empty());
}

#[test]
fn test_image_failure_releases_extractor() {
    let h = Harness::new(Some("0,0,0\n"));
    let err = h.run(FailAt::ReadImage).unwrap_err();

    assert_eq!(err.stage(), Stage::ReadImage);
    assert!(err.to_string().starts_with("Failed to read image "));
    assert_eq!(h.events(), vec!["extractor created", "extractor released"]);
    assert_eq!(h.written.get(), None);
}

#[test]
fn test_missing_keypoint_file_releases_volume_and_extractor() {
    let h = Harness::new(None);
    let err = h.run(FailAt::Nothing).unwrap_err();

    assert_eq!(err.stage(), Stage::LoadKeypoints);
    assert!(matches!(err, PipelineError::KeypointLoad { source: Error::Io(_), .. }));
    assert_eq!(
        h.events(),
        vec![
            "extractor created",
            "volume read",
            "volume released",
            "extractor released",
        ]
    );
}

#[test]
fn test_extraction_failure() {
    let h = Harness::new(Some("0,0,0\n"));
    let err = h.run(FailAt::Extract).unwrap_err();

    assert_eq!(err.stage(), Stage::Extract);
    assert_eq!(err.to_string(), "Failed to extract descriptors: Algorithm error: no descriptor");
    assert_eq!(h.written.get(), None);
    assert_eq!(
        h.events(),
        vec![
            "extractor created",
            "volume read",
            "volume released",
            "extractor released",
        ]
    );
}

#[test]
fn test_descriptor_count_mismatch_is_an_extraction_failure() {
    let h = Harness::new(Some("0,0,0\n1,1,1\n"));
    let err = h.run(FailAt::ShortExtract).unwrap_err();

    assert_eq!(err.stage(), Stage::Extract);
    assert_eq!(h.written.get(), None);
}

#[test]
fn test_write_failure_releases_everything() {
    let h = Harness::new(Some("0,0,0\n"));
    let err = h.run(FailAt::Write).unwrap_err();

    assert_eq!(err.stage(), Stage::Write);
    assert!(matches!(err, PipelineError::Write { source: Error::Io(_), .. }));
    assert_eq!(
        h.events(),
        vec![
            "extractor created",
            "volume read",
            "volume released",
            "extractor released",
        ]
    );
}

#[test]
fn test_empty_keypoint_file_writes_empty_collection() {
    let h = Harness::new(Some(""));
    h.run(FailAt::Nothing).unwrap();
    assert_eq!(h.written.get(), Some(0));
}

#[test]
fn test_blank_line_policy() {
    let h = Harness::new(Some("0,0,0\n\n1,1,1\n"));
    h.run(FailAt::Nothing).unwrap();
    assert_eq!(h.written.get(), Some(3));

    let h = Harness::new(Some("0,0,0\n\n1,1,1\n"));
    h.pipeline(FailAt::Nothing)
        .with_keypoint_options(KeypointCsvOptions {
            blank_lines: BlankLines::Skip,
        })
        .run(&h.image, &h.keypoints, &h.output)
        .unwrap();
    assert_eq!(h.written.get(), Some(2));
}

#[test]
fn test_missing_image_is_reported_before_keypoints() {
    let dir = TempDir::new().unwrap();
    let pipeline = ExtractionPipeline::new(
        ImageVolumeReader::new(),
        ExtractorConfig::default(),
        DescriptorCsvWriter::default(),
    );
    let output = dir.path().join("out.csv");

    let err = pipeline
        .run(
            &dir.path().join("missing.png"),
            &dir.path().join("missing.csv"),
            &output,
        )
        .unwrap_err();

    assert_eq!(err.stage(), Stage::ReadImage);
    assert!(!output.exists());
}

#[test]
fn test_end_to_end_with_image_file() {
    let dir = TempDir::new().unwrap();
    let image_path = dir.path().join("slice.png");
    image::GrayImage::from_fn(8, 8, |x, y| image::Luma([(x * 20 + y * 7) as u8]))
        .save(&image_path)
        .unwrap();

    let keypoints_path = dir.path().join("keypoints.csv");
    fs::write(&keypoints_path, "1,1,0\n4,3,0\n").unwrap();
    let output = dir.path().join("out.csv");

    let pipeline = ExtractionPipeline::new(
        ImageVolumeReader::new(),
        ExtractorConfig::default(),
        DescriptorCsvWriter::default(),
    );
    pipeline.run(&image_path, &keypoints_path, &output).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 2);

    let first: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(first.len(), 4 + DESC_NUMEL);
    assert_eq!(&first[..4], &["1", "1", "0", "1"]);

    let second: Vec<&str> = rows[1].split(',').collect();
    assert_eq!(&second[..3], &["4", "3", "0"]);
}

#[test]
fn test_keypoint_outside_image_fails_extraction() {
    let dir = TempDir::new().unwrap();
    let image_path = dir.path().join("slice.png");
    image::GrayImage::new(4, 4).save(&image_path).unwrap();

    let keypoints_path = dir.path().join("keypoints.csv");
    fs::write(&keypoints_path, "1,1,0\n9,1,0\n").unwrap();
    let output = dir.path().join("out.csv");

    let err = ExtractionPipeline::new(
        ImageVolumeReader::new(),
        ExtractorConfig::default(),
        DescriptorCsvWriter::default(),
    )
    .run(&image_path, &keypoints_path, &output)
    .unwrap_err();

    assert_eq!(err.stage(), Stage::Extract);
    assert!(err.to_string().contains("keypoint 1"));
    assert!(!output.exists());
}
