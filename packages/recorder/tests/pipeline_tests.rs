/// Conversion pipeline tests using a scripted surface and stand-in encoders
use replay_capture::{CaptureConfig, CaptureError, ScriptedSurface, StagingArea, StopReason};
use replay_recorder::{
    convert_with, Conversion, ConversionReport, EncodeError, RecorderConfig, RecorderError,
    ReplaySource, SequenceEncoder, SequenceInput,
};
use std::cell::Cell;
use std::path::Path;
use tempfile::tempdir;

/// Checks the staged sequence is dense, then writes a fake video
#[derive(Default)]
struct CheckingEncoder {
    calls: Cell<u32>,
}

impl SequenceEncoder for CheckingEncoder {
    fn encode(&self, input: &SequenceInput, output: &Path) -> Result<(), EncodeError> {
        self.calls.set(self.calls.get() + 1);

        let dir = input.pattern.parent().unwrap();
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        let expected: Vec<String> = (0..input.frame_count)
            .map(|i| format!("frame_{:05}.jpg", i))
            .collect();
        assert_eq!(names, expected);
        assert_eq!(
            input.pattern.file_name().unwrap().to_string_lossy(),
            "frame_%05d.jpg"
        );

        std::fs::write(output, b"video").unwrap();
        Ok(())
    }
}

/// Writes a partial file and then fails, like an encoder that crashes midway
struct CrashingEncoder;

impl SequenceEncoder for CrashingEncoder {
    fn encode(&self, _input: &SequenceInput, output: &Path) -> Result<(), EncodeError> {
        std::fs::write(output, b"partial").unwrap();
        Err(EncodeError::Status {
            code: Some(1),
            status: "exit status: 1".to_string(),
            stderr: "Conversion failed!".to_string(),
        })
    }
}

fn config(frame_rate: u32, max_duration_seconds: u32, min_grace_frames: u32) -> RecorderConfig {
    RecorderConfig {
        capture: CaptureConfig {
            frame_rate,
            max_duration_seconds,
            image_quality: 80,
            min_grace_frames: Some(min_grace_frames),
        },
        ..Default::default()
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_conversion_encodes_dense_sequence() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 300, 30);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();
    let staging_dir = staging.path().to_path_buf();
    let encoder = CheckingEncoder::default();

    let surface = ScriptedSurface::new().end_after(45);
    let result = Conversion::new(&config).run(surface, &encoder, &mut staging, &output);
    staging.teardown();

    let outcome = result.unwrap();
    assert_eq!(outcome.frames.len(), 45);
    assert_eq!(outcome.stop_reason, StopReason::EndDetected);
    assert_eq!(encoder.calls.get(), 1);
    assert_eq!(std::fs::read(&output).unwrap(), b"video");
    assert!(!staging_dir.exists());
}

#[test]
fn test_conversion_stops_at_ceiling() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();

    let outcome = Conversion::new(&config)
        .run(ScriptedSurface::new(), &CheckingEncoder::default(), &mut staging, &output)
        .unwrap();

    assert_eq!(outcome.frames.len(), 15);
    assert_eq!(outcome.stop_reason, StopReason::CeilingReached);
}

#[test]
fn test_encoder_failure_removes_partial_output_and_staging() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();
    let staging_dir = staging.path().to_path_buf();

    let result = Conversion::new(&config).run(
        ScriptedSurface::new(),
        &CrashingEncoder,
        &mut staging,
        &output,
    );
    staging.teardown();

    let err = result.unwrap_err();
    assert_eq!(err.stage(), "encode");
    assert!(matches!(err, RecorderError::Encode(EncodeError::Status { .. })));
    assert!(!output.exists());
    assert!(!staging_dir.exists());
}

#[test]
fn test_encoder_failure_keeps_preexisting_output() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    std::fs::write(&output, b"previous").unwrap();
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();

    let result = Conversion::new(&config).run(
        ScriptedSurface::new(),
        &CrashingEncoder,
        &mut staging,
        &output,
    );
    staging.teardown();

    assert!(result.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    assert_eq!(entries(root.path()), vec!["battle.mp4"]);
}

#[test]
fn test_successful_encode_replaces_existing_output() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    std::fs::write(&output, b"previous").unwrap();
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();

    let result = Conversion::new(&config).run(
        ScriptedSurface::new(),
        &CheckingEncoder::default(),
        &mut staging,
        &output,
    );
    staging.teardown();

    result.unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), b"video");
    assert_eq!(entries(root.path()), vec!["battle.mp4"]);
}

#[test]
fn test_snapshot_failure_skips_encoding() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();
    let staging_dir = staging.path().to_path_buf();
    let encoder = CheckingEncoder::default();

    let surface = ScriptedSurface::new().fail_snapshot_at(5);
    let result = Conversion::new(&config).run(surface, &encoder, &mut staging, &output);
    staging.teardown();

    let err = result.unwrap_err();
    assert_eq!(err.stage(), "capture");
    assert!(matches!(
        err,
        RecorderError::Capture(CaptureError::SnapshotFailure { index: 5, .. })
    ));
    assert_eq!(encoder.calls.get(), 0);
    assert!(!output.exists());
    assert!(!staging_dir.exists());
}

#[test]
fn test_unready_surface_is_reported() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 1, 2);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();
    let encoder = CheckingEncoder::default();

    let result = Conversion::new(&config).run(
        ScriptedSurface::new().never_ready(),
        &encoder,
        &mut staging,
        &output,
    );

    let err = result.unwrap_err();
    assert_eq!(err.stage(), "load");
    assert!(matches!(
        err,
        RecorderError::Capture(CaptureError::SurfaceUnready(_))
    ));
    assert_eq!(encoder.calls.get(), 0);
}

#[test]
fn test_report_round_trips_to_disk() {
    let root = tempdir().unwrap();
    let output = root.path().join("battle.mp4");
    let config = config(15, 2, 0);
    let mut staging = StagingArea::provision(root.path(), config.capture.max_frames()).unwrap();

    let outcome = Conversion::new(&config)
        .run(ScriptedSurface::new(), &CheckingEncoder::default(), &mut staging, &output)
        .unwrap();

    let source = ReplaySource::parse("gen9ou-1", &config.replay_host).unwrap();
    let report = ConversionReport::new(&source, &output, 15, &outcome);
    assert_eq!(report.frames, 30);
    assert_eq!(report.video_seconds(), 2.0);

    let report_path = root.path().join("report.json");
    report.write(&report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["replayId"], "gen9ou-1");
    assert_eq!(json["frames"], 30);
    assert_eq!(json["stopReason"], "ceilingReached");
}

#[test]
fn test_convert_with_tears_down_staging_after_success() {
    let staging_root = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("battle.mp4");
    let mut config = config(15, 300, 30);
    config.staging_root = Some(staging_root.path().to_path_buf());
    let encoder = CheckingEncoder::default();

    let report = convert_with(
        "gen9ou-1",
        &output,
        &config,
        |_| Ok(ScriptedSurface::new().end_after(45)),
        &encoder,
    )
    .unwrap();

    assert_eq!(report.replay_id, "gen9ou-1");
    assert_eq!(report.frames, 45);
    assert_eq!(report.stop_reason, StopReason::EndDetected);
    assert_eq!(encoder.calls.get(), 1);
    assert_eq!(std::fs::read(&output).unwrap(), b"video");
    assert!(entries(staging_root.path()).is_empty());
}

#[test]
fn test_convert_with_tears_down_staging_after_capture_failure() {
    let staging_root = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("battle.mp4");
    let mut config = config(15, 1, 2);
    config.staging_root = Some(staging_root.path().to_path_buf());
    let encoder = CheckingEncoder::default();

    let err = convert_with(
        "gen9ou-1",
        &output,
        &config,
        |_| Ok(ScriptedSurface::new().fail_snapshot_at(5)),
        &encoder,
    )
    .unwrap_err();

    assert_eq!(err.stage(), "capture");
    assert_eq!(encoder.calls.get(), 0);
    assert!(!output.exists());
    assert!(entries(staging_root.path()).is_empty());
    assert!(entries(out_dir.path()).is_empty());
}

#[test]
fn test_convert_with_tears_down_staging_when_launch_fails() {
    let staging_root = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("battle.mp4");
    let mut config = config(15, 1, 2);
    config.staging_root = Some(staging_root.path().to_path_buf());

    let err = convert_with(
        "gen9ou-1",
        &output,
        &config,
        |_| Err::<ScriptedSurface, _>(RecorderError::Browser("chrome not found".to_string())),
        &CheckingEncoder::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage(), "launch");
    assert!(entries(staging_root.path()).is_empty());
}

#[test]
fn test_convert_with_rejects_bad_source_before_staging() {
    let staging_root = tempdir().unwrap();
    let output = staging_root.path().join("battle.mp4");
    let mut config = config(15, 1, 2);
    config.staging_root = Some(staging_root.path().to_path_buf());

    let err = convert_with(
        "",
        &output,
        &config,
        |_| Ok(ScriptedSurface::new()),
        &CheckingEncoder::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage(), "source");
    assert!(entries(staging_root.path()).is_empty());
}
