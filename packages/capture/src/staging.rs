//! Temporary staging area for captured frames
//!
//! Frames land in a private temp directory as `frame_00000.jpg`,
//! `frame_00001.jpg`, ... so the encoder can consume them as a plain
//! printf-style image sequence. The directory is removed on teardown or
//! when the area is dropped, whichever comes first.

use crate::types::{Frame, StagedFrame};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = "jpg";
const MIN_INDEX_WIDTH: usize = 5;

/// Destination for captured frames
pub trait FrameSink {
    /// Durably store a frame. The frame must not be considered captured
    /// until this returns.
    fn stage(&mut self, frame: &Frame) -> io::Result<StagedFrame>;
}

pub struct StagingArea {
    dir: TempDir,
    index_width: usize,
}

impl StagingArea {
    /// Create a fresh staging directory under `root`, sized so that every
    /// index below `max_frames` gets the same zero-padded width.
    pub fn provision(root: &Path, max_frames: u32) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix("replay-frames-")
            .tempdir_in(root)?;

        debug!("Provisioned staging area {}", dir.path().display());

        Ok(Self {
            dir,
            index_width: index_width(max_frames),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn index_width(&self) -> usize {
        self.index_width
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.dir.path().join(format!(
            "{}{:0width$}.{}",
            FRAME_PREFIX,
            index,
            FRAME_EXTENSION,
            width = self.index_width
        ))
    }

    /// printf-style input pattern matching the staged frame names,
    /// e.g. `/tmp/replay-frames-x/frame_%05d.jpg`
    pub fn input_pattern(&self) -> PathBuf {
        self.dir.path().join(format!(
            "{}%0{}d.{}",
            FRAME_PREFIX, self.index_width, FRAME_EXTENSION
        ))
    }

    /// Remove the staging directory and everything in it. Failures are
    /// logged and otherwise ignored.
    pub fn teardown(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed staging area {}", path.display()),
            Err(e) => warn!("Failed to remove staging area {}: {}", path.display(), e),
        }
    }
}

impl FrameSink for StagingArea {
    fn stage(&mut self, frame: &Frame) -> io::Result<StagedFrame> {
        let path = self.frame_path(frame.index);

        let mut file = File::create(&path)?;
        file.write_all(&frame.payload)?;
        file.sync_all()?;

        Ok(StagedFrame {
            index: frame.index,
            path,
            bytes: frame.payload.len() as u64,
            captured_at: frame.captured_at,
        })
    }
}

fn index_width(max_frames: u32) -> usize {
    let largest = max_frames.saturating_sub(1);
    largest.to_string().len().max(MIN_INDEX_WIDTH)
}
