use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use flume::{Receiver, Sender};
use rayon::prelude::*;
use thiserror::Error;

use crate::image::{Image, ImageError};

/// Frames decoded in parallel before being published.
const BATCH: usize = 8;

#[derive(Debug)]
pub enum DecodeMsg {
    Frame(usize),
    Done,
    Failed(ImageError),
}

/// Ordered list of frames, filled by a background decoder.
pub struct FrameSequence {
    source: PathBuf,
    frames: Arc<RwLock<Vec<Arc<Image>>>>,
    total: usize,
    frame_rate: f64,
    done: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    rx: Receiver<DecodeMsg>,
    decoder: Option<JoinHandle<()>>,
}

impl FrameSequence {
    /// Open a single PNG or a directory of PNGs sorted by name.
    pub fn open<P: AsRef<Path>>(path: P, frame_rate: f64) -> Result<Self, SequenceError> {
        let path = path.as_ref();

        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(SequenceError::InvalidFrameRate(frame_rate));
        }

        let paths = match collect_paths(path)? {
            Source::File(file) => return Ok(Self::still(&file, Image::load(&file)?, frame_rate)),
            Source::Frames(paths) => paths,
        };
        let total = paths.len();

        let frames = Arc::new(RwLock::new(Vec::with_capacity(total)));
        let done = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = flume::unbounded();

        let decoder = {
            let frames = Arc::clone(&frames);
            let done = Arc::clone(&done);
            let cancel = Arc::clone(&cancel);

            std::thread::Builder::new()
                .name("frame-decoder".to_owned())
                .spawn(move || decode(paths, frames, cancel, tx, done))
                .map_err(|e| SequenceError::Io(path.to_owned(), e))?
        };

        log::info!("decoding {total} frame(s) from {path:?} at {frame_rate} fps");

        Ok(Self {
            source: path.to_owned(),
            frames,
            total,
            frame_rate,
            done,
            cancel,
            rx,
            decoder: Some(decoder),
        })
    }

    /// A one-frame sequence, decoded before `open` returns so a broken file
    /// is reported to the caller.
    fn still(path: &Path, image: Image, frame_rate: f64) -> Self {
        let (tx, rx) = flume::unbounded();
        let _ = tx.send(DecodeMsg::Frame(0));
        let _ = tx.send(DecodeMsg::Done);

        log::info!("loaded {path:?} ({}x{})", image.width(), image.height());

        Self {
            source: path.to_owned(),
            frames: Arc::new(RwLock::new(vec![Arc::new(image)])),
            total: 1,
            frame_rate,
            done: Arc::new(AtomicBool::new(true)),
            cancel: Arc::new(AtomicBool::new(false)),
            rx,
            decoder: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn frame(&self, index: usize) -> Option<Arc<Image>> {
        self.frames
            .read()
            .ok()
            .and_then(|frames| frames.get(index).cloned())
    }

    /// Frames decoded so far.
    pub fn frame_count(&self) -> usize {
        self.frames.read().map(|f| f.len()).unwrap_or(0)
    }

    /// Frames the source contains.
    pub fn total_frames(&self) -> usize {
        self.total
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// The decoder has stopped, either at the end or on an error.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Messages sent by the decoder since the last call.
    pub fn poll(&self) -> Vec<DecodeMsg> {
        self.rx.try_iter().collect()
    }

    /// Ask the decoder to stop before its next batch.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Block until the decoder stops. Consumes pending messages.
    pub fn wait(&self) -> Result<usize, SequenceError> {
        while !self.is_done() {
            match self.rx.recv() {
                Ok(DecodeMsg::Failed(e)) => return Err(SequenceError::Decode(e)),
                Ok(DecodeMsg::Done) | Err(_) => break,
                Ok(DecodeMsg::Frame(_)) => {}
            }
        }

        for msg in self.rx.try_iter() {
            if let DecodeMsg::Failed(e) = msg {
                return Err(SequenceError::Decode(e));
            }
        }

        Ok(self.frame_count())
    }
}

impl Drop for FrameSequence {
    fn drop(&mut self) {
        self.cancel();

        // An unfinished decoder is detached; it owns its own handles to the
        // frame list and exits at the next batch boundary.
        match self.decoder.take() {
            Some(handle) if handle.is_finished() => {
                if handle.join().is_err() {
                    log::error!("frame decoder for {:?} panicked", self.source);
                }
            }
            Some(_) => log::debug!("detaching frame decoder for {:?}", self.source),
            None => {}
        }
    }
}

enum Source {
    File(PathBuf),
    Frames(Vec<PathBuf>),
}

fn collect_paths(path: &Path) -> Result<Source, SequenceError> {
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SequenceError::NotFound(path.to_owned()),
        _ => SequenceError::Io(path.to_owned(), e),
    })?;

    if !meta.is_dir() {
        return Ok(Source::File(path.to_owned()));
    }

    let mut paths = Vec::new();

    for entry in std::fs::read_dir(path).map_err(|e| SequenceError::Io(path.to_owned(), e))? {
        let entry = entry.map_err(|e| SequenceError::Io(path.to_owned(), e))?;
        let entry_path = entry.path();

        let is_png = entry_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);

        if is_png && entry_path.is_file() {
            paths.push(entry_path);
        }
    }

    if paths.is_empty() {
        return Err(SequenceError::Empty(path.to_owned()));
    }

    paths.sort();

    Ok(Source::Frames(paths))
}

fn decode(
    paths: Vec<PathBuf>,
    frames: Arc<RwLock<Vec<Arc<Image>>>>,
    cancel: Arc<AtomicBool>,
    tx: Sender<DecodeMsg>,
    done: Arc<AtomicBool>,
) {
    let mut index = 0;

    'outer: for batch in paths.chunks(BATCH) {
        if cancel.load(Ordering::Acquire) {
            log::debug!("frame decoding cancelled after {index} frame(s)");
            break;
        }

        let decoded: Vec<_> = batch.par_iter().map(Image::load).collect();

        for res in decoded {
            match res {
                Ok(image) => {
                    match frames.write() {
                        Ok(mut frames) => frames.push(Arc::new(image)),
                        Err(_) => break 'outer,
                    }
                    // receiver may be gone, nothing to report to then
                    let _ = tx.send(DecodeMsg::Frame(index));
                    index += 1;
                }
                Err(e) => {
                    let _ = tx.send(DecodeMsg::Failed(e));
                    done.store(true, Ordering::Release);
                    return;
                }
            }
        }
    }

    let _ = tx.send(DecodeMsg::Done);
    done.store(true, Ordering::Release);
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("no such file or directory: {0:?}")]
    NotFound(PathBuf),
    #[error("no PNG frames in {0:?}")]
    Empty(PathBuf),
    #[error("could not read {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
    #[error(transparent)]
    Decode(#[from] ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, gray: u8) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = png::Encoder::new(file, 1, 1);
        encoder.set_color(png::ColorType::Grayscale);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[gray]).unwrap();
    }

    #[test]
    fn single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        write_png(&path, 7);

        let seq = FrameSequence::open(&path, 24.0).unwrap();

        assert!(seq.is_done());
        assert_eq!(seq.frame_count(), 1);
        assert_eq!(seq.wait().unwrap(), 1);
        assert_eq!(seq.total_frames(), 1);
        assert_eq!(seq.frame(0).unwrap().data(), &[7, 7, 7, 255]);
        assert!(seq.frame(1).is_none());
    }

    #[test]
    fn directory_is_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        // more frames than one batch
        for i in (0..20).rev() {
            write_png(&dir.path().join(format!("frame_{i:03}.png")), i as u8);
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let seq = FrameSequence::open(dir.path(), 30.0).unwrap();

        assert_eq!(seq.wait().unwrap(), 20);
        assert!(seq.is_done());
        for i in 0..20 {
            assert_eq!(seq.frame(i).unwrap().data()[0], i as u8);
        }
    }

    #[test]
    fn progress_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            write_png(&dir.path().join(format!("{i}.png")), 0);
        }

        let seq = FrameSequence::open(dir.path(), 30.0).unwrap();
        while !seq.is_done() {
            std::thread::yield_now();
        }

        let msgs = seq.poll();
        let frames: Vec<_> = msgs
            .iter()
            .filter_map(|m| match m {
                DecodeMsg::Frame(i) => Some(*i),
                _ => None,
            })
            .collect();

        assert_eq!(frames, vec![0, 1, 2]);
        assert!(matches!(msgs.last(), Some(DecodeMsg::Done)));
    }

    #[test]
    fn broken_frame_stops_decoding() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 1);
        std::fs::write(dir.path().join("b.png"), b"garbage").unwrap();
        write_png(&dir.path().join("c.png"), 3);

        let seq = FrameSequence::open(dir.path(), 30.0).unwrap();

        assert!(matches!(seq.wait(), Err(SequenceError::Decode(_))));
        assert_eq!(seq.frame_count(), 1);
        assert_eq!(seq.total_frames(), 3);
    }

    #[test]
    fn undecodable_single_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(matches!(
            FrameSequence::open(&path, 24.0),
            Err(SequenceError::Decode(ImageError::Decode(..)))
        ));
    }

    #[test]
    fn done_implies_all_frames_published() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            write_png(&dir.path().join(format!("{i:02}.png")), 0);
        }

        let seq = FrameSequence::open(dir.path(), 24.0).unwrap();
        loop {
            // read in the same order as the render loop
            let complete = seq.is_done();
            let available = seq.frame_count();
            if complete {
                assert_eq!(available, 12);
                break;
            }
            assert!(available <= 12);
            std::thread::yield_now();
        }
    }

    #[test]
    fn cancel_stops_at_a_batch_boundary() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..40 {
            write_png(&dir.path().join(format!("{i:02}.png")), 0);
        }

        let seq = FrameSequence::open(dir.path(), 24.0).unwrap();
        seq.cancel();

        let decoded = seq.wait().unwrap();
        assert!(seq.is_done());
        assert_eq!(decoded % BATCH, 0);
        assert!(decoded <= 40);
    }

    #[test]
    fn dropping_mid_decode_does_not_join() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..40 {
            write_png(&dir.path().join(format!("{i:02}.png")), 0);
        }

        let seq = FrameSequence::open(dir.path(), 24.0).unwrap();
        let frames = Arc::clone(&seq.frames);
        drop(seq);

        // the detached decoder keeps its own handle until it stops
        while Arc::strong_count(&frames) > 1 {
            std::thread::yield_now();
        }
        assert_eq!(frames.read().unwrap().len() % BATCH, 0);
    }

    #[test]
    fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            FrameSequence::open(dir.path(), 24.0),
            Err(SequenceError::Empty(_))
        ));
    }

    #[test]
    fn missing_path() {
        assert!(matches!(
            FrameSequence::open("samples/nope.png", 24.0),
            Err(SequenceError::NotFound(_))
        ));
    }

    #[test]
    fn frame_rate_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            FrameSequence::open(dir.path(), 0.0),
            Err(SequenceError::InvalidFrameRate(_))
        ));
    }
}
