use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};
use crate::summary::event::{Event, EventValue};

pub const EVENTS_FILE: &str = "events.jsonl";
pub const IMAGES_DIR: &str = "images";

/// Appends scalar and image summaries to a run directory.
///
/// Layout:
/// ```text
/// <dir>/events.jsonl                     one JSON event per line
/// <dir>/images/<tag>/step_<step>.png     image payloads
/// ```
pub struct SummaryWriter {
    dir: PathBuf,
    events: BufWriter<File>,
}

impl SummaryWriter {
    /// Creates `dir` if needed and opens its events file for appending.
    pub fn create(dir: impl Into<PathBuf>) -> Result<SummaryWriter> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let path = dir.join(EVENTS_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        debug!("summary writer opened {}", path.display());
        Ok(SummaryWriter { dir, events: BufWriter::new(file) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scalar(&mut self, tag: &str, step: u64, value: f64) -> Result<()> {
        self.append(tag, step, EventValue::Scalar { value })
    }

    /// Saves `img` as PNG and records it. Returns the PNG path.
    pub fn image(&mut self, tag: &str, step: u64, img: &RgbaImage) -> Result<PathBuf> {
        let tag = sanitize_tag(tag);
        let relative = format!("{}/{}/step_{}.png", IMAGES_DIR, tag, step);
        let path = self.dir.join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        img.save(&path)?;
        self.append(&tag, step, EventValue::Image {
            path: relative,
            width: img.width(),
            height: img.height(),
        })?;
        Ok(path)
    }

    fn append(&mut self, tag: &str, step: u64, value: EventValue) -> Result<()> {
        let event = Event {
            wall_time: wall_time(),
            step,
            tag: sanitize_tag(tag),
            value,
        };
        let path = self.dir.join(EVENTS_FILE);
        serde_json::to_writer(&mut self.events, &event)?;
        self.events.write_all(b"\n").map_err(|e| Error::io(&path, e))?;
        self.events.flush().map_err(|e| Error::io(&path, e))
    }
}

fn wall_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Keeps `[A-Za-z0-9_-]`; everything else becomes `_`.
pub fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "_".to_owned() } else { cleaned }
}

/// Reads every event of one run directory, in write order.
pub fn read_events(dir: &Path) -> Result<Vec<Event>> {
    let path = dir.join(EVENTS_FILE);
    let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(&path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}

/// Run directories under `logdir` (including `logdir` itself) that hold an
/// events file, sorted by path.
pub fn find_runs(logdir: &Path) -> Result<Vec<PathBuf>> {
    let mut runs = Vec::new();
    collect_runs(logdir, &mut runs)?;
    runs.sort();
    Ok(runs)
}

fn collect_runs(dir: &Path, runs: &mut Vec<PathBuf>) -> Result<()> {
    if dir.join(EVENTS_FILE).is_file() {
        runs.push(dir.to_path_buf());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() && entry.file_name() != IMAGES_DIR {
            collect_runs(&path, runs)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn scalars_and_images_are_recorded_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = SummaryWriter::create(dir.path().join("run")).unwrap();
        w.scalar("epoch_loss", 1, 0.5).unwrap();
        w.scalar("epoch_loss", 2, 0.25).unwrap();
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let png = w.image("training set", 0, &img).unwrap();
        assert!(png.ends_with("images/training_set/step_0.png"));
        assert!(png.is_file());

        let events = read_events(w.dir()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].scalar_value(), Some(0.25));
        assert_eq!(events[2].tag, "training_set");
        match &events[2].value {
            EventValue::Image { path, width, height } => {
                assert_eq!(path, "images/training_set/step_0.png");
                assert_eq!((*width, *height), (3, 2));
            }
            other => panic!("expected an image event, got {:?}", other),
        }

        let decoded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        SummaryWriter::create(dir.path()).unwrap().scalar("a", 0, 1.0).unwrap();
        SummaryWriter::create(dir.path()).unwrap().scalar("a", 1, 2.0).unwrap();
        assert_eq!(read_events(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn finds_nested_runs_but_not_image_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut root = SummaryWriter::create(dir.path()).unwrap();
        root.image("x", 0, &RgbaImage::new(1, 1)).unwrap();
        SummaryWriter::create(dir.path().join("train")).unwrap().scalar("l", 1, 0.1).unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let runs = find_runs(dir.path()).unwrap();
        assert_eq!(runs, vec![dir.path().to_path_buf(), dir.path().join("train")]);
    }

    #[test]
    fn tags_are_sanitized() {
        assert_eq!(sanitize_tag("samples_15"), "samples_15");
        assert_eq!(sanitize_tag("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_tag(""), "_");
    }
}
