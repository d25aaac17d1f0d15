/// Viewer session state machine
///
/// Owns everything the picture viewer loop needs between two polls: the
/// sorted image list, the cursor into it, the last decoded frame, the
/// decode backoff and the selection. The UI layer feeds it scan ticks, key
/// presses and decode results; it never touches the filesystem or decoder
/// on its own.
///
/// Cursor convention: the list is sorted ascending by modification time,
/// index 0 is the oldest image and `len - 1` the newest.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

use super::data::{ImageFile, ImageKind};
use super::scanner::{self, ScanError, SortOrder};
use super::selection::SelectionSet;
use crate::decode::{DecodeError, Frame};

/// Fatal viewer conditions. Everything else is retried.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("lost access to the image directory: {0}")]
    DirectoryLost(#[source] ScanError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Decoding,
    Rendering,
    AwaitingInput,
    Terminated,
}

/// Operator input, already mapped from physical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Exit,
    Previous,
    Next,
    ToggleSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Nothing to show yet (directory empty or not created yet)
    Waiting,
    /// A new newest image appeared; the cursor jumped to it
    NewArrival,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The loop is over; the caller persists this selection
    Exit(SelectionSet),
    Moved,
    /// Already at the end of the list
    Stayed,
    Toggled { selected: bool },
    /// No image to act on
    Ignored,
}

/// A decode the UI should run off-thread and hand back through
/// `finish_decode`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub kind: ImageKind,
}

/// Identifies what is on screen; equal keys mean nothing to redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentKey {
    pub path: PathBuf,
    pub selected: bool,
    pub generation: u64,
}

pub struct Presentation<'a> {
    pub key: PresentKey,
    pub frame: &'a Frame,
}

struct CachedFrame {
    path: PathBuf,
    modified: SystemTime,
    frame: Frame,
    generation: u64,
}

pub struct ViewerSession {
    dir: PathBuf,
    images: Vec<ImageFile>,
    cursor: Option<usize>,
    /// Path and mtime of the newest image seen so far
    newest_known: Option<(PathBuf, SystemTime)>,
    directory_seen: bool,
    cache: Option<CachedFrame>,
    generation: u64,
    decode_in_flight: Option<PathBuf>,
    retry_at: Option<Instant>,
    backoff: Duration,
    selection: SelectionSet,
    phase: Phase,
}

impl ViewerSession {
    pub fn new(dir: PathBuf, selection: SelectionSet, backoff: Duration) -> Self {
        Self {
            dir,
            images: Vec::new(),
            cursor: None,
            newest_known: None,
            directory_seen: false,
            cache: None,
            generation: 0,
            decode_in_flight: None,
            retry_at: None,
            backoff,
            selection,
            phase: Phase::Scanning,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&ImageFile> {
        self.cursor.and_then(|i| self.images.get(i))
    }

    pub fn is_current_selected(&self) -> bool {
        self.current()
            .is_some_and(|image| self.selection.contains(&image.name))
    }

    /// Re-list the directory and reconcile the cursor with what is there now.
    pub fn scan(&mut self) -> Result<ScanOutcome, ViewerError> {
        if self.phase == Phase::Terminated {
            return Ok(ScanOutcome::Unchanged);
        }

        let listed = match scanner::scan_images(&self.dir, SortOrder::Ascending) {
            Ok(listed) => listed,
            Err(err) if self.directory_seen => return Err(ViewerError::DirectoryLost(err)),
            Err(err) => {
                log::debug!("Waiting for image directory: {}", err);
                self.clear_images();
                return Ok(ScanOutcome::Waiting);
            }
        };
        self.directory_seen = true;

        if listed.is_empty() {
            self.clear_images();
            return Ok(ScanOutcome::Waiting);
        }

        let previous = self.current().map(|image| image.path.clone());
        let previous_cursor = self.cursor;
        self.images = listed;
        let last = self.images.len() - 1;
        let newest = (self.images[last].path.clone(), self.images[last].modified);
        // Deleting the newest file exposes an older one; that is not an arrival
        let arrived = match &self.newest_known {
            None => true,
            Some((path, modified)) => *path != newest.0 && newest.1 >= *modified,
        };
        self.newest_known = Some(newest);

        let outcome = if arrived {
            log::info!("New picture: {}", self.images[last].name);
            self.cursor = Some(last);
            self.retry_at = None;
            ScanOutcome::NewArrival
        } else {
            // Files may have been removed below the cursor; follow the file
            // we were on, or clamp if it is gone
            self.cursor = previous
                .and_then(|path| self.images.iter().position(|image| image.path == path))
                .or_else(|| previous_cursor.map(|i| i.min(last)))
                .or(Some(last));
            ScanOutcome::Unchanged
        };

        self.phase = if self.cache_is_current() {
            Phase::Rendering
        } else {
            Phase::Decoding
        };
        Ok(outcome)
    }

    /// The next decode to run, if the current image needs one and no decode
    /// is running or backing off. Marks the request as in flight.
    pub fn next_decode(&mut self, now: Instant) -> Option<DecodeRequest> {
        if self.phase == Phase::Terminated || self.decode_in_flight.is_some() {
            return None;
        }
        if self.retry_at.is_some_and(|at| now < at) {
            return None;
        }
        if self.cache_is_current() {
            return None;
        }
        let image = self.current()?;
        let request = DecodeRequest {
            path: image.path.clone(),
            modified: image.modified,
            kind: image.kind,
        };
        self.decode_in_flight = Some(request.path.clone());
        self.retry_at = None;
        self.phase = Phase::Decoding;
        Some(request)
    }

    /// Hand back the result of a decode started with `next_decode`.
    ///
    /// Failures are expected while the capture process is still writing the
    /// file: they are logged and retried after the backoff.
    pub fn finish_decode(
        &mut self,
        request: DecodeRequest,
        result: Result<Frame, DecodeError>,
        now: Instant,
    ) {
        if self.decode_in_flight.as_ref() == Some(&request.path) {
            self.decode_in_flight = None;
        }
        if self.phase == Phase::Terminated {
            return;
        }

        let still_current = self
            .current()
            .is_some_and(|image| image.path == request.path && image.modified == request.modified);
        if !still_current {
            log::debug!("Discarding decode of {}, no longer on screen", request.path.display());
            return;
        }

        match result {
            Ok(frame) => {
                log::debug!(
                    "Decoded {} ({:?}, {}x{})",
                    request.path.display(),
                    frame.source,
                    frame.width(),
                    frame.height()
                );
                self.generation += 1;
                self.cache = Some(CachedFrame {
                    path: request.path,
                    modified: request.modified,
                    frame,
                    generation: self.generation,
                });
                self.phase = Phase::Rendering;
            }
            Err(err) => {
                log::warn!("{}. Retrying in {:.1}s.", err, self.backoff.as_secs_f32());
                self.retry_at = Some(now + self.backoff);
                self.phase = Phase::Decoding;
            }
        }
    }

    /// What should be on screen for the current image. None while the
    /// current image has no decoded frame yet: a frame of a different image
    /// is never shown in its place.
    pub fn presentation(&self) -> Option<Presentation<'_>> {
        if !self.cache_is_current() {
            return None;
        }
        let cache = self.cache.as_ref()?;
        Some(Presentation {
            key: PresentKey {
                path: cache.path.clone(),
                selected: self.is_current_selected(),
                generation: cache.generation,
            },
            frame: &cache.frame,
        })
    }

    /// The frame has been put on screen; wait for input.
    pub fn rendered(&mut self) {
        if self.phase == Phase::Rendering {
            self.phase = Phase::AwaitingInput;
        }
    }

    pub fn handle_key(&mut self, key: ViewerKey) -> KeyOutcome {
        if self.phase == Phase::Terminated {
            return KeyOutcome::Ignored;
        }

        match key {
            ViewerKey::Exit => {
                self.phase = Phase::Terminated;
                self.decode_in_flight = None;
                self.retry_at = None;
                KeyOutcome::Exit(self.selection.clone())
            }
            ViewerKey::Previous => self.step(|cursor, _| cursor.saturating_sub(1)),
            ViewerKey::Next => self.step(|cursor, last| (cursor + 1).min(last)),
            ViewerKey::ToggleSelection => {
                let Some(name) = self.current().map(|image| image.name.clone()) else {
                    return KeyOutcome::Ignored;
                };
                let selected = self.selection.toggle(&name);
                log::info!("{} {}", if selected { "Selected" } else { "Deselected" }, name);
                // Only the border changes; the decoded frame stays valid
                if self.phase != Phase::Decoding {
                    self.phase = Phase::Rendering;
                }
                KeyOutcome::Toggled { selected }
            }
        }
    }

    fn step(&mut self, advance: impl Fn(usize, usize) -> usize) -> KeyOutcome {
        let (Some(cursor), false) = (self.cursor, self.images.is_empty()) else {
            return KeyOutcome::Ignored;
        };
        let last = self.images.len() - 1;
        let target = advance(cursor, last);
        if target == cursor {
            return KeyOutcome::Stayed;
        }

        self.cursor = Some(target);
        // A pending retry belongs to the image we just left
        self.retry_at = None;
        self.phase = if self.cache_is_current() {
            Phase::Rendering
        } else {
            Phase::Decoding
        };
        KeyOutcome::Moved
    }

    fn cache_is_current(&self) -> bool {
        match (self.cache.as_ref(), self.current()) {
            (Some(cache), Some(image)) => cache.path == image.path && cache.modified == image.modified,
            _ => false,
        }
    }

    fn clear_images(&mut self) {
        self.images.clear();
        self.cursor = None;
        self.newest_known = None;
        self.phase = Phase::Scanning;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::decode_path;
    use crate::decode::tests::write_jpeg;
    use crate::state::scanner::tests::touch;
    use std::fs::{self, File};
    use std::time::UNIX_EPOCH;

    const BACKOFF: Duration = Duration::from_secs(2);

    fn jpeg_at(dir: &Path, name: &str, secs: u64) -> PathBuf {
        let path = dir.join(name);
        write_jpeg(&path, 32, 24);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs))
            .unwrap();
        path
    }

    fn session(dir: &Path, selection: SelectionSet) -> ViewerSession {
        ViewerSession::new(dir.to_path_buf(), selection, BACKOFF)
    }

    /// Run decodes synchronously until nothing is pending
    fn settle(session: &mut ViewerSession, now: Instant) {
        while let Some(request) = session.next_decode(now) {
            let result = decode_path(&request.path, 256);
            session.finish_decode(request, result, now);
        }
    }

    fn current_name(session: &ViewerSession) -> &str {
        session.current().map(|i| i.name.as_str()).unwrap_or("")
    }

    #[test]
    fn test_empty_directory_waits() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), SelectionSet::new());
        assert_eq!(s.scan().unwrap(), ScanOutcome::Waiting);
        assert_eq!(s.phase(), Phase::Scanning);
        assert!(s.current().is_none());
        assert!(s.next_decode(Instant::now()).is_none());
        assert_eq!(s.handle_key(ViewerKey::Previous), KeyOutcome::Ignored);
        assert_eq!(s.handle_key(ViewerKey::ToggleSelection), KeyOutcome::Ignored);
    }

    #[test]
    fn test_missing_directory_waits_until_created() {
        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("session");
        let mut s = session(&session_dir, SelectionSet::new());
        assert_eq!(s.scan().unwrap(), ScanOutcome::Waiting);

        fs::create_dir(&session_dir).unwrap();
        jpeg_at(&session_dir, "a.jpg", 1);
        assert_eq!(s.scan().unwrap(), ScanOutcome::NewArrival);
        assert_eq!(current_name(&s), "a.jpg");
    }

    #[test]
    fn test_losing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("session");
        fs::create_dir(&session_dir).unwrap();
        let mut s = session(&session_dir, SelectionSet::new());
        s.scan().unwrap();

        fs::remove_dir_all(&session_dir).unwrap();
        assert!(matches!(s.scan(), Err(ViewerError::DirectoryLost(_))));
    }

    #[test]
    fn test_navigation_clamps_at_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        let mut s = session(dir.path(), SelectionSet::new());

        assert_eq!(s.scan().unwrap(), ScanOutcome::NewArrival);
        assert_eq!(current_name(&s), "b.jpg");

        assert_eq!(s.handle_key(ViewerKey::Next), KeyOutcome::Stayed);
        assert_eq!(current_name(&s), "b.jpg");

        assert_eq!(s.handle_key(ViewerKey::Previous), KeyOutcome::Moved);
        assert_eq!(current_name(&s), "a.jpg");
        assert_eq!(s.phase(), Phase::Decoding);

        assert_eq!(s.handle_key(ViewerKey::Previous), KeyOutcome::Stayed);
        assert_eq!(current_name(&s), "a.jpg");

        assert_eq!(s.handle_key(ViewerKey::Next), KeyOutcome::Moved);
        assert_eq!(current_name(&s), "b.jpg");
    }

    #[test]
    fn test_new_arrival_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        s.handle_key(ViewerKey::Previous);
        assert_eq!(current_name(&s), "a.jpg");

        // Rescan without changes keeps the operator where they are
        assert_eq!(s.scan().unwrap(), ScanOutcome::Unchanged);
        assert_eq!(current_name(&s), "a.jpg");

        jpeg_at(dir.path(), "c.jpg", 3);
        assert_eq!(s.scan().unwrap(), ScanOutcome::NewArrival);
        assert_eq!(current_name(&s), "c.jpg");
        assert_eq!(s.cursor(), Some(2));
    }

    #[test]
    fn test_cursor_follows_file_when_older_files_vanish() {
        let dir = tempfile::tempdir().unwrap();
        let a = jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        jpeg_at(dir.path(), "c.jpg", 3);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        s.handle_key(ViewerKey::Previous);
        assert_eq!(current_name(&s), "b.jpg");

        fs::remove_file(a).unwrap();
        s.scan().unwrap();
        assert_eq!(current_name(&s), "b.jpg");
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn test_deleting_newest_does_not_move_cursor() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        let c = jpeg_at(dir.path(), "c.jpg", 3);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        s.handle_key(ViewerKey::Previous);
        s.handle_key(ViewerKey::Previous);
        assert_eq!(current_name(&s), "a.jpg");

        fs::remove_file(c).unwrap();
        assert_eq!(s.scan().unwrap(), ScanOutcome::Unchanged);
        assert_eq!(current_name(&s), "a.jpg");

        // A later capture still counts as an arrival
        jpeg_at(dir.path(), "d.jpg", 4);
        assert_eq!(s.scan().unwrap(), ScanOutcome::NewArrival);
        assert_eq!(current_name(&s), "d.jpg");
    }

    #[test]
    fn test_deleting_newest_under_cursor_clamps() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        let b = jpeg_at(dir.path(), "b.jpg", 2);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        assert_eq!(current_name(&s), "b.jpg");

        fs::remove_file(b).unwrap();
        assert_eq!(s.scan().unwrap(), ScanOutcome::Unchanged);
        assert_eq!(current_name(&s), "a.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("session");
        fs::create_dir(&session_dir).unwrap();
        jpeg_at(&session_dir, "a.jpg", 1);
        let mut s = session(&session_dir, SelectionSet::new());
        s.scan().unwrap();

        fs::set_permissions(&session_dir, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores permission bits
        let readable = fs::read_dir(&session_dir).is_ok();
        let result = s.scan();
        fs::set_permissions(&session_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }
        assert!(matches!(result, Err(ViewerError::DirectoryLost(_))));
    }

    #[test]
    fn test_directory_cleared_returns_to_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let a = jpeg_at(dir.path(), "a.jpg", 1);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        settle(&mut s, Instant::now());
        assert!(s.presentation().is_some());

        fs::remove_file(a).unwrap();
        assert_eq!(s.scan().unwrap(), ScanOutcome::Waiting);
        assert_eq!(s.phase(), Phase::Scanning);
        assert!(s.presentation().is_none());
        assert_eq!(s.handle_key(ViewerKey::Next), KeyOutcome::Ignored);
    }

    #[test]
    fn test_cached_frame_skips_redecode() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        settle(&mut s, Instant::now());
        assert_eq!(s.phase(), Phase::Rendering);
        let first = s.presentation().unwrap().key;
        s.rendered();
        assert_eq!(s.phase(), Phase::AwaitingInput);

        assert_eq!(s.scan().unwrap(), ScanOutcome::Unchanged);
        assert_eq!(s.phase(), Phase::Rendering);
        assert!(s.next_decode(Instant::now()).is_none());
        assert_eq!(s.presentation().unwrap().key, first);
    }

    #[test]
    fn test_toggle_scenario_ends_with_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "img1.jpg", 1);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        settle(&mut s, Instant::now());
        let generation = s.presentation().unwrap().key.generation;

        assert_eq!(s.handle_key(ViewerKey::ToggleSelection), KeyOutcome::Toggled { selected: true });
        assert_eq!(s.selection().to_sorted_vec(), vec!["img1.jpg"]);
        let key = s.presentation().unwrap().key;
        assert!(key.selected);
        // Border only: no new decode
        assert_eq!(key.generation, generation);
        assert!(s.next_decode(Instant::now()).is_none());

        assert_eq!(s.handle_key(ViewerKey::ToggleSelection), KeyOutcome::Toggled { selected: false });
        assert!(s.selection().is_empty());

        match s.handle_key(ViewerKey::Exit) {
            KeyOutcome::Exit(selection) => assert!(selection.is_empty()),
            other => panic!("expected exit, got {other:?}"),
        }
        assert_eq!(s.phase(), Phase::Terminated);
    }

    #[test]
    fn test_initial_selection_shows_selected_border() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        let mut s = session(dir.path(), SelectionSet::from_names(["a.jpg"]));
        s.scan().unwrap();
        settle(&mut s, Instant::now());

        let on_b = s.presentation().unwrap().key;
        assert!(on_b.path.ends_with("b.jpg"));
        assert!(!on_b.selected);

        s.handle_key(ViewerKey::Previous);
        assert!(s.presentation().is_none());
        settle(&mut s, Instant::now());
        let on_a = s.presentation().unwrap().key;
        assert!(on_a.path.ends_with("a.jpg"));
        assert!(on_a.selected);
    }

    #[test]
    fn test_corrupt_file_backs_off_without_stopping_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        let broken = touch(dir.path(), "b.jpg", 2);
        fs::write(&broken, b"still being written").unwrap();
        File::options()
            .write(true)
            .open(&broken)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(1_700_000_002))
            .unwrap();

        let mut s = session(dir.path(), SelectionSet::new());
        let now = Instant::now();
        s.scan().unwrap();
        settle(&mut s, now);
        assert_eq!(current_name(&s), "b.jpg");
        assert_eq!(s.phase(), Phase::Decoding);
        assert!(s.presentation().is_none());

        // Backing off: no retry yet, but scanning and input still work
        assert!(s.next_decode(now + Duration::from_millis(500)).is_none());
        assert_eq!(s.scan().unwrap(), ScanOutcome::Unchanged);
        let retry = s.next_decode(now + BACKOFF).expect("retry after backoff");
        assert!(retry.path.ends_with("b.jpg"));
        let result = decode_path(&retry.path, 256);
        s.finish_decode(retry, result, now + BACKOFF);

        // Navigation interrupts the backoff
        assert_eq!(s.handle_key(ViewerKey::Previous), KeyOutcome::Moved);
        settle(&mut s, now + BACKOFF);
        assert!(s.presentation().unwrap().key.path.ends_with("a.jpg"));
        s.rendered();
        assert_eq!(s.phase(), Phase::AwaitingInput);
    }

    #[test]
    fn test_stale_decode_result_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        jpeg_at(dir.path(), "b.jpg", 2);
        let mut s = session(dir.path(), SelectionSet::new());
        let now = Instant::now();
        s.scan().unwrap();

        let request = s.next_decode(now).unwrap();
        assert!(request.path.ends_with("b.jpg"));
        assert!(s.next_decode(now).is_none(), "only one decode in flight");

        s.handle_key(ViewerKey::Previous);
        let result = decode_path(&request.path, 256);
        s.finish_decode(request, result, now);
        assert!(s.presentation().is_none());

        settle(&mut s, now);
        assert!(s.presentation().unwrap().key.path.ends_with("a.jpg"));
    }

    #[test]
    fn test_rewritten_file_is_decoded_again() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        settle(&mut s, Instant::now());
        let first = s.presentation().unwrap().key.generation;

        jpeg_at(dir.path(), "a.jpg", 5);
        s.scan().unwrap();
        assert_eq!(s.phase(), Phase::Decoding);
        settle(&mut s, Instant::now());
        assert!(s.presentation().unwrap().key.generation > first);
    }

    #[test]
    fn test_keys_after_exit_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        jpeg_at(dir.path(), "a.jpg", 1);
        let mut s = session(dir.path(), SelectionSet::new());
        s.scan().unwrap();
        s.handle_key(ViewerKey::Exit);
        assert_eq!(s.handle_key(ViewerKey::ToggleSelection), KeyOutcome::Ignored);
        assert!(s.next_decode(Instant::now()).is_none());
        assert!(s.selection().is_empty());
    }
}
