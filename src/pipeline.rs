use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::api::{ApiClient, NegativeRecord};
use crate::config::RunConfig;
use crate::exif::{self, TagChange, plan_changes, scan_to_tags};

/// Recognized scan file extensions.
const SCAN_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// The interactive seam of the pipeline.
///
/// Matching and writing may need user input (identify a scan, pick between
/// ambiguous candidates, confirm a write). The CLI implements this over
/// stdin; tests script it; [`AutoPrompter`] answers without interaction for
/// fully unattended runs.
pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> Result<bool>;
    /// Ask for a free-form value.
    fn ask(&mut self, question: &str) -> Result<String>;
    /// Pick one of several options, or none to skip.
    fn choose(&mut self, question: &str, options: &[String]) -> Result<Option<usize>>;
    /// Show the pending tag changes for a file and ask whether to write them.
    fn review(&mut self, path: &Path, changes: &[TagChange]) -> Result<bool>;
}

/// A non-interactive prompter that accepts everything it can and skips the
/// rest. Free-form questions cannot be answered unattended and are an error.
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        bail!("interactive input required: {question}")
    }

    fn choose(&mut self, _question: &str, _options: &[String]) -> Result<Option<usize>> {
        Ok(None)
    }

    fn review(&mut self, _path: &Path, _changes: &[TagChange]) -> Result<bool> {
        Ok(true)
    }
}

/// How processing one file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Tags were written to the file.
    Written,
    /// The file already carries everything the catalogue knows.
    UpToDate,
    /// No catalogue record could be identified; the file was skipped.
    Unmatched,
    /// The user declined the match or the write.
    Declined,
    /// Dry run: changes computed but not written.
    Preview,
    /// A per-file error; see `error`. The run continues.
    Failed,
}

/// The result of processing a single scan file.
#[derive(Debug)]
pub struct ScanReport {
    pub path: PathBuf,
    pub scan_id: Option<String>,
    /// A new Scan record was created in the catalogue for this file.
    pub created_scan: bool,
    pub changes: Vec<TagChange>,
    pub outcome: Outcome,
    pub error: Option<String>,
}

impl ScanReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            scan_id: None,
            created_scan: false,
            changes: Vec::new(),
            outcome: Outcome::Unmatched,
            error: None,
        }
    }

    fn fail(mut self, err: impl std::fmt::Display) -> Self {
        self.outcome = Outcome::Failed;
        self.error = Some(err.to_string());
        self
    }
}

/// Enumerate the scan files for this run.
///
/// With `--file`, the sequence is that single path; a missing path is a
/// fatal error, raised before any network traffic. Otherwise `*.jpg` files
/// under `root` are collected, descending into subdirectories only with
/// `--recursive`, in sorted order.
pub fn collect_scans(run: &RunConfig, root: &Path) -> Result<Vec<PathBuf>> {
    if let Some(ref file) = run.file {
        if !file.is_file() {
            bail!("File not found: {}", file.display());
        }
        return Ok(vec![file.clone()]);
    }

    let max_depth = if run.recursive { usize::MAX } else { 1 };
    let mut scans: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_scan_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    scans.sort();
    Ok(scans)
}

/// Check if a file has a recognized scan extension.
fn is_scan_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCAN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Guess a negative's film ID and frame from a filename.
///
/// Assumes `FILM-FRAME-title.jpg` notation, e.g. `123-22-holiday.jpg`
/// yields film `123` and frame `22`.
pub fn guess_frame(filename: &str) -> Option<(String, String)> {
    let lower = filename.to_lowercase();
    let stem = lower
        .strip_suffix(".jpg")
        .or_else(|| lower.strip_suffix(".jpeg"))?;

    let mut parts = stem.splitn(3, '-');
    let film = parts.next()?;
    let frame = parts.next()?;

    if film.is_empty() || frame.is_empty() {
        return None;
    }
    if !film.chars().all(|c| c.is_ascii_digit()) || !frame.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((film.to_string(), frame.to_string()))
}

/// Check whether a string is a canonical hyphenated UUID, as written to
/// `ImageUniqueID` by previous runs.
pub fn is_scan_id(s: &str) -> bool {
    Uuid::try_parse(s)
        .map(|u| u.hyphenated().to_string().eq_ignore_ascii_case(s))
        .unwrap_or(false)
}

/// Apply the matching policy to a set of Negative candidates.
///
/// - zero candidates: unmatched, `None`
/// - one candidate: auto-selected under `--auto` or `--yes`, otherwise
///   confirmed with the user
/// - several candidates: skipped under `--auto` (the guess is ambiguous),
///   otherwise the user picks one — even under `--yes`
pub fn select_negative(
    path: &Path,
    candidates: &[NegativeRecord],
    run: &RunConfig,
    prompter: &mut dyn Prompter,
) -> Result<Option<NegativeRecord>> {
    match candidates {
        [] => {
            log::info!("{}: no matching negative in the catalogue", path.display());
            Ok(None)
        }
        [only] => {
            if run.auto || run.assume_yes {
                log::info!("{} corresponds to negative {}", path.display(), only.slug);
                return Ok(Some(only.clone()));
            }
            let question = match only.caption {
                Some(ref caption) => {
                    format!("Tag {} as negative {} ({caption})?", path.display(), only.slug)
                }
                None => format!("Tag {} as negative {}?", path.display(), only.slug),
            };
            if prompter.confirm(&question)? {
                Ok(Some(only.clone()))
            } else {
                Ok(None)
            }
        }
        many => {
            if run.auto {
                log::warn!(
                    "{}: {} candidate negatives, skipping (ambiguous under --auto)",
                    path.display(),
                    many.len()
                );
                return Ok(None);
            }
            let options: Vec<String> = many
                .iter()
                .map(|n| match n.caption {
                    Some(ref caption) => format!("{} ({caption})", n.slug),
                    None => n.slug.clone(),
                })
                .collect();
            let question = format!("Select the negative for {}", path.display());
            Ok(prompter
                .choose(&question, &options)?
                .and_then(|i| many.get(i))
                .cloned())
        }
    }
}

/// Ask the user for a film ID and frame when the filename gives no clue.
fn prompt_frame(filename: &str, prompter: &mut dyn Prompter) -> Result<(String, String)> {
    let film = prompter.ask(&format!("Enter film ID for {filename}"))?;
    let film = film.trim().to_string();
    if film.is_empty() {
        bail!("no film ID given");
    }
    let frame = prompter.ask(&format!("Enter frame for film {film}"))?;
    let frame = frame.trim().to_string();
    if frame.is_empty() {
        bail!("no frame given");
    }
    Ok((film, frame))
}

/// Process a single scan file through the full pipeline.
///
/// The per-file linear sequence: read EXIF → reuse the embedded scan ID or
/// establish one (filename guess / prompt → negative match → scan creation)
/// → fetch the full record → diff → confirm → write. Every failure is
/// per-file: it lands in the report and the caller moves on to the next
/// file. Nothing is written unless a record was confirmed and the run is
/// not a dry run.
pub async fn process_scan(
    path: &Path,
    api: &ApiClient,
    run: &RunConfig,
    prompter: &mut dyn Prompter,
) -> ScanReport {
    let mut report = ScanReport::new(path);

    let existing = match exif::read_exif(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to read EXIF from {}: {e}", path.display());
            exif::ExifData::default()
        }
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    // Establish the scan ID: reuse the one embedded in the file, or match
    // the file against the catalogue and create a Scan record.
    let scan_id = match existing.scan_id.clone().filter(|id| is_scan_id(id)) {
        Some(id) => {
            log::info!("{} already has an EXIF scan ID {id}", path.display());
            id
        }
        None => {
            log::debug!("{} does not have an EXIF scan ID", path.display());

            let (film, frame) = match guess_frame(&file_name) {
                Some((film, frame)) => {
                    log::info!("Deduced film {film} frame {frame} from {file_name}");
                    (film, frame)
                }
                None if run.auto => {
                    log::info!("{file_name} does not match FILM-FRAME notation, skipping");
                    report.outcome = Outcome::Unmatched;
                    return report;
                }
                None => match prompt_frame(&file_name, prompter) {
                    Ok(ids) => ids,
                    Err(e) => return report.fail(e),
                },
            };

            let candidates = match api.find_negatives(&film, &frame).await {
                Ok(candidates) => candidates,
                Err(e) => return report.fail(e),
            };

            let negative = match select_negative(path, &candidates, run, prompter) {
                Ok(Some(negative)) => negative,
                Ok(None) => {
                    report.outcome = Outcome::Unmatched;
                    return report;
                }
                Err(e) => return report.fail(e),
            };

            match api.create_scan(&negative.slug, &file_name).await {
                Ok(uuid) => {
                    log::info!("Created scan {uuid} for negative {}", negative.slug);
                    report.created_scan = true;
                    uuid
                }
                Err(e) => return report.fail(e),
            }
        }
    };
    report.scan_id = Some(scan_id.clone());

    // Fetch the full record; it can have vanished since the match.
    let scan = match api.get_scan(&scan_id).await {
        Ok(scan) => scan,
        Err(e) => return report.fail(e),
    };

    let wanted = scan_to_tags(&scan);
    let plan = plan_changes(&existing, &wanted);
    report.changes = plan.changes.clone();

    if plan.changes.is_empty() {
        log::info!("{} is already up to date", path.display());
        report.outcome = Outcome::UpToDate;
        return report;
    }

    if run.dry_run {
        report.outcome = Outcome::Preview;
        return report;
    }

    if !run.assume_yes {
        match prompter.review(path, &plan.changes) {
            Ok(true) => {}
            Ok(false) => {
                report.outcome = Outcome::Declined;
                return report;
            }
            Err(e) => return report.fail(e),
        }
    }

    match exif::write_tags(path, &plan.tags) {
        Ok(written) => {
            log::info!("Wrote {written} tag(s) to {}", path.display());
            report.outcome = Outcome::Written;
        }
        Err(e) => {
            return report.fail(format!("Failed to write tags: {e:#}"));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::fs;
    use tempfile::TempDir;

    /// Scripted prompter: answers are consumed in order; running out of a
    /// kind of answer means the code prompted when it shouldn't have.
    #[derive(Default)]
    struct Scripted {
        confirms: Vec<bool>,
        answers: Vec<String>,
        choices: Vec<Option<usize>>,
        prompts: usize,
    }

    impl Prompter for Scripted {
        fn confirm(&mut self, _q: &str) -> Result<bool> {
            self.prompts += 1;
            self.confirms.pop().context("unexpected confirm prompt")
        }

        fn ask(&mut self, _q: &str) -> Result<String> {
            self.prompts += 1;
            self.answers.pop().context("unexpected ask prompt")
        }

        fn choose(&mut self, _q: &str, _options: &[String]) -> Result<Option<usize>> {
            self.prompts += 1;
            self.choices.pop().context("unexpected choose prompt")
        }

        fn review(&mut self, _path: &Path, _changes: &[TagChange]) -> Result<bool> {
            self.prompts += 1;
            self.confirms.pop().context("unexpected review prompt")
        }
    }

    fn negative(slug: &str) -> NegativeRecord {
        serde_json::from_value(serde_json::json!({
            "slug": slug,
            "film": "123",
            "frame": "22"
        }))
        .unwrap()
    }

    // ── guess_frame ──────────────────────────────────────────────────

    #[test]
    fn guess_frame_film_frame_title() {
        assert_eq!(
            guess_frame("123-22-holiday.jpg"),
            Some(("123".to_string(), "22".to_string()))
        );
    }

    #[test]
    fn guess_frame_without_title() {
        assert_eq!(
            guess_frame("123-22.jpg"),
            Some(("123".to_string(), "22".to_string()))
        );
    }

    #[test]
    fn guess_frame_uppercase_and_jpeg() {
        assert_eq!(
            guess_frame("123-22-HOLIDAY.JPG"),
            Some(("123".to_string(), "22".to_string()))
        );
        assert_eq!(
            guess_frame("7-1.jpeg"),
            Some(("7".to_string(), "1".to_string()))
        );
    }

    #[test]
    fn guess_frame_rejects_non_numeric() {
        assert_eq!(guess_frame("IMG_0001.jpg"), None);
        assert_eq!(guess_frame("abc-22.jpg"), None);
        assert_eq!(guess_frame("123-2a.jpg"), None);
    }

    #[test]
    fn guess_frame_rejects_wrong_shapes() {
        assert_eq!(guess_frame("123.jpg"), None);
        assert_eq!(guess_frame("-22.jpg"), None);
        assert_eq!(guess_frame("123-22.png"), None);
        assert_eq!(guess_frame(""), None);
    }

    // ── is_scan_id ───────────────────────────────────────────────────

    #[test]
    fn scan_id_accepts_hyphenated_uuids() {
        assert!(is_scan_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_scan_id("550E8400-E29B-41D4-A716-446655440000"));
    }

    #[test]
    fn scan_id_rejects_everything_else() {
        assert!(!is_scan_id(""));
        assert!(!is_scan_id("not-a-uuid"));
        // Valid UUID but not canonical hyphenated form
        assert!(!is_scan_id("550e8400e29b41d4a716446655440000"));
    }

    // ── collect_scans ────────────────────────────────────────────────

    #[test]
    fn collect_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("123-22.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let run = RunConfig {
            file: Some(jpg.clone()),
            ..RunConfig::default()
        };
        let scans = collect_scans(&run, dir.path()).unwrap();
        assert_eq!(scans, vec![jpg]);
    }

    #[test]
    fn collect_missing_file_is_fatal() {
        let run = RunConfig {
            file: Some(PathBuf::from("missing.jpg")),
            ..RunConfig::default()
        };
        let err = collect_scans(&run, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("missing.jpg"));
    }

    #[test]
    fn collect_skips_subdirectories_by_default() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.jpg"), b"fake").unwrap();

        let scans = collect_scans(&RunConfig::default(), dir.path()).unwrap();
        assert_eq!(scans.len(), 1);
        assert!(scans[0].ends_with("a.jpg"));
    }

    #[test]
    fn collect_recursive_descends() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.JPEG"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let run = RunConfig {
            recursive: true,
            ..RunConfig::default()
        };
        let scans = collect_scans(&run, dir.path()).unwrap();
        assert_eq!(scans.len(), 2);
    }

    #[test]
    fn collect_filters_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("scan.jpg"), b"fake").unwrap();
        fs::write(dir.path().join("scan.png"), b"fake").unwrap();
        fs::write(dir.path().join("notes.txt"), b"fake").unwrap();
        fs::write(dir.path().join("noext"), b"fake").unwrap();

        let scans = collect_scans(&RunConfig::default(), dir.path()).unwrap();
        assert_eq!(scans.len(), 1);
    }

    #[test]
    fn collect_is_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2-2.jpg"), b"fake").unwrap();
        fs::write(dir.path().join("1-1.jpg"), b"fake").unwrap();

        let scans = collect_scans(&RunConfig::default(), dir.path()).unwrap();
        assert!(scans[0].ends_with("1-1.jpg"));
        assert!(scans[1].ends_with("2-2.jpg"));
    }

    // ── select_negative (matching policy) ────────────────────────────

    #[test]
    fn zero_candidates_is_unmatched_without_prompting() {
        let mut prompter = Scripted::default();
        let run = RunConfig::default();
        let selected =
            select_negative(Path::new("123-22.jpg"), &[], &run, &mut prompter).unwrap();
        assert!(selected.is_none());
        assert_eq!(prompter.prompts, 0);
    }

    #[test]
    fn auto_selects_single_candidate_without_prompting() {
        let mut prompter = Scripted::default();
        let run = RunConfig {
            auto: true,
            ..RunConfig::default()
        };
        let selected =
            select_negative(Path::new("123-22.jpg"), &[negative("123.22")], &run, &mut prompter)
                .unwrap();
        assert_eq!(selected.unwrap().slug, "123.22");
        assert_eq!(prompter.prompts, 0);
    }

    #[test]
    fn yes_accepts_single_candidate_without_prompting() {
        let mut prompter = Scripted::default();
        let run = RunConfig {
            assume_yes: true,
            ..RunConfig::default()
        };
        let selected =
            select_negative(Path::new("123-22.jpg"), &[negative("123.22")], &run, &mut prompter)
                .unwrap();
        assert!(selected.is_some());
        assert_eq!(prompter.prompts, 0);
    }

    #[test]
    fn single_candidate_is_confirmed_interactively() {
        let mut prompter = Scripted {
            confirms: vec![true],
            ..Scripted::default()
        };
        let run = RunConfig::default();
        let selected =
            select_negative(Path::new("123-22.jpg"), &[negative("123.22")], &run, &mut prompter)
                .unwrap();
        assert!(selected.is_some());
        assert_eq!(prompter.prompts, 1);
    }

    #[test]
    fn declined_single_candidate_is_unmatched() {
        let mut prompter = Scripted {
            confirms: vec![false],
            ..Scripted::default()
        };
        let run = RunConfig::default();
        let selected =
            select_negative(Path::new("123-22.jpg"), &[negative("123.22")], &run, &mut prompter)
                .unwrap();
        assert!(selected.is_none());
    }

    #[test]
    fn ambiguous_candidates_are_skipped_under_auto() {
        let mut prompter = Scripted::default();
        let run = RunConfig {
            auto: true,
            ..RunConfig::default()
        };
        let candidates = [negative("123.22"), negative("123.22a")];
        let selected =
            select_negative(Path::new("123-22.jpg"), &candidates, &run, &mut prompter).unwrap();
        assert!(selected.is_none());
        assert_eq!(prompter.prompts, 0);
    }

    #[test]
    fn ambiguous_candidates_still_prompt_under_yes() {
        // --yes skips write confirmation, not match disambiguation
        let mut prompter = Scripted {
            choices: vec![Some(1)],
            ..Scripted::default()
        };
        let run = RunConfig {
            assume_yes: true,
            ..RunConfig::default()
        };
        let candidates = [negative("123.22"), negative("123.22a")];
        let selected =
            select_negative(Path::new("123-22.jpg"), &candidates, &run, &mut prompter).unwrap();
        assert_eq!(selected.unwrap().slug, "123.22a");
        assert_eq!(prompter.prompts, 1);
    }

    #[test]
    fn choosing_nothing_skips_the_file() {
        let mut prompter = Scripted {
            choices: vec![None],
            ..Scripted::default()
        };
        let run = RunConfig::default();
        let candidates = [negative("123.22"), negative("123.22a")];
        let selected =
            select_negative(Path::new("123-22.jpg"), &candidates, &run, &mut prompter).unwrap();
        assert!(selected.is_none());
    }

    // ── process_scan ─────────────────────────────────────────────────

    const EMPTY_PAGE: &str = r#"{"count":0,"results":[]}"#;
    const ONE_NEGATIVE_PAGE: &str =
        r#"{"count":1,"results":[{"slug":"123.22","film":"123","frame":"22"}]}"#;
    const SCAN_PAGE: &str = r#"{"count":1,"results":[{
        "uuid":"550e8400-e29b-41d4-a716-446655440000",
        "negative":{"slug":"123.22","camera_make":"Nikon","camera_model":"FM2"}}]}"#;

    /// Minimal canned HTTP responder standing in for the catalogue.
    async fn spawn_api_stub(negatives: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let body = if request.starts_with("GET /negative/") {
                        negatives
                    } else if request.starts_with("POST /scan/") {
                        r#"{"uuid":"550e8400-e29b-41d4-a716-446655440000"}"#
                    } else {
                        SCAN_PAGE
                    };
                    let resp = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(resp.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn dry_run_previews_without_touching_the_file() {
        let server = spawn_api_stub(ONE_NEGATIVE_PAGE).await;
        let api = ApiClient::new(&server, "user", "pass").unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("123-22.jpg");
        fs::write(&path, b"fake scan bytes").unwrap();

        let run = RunConfig {
            auto: true,
            dry_run: true,
            ..RunConfig::default()
        };
        let mut prompter = Scripted::default();
        let report = process_scan(&path, &api, &run, &mut prompter).await;

        assert_eq!(report.outcome, Outcome::Preview);
        assert!(!report.changes.is_empty());
        assert_eq!(prompter.prompts, 0);
        assert_eq!(fs::read(&path).unwrap(), b"fake scan bytes");
    }

    #[tokio::test]
    async fn zero_candidates_never_reach_the_writer() {
        let server = spawn_api_stub(EMPTY_PAGE).await;
        let api = ApiClient::new(&server, "user", "pass").unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("123-22.jpg");
        fs::write(&path, b"fake scan bytes").unwrap();

        let run = RunConfig {
            assume_yes: true,
            ..RunConfig::default()
        };
        let mut prompter = Scripted::default();
        let report = process_scan(&path, &api, &run, &mut prompter).await;

        assert_eq!(report.outcome, Outcome::Unmatched);
        assert!(report.scan_id.is_none());
        assert!(!report.created_scan);
        assert_eq!(fs::read(&path).unwrap(), b"fake scan bytes");
    }

    #[tokio::test]
    async fn declined_review_leaves_the_file_untouched() {
        let server = spawn_api_stub(ONE_NEGATIVE_PAGE).await;
        let api = ApiClient::new(&server, "user", "pass").unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("123-22.jpg");
        fs::write(&path, b"fake scan bytes").unwrap();

        // Popped in reverse: first confirms the match, then declines the
        // write review.
        let mut prompter = Scripted {
            confirms: vec![false, true],
            ..Scripted::default()
        };
        let run = RunConfig::default();
        let report = process_scan(&path, &api, &run, &mut prompter).await;

        assert_eq!(report.outcome, Outcome::Declined);
        assert!(report.created_scan);
        assert_eq!(prompter.prompts, 2);
        assert_eq!(fs::read(&path).unwrap(), b"fake scan bytes");
    }

    // ── prompt_frame ─────────────────────────────────────────────────

    #[test]
    fn prompt_frame_collects_film_then_frame() {
        let mut prompter = Scripted {
            // popped in reverse order
            answers: vec!["22".to_string(), "123".to_string()],
            ..Scripted::default()
        };
        let (film, frame) = prompt_frame("scan.jpg", &mut prompter).unwrap();
        assert_eq!(film, "123");
        assert_eq!(frame, "22");
    }

    #[test]
    fn prompt_frame_rejects_empty_film() {
        let mut prompter = Scripted {
            answers: vec!["  ".to_string()],
            ..Scripted::default()
        };
        assert!(prompt_frame("scan.jpg", &mut prompter).is_err());
    }

    #[test]
    fn auto_prompter_cannot_answer_free_form() {
        let mut prompter = AutoPrompter;
        assert!(prompter.ask("film ID?").is_err());
        assert!(prompter.confirm("ok?").unwrap());
        assert_eq!(prompter.choose("which?", &[]).unwrap(), None);
    }
}
