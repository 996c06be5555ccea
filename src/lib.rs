//! Reformat only the lines of a file that changed since the last commit.
//!
//! The pipeline per file: ask the version control backend for a zero-context
//! diff against the last commit, turn its hunk headers into coalesced line
//! ranges, run the external style engine once per range, verify the engine
//! stayed inside each range, splice the corrected fragments back between the
//! untouched lines and write the result atomically. Running the pipeline a
//! second time with no intervening commits produces no further change.

use error_set::error_set;
use std::fs;
use std::io::Write;
use std::path::Path;

mod diff;
pub mod fixer;
mod merge;
mod range;
pub mod vcs;

pub use diff::DiffParseError;
pub use fixer::{FixError, LineFixer};
pub use merge::MergeError;
pub use range::LineRange;
pub use vcs::{Vcs, VcsError};

use vcs::Backend;

error_set! {
    /// Top-level error for patchfmt operations
    PatchfmtError := {
        #[display("I/O error on {path}: {message}")]
        Io { path: String, message: String },
        DiffParse(DiffParseError),
        Fix(FixError),
        Merge(MergeError),
        Vcs(VcsError),
    }
}

/// What to do with a file the backend does not track.
///
/// There is no diff to restrict formatting to for such files, so the choice
/// between leaving them alone and fixing them in full has to be explicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UntrackedPolicy {
    /// Leave untracked files alone (the default)
    #[default]
    Skip,
    /// Treat the whole file as changed and fix every line
    WholeFile,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Report files that would change without rewriting them
    pub check: bool,
    pub untracked: UntrackedPolicy,
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do: empty diff, or the fixes were already applied
    Unchanged,
    /// The file was rewritten
    Reformatted { ranges: Vec<LineRange> },
    /// Check mode: the file needs reformatting but was left alone
    WouldReformat { ranges: Vec<LineRange> },
    /// The file is untracked and the policy says to skip it
    SkippedUntracked,
}

/// Main interface for patchfmt operations.
///
/// # Examples
/// ```no_run
/// # use patchfmt::{Patchfmt, Vcs, fixer::CommandFixer};
/// let tool = Patchfmt::new(".", Vcs::Git, CommandFixer::new("autopep8"));
/// let outcome = tool.format_file("module.py").unwrap();
/// ```
pub struct Patchfmt<'a, F> {
    root: &'a str,
    backend: Backend<'a>,
    fixer: F,
    options: Options,
}

impl<'a, F: LineFixer> Patchfmt<'a, F> {
    /// Create a tool for the repository at `root` with a chosen backend and
    /// style engine.
    pub fn new(root: &'a str, vcs: Vcs, fixer: F) -> Self {
        Self {
            root,
            backend: Backend::new(vcs, root),
            fixer,
            options: Options::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// The version control operations this tool runs against its repository.
    pub fn backend(&self) -> Backend<'a> {
        self.backend
    }

    /// Reformat the changed lines of one file, `file` relative to the
    /// repository root.
    ///
    /// All-or-nothing per file: any failure (diff parse, engine, merge
    /// invariant) leaves the file untouched on disk. The write is skipped
    /// entirely when the merged result equals the current content.
    pub fn format_file(&self, file: &str) -> Result<Outcome, PatchfmtError> {
        let path = Path::new(self.root).join(file);
        let source = fs::read_to_string(&path).map_err(|e| PatchfmtError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let ranges = if self.backend.is_tracked(file)? {
            diff::modified_ranges(&self.backend.diff(file)?)?
        } else {
            match self.options.untracked {
                UntrackedPolicy::Skip => {
                    log::debug!("{file}: untracked, skipping");
                    return Ok(Outcome::SkippedUntracked);
                }
                UntrackedPolicy::WholeFile => whole_file_range(&source),
            }
        };

        if ranges.is_empty() {
            log::debug!("{file}: no changed lines");
            return Ok(Outcome::Unchanged);
        }
        log::debug!("{file}: {} changed range(s)", ranges.len());

        let mut pieces = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let fixed = self.fixer.fix_range(&source, *range)?;
            let fragment = merge::extract_fragment(&source, &fixed, *range)?;
            pieces.push((*range, fragment));
        }
        let merged = merge::merge(&source, &pieces)?;

        if merged == source {
            log::debug!("{file}: already clean");
            return Ok(Outcome::Unchanged);
        }
        if self.options.check {
            return Ok(Outcome::WouldReformat { ranges });
        }

        write_atomic(&path, &merged).map_err(|e| PatchfmtError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::info!("{file}: reformatted {} range(s)", ranges.len());
        Ok(Outcome::Reformatted { ranges })
    }
}

/// A single range covering every line of the file; empty for an empty file.
fn whole_file_range(source: &str) -> Vec<LineRange> {
    let count = source.split_inclusive('\n').count() as u32;
    if count == 0 {
        Vec::new()
    } else {
        vec![LineRange::new(1, count)]
    }
}

/// Write through a temporary file in the same directory plus rename, so a
/// failure mid-write cannot leave a half-written file behind.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    // Temp files get restrictive default permissions; carry the target's
    // mode over so the rename does not strip bits like the executable flag.
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
