//! The style-correction engine seam.
//!
//! The engine itself is external. [`LineFixer`] is the capability the
//! pipeline needs from it: given the full working-tree text and one line
//! range, return the full text with fixes applied only inside that range.
//! Returning the whole file (rather than just the replacement lines) is how
//! real engines with a `--line-range` flag behave, and it lets the merge
//! layer verify after the fact that nothing outside the range was touched.

use error_set::error_set;
use std::process::{Command, Stdio};

use crate::range::LineRange;

error_set! {
    /// Errors from invoking the formatting engine
    FixError := {
        #[display("Failed to spawn {program}: {message}")]
        SpawnFailed { program: String, message: String },
        #[display("Failed to get stdin handle for {program}")]
        StdinUnavailable { program: String },
        #[display("Failed to write source to {program}: {message}")]
        WriteFailed { program: String, message: String },
        #[display("Failed to wait for {program}: {message}")]
        WaitFailed { program: String, message: String },
        /// The engine rejected the input, e.g. the file does not parse
        #[display("{program} failed on lines {range}: {stderr}")]
        EngineFailed { program: String, range: LineRange, stderr: String },
        #[display("Invalid UTF-8 in {program} output: {message}")]
        InvalidUtf8 { program: String, message: String },
    }
}

/// A style-correction engine able to fix a single line range.
///
/// Implementations must be deterministic and idempotent (fixing already-fixed
/// lines is a no-op); the pipeline's convergence guarantee rests on that.
pub trait LineFixer {
    /// Return the full corrected text for `source`, with style fixes applied
    /// only to the lines in `range`.
    fn fix_range(&self, source: &str, range: LineRange) -> Result<String, FixError>;
}

/// A [`LineFixer`] that shells out to an external formatter.
///
/// The program is invoked as `<program> <args> --line-range START END -`,
/// receives the source on stdin and must print the corrected file to stdout
/// (the calling convention of autopep8 and compatible fixers). A nonzero exit
/// is treated as a file-level failure.
#[derive(Debug, Clone)]
pub struct CommandFixer {
    program: String,
    args: Vec<String>,
}

impl CommandFixer {
    /// Create a fixer running the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add extra arguments passed before the line range.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl LineFixer for CommandFixer {
    fn fix_range(&self, source: &str, range: LineRange) -> Result<String, FixError> {
        use std::io::Write;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--line-range")
            .arg(range.start.to_string())
            .arg(range.end.to_string())
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FixError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        child
            .stdin
            .take()
            .ok_or_else(|| FixError::StdinUnavailable {
                program: self.program.clone(),
            })?
            .write_all(source.as_bytes())
            .map_err(|e| FixError::WriteFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let output = child.wait_with_output().map_err(|e| FixError::WaitFailed {
            program: self.program.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FixError::EngineFailed {
                program: self.program.clone(),
                range,
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| FixError::InvalidUtf8 {
            program: self.program.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    // `sh -c 'cat' fixer ...` ignores the trailing --line-range arguments and
    // copies stdin to stdout, standing in for an identity engine.
    fn identity_fixer() -> CommandFixer {
        CommandFixer::new("sh").with_args(["-c", "cat", "fixer"])
    }

    #[test]
    fn identity_engine_returns_source_unchanged() {
        let source = "a = 1\nb = 2\n";
        let fixed = identity_fixer()
            .fix_range(source, LineRange::new(1, 2))
            .unwrap();
        assert_eq!(fixed, source);
    }

    #[test]
    fn nonzero_exit_is_an_engine_failure() {
        let fixer = CommandFixer::new("sh").with_args(["-c", "exit 3", "fixer"]);
        let result = fixer.fix_range("x=1\n", LineRange::new(1, 1));
        assert!(matches!(result, Err(FixError::EngineFailed { .. })));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let fixer = CommandFixer::new("patchfmt-no-such-engine");
        let result = fixer.fix_range("x=1\n", LineRange::new(1, 1));
        assert!(matches!(result, Err(FixError::SpawnFailed { .. })));
    }
}
