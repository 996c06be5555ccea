//! Version control backends.
//!
//! Two interchangeable backends (git and mercurial) provide the same three
//! capabilities: a zero-context diff between the last commit and the working
//! tree, the committed baseline content, and tracked-file detection. The
//! repository root is always passed explicitly (`git -C`, `hg --cwd`) so the
//! core never depends on the process working directory.

use error_set::error_set;
use std::path::Path;
use std::process::Command;

error_set! {
    /// Errors from version control command execution
    VcsError := {
        #[display("No git or mercurial repository found at {path}")]
        NoRepository { path: String },
        #[display("Failed to run {program}: {message}")]
        CommandFailed { program: String, message: String },
        #[display("{program} exited with an error: {stderr}")]
        ExitError { program: String, stderr: String },
        #[display("Invalid UTF-8 in {program} output: {message}")]
        InvalidUtf8 { program: String, message: String },
    }
}

/// Supported version control backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vcs {
    Git,
    Hg,
}

impl Vcs {
    /// Detect the backend from the repository root directory.
    pub fn detect(root: &str) -> Result<Self, VcsError> {
        let root_path = Path::new(root);
        if root_path.join(".git").exists() {
            Ok(Self::Git)
        } else if root_path.join(".hg").exists() {
            Ok(Self::Hg)
        } else {
            Err(VcsError::NoRepository {
                path: root.to_string(),
            })
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
        }
    }
}

/// Version control operations against one repository.
///
/// File paths are relative to the repository root.
#[derive(Debug, Clone, Copy)]
pub struct Backend<'a> {
    vcs: Vcs,
    root: &'a str,
}

impl<'a> Backend<'a> {
    pub fn new(vcs: Vcs, root: &'a str) -> Self {
        Self { vcs, root }
    }

    /// Unified diff with zero context between the last commit and the
    /// working tree for a single file. Empty output means no changes.
    pub fn diff(&self, file: &str) -> Result<String, VcsError> {
        match self.vcs {
            Vcs::Git => self.run(&[
                "-C",
                self.root,
                "diff",
                "--no-ext-diff",
                "-U0",
                "--no-color",
                "HEAD",
                "--",
                file,
            ]),
            Vcs::Hg => self.run(&[
                "--cwd", self.root, "diff", "--nodates", "-U", "0", "--", file,
            ]),
        }
    }

    /// Content of the file as of the last commit.
    pub fn baseline(&self, file: &str) -> Result<String, VcsError> {
        match self.vcs {
            Vcs::Git => {
                let spec = format!("HEAD:{file}");
                self.run(&["-C", self.root, "show", &spec])
            }
            Vcs::Hg => self.run(&["--cwd", self.root, "cat", "-r", ".", "--", file]),
        }
    }

    /// Whether the backend knows about the file at all.
    pub fn is_tracked(&self, file: &str) -> Result<bool, VcsError> {
        let args: &[&str] = match self.vcs {
            Vcs::Git => &["-C", self.root, "ls-files", "--error-unmatch", "--", file],
            Vcs::Hg => &["--cwd", self.root, "files", "--", file],
        };

        let program = self.vcs.program();
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| VcsError::CommandFailed {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        // Both commands exit nonzero when the file is unknown.
        Ok(output.status.success())
    }

    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let program = self.vcs.program();
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| VcsError::CommandFailed {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::ExitError {
                program: program.to_string(),
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| VcsError::InvalidUtf8 {
            program: program.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detect_git_repository() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let root = dir.path().to_str().unwrap();
        assert_eq!(Vcs::detect(root).unwrap(), Vcs::Git);
    }

    #[test]
    fn detect_hg_repository() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".hg")).unwrap();
        let root = dir.path().to_str().unwrap();
        assert_eq!(Vcs::detect(root).unwrap(), Vcs::Hg);
    }

    #[test]
    fn detect_prefers_git_when_both_present() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join(".hg")).unwrap();
        let root = dir.path().to_str().unwrap();
        assert_eq!(Vcs::detect(root).unwrap(), Vcs::Git);
    }

    #[test]
    fn detect_fails_outside_a_repository() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        assert!(matches!(
            Vcs::detect(root),
            Err(VcsError::NoRepository { .. })
        ));
    }
}
