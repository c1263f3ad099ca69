//! Backend that shells out to the `git` executable.
//!
//! Notes are written with plumbing rather than `git notes add` so the write
//! can be a compare-and-swap: the new notes commit is only installed with
//! `git update-ref <ref> <new> <old>`, which fails if another writer moved
//! the ref in the meantime.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::{Backend, NoteBlob, NoteEntry, WriteOutcome};
use crate::error::{Error, Result};

/// A git work tree driven through the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

/// One line of `git ls-tree` output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TreeEntry {
    mode: String,
    kind: String,
    oid: String,
    path: String,
}

impl TreeEntry {
    fn parse(line: &str) -> Option<Self> {
        let (meta, path) = line.split_once('\t')?;
        let mut parts = meta.split_whitespace();
        Some(Self {
            mode: parts.next()?.to_string(),
            kind: parts.next()?.to_string(),
            oid: parts.next()?.to_string(),
            path: path.to_string(),
        })
    }

    fn to_mktree_line(&self) -> String {
        format!("{} {} {}\t{}\n", self.mode, self.kind, self.oid, self.path)
    }
}

impl GitCli {
    /// Open the repository containing `workdir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `workdir` is not inside a git repository.
    pub fn open(workdir: impl Into<PathBuf>) -> Result<Self> {
        let backend = Self {
            workdir: workdir.into(),
        };
        let output = backend.run(&["rev-parse", "--git-dir"], None)?;
        if !output.status.success() {
            return Err(Error::Config(format!(
                "{} is not a git repository",
                backend.workdir.display()
            )));
        }
        Ok(backend)
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str], input: Option<&str>) -> Result<Output> {
        debug!(args = ?args, "git");
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let Some(input) = input else {
            command.stdin(Stdio::null());
            return Ok(command.output()?);
        };

        command.stdin(Stdio::piped());
        let mut child = command.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
        Ok(child.wait_with_output()?)
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    fn git(&self, args: &[&str]) -> Result<String> {
        self.git_with_input(args, None)
    }

    /// Stdout must be valid UTF-8; note content is never silently rewritten.
    fn git_with_input(&self, args: &[&str], input: Option<&str>) -> Result<String> {
        let output = self.run(args, input)?;
        let command = args.first().copied().unwrap_or("git");
        if !output.status.success() {
            return Err(Error::backend(command, String::from_utf8_lossy(&output.stderr)));
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::backend(command, format!("output is not valid UTF-8: {e}")))?;
        Ok(stdout.trim().to_string())
    }

    /// Run a query that signals "absent" with a non-zero exit.
    fn git_opt(&self, args: &[&str]) -> Result<Option<String>> {
        let output = self.run(args, None)?;
        if output.status.success() {
            let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok((!out.is_empty()).then_some(out))
        } else {
            Ok(None)
        }
    }

    fn ref_tip(&self, name: &str) -> Result<Option<String>> {
        self.git_opt(&["rev-parse", "--verify", "-q", &format!("{name}^{{commit}}")])
    }

    fn tree_entries(&self, tip: &str, recursive: bool) -> Result<Vec<TreeEntry>> {
        let listing = if recursive {
            self.git(&["ls-tree", "-r", tip])?
        } else {
            self.git(&["ls-tree", tip])?
        };
        Ok(listing.lines().filter_map(TreeEntry::parse).collect())
    }

    /// Blob of the note on `target`, searching fanned-out trees too.
    fn find_note(&self, tip: &str, target: &str) -> Result<Option<TreeEntry>> {
        Ok(self
            .tree_entries(tip, true)?
            .into_iter()
            .find(|entry| entry.path.replace('/', "") == target))
    }

    fn config_value(&self, key: &str) -> Result<Option<String>> {
        self.git_opt(&["config", "--get", key])
    }
}

impl Backend for GitCli {
    fn root_commits(&self) -> Result<Vec<String>> {
        if self.ref_tip("HEAD")?.is_none() {
            return Ok(Vec::new());
        }
        let roots = self.git(&["rev-list", "--max-parents=0", "HEAD"])?;
        Ok(roots.lines().map(str::to_string).collect())
    }

    fn resolve_commit(&self, rev: &str) -> Result<Option<String>> {
        self.ref_tip(rev)
    }

    fn read_note(&self, notes_ref: &str, target: &str) -> Result<Option<NoteBlob>> {
        let Some(tip) = self.ref_tip(notes_ref)? else {
            return Ok(None);
        };
        let Some(entry) = self.find_note(&tip, target)? else {
            return Ok(None);
        };
        let content = self.git(&["cat-file", "blob", &entry.oid])?;
        Ok(Some(NoteBlob {
            oid: entry.oid,
            content,
        }))
    }

    fn write_note(
        &self,
        notes_ref: &str,
        target: &str,
        content: &str,
        expected: Option<&str>,
    ) -> Result<WriteOutcome> {
        let old_tip = self.ref_tip(notes_ref)?;

        let current = match &old_tip {
            Some(tip) => self.find_note(tip, target)?,
            None => None,
        };
        if current.as_ref().map(|e| e.oid.as_str()) != expected {
            return Ok(WriteOutcome::Conflict {
                current: current.map(|e| e.oid),
            });
        }
        if current.as_ref().is_some_and(|e| e.path.contains('/')) {
            return Err(Error::backend(
                "notes",
                format!("{notes_ref} uses a fanned-out tree, which is not supported"),
            ));
        }

        let blob = self.git_with_input(&["hash-object", "-w", "--stdin"], Some(content))?;

        let mut listing = String::new();
        if let Some(tip) = &old_tip {
            for entry in self.tree_entries(tip, false)? {
                if entry.path != target {
                    listing.push_str(&entry.to_mktree_line());
                }
            }
        }
        listing.push_str(&format!("100644 blob {blob}\t{target}\n"));
        let tree = self.git_with_input(&["mktree"], Some(&listing))?;

        let message = format!("nt: update {notes_ref}");
        let mut commit_args = vec![
            "commit-tree",
            "--no-gpg-sign",
            tree.as_str(),
            "-m",
            message.as_str(),
        ];
        if let Some(tip) = &old_tip {
            commit_args.push("-p");
            commit_args.push(tip.as_str());
        }
        let commit = self.git(&commit_args)?;

        let old_value = old_tip.as_deref().unwrap_or("");
        let output = self.run(
            &["update-ref", "-m", &message, notes_ref, &commit, old_value],
            None,
        )?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("but expected") || stderr.contains("already exists") {
                debug!(notes_ref, "notes ref moved during write");
                return Ok(WriteOutcome::Conflict {
                    current: self.read_note(notes_ref, target)?.map(|n| n.oid),
                });
            }
            return Err(Error::backend("update-ref", stderr));
        }

        Ok(WriteOutcome::Written { oid: blob })
    }

    fn list_notes(&self, notes_ref: &str) -> Result<Vec<NoteEntry>> {
        if self.ref_tip(notes_ref)?.is_none() {
            return Ok(Vec::new());
        }
        let listing = self.git(&["notes", "--ref", notes_ref, "list"])?;
        Ok(listing
            .lines()
            .filter_map(|line| {
                let (blob, target) = line.split_once(' ')?;
                Some(NoteEntry {
                    blob: blob.to_string(),
                    target: target.to_string(),
                })
            })
            .collect())
    }

    fn identity(&self) -> Result<Option<String>> {
        let name = self.config_value("user.name")?;
        let email = self.config_value("user.email")?;
        Ok(match (name, email) {
            (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
            (Some(name), None) => Some(name),
            (None, Some(email)) => Some(format!("<{email}>")),
            (None, None) => None,
        })
    }

    fn push(&self, remote: &str, refspec: &str) -> Result<()> {
        self.git(&["push", remote, refspec]).map(|_| ())
    }

    fn fetch(&self, remote: &str, refspec: &str) -> Result<()> {
        self.git(&["fetch", remote, refspec]).map(|_| ())
    }
}
