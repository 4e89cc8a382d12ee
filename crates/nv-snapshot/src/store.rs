//! The per-organization history store.
//!
//! Writes (init, stage, commit) go through the `git` binary; reads (ref
//! resolution, history walk, tree flattening, blob reads) use `gix`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use nv_core::Revision;

use crate::error::SnapshotError;

/// Committer identity recorded in each repository's local config.
#[derive(Debug, Clone)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Initialize (if needed) the repository at `root`, then (re)apply the
    /// local identity and description. Safe to call before every scan.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Git`] if a git command fails and
    /// [`SnapshotError::Io`] if the directory cannot be created.
    pub fn ensure_repository(
        root: &Path,
        identity: &GitIdentity,
        description: &str,
    ) -> Result<Self, SnapshotError> {
        std::fs::create_dir_all(root).map_err(SnapshotError::io(root))?;
        let store = Self {
            root: root.to_path_buf(),
        };
        if !root.join(".git").exists() {
            store.git(&["init", "--quiet"])?;
            tracing::info!(root = %root.display(), "initialized snapshot repository");
        }
        store.git(&["config", "user.name", &identity.name])?;
        store.git(&["config", "user.email", &identity.email])?;
        store.git(&["config", "commit.gpgsign", "false"])?;
        store.git(&["config", "core.autocrlf", "false"])?;
        let desc_path = root.join(".git").join("description");
        std::fs::write(&desc_path, format!("{description}\n"))
            .map_err(SnapshotError::io(&desc_path))?;
        Ok(store)
    }

    /// Open an existing repository for reading.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotARepository`] if `root` holds no repository.
    pub fn open(root: &Path) -> Result<Self, SnapshotError> {
        if !root.join(".git").is_dir() {
            return Err(SnapshotError::NotARepository(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Stage everything under the root and commit it.
    ///
    /// Creates a revision iff the staged tree differs from HEAD or HEAD is
    /// unborn. Returns `None` when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Git`] if staging or committing fails.
    pub fn commit(&self, message: &str) -> Result<Option<Revision>, SnapshotError> {
        self.git(&["add", "--all"])?;

        let first = self.head_id()?.is_none();
        if !first && !self.staged_changes()? {
            tracing::debug!(root = %self.root.display(), "nothing changed, no revision");
            return Ok(None);
        }

        let mut args = vec!["commit", "--quiet", "--no-verify", "-m", message];
        if first {
            args.push("--allow-empty");
        }
        self.git(&args)?;

        let revision = self.resolve("HEAD")?;
        tracing::info!(revision = %revision.short_id(), "committed snapshot");
        Ok(Some(revision))
    }

    fn staged_changes(&self) -> Result<bool, SnapshotError> {
        let status = self
            .command(&["diff", "--cached", "--quiet"])
            .status()
            .map_err(|e| SnapshotError::Git(format!("run git diff: {e}")))?;
        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(SnapshotError::Git(format!("git diff --cached exited with {status}"))),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn git(&self, args: &[&str]) -> Result<String, SnapshotError> {
        let output = self
            .command(args)
            .output()
            .map_err(|e| SnapshotError::Git(format!("run git {}: {e}", args[0])))?;
        if !output.status.success() {
            return Err(SnapshotError::Git(format!(
                "git {} failed: {}",
                args[0],
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    // ── Reads ──────────────────────────────────────────────────────

    fn repo(&self) -> Result<gix::Repository, SnapshotError> {
        gix::open(&self.root).map_err(|_| SnapshotError::NotARepository(self.root.clone()))
    }

    fn head_id(&self) -> Result<Option<gix::ObjectId>, SnapshotError> {
        let repo = self.repo()?;
        let head = repo
            .head()
            .map_err(|e| SnapshotError::Git(format!("read HEAD: {e}")))?;
        Ok(head.id().map(gix::Id::detach))
    }

    /// Resolve `HEAD`, `HEAD~N`, `HEAD^…`, or a full or abbreviated
    /// (at least four hex digits, unambiguous) revision id, optionally
    /// followed by `~N`/`^` suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnknownRevision`] if the reference does not
    /// name a revision in this history.
    pub fn resolve(&self, reference: &str) -> Result<Revision, SnapshotError> {
        let (base, steps) = parse_reference(reference)?;
        let repo = self.repo()?;
        let head = self
            .head_id()?
            .ok_or_else(|| SnapshotError::unknown(reference, "the history is empty"))?;

        let mut id = match base {
            Base::Head => head,
            Base::Prefix(prefix) => find_by_prefix(&repo, head, reference, &prefix)?,
        };
        for _ in 0..steps {
            let commit = repo
                .find_commit(id)
                .map_err(|e| SnapshotError::Git(format!("find commit {id}: {e}")))?;
            id = commit
                .parent_ids()
                .next()
                .map(gix::Id::detach)
                .ok_or_else(|| SnapshotError::unknown(reference, "walks past the first revision"))?;
        }
        revision_of(&repo, id)
    }

    /// Revisions newest first, following first parents from HEAD.
    ///
    /// The walk is lazy and each call starts over from HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened; individual items
    /// carry errors from reading commits.
    pub fn revisions(&self) -> Result<Revisions, SnapshotError> {
        Ok(Revisions {
            next: self.head_id()?,
            repo: self.repo()?,
        })
    }

    /// The flattened `path → blob id` map of a revision's tree.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Git`] if the commit or its trees cannot be read.
    pub fn tree_files(&self, revision: &Revision) -> Result<BTreeMap<String, String>, SnapshotError> {
        let repo = self.repo()?;
        let id = parse_id(&revision.id)?;
        let tree = repo
            .find_commit(id)
            .map_err(|e| SnapshotError::Git(format!("find commit {id}: {e}")))?
            .tree()
            .map_err(|e| SnapshotError::Git(format!("load tree of {id}: {e}")))?;

        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(|e| SnapshotError::Git(format!("walk tree of {id}: {e}")))?;

        Ok(recorder
            .records
            .into_iter()
            .filter(|entry| !entry.mode.is_tree() && !entry.mode.is_commit())
            .map(|entry| (entry.filepath.to_string(), entry.oid.to_string()))
            .collect())
    }

    /// Raw content of a blob.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Git`] if the object is missing.
    pub fn read_blob(&self, blob_id: &str) -> Result<Vec<u8>, SnapshotError> {
        let repo = self.repo()?;
        let id = parse_id(blob_id)?;
        let object = repo
            .find_object(id)
            .map_err(|e| SnapshotError::Git(format!("find blob {id}: {e}")))?;
        Ok(object.detach().data)
    }
}

/// Lazy first-parent history walk.
pub struct Revisions {
    repo: gix::Repository,
    next: Option<gix::ObjectId>,
}

impl Iterator for Revisions {
    type Item = Result<Revision, SnapshotError>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        let revision = revision_of(&self.repo, id);
        if let Ok(rev) = &revision {
            self.next = rev.parent.as_deref().and_then(|p| parse_id(p).ok());
        }
        Some(revision)
    }
}

// ── Reference parsing ──────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Base {
    Head,
    Prefix(String),
}

/// Split a reference into its base and the number of first-parent steps.
fn parse_reference(reference: &str) -> Result<(Base, usize), SnapshotError> {
    let trimmed = reference.trim();
    let split = trimmed.find(['~', '^']).unwrap_or(trimmed.len());
    let (base, mut suffix) = trimmed.split_at(split);

    let base = if base.eq_ignore_ascii_case("HEAD") {
        Base::Head
    } else if (4..=40).contains(&base.len()) && base.chars().all(|c| c.is_ascii_hexdigit()) {
        Base::Prefix(base.to_ascii_lowercase())
    } else {
        return Err(SnapshotError::unknown(
            reference,
            "expected HEAD or a revision id of at least 4 hex digits",
        ));
    };

    let mut steps = 0usize;
    while let Some(op) = suffix.chars().next() {
        suffix = &suffix[op.len_utf8()..];
        let digits_end = suffix
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(suffix.len());
        let (digits, rest) = suffix.split_at(digits_end);
        suffix = rest;
        let n = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<usize>()
                .map_err(|_| SnapshotError::unknown(reference, "step count is too large"))?
        };
        match op {
            '~' => steps += n,
            // Only first parents exist in a linear history.
            '^' if n <= 1 => steps += n,
            '^' => return Err(SnapshotError::unknown(reference, "only the first parent exists")),
            _ => return Err(SnapshotError::unknown(reference, "unexpected character")),
        }
    }
    Ok((base, steps))
}

fn find_by_prefix(
    repo: &gix::Repository,
    head: gix::ObjectId,
    reference: &str,
    prefix: &str,
) -> Result<gix::ObjectId, SnapshotError> {
    let walk = repo
        .rev_walk([head])
        .all()
        .map_err(|e| SnapshotError::Git(format!("walk history: {e}")))?;
    let mut found = None;
    for info in walk {
        let info = info.map_err(|e| SnapshotError::Git(format!("walk history: {e}")))?;
        if info.id.to_string().starts_with(prefix) {
            if found.is_some() {
                return Err(SnapshotError::unknown(reference, "the prefix is ambiguous"));
            }
            found = Some(info.id);
        }
    }
    found.ok_or_else(|| SnapshotError::unknown(reference, "no such revision"))
}

fn revision_of(repo: &gix::Repository, id: gix::ObjectId) -> Result<Revision, SnapshotError> {
    let commit = repo
        .find_commit(id)
        .map_err(|e| SnapshotError::Git(format!("find commit {id}: {e}")))?;
    let time = commit
        .time()
        .map_err(|e| SnapshotError::Git(format!("read time of {id}: {e}")))?;
    let timestamp = DateTime::<Utc>::from_timestamp(time.seconds, 0).unwrap_or_default();
    let message = commit.message_raw_sloppy().to_string().trim_end().to_string();
    let parent = commit.parent_ids().next().map(|p| p.detach().to_string());
    Ok(Revision {
        id: id.to_string(),
        timestamp,
        message,
        parent,
    })
}

fn parse_id(hex: &str) -> Result<gix::ObjectId, SnapshotError> {
    gix::ObjectId::from_hex(hex.as_bytes())
        .map_err(|e| SnapshotError::Git(format!("invalid object id '{hex}': {e}")))
}
