use anyhow::{Context, Result};
use git2::{DiffOptions, Repository, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Tracks which files and packages changed in the tree.
pub struct ChangeTracker {
    repo: Repository,
}

impl ChangeTracker {
    pub fn new(tree_root: &Path) -> Result<Self> {
        let repo =
            Repository::discover(tree_root).context("Failed to open git repository")?;
        Ok(Self { repo })
    }

    /// Paths changed in the work tree, repo-relative, deduplicated.
    ///
    /// Includes staged, unstaged, and untracked files. When `since` is given
    /// (any revspec: ref, tag, SHA), the diff base is that revision's tree,
    /// so commits made after it are included too.
    pub fn changed_paths(&self, since: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        match since {
            Some(rev) => self.paths_since(rev),
            None => self.work_tree_paths(),
        }
    }

    fn paths_since(&self, rev: &str) -> Result<BTreeSet<PathBuf>> {
        let object = self
            .repo
            .revparse_single(rev)
            .with_context(|| format!("Failed to resolve revision '{rev}'"))?;
        let tree = object
            .peel_to_tree()
            .with_context(|| format!("Revision '{rev}' does not point to a tree"))?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?;

        let mut paths = BTreeSet::new();
        diff.foreach(
            &mut |delta, _progress| {
                for file in [delta.new_file(), delta.old_file()] {
                    if let Some(path) = file.path() {
                        paths.insert(path.to_path_buf());
                    }
                }
                true
            },
            None,
            None,
            None,
        )?;

        Ok(paths)
    }

    fn work_tree_paths(&self) -> Result<BTreeSet<PathBuf>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut paths = BTreeSet::new();
        for entry in statuses.iter() {
            if let Some(path) = entry.path() {
                paths.insert(PathBuf::from(path));
            }
        }
        Ok(paths)
    }
}

/// Map changed paths to the package names they touch.
///
/// A path under `<package_root>/<name>/...` maps to `name`; everything else
/// is ignored, including the package root itself.
pub fn changed_packages<'a, I>(paths: I, package_root: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut packages = BTreeSet::new();
    for path in paths {
        let Ok(rest) = path.strip_prefix(package_root) else {
            continue;
        };
        if let Some(first) = rest.components().next() {
            packages.insert(first.as_os_str().to_string_lossy().into_owned());
        }
    }
    packages
}
