use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

/// Paths reported by a name-only diff, relative to the working tree root.
///
/// Always sorted ascending with no empty or duplicate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFiles(Vec<String>);

impl ChangedFiles {
    pub fn from_diff_output(raw: &str) -> Self {
        Self::from_entries(raw.lines().map(|line| line.trim_end_matches('\r')))
    }

    /// Parses `git diff --name-only -z`, where names are verbatim and
    /// terminated by NUL instead of quoted and newline separated.
    pub fn from_nul_separated(raw: &str) -> Self {
        Self::from_entries(raw.split('\0'))
    }

    fn from_entries<'a>(entries: impl Iterator<Item = &'a str>) -> Self {
        let mut files: Vec<String> = entries
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();

        files.sort();
        files.dedup();

        Self(files)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn transfer_pairs(&self, local_origin: &Path, remote_origin: &Path) -> Vec<TransferPair> {
        self.iter()
            .map(|path_name| TransferPair::new(local_origin, remote_origin, Path::new(path_name)))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangedFiles {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let entries: Vec<String> = iter.into_iter().map(Into::into).collect();
        Self::from_entries(entries.iter().map(String::as_str))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPair {
    pub path_name: PathBuf,
    pub local_source: PathBuf,
    pub remote_dest: PathBuf,
}

impl TransferPair {
    pub fn new(local_origin: &Path, remote_origin: &Path, path_name: &Path) -> Self {
        Self {
            path_name: path_name.to_path_buf(),
            local_source: local_origin.join(path_name),
            remote_dest: remote_origin.join(path_name),
        }
    }
}

impl Display for TransferPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.path_name.display(),
            self.local_source.display(),
            self.remote_dest.display()
        )
    }
}
