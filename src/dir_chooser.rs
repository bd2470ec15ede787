use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

/// One row of the chooser listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooserEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Model behind the "Select Download Folder" popup.
///
/// Browsing starts at the current save path. Confirming without a chosen
/// row does nothing; a chosen file resolves to its parent directory.
pub struct DirChooser {
    location: PathBuf,
    entries: Vec<ChooserEntry>,
    selection: Option<PathBuf>,
}

impl DirChooser {
    pub fn open(root: &Path) -> Self {
        let location = if root.is_dir() {
            root.to_path_buf()
        } else {
            root.parent().filter(|p| p.is_dir()).map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
        };
        let mut chooser = Self { location, entries: Vec::new(), selection: None };
        chooser.refresh();
        chooser
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn entries(&self) -> &[ChooserEntry] {
        &self.entries
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    pub fn select(&mut self, path: PathBuf) {
        self.selection = Some(path);
    }

    /// Descends into a directory row
    pub fn enter(&mut self, path: &Path) {
        if path.is_dir() {
            self.location = path.to_path_buf();
            self.selection = None;
            self.refresh();
        }
    }

    pub fn up(&mut self) {
        if let Some(parent) = self.location.parent().map(Path::to_path_buf) {
            self.location = parent;
            self.selection = None;
            self.refresh();
        }
    }

    /// Directory the user confirmed, or `None` while nothing is selected
    pub fn confirm(&self) -> Option<PathBuf> {
        let chosen = self.selection.as_ref()?;
        if chosen.is_file() {
            chosen.parent().map(Path::to_path_buf)
        } else {
            Some(chosen.clone())
        }
    }

    fn refresh(&mut self) {
        self.entries = match fs::read_dir(&self.location) {
            Ok(read) => read
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.starts_with('.') {
                        return None;
                    }
                    let path = entry.path();
                    Some(ChooserEntry { is_dir: path.is_dir(), name, path })
                })
                .collect(),
            Err(err) => {
                warn!(path = %self.location.display(), error = %err, "cannot list directory");
                Vec::new()
            }
        };
        self.entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    }
}
