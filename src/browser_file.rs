//! Browser `File` handles as pipeline input.

use moodlens_core::SelectedFile;
use web_sys::{File, FileList};

/// A `File` from a drop or the file picker.
#[derive(Debug, Clone)]
pub struct BrowserFile(pub File);

impl BrowserFile {
    /// Collect a `FileList` into an ordered vector.
    pub fn from_list(files: &FileList) -> Vec<Self> {
        (0..files.length())
            .filter_map(|i| files.get(i))
            .map(BrowserFile)
            .collect()
    }

    pub fn as_file(&self) -> &File {
        &self.0
    }
}

impl SelectedFile for BrowserFile {
    fn name(&self) -> String {
        self.0.name()
    }

    fn mime_type(&self) -> String {
        self.0.type_()
    }

    fn size(&self) -> u64 {
        self.0.size() as u64
    }
}
