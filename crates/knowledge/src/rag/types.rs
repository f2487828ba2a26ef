//! Naming rules shared by the answer composer and citation resolver.

use docintel_core::config::StorageSettings;

/// Maps index source names ("annual-report.json") to stored document files
/// ("annual-report.pdf") and display names ("annual report").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNaming {
    pub index_suffix: String,
    pub document_suffix: String,
}

impl Default for SourceNaming {
    fn default() -> Self {
        Self {
            index_suffix: ".json".to_string(),
            document_suffix: ".pdf".to_string(),
        }
    }
}

impl From<&StorageSettings> for SourceNaming {
    fn from(storage: &StorageSettings) -> Self {
        Self {
            index_suffix: storage.index_suffix.clone(),
            document_suffix: storage.document_suffix.clone(),
        }
    }
}

impl SourceNaming {
    fn stem<'a>(&self, source: &'a str) -> &'a str {
        source.strip_suffix(self.index_suffix.as_str()).unwrap_or(source)
    }

    /// Stored document file for an index source.
    pub fn document_file(&self, source: &str) -> String {
        format!("{}{}", self.stem(source), self.document_suffix)
    }

    /// Human-readable name: suffix removed, dashes and underscores as spaces.
    pub fn display_name(&self, source: &str) -> String {
        self.stem(source)
            .replace(['-', '_'], " ")
            .trim()
            .to_string()
    }
}
