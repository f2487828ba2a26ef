//! Citation grouping and link resolution.

use crate::links::LinkFactory;
use crate::rag::types::SourceNaming;
use crate::types::{Citation, RetrievalResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// A source whose link could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFailure {
    pub source: String,
    pub message: String,
}

/// Citations in first-seen source order, plus the sources that were skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationResolution {
    pub citations: Vec<Citation>,
    pub failures: Vec<LinkFailure>,
}

/// Groups retrieved chunks by source document and attaches document links.
#[derive(Clone)]
pub struct CitationResolver {
    links: Arc<dyn LinkFactory>,
    naming: SourceNaming,
    container: String,
    ttl_minutes: u32,
}

impl CitationResolver {
    pub fn new(
        links: Arc<dyn LinkFactory>,
        naming: SourceNaming,
        container: impl Into<String>,
        ttl_minutes: u32,
    ) -> Self {
        Self {
            links,
            naming,
            container: container.into(),
            ttl_minutes,
        }
    }

    /// One citation per distinct source, pages ascending.
    ///
    /// A link failure drops that source only; the others still resolve.
    pub async fn resolve(&self, result: &RetrievalResult) -> CitationResolution {
        let mut groups: Vec<(String, BTreeSet<u32>)> = Vec::new();

        for chunk in &result.chunks {
            if chunk.source.trim().is_empty() {
                continue;
            }
            match groups.iter_mut().find(|(source, _)| *source == chunk.source) {
                Some((_, pages)) => {
                    pages.insert(chunk.page);
                }
                None => groups.push((chunk.source.clone(), BTreeSet::from([chunk.page]))),
            }
        }

        let mut resolution = CitationResolution::default();

        for (source, pages) in groups {
            let source_file = self.naming.document_file(&source);

            match self
                .links
                .make_link(&self.container, &source_file, self.ttl_minutes)
                .await
            {
                Ok(url) => resolution.citations.push(Citation {
                    display_name: self.naming.display_name(&source),
                    source_file,
                    pages,
                    url,
                }),
                Err(e) => {
                    warn!("Could not create link for {}: {}", source_file, e);
                    resolution.failures.push(LinkFailure {
                        source,
                        message: e.to_string(),
                    });
                }
            }
        }

        resolution
    }
}
