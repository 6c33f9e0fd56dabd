//! Search-index crawl scope and prune targets for content changes.
//!
//! Given the files a push or PR touched, decide whether the site search
//! index needs a crawl and which content collections to re-crawl, and map
//! removed content files to the document ids that should be deleted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeployError, Result};

/// Document ids are deleted in batches of this size.
pub const DELETE_CHUNK_SIZE: usize = 100;

/// Content collections that have their own crawl target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Articles,
    Services,
    CaseStudies,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Articles,
        Collection::Services,
        Collection::CaseStudies,
    ];

    /// Directory name under the content root, also the URL segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Services => "services",
            Collection::CaseStudies => "case-studies",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = DeployError;

    fn from_str(value: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == value.trim())
            .ok_or_else(|| DeployError::UnknownCollection(value.to_string()))
    }
}

/// Which crawls a change set calls for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlScope {
    pub should_index: bool,
    pub crawl_articles: bool,
    pub crawl_services: bool,
    pub crawl_case_studies: bool,
}

impl CrawlScope {
    fn everything() -> Self {
        CrawlScope {
            should_index: true,
            crawl_articles: true,
            crawl_services: true,
            crawl_case_studies: true,
        }
    }
}

/// One entry of the GitHub "list files" response for a PR or comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
}

/// Trim the site origin and drop one trailing slash.
pub fn normalize_origin(origin: &str) -> Result<String> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err(DeployError::EmptySetting("site_origin"));
    }
    Ok(origin.strip_suffix('/').unwrap_or(origin).to_string())
}

/// Trim the content root and make sure it ends with `/`.
pub fn normalize_content_root(content_root: &str) -> Result<String> {
    let root = content_root.trim();
    if root.is_empty() {
        return Err(DeployError::EmptySetting("content_root"));
    }
    if root.ends_with('/') {
        Ok(root.to_string())
    } else {
        Ok(format!("{root}/"))
    }
}

/// Decide the crawl scope for a list of changed paths.
///
/// Nothing under the content root means no indexing. Changes limited to
/// articles only re-crawl articles. Any content outside the three
/// collections re-crawls everything, otherwise each touched collection is
/// re-crawled.
pub fn determine_crawl_scope<S: AsRef<str>>(changed_files: &[S], content_root: &str) -> CrawlScope {
    let root = if content_root.ends_with('/') {
        content_root.to_string()
    } else {
        format!("{content_root}/")
    };

    let content_files: Vec<&str> = changed_files
        .iter()
        .map(|f| AsRef::<str>::as_ref(f))
        .filter(|f| f.starts_with(&root))
        .collect();
    if content_files.is_empty() {
        return CrawlScope::default();
    }

    let prefix = |c: Collection| format!("{root}{}/", c.as_str());
    let touches = |c: Collection| {
        let p = prefix(c);
        content_files.iter().any(|f| f.starts_with(&p))
    };
    let other_content = content_files.iter().any(|f| {
        Collection::ALL
            .into_iter()
            .all(|c| !f.starts_with(&prefix(c)))
    });

    let articles = touches(Collection::Articles);
    let services = touches(Collection::Services);
    let case_studies = touches(Collection::CaseStudies);

    let scope = if articles && !services && !case_studies && !other_content {
        CrawlScope {
            should_index: true,
            crawl_articles: true,
            ..CrawlScope::default()
        }
    } else if other_content {
        CrawlScope::everything()
    } else {
        CrawlScope {
            should_index: true,
            crawl_articles: articles,
            crawl_services: services,
            crawl_case_studies: case_studies,
        }
    };
    debug!(content_files = content_files.len(), ?scope, "Determined crawl scope");
    scope
}

/// Map a content file to its site URL path, e.g.
/// `src/content/articles/foo/index.mdx` to `/articles/foo`.
///
/// Returns `None` for files outside the collection or that are not
/// Markdown/MDX.
pub fn content_file_to_url_path(
    filename: &str,
    content_root: &str,
    collection: Collection,
) -> Option<String> {
    let root = normalize_content_root(content_root).ok()?;
    let relative = filename.strip_prefix(root.as_str())?;
    let relative = relative.strip_prefix(&format!("{collection}/"))?;

    let stem = relative
        .strip_suffix(".mdx")
        .or_else(|| relative.strip_suffix(".md"))?;
    let stem = if stem == "index" {
        ""
    } else {
        stem.strip_suffix("/index").unwrap_or(stem)
    };
    let stem = stem.trim_matches('/');

    if stem.is_empty() {
        Some(format!("/{collection}"))
    } else {
        Some(format!("/{collection}/{stem}"))
    }
}

/// Search document ids for content files removed from a collection.
pub fn removed_document_ids(
    files: &[ChangedFile],
    site_origin: &str,
    content_root: &str,
    collection: Collection,
) -> Result<Vec<String>> {
    let origin = normalize_origin(site_origin)?;
    let root = normalize_content_root(content_root)?;

    let ids: Vec<String> = files
        .iter()
        .filter(|f| f.status == "removed")
        .filter_map(|f| content_file_to_url_path(&f.filename, &root, collection))
        .map(|path| format!("{origin}{path}"))
        .collect();
    debug!(collection = %collection, count = ids.len(), "Resolved removed document ids");
    Ok(ids)
}

/// Split ids into delete batches.
pub fn delete_batches(ids: &[String]) -> impl Iterator<Item = &[String]> {
    ids.chunks(DELETE_CHUNK_SIZE)
}
