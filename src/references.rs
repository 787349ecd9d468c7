//! Resolution of query references (files, folders, URLs) into a corpus.
//!
//! Folder policy: hidden entries are skipped, `.gitignore` and `.ignore`
//! rules apply even outside a git repository, binary files and files above
//! the size limit are skipped, and files are visited in path order. Web
//! pages are held to the same size limit.

use crate::config::Limits;
use crate::error::MfError;
use crate::llm::http_client;
use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, warn};

/// Bytes inspected for a NUL byte when sniffing binary content.
const BINARY_SNIFF_LEN: usize = 8000;

/// Wrap width used when rendering HTML pages to text.
const HTML_TEXT_WIDTH: usize = 100;

/// What a reference string turned out to denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    File,
    Folder,
    Url,
}

impl ReferenceKind {
    /// Classify `reference`. Existing paths win over URL syntax.
    pub fn classify(reference: &str) -> Option<Self> {
        let path = Path::new(reference);
        if path.is_file() {
            Some(ReferenceKind::File)
        } else if path.is_dir() {
            Some(ReferenceKind::Folder)
        } else if is_url(reference) {
            Some(ReferenceKind::Url)
        } else {
            None
        }
    }
}

fn is_url(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && reference.len() > 8
}

/// One resolved piece of reference text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub name: String,
    pub content: String,
}

/// Resolved references, in the order they were given.
#[derive(Debug, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn push(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.entries.push(CorpusEntry {
            name: name.into(),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Render every entry as a section tagged with its reference name.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "--- BEGIN {name} ---\n{content}\n--- END {name} ---",
                    name = entry.name,
                    content = entry.content.trim_end()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Resolves reference strings into a [`Corpus`].
pub struct ReferenceResolver {
    http: reqwest::Client,
    max_file_bytes: u64,
}

impl ReferenceResolver {
    pub fn new(limits: &Limits) -> Result<Self, MfError> {
        Ok(Self {
            http: http_client(limits.timeout_secs)?,
            max_file_bytes: limits.max_file_bytes,
        })
    }

    /// Resolve all references in order. The first failure aborts.
    pub async fn resolve(&self, references: &[String]) -> Result<Corpus, MfError> {
        let mut corpus = Corpus::default();
        for reference in references {
            match ReferenceKind::classify(reference) {
                Some(ReferenceKind::File) => {
                    let content = self
                        .read_text(Path::new(reference))
                        .map_err(|reason| MfError::unresolvable(reference, reason))?;
                    corpus.push(reference.as_str(), content);
                }
                Some(ReferenceKind::Folder) => self.resolve_folder(reference, &mut corpus)?,
                Some(ReferenceKind::Url) => {
                    let content = self.fetch(reference).await?;
                    corpus.push(reference.as_str(), content);
                }
                None => {
                    return Err(MfError::unresolvable(
                        reference,
                        "not an existing file, folder or http(s) URL",
                    ))
                }
            }
            debug!("Resolved reference {}", reference);
        }
        Ok(corpus)
    }

    fn resolve_folder(&self, reference: &str, corpus: &mut Corpus) -> Result<(), MfError> {
        let before = corpus.entries().len();
        let walker = WalkBuilder::new(reference)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| MfError::unresolvable(reference, e.to_string()))?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            match self.read_text(path) {
                Ok(content) => corpus.push(path.display().to_string(), content),
                Err(reason) => debug!("Skipping {}: {}", path.display(), reason),
            }
        }

        if corpus.entries().len() == before {
            warn!("Folder {} contains no readable text files", reference);
        }
        Ok(())
    }

    /// Read a UTF-8 text file within the size limit.
    fn read_text(&self, path: &Path) -> Result<String, String> {
        let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
        if metadata.len() > self.max_file_bytes {
            return Err(format!(
                "file is {} bytes, above the limit of {}",
                metadata.len(),
                self.max_file_bytes
            ));
        }
        let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
        if looks_binary(&bytes) {
            return Err("file looks binary".to_string());
        }
        String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
    }

    async fn fetch(&self, url: &str) -> Result<String, MfError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MfError::unresolvable(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MfError::unresolvable(
                url,
                format!("server returned {}", response.status()),
            ));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("html"));
        let body = self.read_body(url, response).await?;
        let body = String::from_utf8_lossy(&body).into_owned();

        if is_html {
            html_to_text(&body).map_err(|reason| MfError::unresolvable(url, reason))
        } else {
            Ok(body)
        }
    }

    /// Read a response body, giving up once it grows past the size limit.
    async fn read_body(
        &self,
        url: &str,
        mut response: reqwest::Response,
    ) -> Result<Vec<u8>, MfError> {
        let too_large = || {
            MfError::unresolvable(
                url,
                format!("response is above the limit of {} bytes", self.max_file_bytes),
            )
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_file_bytes)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MfError::unresolvable(url, e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_file_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

fn html_to_text(html: &str) -> Result<String, String> {
    html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH).map_err(|e| e.to_string())
}
