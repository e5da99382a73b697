//! Document ingestion: fetch the configured sources and extract the
//! content-bearing text of each page.

use scraper::{Html, Selector};

use crate::config::Settings;
use crate::errors::PipelineError;

/// A source document with its extracted text. The URL doubles as the
/// document id; documents are immutable after ingestion.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub text: String,
    pub title: Option<String>,
}

pub struct DocumentLoader {
    client: reqwest::Client,
    selector: Selector,
}

impl DocumentLoader {
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout())
            .build()
            .map_err(|err| PipelineError::Config(format!("cannot build http client: {}", err)))?;

        let selector = content_selector(&settings.rag.content_markers)?;

        Ok(Self { client, selector })
    }

    /// Fetch every source in order. Unreachable sources and pages where no
    /// node matches the content markers are skipped with a warning; the
    /// whole ingestion fails only when nothing at all could be loaded, so
    /// the pipeline never builds an empty index silently.
    pub async fn load(&self, sources: &[String]) -> Result<Vec<Document>, PipelineError> {
        let mut documents = Vec::new();
        let mut last_failure = String::from("no sources configured");

        for source in sources {
            let source = source.trim();
            if source.is_empty() {
                continue;
            }

            let html = match self.fetch(source).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!("skipping {}: {}", source, err);
                    last_failure = err.to_string();
                    continue;
                }
            };

            let (title, text) = extract_content(&html, &self.selector);
            if text.is_empty() {
                tracing::warn!("no content matched the configured markers at {}", source);
                continue;
            }

            tracing::info!("loaded {} ({} chars)", source, text.chars().count());
            documents.push(Document {
                source: source.to_string(),
                text,
                title,
            });
        }

        if documents.is_empty() {
            return Err(PipelineError::Fetch {
                url: sources.first().cloned().unwrap_or_default(),
                reason: format!("no document could be loaded ({})", last_failure),
            });
        }

        Ok(documents)
    }

    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PipelineError::Fetch {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch {
                url: url.to_string(),
                reason: format!("status {}", status),
            });
        }

        response.text().await.map_err(|err| PipelineError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}

/// One selector matching any of the configured class markers.
fn content_selector(markers: &[String]) -> Result<Selector, PipelineError> {
    let joined = markers
        .iter()
        .map(|marker| format!(".{}", marker.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    Selector::parse(&joined).map_err(|err| {
        PipelineError::Config(format!("invalid content markers {:?}: {}", markers, err))
    })
}

/// The page title plus the text of every node matching the marker
/// selector, in document order. Each matched node becomes one
/// whitespace-normalized block; blocks are separated by blank lines.
fn extract_content(html: &str, selector: &Selector) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|title_selector| {
        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let blocks: Vec<String> = document
        .select(selector)
        .map(|element| {
            element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|block| !block.is_empty())
        .collect();

    (title, blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r##"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Agent Planning</title>
            <script>var tracking = true;</script>
        </head>
        <body>
            <nav class="site-nav">Home | Archive | About</nav>
            <h1 class="post-title">LLM Powered Agents</h1>
            <div class="post-content">
                <p>Task decomposition is splitting a task into subtasks.</p>
                <p>Each <a href="#">subtask</a> is then solved independently.</p>
            </div>
            <footer>Copyright notice</footer>
        </body>
        </html>
    "##;

    fn markers() -> Vec<String> {
        vec!["post-content".to_string(), "post-title".to_string()]
    }

    #[test]
    fn extracts_only_marked_nodes() {
        let selector = content_selector(&markers()).unwrap();
        let (title, text) = extract_content(SAMPLE_PAGE, &selector);

        assert_eq!(title.as_deref(), Some("Agent Planning"));
        assert!(text.contains("Task decomposition is splitting a task into subtasks."));
        assert!(text.contains("LLM Powered Agents"));
        assert!(!text.contains("Archive"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn marked_nodes_come_out_in_document_order() {
        let selector = content_selector(&markers()).unwrap();
        let (_, text) = extract_content(SAMPLE_PAGE, &selector);

        let title_pos = text.find("LLM Powered Agents").unwrap();
        let content_pos = text.find("Task decomposition").unwrap();
        assert!(title_pos < content_pos);
    }

    #[test]
    fn inline_markup_does_not_break_words_apart() {
        let selector = content_selector(&markers()).unwrap();
        let (_, text) = extract_content(SAMPLE_PAGE, &selector);
        assert!(text.contains("Each subtask is then solved independently."));
    }

    #[test]
    fn no_matches_yields_empty_text() {
        let selector = content_selector(&["missing-class".to_string()]).unwrap();
        let (_, text) = extract_content(SAMPLE_PAGE, &selector);
        assert!(text.is_empty());
    }
}
