use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use scraper::{ElementRef, Html, Node, Selector};
use tutorbot_core::{Document, Value};
use walkdir::WalkDir;

use crate::IngestionError;

pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["txt", "text", "md", "markdown", "html", "htm", "csv"];

/// Scraped corpora are stored as a table of page text and page URL.
const CSV_TEXT_COLUMN: &str = "text";
const CSV_SOURCE_COLUMN: &str = "source";
const MISSING_SOURCE: &str = "N/A";

const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "template",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "pre", "li", "ul", "ol", "table", "tr", "h1",
    "h2", "h3", "h4", "h5", "h6", "blockquote", "dt", "dd", "br",
];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn base_metadata(path: &Path) -> HashMap<String, Value> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "source".to_string(),
        Value::String(path.to_string_lossy().to_string()),
    );
    metadata
}

/// Recursively lists every supported file under `dir`, sorted for a stable
/// chunk order.
pub fn collect_corpus_paths(dir: &Path) -> Result<Vec<PathBuf>, IngestionError> {
    if !dir.is_dir() {
        return Err(IngestionError::MissingCorpus(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| IngestionError::Read {
            path: err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let supported = extension_of(entry.path())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        if supported {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

pub async fn load_file_async(path: PathBuf) -> Result<Vec<Document>, IngestionError> {
    let extension = extension_of(&path);
    let kind = match extension.as_deref() {
        Some("txt" | "text") => Kind::Text,
        Some("md" | "markdown") => Kind::Markdown,
        Some("html" | "htm") => Kind::Html,
        Some("csv") => Kind::Csv,
        _ => return Err(IngestionError::UnsupportedExtension(path)),
    };

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(source) => return Err(IngestionError::Read { path, source }),
    };

    let documents = match kind {
        Kind::Text => vec![Document {
            id: path.to_string_lossy().to_string(),
            content: raw,
            metadata: base_metadata(&path),
            embedding: None,
        }],
        Kind::Markdown => vec![markdown_document(&path, &raw)],
        Kind::Html => vec![html_document(&path, &raw)?],
        Kind::Csv => csv_documents(&path, &raw)?,
    };
    Ok(documents)
}

pub async fn load_files_async(paths: Vec<PathBuf>) -> Result<Vec<Document>, IngestionError> {
    let mut documents = Vec::new();
    for path in paths {
        documents.extend(load_file_async(path).await?);
    }
    Ok(documents)
}

enum Kind {
    Text,
    Markdown,
    Html,
    Csv,
}

fn heading_number(level: HeadingLevel) -> u64 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn markdown_document(path: &Path, raw: &str) -> Document {
    let mut content = String::new();
    let mut headers = Vec::new();
    let mut current_heading: Option<(u64, String)> = None;

    for event in Parser::new(raw) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((heading_number(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current_heading.take() {
                    headers.push(serde_json::json!({ "level": level, "text": text.trim() }));
                }
                content.push_str("\n\n");
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading)) = current_heading.as_mut() {
                    heading.push_str(&text);
                }
                content.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => content.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::CodeBlock | TagEnd::Item) => {
                content.push_str("\n\n");
            }
            _ => {}
        }
    }

    let mut metadata = base_metadata(path);
    if let Some(title) = headers
        .iter()
        .find(|header| header["level"] == 1)
        .and_then(|header| header["text"].as_str())
    {
        metadata.insert("title".to_string(), Value::String(title.to_string()));
    }
    metadata.insert("headers".to_string(), Value::Array(headers));

    Document {
        id: path.to_string_lossy().to_string(),
        content: content.trim().to_string(),
        metadata,
        embedding: None,
    }
}

/// One document per row with non-blank `text`. The row's `source` URL becomes
/// the document source; rows without one fall back to the file path.
fn csv_documents(path: &Path, raw: &str) -> Result<Vec<Document>, IngestionError> {
    let csv_error = |reason: String| IngestionError::Csv {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(csv_delimiter(raw))
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| csv_error(err.to_string()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    };
    let text_column = column(CSV_TEXT_COLUMN)
        .ok_or_else(|| csv_error(format!("missing '{CSV_TEXT_COLUMN}' column")))?;
    let source_column = column(CSV_SOURCE_COLUMN);
    let file = path.to_string_lossy().to_string();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_error(err.to_string()))?;
        let text = record.get(text_column).unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        let source = source_column
            .and_then(|index| record.get(index))
            .map(str::trim)
            .filter(|source| !source.is_empty() && *source != MISSING_SOURCE)
            .unwrap_or(&file);

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), Value::String(source.to_string()));
        metadata.insert("file".to_string(), Value::String(file.clone()));
        metadata.insert("row".to_string(), Value::from(row));
        documents.push(Document {
            id: format!("{file}#row{row}"),
            content: text.to_string(),
            metadata,
            embedding: None,
        });
    }
    Ok(documents)
}

/// Comma unless the header line only uses semicolons.
fn csv_delimiter(raw: &str) -> u8 {
    let header = raw.lines().next().unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn selector(path: &Path, css: &str) -> Result<Selector, IngestionError> {
    Selector::parse(css).map_err(|err| IngestionError::Html {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Keeps the text of `<main>` (documentation pages put their content there),
/// falling back to `<body>` and then the whole document.
fn html_document(path: &Path, raw: &str) -> Result<Document, IngestionError> {
    let html = Html::parse_document(raw);
    let mut metadata = base_metadata(path);

    let title = html
        .select(&selector(path, "title")?)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty());
    if let Some(title) = title {
        metadata.insert("title".to_string(), Value::String(title));
    }
    if let Some(lang) = html
        .select(&selector(path, "html")?)
        .next()
        .and_then(|el| el.value().attr("lang"))
    {
        metadata.insert("lang".to_string(), Value::String(lang.to_string()));
    }

    let root = html
        .select(&selector(path, "main")?)
        .next()
        .or_else(|| html.select(&selector(path, "body").ok()?).next())
        .unwrap_or_else(|| html.root_element());

    let mut content = String::new();
    collect_text(root, &mut content);

    Ok(Document {
        id: path.to_string_lossy().to_string(),
        content: collapse_blank_lines(&content),
        metadata,
        embedding: None,
    })
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(text);
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
                if BLOCK_ELEMENTS.contains(&name) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines = Vec::new();
    let mut blank = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            if !blank && !lines.is_empty() {
                lines.push("");
            }
            blank = true;
        } else {
            lines.push(line);
            blank = false;
        }
    }
    lines.join("\n").trim().to_string()
}
