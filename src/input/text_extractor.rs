//! Text extraction from supported file formats

use crate::error::Result;
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path).await?)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(markdown_to_text(&markdown_content))
    }
}

/// Strip Markdown markup, keeping one block per line.
///
/// List items come out as `- item` so bullets still count, and link targets
/// are kept after the link text so profile URLs survive.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();
    let mut link_targets: Vec<String> = Vec::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Item) => {
                ensure_line_start(&mut text);
                text.push_str("- ");
            }
            Event::Start(Tag::Link(_, destination, _)) => link_targets.push(destination.to_string()),
            Event::End(Tag::Link(..)) => {
                if let Some(destination) = link_targets.pop() {
                    if !destination.is_empty() && !text.ends_with(destination.as_str()) {
                        text.push_str(&format!(" ({})", destination));
                    }
                }
            }
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(..))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_))
            | Event::End(Tag::TableRow)
            | Event::End(Tag::TableHead) => ensure_line_start(&mut text),
            Event::End(Tag::TableCell) => text.push(' '),
            Event::Text(content) | Event::Code(content) => text.push_str(&content),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak | Event::Rule => ensure_line_start(&mut text),
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_line_start(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_markup_removed() {
        let markdown = "# Jane Doe\n\n**Senior** engineer with _Rust_ and `SQL`.\n\n## Experience\n\n* Led a team\n* Cut costs by 30%\n";
        let text = markdown_to_text(markdown);

        assert_eq!(
            text,
            "Jane Doe\nSenior engineer with Rust and SQL.\nExperience\n- Led a team\n- Cut costs by 30%"
        );
    }

    #[test]
    fn test_markdown_links_keep_target() {
        let text = markdown_to_text("[LinkedIn](https://linkedin.com/in/jane) | <jane@example.com>");

        assert!(text.contains("LinkedIn (https://linkedin.com/in/jane)"));
        assert!(text.contains("jane@example.com"));
    }

    #[test]
    fn test_empty_markdown() {
        assert_eq!(markdown_to_text(""), "");
    }

    #[tokio::test]
    async fn test_plain_text_read_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.txt");
        std::fs::write(&path, "Experience\n• Built things").unwrap();

        let text = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(text, "Experience\n• Built things");
    }
}
