use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::io::Read;
use std::path::Path;

/// Document formats the reader can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Docx,
    Pdf,
    Pptx,
}

impl DocumentFormat {
    pub const EXTENSIONS: [&'static str; 4] = ["txt", "docx", "pdf", "pptx"];

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }
}

/// Extract the plain text of a document, choosing the extractor by extension.
pub fn extract_text(path: &Path) -> Result<String> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        anyhow::anyhow!(
            "Unsupported file format: {}. Supported: {}",
            path.display(),
            DocumentFormat::EXTENSIONS.join(", ")
        )
    })?;

    match format {
        DocumentFormat::Text => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| anyhow::anyhow!("Failed to extract text from {}: {e}", path.display())),
        DocumentFormat::Pptx => extract_pptx(path),
    }
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<std::fs::File>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    zip::ZipArchive::new(file).with_context(|| format!("{} is not a valid archive", path.display()))
}

fn read_entry(archive: &mut zip::ZipArchive<std::fs::File>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("Missing {name} in archive"))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

fn extract_docx(path: &Path) -> Result<String> {
    let mut archive = open_archive(path)?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    paragraph_text(&xml, "w")
}

fn extract_pptx(path: &Path) -> Result<String> {
    let mut archive = open_archive(path)?;

    // Slides are stored as ppt/slides/slideN.xml; order them by N, not by name.
    let slide_name = Regex::new(r"^ppt/slides/slide(\d+)\.xml$")?;
    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = slide_name.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut text = Vec::new();
    for (_, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        let slide = paragraph_text(&xml, "a")?;
        if !slide.trim().is_empty() {
            text.push(slide);
        }
    }
    Ok(text.join("\n\n"))
}

/// Collect the text runs (`<ns:t>`) of each paragraph (`<ns:p>`) in an OOXML part.
/// Tabs and line breaks inside a paragraph are kept. Paragraphs are separated
/// by a blank line.
fn paragraph_text(xml: &str, ns: &str) -> Result<String> {
    let paragraph_tag = format!("{ns}:p");
    let text_tag = format!("{ns}:t");
    let tab_tag = format!("{ns}:tab");
    let break_tag = format!("{ns}:br");

    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().context("Malformed document XML")? {
            Event::Start(e) => {
                let name = e.name();
                if name.as_ref() == text_tag.as_bytes() {
                    in_text = true;
                } else if name.as_ref() == tab_tag.as_bytes() {
                    current.push('\t');
                } else if name.as_ref() == break_tag.as_bytes() {
                    current.push('\n');
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if name.as_ref() == tab_tag.as_bytes() {
                    current.push('\t');
                } else if name.as_ref() == break_tag.as_bytes() {
                    current.push('\n');
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref() == text_tag.as_bytes() {
                    in_text = false;
                } else if name.as_ref() == paragraph_tag.as_bytes() {
                    let paragraph = std::mem::take(&mut current);
                    if !paragraph.trim().is_empty() {
                        paragraphs.push(paragraph);
                    }
                }
            }
            Event::Text(e) if in_text => {
                let text = e
                    .decode()
                    .map_err(|err| anyhow::anyhow!("Decode error: {err:?}"))?;
                current.push_str(&text);
            }
            Event::CData(e) if in_text => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| anyhow::anyhow!("Decode error: {err:?}"))?;
                current.push_str(&text);
            }
            Event::GeneralRef(e) if in_text => {
                let entity = e
                    .decode()
                    .map_err(|err| anyhow::anyhow!("Decode error: {err:?}"))?;
                let raw_entity = format!("&{entity};");
                let resolved = quick_xml::escape::unescape(&raw_entity)
                    .map_err(|err| anyhow::anyhow!("Unknown entity &{entity};: {err:?}"))?;
                current.push_str(&resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("book.TXT")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("/a/b.docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("deck.pptx")),
            Some(DocumentFormat::Pptx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.md")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_unsupported_format_errors() {
        let err = extract_text(Path::new("song.mp3")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_text_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, "Once upon a time\n\nThe end").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "Once upon a time\n\nThe end");
    }

    #[test]
    fn test_paragraph_text_from_docx_xml() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">world &amp; all</w:t></w:r></w:p>
            <w:p><w:pPr/></w:p>
            <w:p w:rsidR="00A1"><w:r><w:t>Second</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(paragraph_text(xml, "w").unwrap(), "Hello world & all\n\nSecond");
    }

    #[test]
    fn test_character_references_resolved() {
        let xml = "<w:p><w:r><w:t>It&#8217;s &#x201C;here&#x201D; &lt;now&gt;</w:t></w:r></w:p>";
        assert_eq!(
            paragraph_text(xml, "w").unwrap(),
            "It\u{2019}s \u{201C}here\u{201D} <now>"
        );
    }

    #[test]
    fn test_tabs_and_breaks_kept() {
        let xml = "<w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p>";
        assert_eq!(paragraph_text(xml, "w").unwrap(), "Name\tValue\nNext");

        let slide = "<a:p><a:r><a:t>Up</a:t></a:r><a:br><a:rPr/></a:br><a:r><a:t>Down</a:t></a:r></a:p>";
        assert_eq!(paragraph_text(slide, "a").unwrap(), "Up\nDown");
    }

    #[test]
    fn test_text_outside_runs_ignored() {
        let xml = "<w:body><w:p><w:pPr><w:rStyle>Heading</w:rStyle></w:pPr><w:r><w:t>Title</w:t></w:r></w:p></w:body>";
        assert_eq!(paragraph_text(xml, "w").unwrap(), "Title");
    }

    fn write_archive(path: &PathBuf, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_docx_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chapter.docx");
        write_archive(
            &path,
            &[(
                "word/document.xml",
                "<w:body><w:p><w:r><w:t>First</w:t></w:r></w:p><w:p><w:r><w:t>Second</w:t></w:r></w:p></w:body>",
            )],
        );
        assert_eq!(extract_text(&path).unwrap(), "First\n\nSecond");
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("deck.pptx");
        write_archive(
            &path,
            &[
                ("ppt/slides/slide10.xml", "<a:p><a:r><a:t>Ten</a:t></a:r></a:p>"),
                ("ppt/slides/slide2.xml", "<a:p><a:r><a:t>Two</a:t></a:r></a:p>"),
                ("ppt/slides/slide1.xml", "<a:p><a:r><a:t>One</a:t></a:r></a:p>"),
            ],
        );
        assert_eq!(extract_text(&path).unwrap(), "One\n\nTwo\n\nTen");
    }

    #[test]
    fn test_corrupt_docx_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(extract_text(&path).is_err());
    }
}
