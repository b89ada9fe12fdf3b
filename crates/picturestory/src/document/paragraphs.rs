/// A run of document text between blank lines, with the logical line range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentParagraph {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl DocumentParagraph {
    /// Number of lines after the first one (`end_line - start_line`).
    pub fn span(&self) -> usize {
        self.end_line - self.start_line
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Split document text into paragraphs on blank-line (`\n\n`) boundaries.
///
/// Line numbers count only the lines that belong to paragraphs: the separating
/// blank line is not numbered, and whitespace-only chunks are dropped without
/// advancing the counter. This keeps paragraphs contiguous, so the end line of
/// one is always immediately followed by the start line of the next.
pub fn segment(text: &str) -> Vec<DocumentParagraph> {
    // Normalize line endings
    let text = text.replace("\r\n", "\n");

    let mut paragraphs = Vec::new();
    let mut line_counter = 0;

    for chunk in text.split("\n\n") {
        if chunk.trim().is_empty() {
            continue;
        }

        let line_count = chunk.split('\n').count();
        let start_line = line_counter;
        line_counter += line_count;

        paragraphs.push(DocumentParagraph {
            start_line,
            end_line: line_counter - 1,
            text: chunk.to_string(),
        });
    }

    paragraphs
}
