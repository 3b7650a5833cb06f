//! Paragraph chunking with char spans
//!
//! Splits a document on blank lines, merging consecutive paragraphs up to a
//! max size, and falls back to a windowed split for a single oversized
//! paragraph. Every chunk records its exact char offsets into the source so
//! fragments stay attributable to a span of the original document.

/// A span of document text destined to become one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Start char offset into the source document
    pub start_char: usize,
    /// End char offset (exclusive)
    pub end_char: usize,
}

/// Split `content` into paragraph-based chunks of at most `max_chars` chars.
#[must_use]
pub fn split_paragraphs(content: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Option<Chunk> = None;

    for (start, paragraph) in paragraphs(content) {
        let para_chars = paragraph.chars().count();

        match current.take() {
            None => {
                current = Some(begin_chunk(start, paragraph, para_chars, max_chars, &mut chunks));
            }
            Some(mut chunk) => {
                // Merge by re-slicing the source span so the chunk text keeps
                // the document's actual separator, whatever it was.
                let merged_end = start + para_chars;
                if merged_end - chunk.start_char <= max_chars {
                    chunk.text = slice_chars(content, chunk.start_char, merged_end);
                    chunk.end_char = merged_end;
                    current = Some(chunk);
                } else {
                    chunks.push(chunk);
                    current =
                        Some(begin_chunk(start, paragraph, para_chars, max_chars, &mut chunks));
                }
            }
        }
    }

    if let Some(chunk) = current {
        chunks.push(chunk);
    }
    chunks
}

fn slice_chars(content: &str, start: usize, end: usize) -> String {
    content.chars().skip(start).take(end - start).collect()
}

// Start a chunk from one paragraph, windowing it first if it alone exceeds
// the budget. Completed windows go straight to `chunks`; the return value is
// the still-open tail.
fn begin_chunk(
    start: usize,
    paragraph: &str,
    para_chars: usize,
    max_chars: usize,
    chunks: &mut Vec<Chunk>,
) -> Chunk {
    if para_chars <= max_chars {
        return Chunk { text: paragraph.to_string(), start_char: start, end_char: start + para_chars };
    }

    let chars: Vec<char> = paragraph.chars().collect();
    let mut offset = 0;
    while para_chars - offset > max_chars {
        chunks.push(Chunk {
            text: chars[offset..offset + max_chars].iter().collect(),
            start_char: start + offset,
            end_char: start + offset + max_chars,
        });
        offset += max_chars;
    }

    Chunk {
        text: chars[offset..].iter().collect(),
        start_char: start + offset,
        end_char: start + para_chars,
    }
}

/// Iterate non-blank paragraphs with their starting char offset.
fn paragraphs(content: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut offset = 0usize;
    content.split("\n\n").filter_map(move |raw| {
        let raw_chars = raw.chars().count();
        let start = offset;
        offset += raw_chars + 2; // account for the consumed separator

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lead = raw.chars().take_while(|c| c.is_whitespace()).count();
        Some((start + lead, trimmed))
    })
}
