//! Context assembly: retrieval matches in, one prompt-ready block out.

use ragline_core::index::RetrievalMatch;

/// Separator placed between snippets in the assembled block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Outcome of assembling retrieval matches.
///
/// `Empty` means matches existed but none contributed usable text —
/// distinct from retrieval returning nothing at all, which the caller
/// detects before assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledContext {
    Ready(String),
    Empty,
}

/// Deterministic, non-reordering context assembler.
///
/// Snippets are kept in the order the index ranked them. Matches without
/// a text field are dropped. The assembled block is bounded by a
/// character budget; snippets that do not fit are dropped whole, except
/// the first, which is truncated rather than lost.
pub struct ContextAssembler {
    max_chars: usize,
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn assemble(&self, matches: &[RetrievalMatch]) -> AssembledContext {
        let mut out = String::new();
        for m in matches {
            let Some(text) = m.text.as_deref() else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let needed = if out.is_empty() {
                text.len()
            } else {
                CONTEXT_SEPARATOR.len() + text.len()
            };
            if out.len() + needed > self.max_chars {
                if out.is_empty() {
                    out.push_str(truncate_at_boundary(text, self.max_chars));
                }
                break;
            }
            if !out.is_empty() {
                out.push_str(CONTEXT_SEPARATOR);
            }
            out.push_str(text);
        }

        if out.trim().is_empty() {
            AssembledContext::Empty
        } else {
            AssembledContext::Ready(out)
        }
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
