//! Presentation transform for review prompts.

use rehearse_types::item::MASK;

/// Paragraph separator inside stored definitions.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Turn a stored definition into a prompt that does not give the word away.
///
/// When the definition has more than one paragraph the first one is dropped,
/// since it restates the word. Every literal occurrence of `word` in what
/// remains is replaced with [`MASK`]. An empty word is left unmasked.
pub fn mask_definition(word: &str, definition: &str) -> String {
    let body = match definition.split_once(PARAGRAPH_BREAK) {
        Some((_, rest)) => rest,
        None => definition,
    };
    if word.is_empty() {
        return body.to_string();
    }
    body.replace(word, MASK)
}
