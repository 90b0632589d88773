use smartdoc_core::types::RetrievedChunk;

pub const QA_TEMPLATE: &str = "Based on the provided context, please answer the question:

Context: {context}

Question: {question}

Instructions:
1. Only use information from the context
2. If unsure, respond with \"I don't know\"
3. Keep answers concise (3-4 sentences)
4. Be clear and direct

Answer:";

pub const DOCUMENT_TEMPLATE: &str = "Content: {page_content}\nSource: {source}";

pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Substitute `{name}` placeholders in one pass; inserted values are never rescanned.
/// Unknown placeholders are left as they are.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            vars.iter().find(|(k, _)| *k == name).map(|(_, v)| (*v, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn format_passage(passage: &RetrievedChunk) -> String {
    let source = passage.chunk.provenance();
    fill(DOCUMENT_TEMPLATE, &[("page_content", &passage.chunk.content), ("source", &source)])
}

pub fn format_context(passages: &[RetrievedChunk]) -> String {
    passages.iter().map(format_passage).collect::<Vec<_>>().join(DOCUMENT_SEPARATOR)
}

pub fn render_prompt(question: &str, passages: &[RetrievedChunk]) -> String {
    let context = format_context(passages);
    fill(QA_TEMPLATE, &[("context", &context), ("question", question)])
}
