/// Question-answering prompt with `{context_str}` and `{query_str}` slots.
pub const QA_PROMPT_TEMPLATE: &str = concat!(
    "We have provided context information below. \n",
    "---------------------\n",
    "{context_str}",
    "\n---------------------\n",
    "Given this information above, please answer the question clearly but as concisely as possible: {query_str}\n",
);

const CONTEXT_SLOT: &str = "{context_str}";
const QUERY_SLOT: &str = "{query_str}";

/// Fill both slots in one pass; substituted text is never scanned again.
pub fn render_qa_prompt(template: &str, context: &str, query: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + query.len());
    let mut rest = template;

    loop {
        let next = [(CONTEXT_SLOT, context), (QUERY_SLOT, query)]
            .into_iter()
            .filter_map(|(slot, value)| rest.find(slot).map(|pos| (pos, slot, value)))
            .min_by_key(|(pos, _, _)| *pos);

        match next {
            Some((pos, slot, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + slot.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Retrieved chunks joined by a blank line, best first.
pub fn join_context<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    chunks.into_iter().collect::<Vec<_>>().join("\n\n")
}
