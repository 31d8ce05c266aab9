// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction for the classification call.

use membridge_config::ContentPolicy;

/// System instruction sent with every classification request.
pub const SYSTEM_INSTRUCTION: &str = "You are the gatekeeper of a long-term memory store. \
You decide whether a piece of text adds knowledge worth keeping, and you answer with a single JSON object and nothing else.";

const CLASSIFY_INSTRUCTIONS: &str = r#"Decide the intent by knowledge increment:
   - SAVE: the input contains new facts that are not in the context.
   - UPDATE: the input refines, corrects, or contradicts a memory in the context.
     Set "target_id" to the id shown in that memory's [ID: ...] marker.
   - DISCARD: the input is small talk, acknowledgement, or an exact duplicate of the context."#;

const FORCE_SAVE_INSTRUCTIONS: &str =
    r#"The intent is ALWAYS "SAVE". The user asked for this text to be stored as is."#;

const VERBATIM_CONTENT: &str = r#"For SAVE and UPDATE, copy the user input into "content" VERBATIM.
   Do not summarize, rephrase, translate, or change perspective.
   Keep every character, newline, bullet, and symbol."#;

const SUMMARIZE_CONTENT: &str = r#"For SAVE and UPDATE, write "content" as one concise, standalone statement of the fact,
   in the same language as the user input. For UPDATE, the statement replaces the old memory entirely."#;

const SCHEMA: &str = r#"{
  "intent": "SAVE" | "UPDATE" | "DISCARD",
  "reason": "brief explanation",
  "content": "text to store",
  "tags": ["tag1", "tag2"],
  "target_id": "id from the context, or null"
}"#;

/// Build the user prompt for one classification.
pub fn build_prompt(
    input: &str,
    context: &str,
    force_save: bool,
    source_url: Option<&str>,
    policy: ContentPolicy,
) -> String {
    let context = if context.trim().is_empty() {
        "None"
    } else {
        context
    };
    let source_url = source_url.filter(|u| !u.trim().is_empty()).unwrap_or("None");

    let intent = if force_save {
        FORCE_SAVE_INSTRUCTIONS
    } else {
        CLASSIFY_INSTRUCTIONS
    };
    // Force-save input is stored verbatim whatever the policy says.
    let content = if force_save || policy == ContentPolicy::Verbatim {
        VERBATIM_CONTENT
    } else {
        SUMMARIZE_CONTENT
    };

    format!(
        "Context (existing memories):\n{context}\n\n\
         Source URL: {source_url}\n\n\
         User Input:\n{input}\n\n\
         Instructions:\n\
         1. {intent}\n\
         2. {content}\n\
         3. Give 1 to 5 short lowercase topic tags.\n\n\
         Answer with JSON matching this schema:\n{SCHEMA}\n"
    )
}
