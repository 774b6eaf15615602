//! Prompts for the four study artifacts.
//!
//! Every prompt is an instruction header followed by a blank line and the
//! bounded context, verbatim. Construction is pure string formatting; count
//! ranges are validated by [`crate::config::StudyConfigBuilder::build`], not
//! here.

use crate::config::StudyConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which artifact a prompt (and its result) belongs to.
///
/// The declaration order is the fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    Summary,
    Flashcards,
    ShortQa,
    MindMap,
}

impl ArtifactKind {
    /// All artifacts in display order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Summary,
        ArtifactKind::Flashcards,
        ArtifactKind::ShortQa,
        ArtifactKind::MindMap,
    ];

    /// Section heading used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Summary => "Summary",
            ArtifactKind::Flashcards => "Flashcards",
            ArtifactKind::ShortQa => "Q&A",
            ArtifactKind::MindMap => "Mind-map",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One prompt to send, with its count parameter where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptSpec {
    Summary(u32),
    Flashcards(u32),
    ShortQa(u32),
    MindMap,
}

impl PromptSpec {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            PromptSpec::Summary(_) => ArtifactKind::Summary,
            PromptSpec::Flashcards(_) => ArtifactKind::Flashcards,
            PromptSpec::ShortQa(_) => ArtifactKind::ShortQa,
            PromptSpec::MindMap => ArtifactKind::MindMap,
        }
    }

    /// Instruction header, without the context.
    pub fn header(&self) -> String {
        match self {
            PromptSpec::Summary(n) => {
                format!("Summarize the following in {n} concise bullet points:")
            }
            PromptSpec::Flashcards(n) => format!(
                "Create {n} flashcards in JSON format with 'question' and 'answer' from this content. \
{FLASHCARDS_SHAPE}"
            ),
            PromptSpec::ShortQa(n) => format!("Generate {n} short Q&A pairs (Q: ... A: ...):"),
            PromptSpec::MindMap => MIND_MAP_HEADER.to_string(),
        }
    }

    /// Full prompt: header, blank line, context.
    pub fn build(&self, context: &str) -> String {
        format!("{}\n\n{}", self.header(), context)
    }
}

/// Shape requirement appended to the flashcard instruction.
pub const FLASHCARDS_SHAPE: &str = "Respond with a JSON array only, where every element is an object \
with exactly two string fields: \"question\" and \"answer\".";

/// Mind-map instruction. The renderer does no prose stripping, so the model
/// must emit bare DOT.
pub const MIND_MAP_HEADER: &str =
    "Create a mind-map in Graphviz DOT format for this content. Output ONLY DOT code.";

/// The four prompt specs for a run, in display order.
pub fn prompt_specs(config: &StudyConfig) -> [PromptSpec; 4] {
    [
        PromptSpec::Summary(config.num_bullets),
        PromptSpec::Flashcards(config.num_flashcards),
        PromptSpec::ShortQa(config.num_short_qa),
        PromptSpec::MindMap,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_embeds_count_and_context() {
        let p = PromptSpec::Summary(3).build("Photosynthesis.");
        assert_eq!(
            p,
            "Summarize the following in 3 concise bullet points:\n\nPhotosynthesis."
        );
    }

    #[test]
    fn flashcards_prompt_asks_for_json_array() {
        let p = PromptSpec::Flashcards(12).build("ctx");
        assert!(p.starts_with("Create 12 flashcards in JSON format with 'question' and 'answer'"));
        assert!(p.contains("JSON array"));
        assert!(p.contains("exactly two string fields"));
        assert!(p.ends_with("\n\nctx"));
    }

    #[test]
    fn short_qa_prompt_format() {
        let p = PromptSpec::ShortQa(8).build("ctx");
        assert_eq!(p, "Generate 8 short Q&A pairs (Q: ... A: ...):\n\nctx");
    }

    #[test]
    fn mind_map_prompt_demands_only_dot() {
        let p = PromptSpec::MindMap.build("ctx");
        assert!(p.contains("Graphviz DOT"));
        assert!(p.contains("Output ONLY DOT code."));
        assert!(p.ends_with("ctx"));
    }

    #[test]
    fn context_is_embedded_verbatim() {
        let ctx = "  leading space, {braces} and \n newlines  ";
        for spec in prompt_specs(&StudyConfig::default()) {
            assert!(spec.build(ctx).ends_with(ctx), "{spec:?}");
        }
    }

    #[test]
    fn specs_follow_display_order() {
        let kinds: Vec<_> = prompt_specs(&StudyConfig::default())
            .iter()
            .map(PromptSpec::kind)
            .collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
    }
}
