use indexmap::IndexMap;

use crate::services::profile::{Insight, SheetProfile};

pub mod markdown;

pub use markdown::MarkdownRenderer;

/// Turns computed profiles and insights into a document.
pub trait TextRenderer {
    fn render(
        &self,
        profiles: &[SheetProfile],
        insights: &IndexMap<String, Vec<Insight>>,
        source_description: &str,
    ) -> String;
}
