//! Structured search reply and its text rendering

use crate::network::{ChatResponse, SourceRecord};

/// Answer text used when the API returns no choices
pub const EMPTY_ANSWER: &str = "No response from Perplexity API";

/// The parts of an API reply that are shown to the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReply {
    pub answer: String,
    pub citations: Vec<String>,
    pub sources: Vec<SourceRecord>,
    pub related_questions: Vec<String>,
}

impl From<ChatResponse> for SearchReply {
    fn from(response: ChatResponse) -> Self {
        let answer = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_else(|| EMPTY_ANSWER.to_string());

        Self {
            answer,
            citations: response.citations.unwrap_or_default(),
            sources: response.search_results.unwrap_or_default(),
            related_questions: response.related_questions.unwrap_or_default(),
        }
    }
}

impl SearchReply {
    /// Render as markdown: the answer followed by the source URL, detailed
    /// source and related question sections, in that order. Sections with
    /// nothing to show are left out.
    pub fn render(&self) -> String {
        let mut out = self.answer.clone();

        if !self.citations.is_empty() {
            out.push_str("\n\n## Source URLs\n");
            for (i, url) in self.citations.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, url));
            }
        }

        if !self.sources.is_empty() {
            out.push_str("\n\n## Detailed Sources\n");
            for (i, source) in self.sources.iter().enumerate() {
                let title = source
                    .title
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or(&source.url);
                out.push_str(&format!("\n{}. **{}**\n", i + 1, title));
                out.push_str(&format!("   URL: {}\n", source.url));
                if let Some(snippet) = source.snippet.as_deref().filter(|s| !s.trim().is_empty()) {
                    out.push_str(&format!("   Snippet: {}\n", snippet));
                }
            }
        }

        if !self.related_questions.is_empty() {
            out.push_str("\n\n## Related Questions\n");
            for question in &self.related_questions {
                out.push_str(&format!("- {}\n", question));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(citations: usize, sources: usize, related: usize) -> SearchReply {
        SearchReply {
            answer: "The answer.".to_string(),
            citations: (1..=citations).map(|i| format!("https://c{}.example", i)).collect(),
            sources: (1..=sources)
                .map(|i| SourceRecord {
                    url: format!("https://s{}.example", i),
                    title: Some(format!("Source {}", i)),
                    snippet: Some(format!("snippet {}", i)),
                })
                .collect(),
            related_questions: (1..=related).map(|i| format!("Question {}?", i)).collect(),
        }
    }

    #[test]
    fn test_answer_only() {
        let text = reply(0, 0, 0).render();
        assert_eq!(text, "The answer.");
        assert!(!text.contains("##"));
    }

    #[test]
    fn test_sections_present_iff_non_empty() {
        for (c, s, r) in [(0, 0, 0), (2, 0, 0), (0, 1, 0), (0, 0, 3), (3, 2, 1)] {
            let text = reply(c, s, r).render();
            assert_eq!(text.contains("## Source URLs"), c > 0);
            assert_eq!(text.contains("## Detailed Sources"), s > 0);
            assert_eq!(text.contains("## Related Questions"), r > 0);
        }
    }

    #[test]
    fn test_citations_numbered_in_order() {
        let text = reply(3, 0, 0).render();
        let section = text.split("## Source URLs\n").nth(1).unwrap();
        let lines: Vec<_> = section.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1. https://c1.example",
                "2. https://c2.example",
                "3. https://c3.example"
            ]
        );
    }

    #[test]
    fn test_full_layout() {
        let text = reply(1, 1, 1).render();
        let expected = "The answer.\
\n\n## Source URLs\n1. https://c1.example\n\
\n\n## Detailed Sources\n\n1. **Source 1**\n   URL: https://s1.example\n   Snippet: snippet 1\n\
\n\n## Related Questions\n- Question 1?\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_section_order() {
        let text = reply(1, 1, 1).render();
        let urls = text.find("## Source URLs").unwrap();
        let detailed = text.find("## Detailed Sources").unwrap();
        let related = text.find("## Related Questions").unwrap();
        assert!(urls < detailed && detailed < related);
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = reply(2, 2, 2);
        assert_eq!(r.render(), r.render());
    }

    #[test]
    fn test_source_without_title_or_snippet() {
        let r = SearchReply {
            answer: "A".to_string(),
            sources: vec![SourceRecord {
                url: "https://bare.example".to_string(),
                title: None,
                snippet: Some(String::new()),
            }],
            ..Default::default()
        };
        let text = r.render();
        assert!(text.contains("1. **https://bare.example**"));
        assert!(!text.contains("Snippet:"));
    }

    #[test]
    fn test_from_response_without_choices() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let r = SearchReply::from(response);
        assert_eq!(r.answer, EMPTY_ANSWER);
        assert!(r.citations.is_empty());
    }

    #[test]
    fn test_from_response_takes_first_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ],
            "related_questions": ["Why?"]
        }))
        .unwrap();
        let r = SearchReply::from(response);
        assert_eq!(r.answer, "first");
        assert_eq!(r.related_questions, vec!["Why?"]);
    }
}
