use super::lines::{classify_line, Line};

/// A level-2 section: heading text and the body up to the next `## ` heading.
#[derive(Debug, Clone)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// Cluster a document into level-2 sections. Text before the first
/// level-2 heading is not part of any section.
pub fn cluster_sections(markdown: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for raw in markdown.lines() {
        if let Line::Heading { level: 2, text } = classify_line(raw) {
            if let Some((heading, body)) = current.take() {
                sections.push(Section {
                    heading,
                    body: body.join("\n").trim().to_string(),
                });
            }
            current = Some((text, Vec::new()));
            continue;
        }
        if let Some((_, body)) = current.as_mut() {
            body.push(raw);
        }
    }

    if let Some((heading, body)) = current {
        sections.push(Section {
            heading,
            body: body.join("\n").trim().to_string(),
        });
    }

    sections
}

/// Body of the first section whose heading is exactly `name`.
pub fn extract_section(markdown: &str, name: &str) -> Option<String> {
    cluster_sections(markdown)
        .into_iter()
        .find(|s| s.heading == name)
        .map(|s| s.body)
}

/// Try each heading name in turn; the first one with a non-empty body wins.
pub fn first_section(markdown: &str, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| extract_section(markdown, name))
        .find(|body| !body.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Current Understanding\n\nIteration: 2\n\n## Executive Summary\n\nHybrid search wins.\n\n### Detail\nstill summary\n\n## Recommendations\n\n## Open Questions\n- [ ] cost at scale?\n";

    #[test]
    fn sections_in_order() {
        let headings: Vec<String> = cluster_sections(DOC).into_iter().map(|s| s.heading).collect();
        assert_eq!(headings, vec!["Executive Summary", "Recommendations", "Open Questions"]);
    }

    #[test]
    fn level_three_stays_inside_section() {
        let body = extract_section(DOC, "Executive Summary").unwrap();
        assert_eq!(body, "Hybrid search wins.\n\n### Detail\nstill summary");
    }

    #[test]
    fn empty_section_falls_through() {
        assert_eq!(extract_section(DOC, "Recommendations").as_deref(), Some(""));
        let found = first_section(DOC, &["Recommendations", "Open Questions"]);
        assert_eq!(found.as_deref(), Some("- [ ] cost at scale?"));
    }

    #[test]
    fn missing_section() {
        assert!(extract_section(DOC, "Validation Summary").is_none());
        assert!(first_section(DOC, &["Nope", "Also Nope"]).is_none());
    }

    #[test]
    fn heading_must_match_exactly() {
        assert!(extract_section(DOC, "Executive").is_none());
    }
}
