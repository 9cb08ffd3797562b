//! Result Renderer: display groupings and clipboard text for an analysis.
//!
//! No business logic lives here: card order, colors and the text layout are
//! fixed.

use serde::Serialize;
#[cfg(test)]
use thiserror::Error;

use crate::models::analysis::AnalysisResult;

const CLIPBOARD_TITLE: &str = "Ai SWOT Analysis";
const SUMMARY_PREFIX: &str = "Summary: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strengths,
    Weaknesses,
    Opportunities,
    Threats,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Strengths,
        Category::Weaknesses,
        Category::Opportunities,
        Category::Threats,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::Strengths => "Strengths",
            Category::Weaknesses => "Weaknesses",
            Category::Opportunities => "Opportunities",
            Category::Threats => "Threats",
        }
    }

    pub fn color(&self) -> CardColor {
        match self {
            Category::Strengths => CardColor::Emerald,
            Category::Weaknesses => CardColor::Amber,
            Category::Opportunities => CardColor::Blue,
            Category::Threats => CardColor::Red,
        }
    }

    fn header(&self) -> &'static str {
        match self {
            Category::Strengths => "STRENGTHS:",
            Category::Weaknesses => "WEAKNESSES:",
            Category::Opportunities => "OPPORTUNITIES:",
            Category::Threats => "THREATS:",
        }
    }

    fn items<'a>(&self, result: &'a AnalysisResult) -> &'a [String] {
        match self {
            Category::Strengths => &result.strengths,
            Category::Weaknesses => &result.weaknesses,
            Category::Opportunities => &result.opportunities,
            Category::Threats => &result.threats,
        }
    }

    #[cfg(test)]
    fn items_mut<'a>(&self, result: &'a mut AnalysisResult) -> &'a mut Vec<String> {
        match self {
            Category::Strengths => &mut result.strengths,
            Category::Weaknesses => &mut result.weaknesses,
            Category::Opportunities => &mut result.opportunities,
            Category::Threats => &mut result.threats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Emerald,
    Amber,
    Blue,
    Red,
}

/// One SWOT card.
#[derive(Debug, Clone, Serialize)]
pub struct CardGroup {
    pub category: Category,
    pub title: &'static str,
    pub color: CardColor,
    pub count: usize,
    /// "`N Points`" badge text.
    pub badge: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub summary: String,
    pub cards: Vec<CardGroup>,
}

pub fn render(result: &AnalysisResult) -> ResultView {
    let cards = Category::ALL
        .iter()
        .map(|category| {
            let items = category.items(result).to_vec();
            CardGroup {
                category: *category,
                title: category.title(),
                color: category.color(),
                count: items.len(),
                badge: format!("{} Points", items.len()),
                items,
            }
        })
        .collect();

    ResultView {
        summary: result.summary.clone(),
        cards,
    }
}

/// Plain-text rendering for the clipboard.
pub fn serialize(result: &AnalysisResult) -> String {
    let mut text = format!("{CLIPBOARD_TITLE}\n{SUMMARY_PREFIX}{}", result.summary);
    for category in Category::ALL {
        text.push_str("\n\n");
        text.push_str(category.header());
        text.push('\n');
        text.push_str(&category.items(result).join("\n"));
    }
    text
}

#[cfg(test)]
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("missing '{0}' line")]
    MissingLine(&'static str),

    #[error("missing section header '{0}'")]
    MissingSection(&'static str),
}

/// Reads back text produced by [`serialize`]. Items containing newlines
/// cannot be told apart from separate items.
#[cfg(test)]
pub fn parse_serialized(text: &str) -> Result<AnalysisResult, ParseError> {
    let rest = text
        .strip_prefix(CLIPBOARD_TITLE)
        .and_then(|r| r.strip_prefix('\n'))
        .ok_or(ParseError::MissingLine(CLIPBOARD_TITLE))?;
    let rest = rest
        .strip_prefix(SUMMARY_PREFIX)
        .ok_or(ParseError::MissingLine(SUMMARY_PREFIX))?;

    let mut result = AnalysisResult::default();

    // Each section starts at "\n\n<HEADER>\n"; find them in order.
    let mut bounds = Vec::with_capacity(Category::ALL.len());
    let mut cursor = 0;
    for category in Category::ALL {
        let marker = format!("\n\n{}\n", category.header());
        let at = rest[cursor..]
            .find(&marker)
            .map(|i| cursor + i)
            .ok_or(ParseError::MissingSection(category.header()))?;
        bounds.push((category, at, at + marker.len()));
        cursor = at + marker.len();
    }

    result.summary = rest[..bounds[0].1].to_string();
    for (i, (category, _, body_start)) in bounds.iter().enumerate() {
        let body_end = bounds.get(i + 1).map(|b| b.1).unwrap_or(rest.len());
        let body = &rest[*body_start..body_end];
        *category.items_mut(&mut result) = if body.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(String::from).collect()
        };
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(counts: [usize; 4]) -> AnalysisResult {
        let items = |prefix: &str, n: usize| -> Vec<String> {
            (1..=n).map(|i| format!("{prefix} point {i}: detail")).collect()
        };
        AnalysisResult {
            summary: "Strong core, exposed to pricing pressure.".to_string(),
            strengths: items("Strength", counts[0]),
            weaknesses: items("Weakness", counts[1]),
            opportunities: items("Opportunity", counts[2]),
            threats: items("Threat", counts[3]),
        }
    }

    #[test]
    fn test_render_counts_order_and_colors() {
        let result = sample([6, 5, 7, 6]);
        let view = render(&result);

        let counts: Vec<usize> = view.cards.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![6, 5, 7, 6]);

        let colors: Vec<CardColor> = view.cards.iter().map(|c| c.color).collect();
        assert_eq!(
            colors,
            vec![CardColor::Emerald, CardColor::Amber, CardColor::Blue, CardColor::Red]
        );

        assert_eq!(view.cards[0].items, result.strengths);
        assert_eq!(view.cards[3].items, result.threats);
        assert_eq!(view.cards[1].badge, "5 Points");
        assert_eq!(view.summary, result.summary);
    }

    #[test]
    fn test_serialize_layout() {
        let result = AnalysisResult {
            summary: "S".into(),
            strengths: vec!["a".into(), "b".into()],
            weaknesses: vec!["c".into()],
            opportunities: vec![],
            threats: vec!["d".into()],
        };
        assert_eq!(
            serialize(&result),
            "Ai SWOT Analysis\nSummary: S\n\nSTRENGTHS:\na\nb\n\nWEAKNESSES:\nc\n\nOPPORTUNITIES:\n\n\nTHREATS:\nd"
        );
    }

    #[test]
    fn test_serialize_then_parse_recovers_result() {
        let result = sample([6, 5, 7, 6]);
        assert_eq!(parse_serialized(&serialize(&result)).unwrap(), result);
    }

    #[test]
    fn test_parse_keeps_empty_categories() {
        let result = sample([0, 3, 0, 1]);
        assert_eq!(parse_serialized(&serialize(&result)).unwrap(), result);
    }

    #[test]
    fn test_parse_rejects_foreign_text() {
        assert_eq!(
            parse_serialized("hello").unwrap_err(),
            ParseError::MissingLine(CLIPBOARD_TITLE)
        );
        assert_eq!(
            parse_serialized("Ai SWOT Analysis\nSummary: x\n\nSTRENGTHS:\na").unwrap_err(),
            ParseError::MissingSection("WEAKNESSES:")
        );
    }
}
