//! Analyst prompt construction and response parsing.

use analyst_core::{AnalysisResult, DataError, KeyMetrics, NewsItem, Result, Symbol};

/// Most headlines included in a prompt.
pub const MAX_HEADLINES: usize = 5;

/// Longest business summary, in characters, included in a prompt.
pub const MAX_SUMMARY_CHARS: usize = 800;

/// Headline used for news items without a title.
pub const UNKNOWN_STORY: &str = "Unknown Story";

const NOT_AVAILABLE: &str = "N/A";

/// Builds the analyst prompt for a symbol.
#[must_use]
pub fn build_prompt(
    symbol: &Symbol,
    metrics: &KeyMetrics,
    news: &[NewsItem],
    summary: &str,
) -> String {
    let headlines = news
        .iter()
        .take(MAX_HEADLINES)
        .map(|item| format!("- {}", item.title.as_deref().unwrap_or(UNKNOWN_STORY)))
        .collect::<Vec<_>>()
        .join("\n");
    let summary: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();

    format!(
        "Act as a senior financial analyst. Analyze {symbol} based on this data:\n\
         [FINANCIALS] Margins: {margins}, ROE: {roe}, PEG: {peg}, P/E: {pe}\n\
         [NEWS] {headlines}\n\
         [SUMMARY] {summary}...\n\
         \n\
         TASK: Provide JSON with keys: \"moat\" (String, max 2 sentences), \
         \"catalysts\" (List of strings), \"risks\" (List of strings).\n",
        margins = percent(metrics.profit_margins),
        roe = percent(metrics.return_on_equity),
        peg = plain(metrics.peg_ratio),
        pe = plain(metrics.trailing_pe),
    )
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn plain(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Removes Markdown code fences the model may wrap its JSON in.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses an LLM response into an [`AnalysisResult`].
///
/// # Errors
/// Returns [`DataError::Parse`] unless the text, once fences are removed, is a
/// JSON object with `moat`, `catalysts` and `risks`.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| DataError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> KeyMetrics {
        KeyMetrics {
            peg_ratio: Some(2.1),
            trailing_pe: Some(29.5),
            profit_margins: Some(0.253),
            return_on_equity: None,
        }
    }

    #[test]
    fn test_prompt_formats_metrics() {
        let prompt = build_prompt(&Symbol::new("AAPL"), &metrics(), &[], "Phones.");

        assert!(prompt.contains("Analyze AAPL based on this data"));
        assert!(prompt.contains("Margins: 25.3%, ROE: N/A, PEG: 2.1, P/E: 29.5"));
        assert!(prompt.contains("[SUMMARY] Phones...."));
    }

    #[test]
    fn test_prompt_limits_headlines() {
        let mut news: Vec<NewsItem> = (1..=7).map(|i| NewsItem::headline(format!("Story {i}"))).collect();
        news[1].title = None;

        let prompt = build_prompt(&Symbol::new("AAPL"), &metrics(), &news, "");

        assert!(prompt.contains("[NEWS] - Story 1\n- Unknown Story\n- Story 3\n- Story 4\n- Story 5\n"));
        assert!(!prompt.contains("Story 6"));
    }

    #[test]
    fn test_prompt_truncates_summary() {
        let summary = "é".repeat(MAX_SUMMARY_CHARS + 50);
        let prompt = build_prompt(&Symbol::new("AAPL"), &KeyMetrics::default(), &[], &summary);

        let expected = format!("[SUMMARY] {}...", "é".repeat(MAX_SUMMARY_CHARS));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"é".repeat(MAX_SUMMARY_CHARS + 1)));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_parse_analysis() {
        let text = "```json\n{\"moat\": \"Ecosystem\", \"catalysts\": [\"AI\"], \"risks\": []}\n```";
        let analysis = parse_analysis(text).unwrap();

        assert_eq!(analysis.moat, "Ecosystem");
        assert_eq!(analysis.catalysts, vec!["AI".to_string()]);
        assert!(analysis.risks.is_empty());
    }

    #[test]
    fn test_parse_analysis_requires_all_keys() {
        assert!(parse_analysis(r#"{"moat": "x", "catalysts": []}"#).is_err());
        assert!(parse_analysis("I cannot help with that.").is_err());
    }
}
