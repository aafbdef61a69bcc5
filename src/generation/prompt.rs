//! Insight prompt construction.

use super::SummaryItem;
use crate::journal::timekey::bucket_label;
use crate::journal::types::{BucketKey, Granularity};

/// Build the coaching prompt for a timeframe.
///
/// Items are listed highest rating first; ties keep their input order.
pub fn build_insight_prompt(
    items: &[SummaryItem],
    timeframe_type: Granularity,
    timeframe_key: &BucketKey,
) -> String {
    let timeframe_label = bucket_label(timeframe_key, timeframe_type);

    let mut sorted: Vec<&SummaryItem> = items.iter().collect();
    sorted.sort_by(|a, b| b.rating.cmp(&a.rating));
    let listing = sorted
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. [Impact: {}/10] {}", i + 1, item.rating, item.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an insightful career coach analyzing someone's accomplishments for {timeframe_label}.

Accomplishments ({count} total):
{listing}

Please provide a thoughtful, encouraging analysis in 3-4 paragraphs that:
1. Identifies patterns and themes across their accomplishments
2. Highlights their highest-impact work (ratings 8-10)
3. Notes areas of growth or consistent focus
4. Offers one actionable insight or suggestion for the next period

Keep the tone warm, professional, and motivating. Use markdown formatting for readability.",
        count = items.len(),
    )
}
