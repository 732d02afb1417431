use crate::models::Event;

/// Scores how well an event matches a set of recommendation keywords
///
/// Fixed weights, case-insensitive on the event side; keywords are expected
/// to be lowercase already (callers normalize at the boundary):
/// - +5 when the category equals a keyword exactly
/// - +3 per tag equal to a keyword exactly
/// - +2 per keyword occurring inside "title description"
///
/// Pure function; no upper bound on the score.
pub fn score(event: &Event, recommendations: &[String]) -> u32 {
    let mut score = 0;

    if recommendations.contains(&event.category.to_lowercase()) {
        score += 5;
    }

    for tag in &event.tags {
        if recommendations.contains(&tag.to_lowercase()) {
            score += 3;
        }
    }

    let event_text = format!("{} {}", event.title, event.description).to_lowercase();
    for rec in recommendations {
        if event_text.contains(rec.as_str()) {
            score += 2;
        }
    }

    score
}
