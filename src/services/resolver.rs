//! Free-text query classification
//!
//! Maps what a visitor types into the search bar onto the most likely page:
//! a candidate profile, a donation page, an elections listing for a place,
//! the vendor marketplace, or the generic search page.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use super::validation::US_STATE_CODES;

const DONATION_WORDS: &[&str] = &[
    "donate", "donation", "donations", "contribute", "contribution", "give", "fund", "chip",
];

const ELECTION_WORDS: &[&str] = &[
    "election", "elections", "vote", "voting", "ballot", "race", "races", "running", "candidates",
    "polls", "primary", "runoff",
];

const VENDOR_WORDS: &[&str] = &[
    "vendor", "vendors", "printing", "printer", "signs", "consultant", "consultants", "consulting",
    "photographer", "photography", "marketing", "designer", "mailers", "canvassing", "services",
];

const STATE_NAMES: &[(&str, &str)] = &[
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"), ("delaware", "DE"),
    ("florida", "FL"), ("georgia", "GA"), ("hawaii", "HI"), ("idaho", "ID"), ("illinois", "IL"),
    ("indiana", "IN"), ("iowa", "IA"), ("kansas", "KS"), ("kentucky", "KY"), ("louisiana", "LA"),
    ("maine", "ME"), ("maryland", "MD"), ("massachusetts", "MA"), ("michigan", "MI"),
    ("minnesota", "MN"), ("mississippi", "MS"), ("missouri", "MO"), ("montana", "MT"),
    ("nebraska", "NE"), ("nevada", "NV"), ("new hampshire", "NH"), ("new jersey", "NJ"),
    ("new mexico", "NM"), ("new york", "NY"), ("north carolina", "NC"), ("north dakota", "ND"),
    ("ohio", "OH"), ("oklahoma", "OK"), ("oregon", "OR"), ("pennsylvania", "PA"),
    ("rhode island", "RI"), ("south carolina", "SC"), ("south dakota", "SD"), ("tennessee", "TN"),
    ("texas", "TX"), ("utah", "UT"), ("vermont", "VT"), ("virginia", "VA"), ("washington", "WA"),
    ("west virginia", "WV"), ("wisconsin", "WI"), ("wyoming", "WY"),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Query must not be empty")]
    EmptyQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Candidate,
    Donate,
    Elections,
    Vendors,
    Search,
}

/// Where a query should take the visitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch {
    pub kind: RouteKind,
    pub href: String,
    /// Rough certainty between 0 and 1
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<i32>,
}

/// The parts of a candidate the resolver matches against
#[derive(Debug, Clone, Copy)]
pub struct CandidateRef<'a> {
    pub id: i32,
    pub name: &'a str,
    pub slug: &'a str,
}

/// A place mentioned in the query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_any(tokens: &[String], vocabulary: &[&str]) -> bool {
    tokens.iter().any(|t| vocabulary.contains(&t.as_str()))
}

/// True when `needle` appears in `haystack` as a run of whole words
fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

fn state_from_word(raw: &str, allow_lowercase_code: bool) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.len() == 2 {
        let is_upper = trimmed.chars().all(|c| c.is_ascii_uppercase());
        let upper = trimmed.to_ascii_uppercase();
        if (is_upper || allow_lowercase_code) && US_STATE_CODES.contains(&upper.as_str()) {
            return Some(upper);
        }
        return None;
    }
    let lower = trimmed.to_lowercase();
    STATE_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| code.to_string())
}

/// Finds a "City, ST" pair, a state name, or an upper-case state code
pub fn find_location(query: &str) -> Location {
    if let Some((before, after)) = query.rsplit_once(',') {
        let state = after
            .split_whitespace()
            .next()
            .and_then(|word| state_from_word(word, true))
            .or_else(|| state_from_word(after.trim(), true));
        if let Some(state) = state {
            let lower = before.to_ascii_lowercase();
            let city_part = match lower.rfind(" in ") {
                Some(idx) => &before[idx + 4..],
                None if lower.starts_with("in ") => &before[3..],
                None => before,
            };
            let city: Vec<&str> = city_part
                .split_whitespace()
                .rev()
                .take_while(|w| w.chars().next().is_some_and(char::is_uppercase))
                .collect();
            let city = city.into_iter().rev().collect::<Vec<_>>().join(" ");
            return Location {
                city: (!city.is_empty()).then_some(city),
                state: Some(state),
            };
        }
    }

    let lower_words = words(query);
    for (name, code) in STATE_NAMES {
        let name_words: Vec<String> = name.split(' ').map(str::to_string).collect();
        if contains_phrase(&lower_words, &name_words) {
            return Location { city: None, state: Some(code.to_string()) };
        }
    }

    let state = query.split_whitespace().find_map(|word| state_from_word(word, false));
    Location { city: None, state }
}

fn query_string(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn best_candidate<'a>(tokens: &[String], raw_lower: &str, candidates: &[CandidateRef<'a>]) -> Option<(CandidateRef<'a>, f32)> {
    let mut best: Option<(CandidateRef<'a>, f32)> = None;

    for candidate in candidates {
        let name_words = words(candidate.name);
        let confidence = if contains_phrase(tokens, &name_words) {
            0.95
        } else if !candidate.slug.is_empty()
            && raw_lower.split_whitespace().any(|w| w == candidate.slug)
        {
            0.9
        } else if name_words.len() > 1
            && name_words.last().is_some_and(|last| last.len() >= 3 && tokens.contains(last))
        {
            0.6
        } else {
            continue;
        };

        let better = match &best {
            None => true,
            Some((current, score)) => {
                confidence > *score || (confidence == *score && candidate.name.len() > current.name.len())
            }
        };
        if better {
            best = Some((*candidate, confidence));
        }
    }

    best
}

/// Classifies a free-text query into the page it most likely refers to
///
/// ### Arguments
///
/// * `query` - What the visitor typed
/// * `candidates` - Visible candidates to match names and slugs against
///
/// ### Returns
///
/// The route to redirect to, or an error when the query is blank
pub fn resolve_semantic_route(query: &str, candidates: &[CandidateRef<'_>]) -> Result<RouteMatch, ResolveError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ResolveError::EmptyQuery);
    }

    let tokens = words(query);
    let raw_lower = query.to_lowercase();

    if let Some((candidate, confidence)) = best_candidate(&tokens, &raw_lower, candidates) {
        let (kind, href) = if has_any(&tokens, DONATION_WORDS) {
            (RouteKind::Donate, format!("/candidates/{}/donate", candidate.slug))
        } else {
            (RouteKind::Candidate, format!("/candidates/{}", candidate.slug))
        };
        return Ok(RouteMatch { kind, href, confidence, candidate_id: Some(candidate.id) });
    }

    let election_intent = has_any(&tokens, ELECTION_WORDS);
    let location = find_location(query);
    if election_intent || location.state.is_some() {
        let mut pairs = Vec::new();
        if let Some(city) = &location.city {
            pairs.push(("city", city.as_str()));
        }
        if let Some(state) = &location.state {
            pairs.push(("state", state.as_str()));
        }
        let href = if pairs.is_empty() {
            "/elections".to_string()
        } else {
            format!("/elections?{}", query_string(&pairs))
        };
        let confidence = match (election_intent, location.state.is_some()) {
            (true, true) => 0.85,
            (false, true) => 0.7,
            _ => 0.6,
        };
        return Ok(RouteMatch { kind: RouteKind::Elections, href, confidence, candidate_id: None });
    }

    if has_any(&tokens, VENDOR_WORDS) {
        return Ok(RouteMatch {
            kind: RouteKind::Vendors,
            href: format!("/vendors?{}", query_string(&[("search", query)])),
            confidence: 0.6,
            candidate_id: None,
        });
    }

    Ok(RouteMatch {
        kind: RouteKind::Search,
        href: format!("/search?{}", query_string(&[("q", query)])),
        confidence: 0.2,
        candidate_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<CandidateRef<'static>> {
        vec![
            CandidateRef { id: 1, name: "Jane Doe", slug: "jane-doe" },
            CandidateRef { id: 2, name: "Marcus Lee", slug: "marcus-lee" },
            CandidateRef { id: 3, name: "Marcus Lee-Warren", slug: "marcus-lee-warren" },
        ]
    }

    #[test]
    fn test_blank_query_is_rejected() {
        assert_eq!(resolve_semantic_route("   ", &roster()), Err(ResolveError::EmptyQuery));
    }

    #[test]
    fn test_candidate_by_name() {
        let route = resolve_semantic_route("who is jane doe", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Candidate);
        assert_eq!(route.href, "/candidates/jane-doe");
        assert_eq!(route.candidate_id, Some(1));
    }

    #[test]
    fn test_candidate_by_slug() {
        let route = resolve_semantic_route("marcus-lee-warren", &roster()).unwrap();
        assert_eq!(route.candidate_id, Some(3));
    }

    #[test]
    fn test_longest_name_wins() {
        let route = resolve_semantic_route("Marcus Lee Warren platform", &roster()).unwrap();
        assert_eq!(route.candidate_id, Some(3));
    }

    #[test]
    fn test_donation_intent() {
        let route = resolve_semantic_route("donate to Jane Doe", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Donate);
        assert_eq!(route.href, "/candidates/jane-doe/donate");
    }

    #[test]
    fn test_last_name_match() {
        let route = resolve_semantic_route("doe campaign", &roster()).unwrap();
        assert_eq!(route.candidate_id, Some(1));
        assert!(route.confidence < 0.9);
    }

    #[test]
    fn test_elections_with_city_and_state() {
        let route = resolve_semantic_route("elections in Round Rock, TX", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Elections);
        assert_eq!(route.href, "/elections?city=Round+Rock&state=TX");
        assert_eq!(route.confidence, 0.85);
    }

    #[test]
    fn test_location_without_intent() {
        let route = resolve_semantic_route("Austin, Texas", &roster()).unwrap();
        assert_eq!(route.href, "/elections?city=Austin&state=TX");

        let route = resolve_semantic_route("what is happening in new york", &roster()).unwrap();
        assert_eq!(route.href, "/elections?state=NY");
    }

    #[test]
    fn test_lowercase_words_are_not_state_codes() {
        // "in" and "or" must not be read as Indiana and Oregon
        let route = resolve_semantic_route("signs in or near downtown", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Vendors);
    }

    #[test]
    fn test_election_intent_only() {
        let route = resolve_semantic_route("when do I vote", &roster()).unwrap();
        assert_eq!(route.href, "/elections");
    }

    #[test]
    fn test_vendor_intent() {
        let route = resolve_semantic_route("yard sign printing", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Vendors);
        assert_eq!(route.href, "/vendors?search=yard+sign+printing");
    }

    #[test]
    fn test_fallback_search() {
        let route = resolve_semantic_route("school board budget", &roster()).unwrap();
        assert_eq!(route.kind, RouteKind::Search);
        assert_eq!(route.href, "/search?q=school+board+budget");
        assert_eq!(route.candidate_id, None);
    }
}
