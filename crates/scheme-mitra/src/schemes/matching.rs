use super::catalog::SchemeRecord;

/// Domain terms checked against both the scheme text and the profile text.
/// Substring semantics are deliberate: "farmer" also hits "Farmers".
pub const PROFILE_KEYWORDS: &[&str] = &[
    "farmer",
    "women",
    "youth",
    "student",
    "senior",
    "elder",
    "msme",
    "business",
    "entrepreneur",
    "girl",
    "female",
    "young",
    "old",
    "small",
    "enterprise",
];

const BASE_SCORE: u8 = 50;
const KEYWORD_WEIGHT: u8 = 5;

/// The score never reaches 100: the heuristic does not claim certainty.
pub const SCORE_CEILING: u8 = 95;

/// Keyword-overlap match percentage between a scheme and a free-text profile.
///
/// Deterministic placeholder for a richer signal: each keyword present in
/// both the scheme text (name + beneficiary + category) and the profile adds
/// 5 points on a base of 50, capped at 95.
pub fn match_score(scheme: &SchemeRecord, profile_text: &str) -> u8 {
    let haystack = format!(
        "{} {} {}",
        scheme.name, scheme.beneficiary, scheme.category
    )
    .to_lowercase();
    let profile = profile_text.to_lowercase();

    let matches = PROFILE_KEYWORDS
        .iter()
        .filter(|&&keyword| haystack.contains(keyword) && profile.contains(keyword))
        .count();

    let score = BASE_SCORE as usize + KEYWORD_WEIGHT as usize * matches;
    score.min(SCORE_CEILING as usize) as u8
}
