// src/pipeline/vocab.rs
//
// Controlled-vocabulary normalizers. Raw platform labels (Italian and
// English) are mapped onto small closed enumerations through ordered rule
// tables; unrecognized input always lands on the designated fallback member,
// never on an error.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level property category, collapsing the platform's structure types
/// (hotel, motel, resort vs. apartments, B&Bs, villas, farm stays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Hotel,
    Apartment,
    Other,
}

/// Hotel-like structure types. Checked before the apartment keywords.
const HOTEL_KEYWORDS: &[&str] = &[
    "hotel", "motel", "resort", "residence", "locand", "villaggi",
];

/// Apartment-like structure types ("locand" and friends are stems so both
/// singular and plural labels match).
const APARTMENT_KEYWORDS: &[&str] = &[
    "appartament",
    "apartment",
    "bed & breakfast",
    "b&b",
    "casa",
    "case",
    "affittacamere",
    "vill",
    "ostell",
    "hostel",
    "agriturism",
    "chalet",
    "campeggi",
    "homestay",
    "famiglia",
];

impl PropertyCategory {
    /// Classifies a free-text structure label. No match falls back to
    /// [`PropertyCategory::Other`].
    pub fn from_label(label: &str) -> Self {
        let lowered = normalize(label);
        if HOTEL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            PropertyCategory::Hotel
        } else if APARTMENT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            PropertyCategory::Apartment
        } else {
            PropertyCategory::Other
        }
    }
}

/// Accommodation level of a single sellable unit, as advertised in rate and
/// room labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationLevel {
    Rooms,
    JuniorSuite,
    Suite,
    Apartment,
    Villa,
    Dependence,
    Studio,
    Bungalow,
    Dormitory,
    Other,
}

static LEVEL_MAP: Lazy<HashMap<&'static str, AccommodationLevel>> = Lazy::new(|| {
    use AccommodationLevel::*;
    HashMap::from([
        ("camera", Rooms),
        ("camere", Rooms),
        ("room", Rooms),
        ("rooms", Rooms),
        ("studio room", Rooms),
        ("junior suite", JuniorSuite),
        ("suite", Suite),
        ("appartamento", Apartment),
        ("appartamenti", Apartment),
        ("apartment", Apartment),
        ("apartments", Apartment),
        ("villa", Villa),
        ("ville", Villa),
        ("villetta", Villa),
        ("castello", Villa),
        ("castelli", Villa),
        ("castelletto", Villa),
        ("chalet", Villa),
        ("depandance", Dependence),
        ("studio", Studio),
        ("bungalow", Bungalow),
        ("dormitory", Dormitory),
    ])
});

impl AccommodationLevel {
    /// Extracts the accommodation level from an advertised unit label.
    ///
    /// Longest leading phrase wins, so "junior suite" beats "suite" and
    /// "studio room" beats "studio"; then single words anywhere in the label
    /// are tried. No match falls back to [`AccommodationLevel::Other`].
    pub fn from_label(label: &str) -> Self {
        let lowered = normalize(label);
        let words: Vec<&str> = lowered.split_whitespace().collect();
        for n in (1..=words.len()).rev() {
            let phrase = words[..n].join(" ");
            if let Some(level) = LEVEL_MAP.get(phrase.as_str()) {
                return *level;
            }
        }
        for word in &words {
            if let Some(level) = LEVEL_MAP.get(*word) {
                return *level;
            }
        }
        AccommodationLevel::Other
    }
}

/// Accommodation tier derived from the label, star rating and amenity count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationTier {
    Luxury,
    Upscale,
    Midscale,
    Budget,
    Unknown,
}

/// Ordered keyword rules, first match wins. Rule priority is fixed:
/// Luxury > Upscale > Midscale > Budget, so a label carrying both "luxury"
/// and "budget" keywords classifies as Luxury.
const TIER_RULES: &[(AccommodationTier, &[&str])] = &[
    (
        AccommodationTier::Luxury,
        &["luxury", "lusso", "deluxe", "palace", "grand", "5 stelle"],
    ),
    (
        AccommodationTier::Upscale,
        &["boutique", "premium", "superior", "executive"],
    ),
    (
        AccommodationTier::Midscale,
        &["comfort", "standard", "classic", "classica"],
    ),
    (
        AccommodationTier::Budget,
        &["budget", "economy", "economica", "low cost", "basic"],
    ),
];

impl AccommodationTier {
    /// Classifies an accommodation into a tier. Deterministic and total:
    /// keyword rules first (fixed priority order), then star rating
    /// (5 -> Luxury, 4 -> Upscale, 3 -> Midscale, 1-2 -> Budget), then
    /// amenity count (>=20 Upscale, >=8 Midscale, >=1 Budget), otherwise
    /// [`AccommodationTier::Unknown`].
    pub fn classify(label: Option<&str>, stars: Option<i64>, amenities: Option<i64>) -> Self {
        if let Some(label) = label {
            let lowered = normalize(label);
            for (tier, keywords) in TIER_RULES {
                if keywords.iter().any(|k| lowered.contains(k)) {
                    return *tier;
                }
            }
        }
        match stars {
            Some(s) if s >= 5 => return AccommodationTier::Luxury,
            Some(4) => return AccommodationTier::Upscale,
            Some(3) => return AccommodationTier::Midscale,
            Some(s) if (1..=2).contains(&s) => return AccommodationTier::Budget,
            _ => {}
        }
        match amenities {
            Some(a) if a >= 20 => AccommodationTier::Upscale,
            Some(a) if a >= 8 => AccommodationTier::Midscale,
            Some(a) if a >= 1 => AccommodationTier::Budget,
            _ => AccommodationTier::Unknown,
        }
    }
}

/// Fallback occupancy derived from the room label when the export carries no
/// numeric capacity fields. Larger capacities are checked first so "family
/// room with double bed" reads as 4, not 2.
pub fn occupancy_from_label(label: &str) -> Option<i64> {
    let lowered = normalize(label);
    const BY_SIZE: &[(i64, &[&str])] = &[
        (4, &["quadrupla", "quad", "family", "famiglia"]),
        (3, &["tripla", "triple"]),
        (2, &["doppia", "double", "twin", "matrimoniale"]),
        (1, &["singola", "single"]),
    ];
    for (capacity, keywords) in BY_SIZE {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return Some(*capacity);
        }
    }
    None
}

/// Case folding plus whitespace normalization applied before any rule match.
fn normalize(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_category_rules() {
        assert_eq!(PropertyCategory::from_label("Hotel"), PropertyCategory::Hotel);
        assert_eq!(PropertyCategory::from_label("Motel"), PropertyCategory::Hotel);
        assert_eq!(
            PropertyCategory::from_label("Villaggi turistici"),
            PropertyCategory::Hotel
        );
        assert_eq!(
            PropertyCategory::from_label("Appartamenti"),
            PropertyCategory::Apartment
        );
        assert_eq!(
            PropertyCategory::from_label("Bed & Breakfast"),
            PropertyCategory::Apartment
        );
        assert_eq!(
            PropertyCategory::from_label("Agriturismi"),
            PropertyCategory::Apartment
        );
        assert_eq!(
            PropertyCategory::from_label("spaceship"),
            PropertyCategory::Other
        );
    }

    #[test]
    fn test_level_longest_phrase_wins() {
        assert_eq!(
            AccommodationLevel::from_label("Junior Suite"),
            AccommodationLevel::JuniorSuite
        );
        assert_eq!(
            AccommodationLevel::from_label("Studio Room"),
            AccommodationLevel::Rooms
        );
        assert_eq!(
            AccommodationLevel::from_label("Suite con vista"),
            AccommodationLevel::Suite
        );
        assert_eq!(
            AccommodationLevel::from_label("Camera Doppia Deluxe"),
            AccommodationLevel::Rooms
        );
    }

    #[test]
    fn test_level_word_fallback_and_other() {
        // "Deluxe" is not a level; "appartamento" later in the label still matches.
        assert_eq!(
            AccommodationLevel::from_label("Deluxe appartamento"),
            AccommodationLevel::Apartment
        );
        assert_eq!(
            AccommodationLevel::from_label("qualcosa di strano"),
            AccommodationLevel::Other
        );
        assert_eq!(AccommodationLevel::from_label(""), AccommodationLevel::Other);
    }

    #[test]
    fn test_tier_keyword_priority() {
        // Both keywords present: Luxury rules are checked first.
        assert_eq!(
            AccommodationTier::classify(Some("budget luxury loft"), None, None),
            AccommodationTier::Luxury
        );
        assert_eq!(
            AccommodationTier::classify(Some("Camera Economica"), Some(5), None),
            AccommodationTier::Budget
        );
    }

    #[test]
    fn test_tier_star_and_amenity_fallback() {
        assert_eq!(
            AccommodationTier::classify(Some("camera"), Some(5), None),
            AccommodationTier::Luxury
        );
        assert_eq!(
            AccommodationTier::classify(None, Some(4), None),
            AccommodationTier::Upscale
        );
        assert_eq!(
            AccommodationTier::classify(None, Some(1), None),
            AccommodationTier::Budget
        );
        assert_eq!(
            AccommodationTier::classify(None, None, Some(25)),
            AccommodationTier::Upscale
        );
        assert_eq!(
            AccommodationTier::classify(None, None, Some(9)),
            AccommodationTier::Midscale
        );
        assert_eq!(
            AccommodationTier::classify(None, None, Some(2)),
            AccommodationTier::Budget
        );
    }

    #[test]
    fn test_tier_total_with_unknown_fallback() {
        assert_eq!(
            AccommodationTier::classify(None, None, None),
            AccommodationTier::Unknown
        );
        assert_eq!(
            AccommodationTier::classify(Some("camera"), Some(0), Some(0)),
            AccommodationTier::Unknown
        );
        // Determinism: same tuple, same tier.
        let first = AccommodationTier::classify(Some("Suite Superior"), Some(3), Some(12));
        let second = AccommodationTier::classify(Some("Suite Superior"), Some(3), Some(12));
        assert_eq!(first, second);
    }

    #[test]
    fn test_occupancy_from_label() {
        assert_eq!(occupancy_from_label("Camera Singola"), Some(1));
        assert_eq!(occupancy_from_label("Camera Matrimoniale"), Some(2));
        assert_eq!(occupancy_from_label("Camera Tripla"), Some(3));
        assert_eq!(occupancy_from_label("Family room with double bed"), Some(4));
        assert_eq!(occupancy_from_label("Suite"), None);
    }
}
