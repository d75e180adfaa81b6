//! Country alias table.
//!
//! Policy text names countries in many ways ("the United States", "U.S.",
//! "Chinese imports", "PRC"). Extraction and graph construction both resolve
//! to the canonical title-case names in this table so that an extracted
//! country can be looked up as a graph node.

use std::collections::BTreeSet;

/// One canonical country and the ways it appears in text.
#[derive(Debug, Clone, Copy)]
pub struct CountryEntry {
    /// Canonical title-case name.
    pub name: &'static str,
    pub iso2: &'static str,
    pub iso3: &'static str,
    /// Lower-case substrings matched anywhere in lower-cased text.
    pub aliases: &'static [&'static str],
    /// Upper-case abbreviations matched as whole tokens, case-sensitively.
    pub codes: &'static [&'static str],
}

pub const COUNTRY_TABLE: &[CountryEntry] = &[
    CountryEntry {
        name: "United States",
        iso2: "US",
        iso3: "USA",
        aliases: &["united states", "u.s.", "american"],
        codes: &["US", "USA"],
    },
    CountryEntry {
        name: "China",
        iso2: "CN",
        iso3: "CHN",
        aliases: &["china", "chinese", "people's republic"],
        codes: &["PRC", "CN", "CHN"],
    },
    CountryEntry {
        name: "Mexico",
        iso2: "MX",
        iso3: "MEX",
        aliases: &["mexico", "mexican"],
        codes: &["MX", "MEX"],
    },
    CountryEntry {
        name: "Canada",
        iso2: "CA",
        iso3: "CAN",
        aliases: &["canada", "canadian"],
        codes: &["CAN"],
    },
    CountryEntry {
        name: "Japan",
        iso2: "JP",
        iso3: "JPN",
        aliases: &["japan", "japanese"],
        codes: &["JPN"],
    },
    CountryEntry {
        name: "Germany",
        iso2: "DE",
        iso3: "DEU",
        aliases: &["germany", "german"],
        codes: &["DEU"],
    },
    CountryEntry {
        name: "European Union",
        iso2: "EU",
        iso3: "EUU",
        aliases: &["european union", "europe"],
        codes: &["EU"],
    },
    CountryEntry {
        name: "United Kingdom",
        iso2: "GB",
        iso3: "GBR",
        aliases: &["united kingdom", "britain", "british"],
        codes: &["UK", "GBR"],
    },
    CountryEntry {
        name: "South Korea",
        iso2: "KR",
        iso3: "KOR",
        aliases: &["south korea", "korea", "korean"],
        codes: &["ROK", "KOR"],
    },
    CountryEntry {
        name: "India",
        iso2: "IN",
        iso3: "IND",
        aliases: &["india", "indian"],
        codes: &["IND"],
    },
    CountryEntry {
        name: "Vietnam",
        iso2: "VN",
        iso3: "VNM",
        aliases: &["vietnam", "viet nam", "vietnamese"],
        codes: &["VNM"],
    },
    CountryEntry {
        name: "Taiwan",
        iso2: "TW",
        iso3: "TWN",
        aliases: &["taiwan", "taiwanese"],
        codes: &["TWN"],
    },
    CountryEntry {
        name: "Brazil",
        iso2: "BR",
        iso3: "BRA",
        aliases: &["brazil", "brazilian"],
        codes: &["BRA"],
    },
    CountryEntry {
        name: "France",
        iso2: "FR",
        iso3: "FRA",
        aliases: &["france", "french"],
        codes: &["FRA"],
    },
    CountryEntry {
        name: "Italy",
        iso2: "IT",
        iso3: "ITA",
        aliases: &["italy", "italian"],
        codes: &["ITA"],
    },
    CountryEntry {
        name: "Australia",
        iso2: "AU",
        iso3: "AUS",
        aliases: &["australia", "australian"],
        codes: &["AUS"],
    },
    CountryEntry {
        name: "Russia",
        iso2: "RU",
        iso3: "RUS",
        aliases: &["russia", "russian"],
        codes: &["RUS"],
    },
    CountryEntry {
        name: "Turkey",
        iso2: "TR",
        iso3: "TUR",
        aliases: &["turkey", "turkish", "turkiye"],
        codes: &["TUR"],
    },
    CountryEntry {
        name: "Indonesia",
        iso2: "ID",
        iso3: "IDN",
        aliases: &["indonesia", "indonesian"],
        codes: &["IDN"],
    },
    CountryEntry {
        name: "Thailand",
        iso2: "TH",
        iso3: "THA",
        aliases: &["thailand", "thai"],
        codes: &["THA"],
    },
    CountryEntry {
        name: "Malaysia",
        iso2: "MY",
        iso3: "MYS",
        aliases: &["malaysia", "malaysian"],
        codes: &["MYS"],
    },
    CountryEntry {
        name: "Singapore",
        iso2: "SG",
        iso3: "SGP",
        aliases: &["singapore"],
        codes: &["SGP"],
    },
    CountryEntry {
        name: "Switzerland",
        iso2: "CH",
        iso3: "CHE",
        aliases: &["switzerland", "swiss"],
        codes: &["CHE"],
    },
    CountryEntry {
        name: "Netherlands",
        iso2: "NL",
        iso3: "NLD",
        aliases: &["netherlands", "dutch"],
        codes: &["NLD"],
    },
    CountryEntry {
        name: "Saudi Arabia",
        iso2: "SA",
        iso3: "SAU",
        aliases: &["saudi arabia", "saudi"],
        codes: &["KSA", "SAU"],
    },
    CountryEntry {
        name: "South Africa",
        iso2: "ZA",
        iso3: "ZAF",
        aliases: &["south africa"],
        codes: &["ZAF"],
    },
    CountryEntry {
        name: "Argentina",
        iso2: "AR",
        iso3: "ARG",
        aliases: &["argentina", "argentine"],
        codes: &["ARG"],
    },
];

/// Resolve a country name, alias, or ISO code to its canonical name.
///
/// Matching is exact after trimming: case-insensitive for names and aliases,
/// case-insensitive for ISO codes. Returns `None` for unknown inputs.
pub fn canonical_country(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    COUNTRY_TABLE
        .iter()
        .find(|entry| {
            entry.name.to_lowercase() == lower
                || entry.iso2.eq_ignore_ascii_case(trimmed)
                || entry.iso3.eq_ignore_ascii_case(trimmed)
                || entry.aliases.iter().any(|a| *a == lower)
                || entry.codes.iter().any(|c| c.eq_ignore_ascii_case(trimmed))
        })
        .map(|entry| entry.name)
}

/// Canonical name if known, otherwise the trimmed input in title case.
///
/// Used for graph node names so that rows keyed by ISO code and rows keyed by
/// full name land on the same node.
pub fn normalize_country(input: &str) -> String {
    match canonical_country(input) {
        Some(name) => name.to_string(),
        None => title_case(input.trim()),
    }
}

/// Find every country mentioned in `text`.
///
/// Aliases are matched as lower-case substrings; abbreviations such as "US"
/// or "PRC" only as whole upper-case tokens so that the pronoun "us" does
/// not count as a mention.
pub fn find_countries(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    COUNTRY_TABLE
        .iter()
        .filter(|entry| {
            entry.aliases.iter().any(|alias| lower.contains(alias))
                || entry.codes.iter().any(|code| tokens.contains(code))
        })
        .map(|entry| entry.name.to_string())
        .collect()
}

/// Title-case each whitespace-separated word ("united states" → "United States").
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_from_codes_and_names() {
        assert_eq!(canonical_country("US"), Some("United States"));
        assert_eq!(canonical_country("usa"), Some("United States"));
        assert_eq!(canonical_country("CN"), Some("China"));
        assert_eq!(canonical_country("  china "), Some("China"));
        assert_eq!(canonical_country("Atlantis"), None);
        assert_eq!(canonical_country(""), None);
    }

    #[test]
    fn finds_mentions_in_text() {
        let found = find_countries(
            "The United States will impose a 25% tariff on imports from China",
        );
        assert!(found.contains("United States"));
        assert!(found.contains("China"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn pronoun_us_is_not_a_country() {
        let found = find_countries("Let us consider the impact on trade");
        assert!(found.is_empty());
    }

    #[test]
    fn abbreviations_match_as_tokens() {
        let found = find_countries("US and PRC officials met");
        assert!(found.contains("United States"));
        assert!(found.contains("China"));
    }

    #[test]
    fn normalize_unknown_title_cases() {
        assert_eq!(normalize_country("new zealand"), "New Zealand");
        assert_eq!(normalize_country("JP"), "Japan");
    }
}
