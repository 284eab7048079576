/// One candidate airport for an ambiguous city.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportOption {
    pub code: &'static str,
    pub name: &'static str,
}

/// Outcome of resolving a free-form city or airport phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum CityResolution {
    /// The phrase maps to exactly one airport.
    Exact { code: String },
    /// The phrase names a city served by several airports. The caller
    /// must disambiguate; searching on the primary code alone would
    /// silently guess.
    MultiAirport {
        city: String,
        primary: String,
        options: Vec<AirportOption>,
    },
    /// No exact entry, but the phrase resembles known city names.
    /// The placeholder code lets a best-effort search proceed, though
    /// resolving the ambiguity first is preferred.
    Partial {
        placeholder: String,
        suggestions: Vec<String>,
    },
    /// Nothing matched; the uppercased phrase is used as-is.
    Unknown { placeholder: String },
}

/// Cities with more than one serving airport. The first entry is the
/// conventional primary.
const MULTI_AIRPORT: &[(&str, &[AirportOption])] = &[
    (
        "new york",
        &[
            AirportOption { code: "JFK", name: "John F. Kennedy International" },
            AirportOption { code: "LGA", name: "LaGuardia" },
            AirportOption { code: "EWR", name: "Newark Liberty International" },
        ],
    ),
    (
        "new york city",
        &[
            AirportOption { code: "JFK", name: "John F. Kennedy International" },
            AirportOption { code: "LGA", name: "LaGuardia" },
            AirportOption { code: "EWR", name: "Newark Liberty International" },
        ],
    ),
    (
        "london",
        &[
            AirportOption { code: "LHR", name: "Heathrow" },
            AirportOption { code: "LGW", name: "Gatwick" },
            AirportOption { code: "STN", name: "Stansted" },
            AirportOption { code: "LTN", name: "Luton" },
        ],
    ),
    (
        "paris",
        &[
            AirportOption { code: "CDG", name: "Charles de Gaulle" },
            AirportOption { code: "ORY", name: "Orly" },
        ],
    ),
    (
        "tokyo",
        &[
            AirportOption { code: "HND", name: "Haneda" },
            AirportOption { code: "NRT", name: "Narita International" },
        ],
    ),
    (
        "houston",
        &[
            AirportOption { code: "IAH", name: "George Bush Intercontinental" },
            AirportOption { code: "HOU", name: "William P. Hobby" },
        ],
    ),
    (
        "dallas",
        &[
            AirportOption { code: "DFW", name: "Dallas/Fort Worth International" },
            AirportOption { code: "DAL", name: "Dallas Love Field" },
        ],
    ),
    (
        "chicago",
        &[
            AirportOption { code: "ORD", name: "O'Hare International" },
            AirportOption { code: "MDW", name: "Midway International" },
        ],
    ),
    (
        "washington",
        &[
            AirportOption { code: "IAD", name: "Dulles International" },
            AirportOption { code: "DCA", name: "Ronald Reagan National" },
        ],
    ),
];

/// Single-airport cities and common slang.
const CITY_CODES: &[(&str, &str)] = &[
    ("atlanta", "ATL"),
    ("los angeles", "LAX"),
    ("la", "LAX"),
    ("san francisco", "SFO"),
    ("san fran", "SFO"),
    ("miami", "MIA"),
    ("las vegas", "LAS"),
    ("vegas", "LAS"),
    ("boston", "BOS"),
    ("seattle", "SEA"),
    ("denver", "DEN"),
    ("phoenix", "PHX"),
    ("austin", "AUS"),
    ("orlando", "MCO"),
    ("san diego", "SAN"),
    ("philadelphia", "PHL"),
    ("philly", "PHL"),
    ("new orleans", "MSY"),
    ("nashville", "BNA"),
    ("detroit", "DTW"),
    ("minneapolis", "MSP"),
    ("salt lake city", "SLC"),
    ("toronto", "YYZ"),
    ("vancouver", "YVR"),
    ("mexico city", "MEX"),
    ("cancun", "CUN"),
    ("amsterdam", "AMS"),
    ("frankfurt", "FRA"),
    ("munich", "MUC"),
    ("berlin", "BER"),
    ("madrid", "MAD"),
    ("barcelona", "BCN"),
    ("rome", "FCO"),
    ("lisbon", "LIS"),
    ("dublin", "DUB"),
    ("zurich", "ZRH"),
    ("vienna", "VIE"),
    ("istanbul", "IST"),
    ("dubai", "DXB"),
    ("doha", "DOH"),
    ("delhi", "DEL"),
    ("mumbai", "BOM"),
    ("singapore", "SIN"),
    ("bangkok", "BKK"),
    ("hong kong", "HKG"),
    ("seoul", "ICN"),
    ("sydney", "SYD"),
    ("melbourne", "MEL"),
    ("auckland", "AKL"),
    ("sao paulo", "GRU"),
    ("buenos aires", "EZE"),
    ("johannesburg", "JNB"),
    ("cairo", "CAI"),
];

/// Resolve a free-form city/airport phrase. Case-insensitive, trimmed.
pub fn resolve_city(phrase: &str) -> CityResolution {
    let needle = phrase.trim().to_lowercase();
    if needle.is_empty() {
        return CityResolution::Unknown {
            placeholder: String::new(),
        };
    }

    // A bare three-letter token is taken as an IATA code.
    if needle.len() == 3 && needle.chars().all(|c| c.is_ascii_alphabetic()) {
        return CityResolution::Exact {
            code: needle.to_uppercase(),
        };
    }

    if let Some((city, options)) = MULTI_AIRPORT.iter().find(|(name, _)| *name == needle) {
        return CityResolution::MultiAirport {
            city: (*city).to_string(),
            primary: options[0].code.to_string(),
            options: options.to_vec(),
        };
    }

    if let Some((_, code)) = CITY_CODES.iter().find(|(name, _)| *name == needle) {
        return CityResolution::Exact {
            code: (*code).to_string(),
        };
    }

    let suggestions = fuzzy_candidates(&needle);
    let placeholder = phrase.trim().to_uppercase();
    if suggestions.is_empty() {
        CityResolution::Unknown { placeholder }
    } else {
        CityResolution::Partial {
            placeholder,
            suggestions,
        }
    }
}

/// Up to 5 known city names resembling the phrase: substring containment
/// in either direction, or a shared four-character prefix so a dropped
/// letter still surfaces the city.
fn fuzzy_candidates(needle: &str) -> Vec<String> {
    let prefix: String = needle.chars().take(4).collect();
    let known = MULTI_AIRPORT
        .iter()
        .map(|(name, _)| *name)
        .chain(CITY_CODES.iter().map(|(name, _)| *name));

    let mut out = Vec::new();
    for name in known {
        let hit = name.contains(needle)
            || needle.contains(name)
            || (prefix.chars().count() >= 4 && name.starts_with(prefix.as_str()));
        if hit && !out.contains(&name.to_string()) {
            out.push(name.to_string());
            if out.len() == 5 {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_is_multi_airport() {
        match resolve_city("new york") {
            CityResolution::MultiAirport { primary, options, .. } => {
                assert_eq!(primary, "JFK");
                let codes: Vec<&str> = options.iter().map(|o| o.code).collect();
                assert_eq!(codes, vec!["JFK", "LGA", "EWR"]);
            }
            other => panic!("expected multi-airport, got {:?}", other),
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(matches!(
            resolve_city("  New York  "),
            CityResolution::MultiAirport { .. }
        ));
    }

    #[test]
    fn test_iata_code_passes_through() {
        assert_eq!(
            resolve_city("IAH"),
            CityResolution::Exact { code: "IAH".to_string() }
        );
        assert_eq!(
            resolve_city("dfw"),
            CityResolution::Exact { code: "DFW".to_string() }
        );
    }

    #[test]
    fn test_single_airport_city() {
        assert_eq!(
            resolve_city("Atlanta"),
            CityResolution::Exact { code: "ATL".to_string() }
        );
    }

    #[test]
    fn test_slang_entry() {
        assert_eq!(
            resolve_city("vegas"),
            CityResolution::Exact { code: "LAS".to_string() }
        );
    }

    #[test]
    fn test_typo_gets_fuzzy_suggestions() {
        match resolve_city("houstn") {
            CityResolution::Partial { placeholder, suggestions } => {
                assert_eq!(placeholder, "HOUSTN");
                assert!(suggestions.contains(&"houston".to_string()));
            }
            other => panic!("expected partial match, got {:?}", other),
        }
    }

    #[test]
    fn test_substring_gets_fuzzy_suggestions() {
        match resolve_city("angeles") {
            CityResolution::Partial { suggestions, .. } => {
                assert!(suggestions.contains(&"los angeles".to_string()));
            }
            other => panic!("expected partial match, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestions_capped_at_five() {
        // "an" appears in far more than five known city names.
        match resolve_city("an") {
            CityResolution::Partial { suggestions, .. } => assert_eq!(suggestions.len(), 5),
            other => panic!("expected partial match, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_falls_back_to_uppercase() {
        assert_eq!(
            resolve_city("xqzzistan"),
            CityResolution::Unknown { placeholder: "XQZZISTAN".to_string() }
        );
    }
}
