//! Canonical region vocabulary and normalization.
//!
//! Three region vocabularies coexist in the stored data:
//!
//! - the baseline library's canonical grid codes (`national_average`,
//!   `east_china`, ...),
//! - the legacy factor-library codes (`CN`, `CN-East`, ..., `Global`),
//! - free-form restaurant addresses from which a grid region can be inferred.
//!
//! [`Region`] is the single canonical vocabulary; everything else is mapped
//! onto it via [`Region::normalize`] and [`address_to_region`].

use serde::{Deserialize, Serialize};

/// Canonical grid regions used by baselines and factor matching.
///
/// The vocabulary follows the national grid operator split. Baseline records
/// use these codes directly; factor records may still carry legacy codes,
/// which [`Region::normalize`] folds back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NationalAverage,
    NorthChina,
    Northeast,
    EastChina,
    CentralChina,
    Northwest,
    Southwest,
    SouthChina,
}

/// Region used whenever a raw value is absent or unrecognized, and as the
/// relaxation target of the factor resolver.
pub const DEFAULT_REGION: Region = Region::NationalAverage;

impl Region {
    /// The canonical token for this region.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NationalAverage => "national_average",
            Region::NorthChina => "north_china",
            Region::Northeast => "northeast",
            Region::EastChina => "east_china",
            Region::CentralChina => "central_china",
            Region::Northwest => "northwest",
            Region::Southwest => "southwest",
            Region::SouthChina => "south_china",
        }
    }

    /// Map a raw region token onto the canonical vocabulary.
    ///
    /// Canonical tokens map to themselves, so the operation is idempotent:
    /// `normalize(normalize(x)) == normalize(x)` for every input. Legacy
    /// factor-library codes map to their grid equivalent. Absent, empty and
    /// unrecognized values fall back to [`DEFAULT_REGION`].
    pub fn normalize(raw: Option<&str>) -> Region {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r.trim(),
            _ => return DEFAULT_REGION,
        };
        match raw {
            "national_average" => Region::NationalAverage,
            "north_china" => Region::NorthChina,
            "northeast" | "northeast_china" => Region::Northeast,
            "east_china" => Region::EastChina,
            "central_china" => Region::CentralChina,
            "northwest" | "northwest_china" => Region::Northwest,
            "southwest" | "southwest_china" => Region::Southwest,
            "south_china" => Region::SouthChina,
            // Legacy factor-library codes
            "CN" | "Global" => Region::NationalAverage,
            "CN-East" => Region::EastChina,
            "CN-North" => Region::NorthChina,
            "CN-South" => Region::SouthChina,
            "CN-West" => Region::Northwest,
            _ => DEFAULT_REGION,
        }
    }

    /// Legacy factor-library code for this region.
    ///
    /// The factor library never had independent northeast, central or
    /// southwest codes; those grids share the nearest neighbouring code.
    pub fn factor_code(&self) -> &'static str {
        match self {
            Region::NationalAverage => "CN",
            Region::NorthChina | Region::Northeast => "CN-North",
            Region::EastChina | Region::CentralChina => "CN-East",
            Region::SouthChina => "CN-South",
            Region::Northwest | Region::Southwest => "CN-West",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Province and municipality names per grid region, used for address
/// inference. Ordered longest key first so a longer, more specific name is
/// never masked by a shorter one contained in the same address.
const ADDRESS_KEYS: &[(&str, Region)] = &[
    ("黑龙江", Region::Northeast),
    // North China grid
    ("北京", Region::NorthChina),
    ("天津", Region::NorthChina),
    ("河北", Region::NorthChina),
    ("山西", Region::NorthChina),
    ("山东", Region::NorthChina),
    // Northeast grid
    ("辽宁", Region::Northeast),
    ("吉林", Region::Northeast),
    ("沈阳", Region::Northeast),
    ("哈尔滨", Region::Northeast),
    // East China grid
    ("上海", Region::EastChina),
    ("江苏", Region::EastChina),
    ("浙江", Region::EastChina),
    ("安徽", Region::EastChina),
    ("福建", Region::EastChina),
    ("南京", Region::EastChina),
    ("杭州", Region::EastChina),
    // Central China grid
    ("河南", Region::CentralChina),
    ("湖北", Region::CentralChina),
    ("湖南", Region::CentralChina),
    ("江西", Region::CentralChina),
    ("武汉", Region::CentralChina),
    // Northwest grid
    ("陕西", Region::Northwest),
    ("甘肃", Region::Northwest),
    ("青海", Region::Northwest),
    ("宁夏", Region::Northwest),
    ("新疆", Region::Northwest),
    ("西安", Region::Northwest),
    // Southwest grid
    ("四川", Region::Southwest),
    ("重庆", Region::Southwest),
    ("云南", Region::Southwest),
    ("贵州", Region::Southwest),
    ("西藏", Region::Southwest),
    ("成都", Region::Southwest),
    // South China grid
    ("广东", Region::SouthChina),
    ("广西", Region::SouthChina),
    ("海南", Region::SouthChina),
    ("广州", Region::SouthChina),
    ("深圳", Region::SouthChina),
];

/// Infer a grid region from a free-form address by substring containment.
///
/// Returns `None` when no known province or city name appears in the
/// address.
pub fn address_to_region(address: &str) -> Option<Region> {
    if address.is_empty() {
        return None;
    }
    ADDRESS_KEYS
        .iter()
        .find(|(key, _)| address.contains(key))
        .map(|(_, region)| *region)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &[&str] = &[
        "national_average",
        "north_china",
        "northeast",
        "east_china",
        "central_china",
        "northwest",
        "southwest",
        "south_china",
    ];

    #[test]
    fn normalize_is_idempotent() {
        let raw = [
            "CN",
            "CN-East",
            "CN-North",
            "CN-South",
            "CN-West",
            "Global",
            "gibberish",
            "",
        ];
        for r in CANONICAL.iter().chain(raw.iter()) {
            let once = Region::normalize(Some(r));
            let twice = Region::normalize(Some(once.as_str()));
            assert_eq!(once, twice, "normalize not idempotent for {r:?}");
        }
    }

    #[test]
    fn canonical_tokens_map_to_themselves() {
        for token in CANONICAL {
            assert_eq!(Region::normalize(Some(token)).as_str(), *token);
        }
    }

    #[test]
    fn legacy_codes_map_to_grid_regions() {
        assert_eq!(Region::normalize(Some("CN")), Region::NationalAverage);
        assert_eq!(Region::normalize(Some("CN-East")), Region::EastChina);
        assert_eq!(Region::normalize(Some("CN-North")), Region::NorthChina);
        assert_eq!(Region::normalize(Some("CN-South")), Region::SouthChina);
        assert_eq!(Region::normalize(Some("CN-West")), Region::Northwest);
        assert_eq!(Region::normalize(Some("Global")), Region::NationalAverage);
    }

    #[test]
    fn absent_or_unknown_falls_back_to_default() {
        assert_eq!(Region::normalize(None), DEFAULT_REGION);
        assert_eq!(Region::normalize(Some("")), DEFAULT_REGION);
        assert_eq!(Region::normalize(Some("  ")), DEFAULT_REGION);
        assert_eq!(Region::normalize(Some("mars")), DEFAULT_REGION);
    }

    #[test]
    fn factor_codes_round_trip_through_normalize() {
        for token in CANONICAL {
            let region = Region::normalize(Some(token));
            let back = Region::normalize(Some(region.factor_code()));
            // Shared legacy codes collapse onto the owning grid
            assert_eq!(back.factor_code(), region.factor_code());
        }
    }

    #[test]
    fn address_inference_matches_provinces_and_cities() {
        assert_eq!(
            address_to_region("上海市浦东新区张江路100号"),
            Some(Region::EastChina)
        );
        assert_eq!(
            address_to_region("广东省深圳市南山区"),
            Some(Region::SouthChina)
        );
        assert_eq!(
            address_to_region("黑龙江省哈尔滨市道里区"),
            Some(Region::Northeast)
        );
        assert_eq!(address_to_region("Somewhere else entirely"), None);
        assert_eq!(address_to_region(""), None);
    }

    #[test]
    fn serde_uses_canonical_tokens() {
        let json = serde_json::to_string(&Region::EastChina).unwrap();
        assert_eq!(json, "\"east_china\"");
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Region::EastChina);
    }
}
