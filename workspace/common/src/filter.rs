use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel region value meaning "no region restriction".
pub const ALL_REGIONS: &str = "All";

/// Region half of a metrics filter.
///
/// `All` leaves every region in place; `Named` keeps only rows whose region
/// matches exactly. Valid named values are constrained to the regions
/// observed in the dataset (see [`FilterOptions`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(from = "String", into = "String")]
pub enum RegionFilter {
    All,
    Named(String),
}

impl RegionFilter {
    /// Whether a row with the given region passes this filter.
    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Named(name) => name == region,
        }
    }
}

impl From<String> for RegionFilter {
    fn from(value: String) -> Self {
        if value == ALL_REGIONS {
            RegionFilter::All
        } else {
            RegionFilter::Named(value)
        }
    }
}

impl From<Option<String>> for RegionFilter {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(region) => RegionFilter::from(region),
            None => RegionFilter::All,
        }
    }
}

impl From<RegionFilter> for String {
    fn from(value: RegionFilter) -> Self {
        match value {
            RegionFilter::All => ALL_REGIONS.to_string(),
            RegionFilter::Named(name) => name,
        }
    }
}

impl std::fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionFilter::All => f.write_str(ALL_REGIONS),
            RegionFilter::Named(name) => f.write_str(name),
        }
    }
}

/// Criteria applied to a dataset before aggregation.
///
/// `year` is required and must be one of the dataset's distinct years;
/// callers populate their choices from [`FilterOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilterCriteria {
    /// Calendar year to keep (e.g. 2023)
    pub year: i32,
    /// Region to keep, or the "All" sentinel
    pub region: RegionFilter,
}

impl FilterCriteria {
    pub fn new(year: i32, region: RegionFilter) -> Self {
        Self { year, region }
    }
}

/// The filter values a dataset supports, for populating filter widgets.
///
/// Years ascend; regions ascend with the "All" sentinel prepended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilterOptions {
    /// Distinct years present in the dataset
    pub years: Vec<i32>,
    /// "All" followed by the distinct regions present in the dataset
    pub regions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_round_trips_through_serde() {
        let json = serde_json::to_string(&RegionFilter::All).unwrap();
        assert_eq!(json, "\"All\"");
        let parsed: RegionFilter = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(parsed, RegionFilter::All);
    }

    #[test]
    fn named_region_round_trips_through_serde() {
        let parsed: RegionFilter = serde_json::from_str("\"East\"").unwrap();
        assert_eq!(parsed, RegionFilter::Named("East".to_string()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"East\"");
    }

    #[test]
    fn region_filter_matches() {
        assert!(RegionFilter::All.matches("East"));
        assert!(RegionFilter::Named("East".to_string()).matches("East"));
        assert!(!RegionFilter::Named("East".to_string()).matches("West"));
    }

    #[test]
    fn missing_region_means_all() {
        assert_eq!(RegionFilter::from(None), RegionFilter::All);
        assert_eq!(
            RegionFilter::from(Some("West".to_string())),
            RegionFilter::Named("West".to_string())
        );
    }
}
