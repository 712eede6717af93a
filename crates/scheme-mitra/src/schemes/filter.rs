use super::catalog::SchemeRecord;

/// Search and filter selections for a scheme listing.
///
/// `None` means "no constraint". The free-text query matches as a
/// case-insensitive substring of any searchable field; the categorical
/// filters require exact equality and compose with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeFilter {
    pub query: Option<String>,
    pub ministry: Option<String>,
    pub beneficiary: Option<String>,
    pub category: Option<String>,
}

impl SchemeFilter {
    /// Build a filter from raw user selections, treating blanks and the
    /// `all` sentinel ("all", "All Ministries", "All Types", ...) as
    /// unconstrained.
    pub fn from_selections(
        query: Option<String>,
        ministry: Option<String>,
        beneficiary: Option<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            query: normalize(query),
            ministry: normalize(ministry),
            beneficiary: normalize(beneficiary),
            category: normalize(category),
        }
    }

    pub fn matches(&self, scheme: &SchemeRecord) -> bool {
        if let Some(query) = self.query.as_deref() {
            let needle = query.to_lowercase();
            let searched = [
                &scheme.name,
                &scheme.description,
                &scheme.ministry,
                &scheme.beneficiary,
            ];
            if !searched
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        let equals = |constraint: &Option<String>, field: &str| {
            constraint
                .as_deref()
                .map_or(true, |expected| expected == field)
        };

        equals(&self.ministry, &scheme.ministry)
            && equals(&self.beneficiary, &scheme.beneficiary)
            && equals(&self.category, &scheme.category)
    }
}

/// Reduce the scheme list to records matching the filter, preserving input
/// order. Pure: the input is never mutated.
pub fn filter_schemes<'a>(
    schemes: &'a [SchemeRecord],
    filter: &SchemeFilter,
) -> Vec<&'a SchemeRecord> {
    schemes
        .iter()
        .filter(|scheme| filter.matches(scheme))
        .collect()
}

fn normalize(raw: Option<String>) -> Option<String> {
    let value = raw?.trim().to_string();
    if value.is_empty() {
        return None;
    }
    let lowered = value.to_lowercase();
    if lowered == "all" || lowered.starts_with("all ") {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(id: &str, name: &str, ministry: &str, beneficiary: &str) -> SchemeRecord {
        SchemeRecord {
            id: id.to_string(),
            name: name.to_string(),
            ministry: ministry.to_string(),
            beneficiary: beneficiary.to_string(),
            benefit: "Benefit".to_string(),
            description: "Support programme".to_string(),
            category: "Farmers".to_string(),
            source_url: "https://example.gov.in".to_string(),
        }
    }

    fn sample() -> Vec<SchemeRecord> {
        vec![
            scheme(
                "farmer-aid",
                "Farmer Aid",
                "Ministry of Agriculture",
                "Farmers",
            ),
            scheme(
                "student-grant",
                "Student Grant",
                "Ministry of Education",
                "Students",
            ),
            scheme(
                "women-fund",
                "Enterprise Fund",
                "Ministry of Finance",
                "Women Entrepreneurs",
            ),
        ]
    }

    #[test]
    fn empty_filter_matches_everything_in_order() {
        let schemes = sample();
        let matches = filter_schemes(&schemes, &SchemeFilter::default());
        let ids: Vec<&str> = matches.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["farmer-aid", "student-grant", "women-fund"]);
    }

    #[test]
    fn query_matches_substring_of_any_searched_field() {
        let schemes = sample();

        let by_name = SchemeFilter::from_selections(Some("farmer".to_string()), None, None, None);
        let ids: Vec<&str> = filter_schemes(&schemes, &by_name)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["farmer-aid"]);

        let by_ministry =
            SchemeFilter::from_selections(Some("education".to_string()), None, None, None);
        let ids: Vec<&str> = filter_schemes(&schemes, &by_ministry)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["student-grant"]);

        let by_beneficiary =
            SchemeFilter::from_selections(Some("entrepreneur".to_string()), None, None, None);
        let ids: Vec<&str> = filter_schemes(&schemes, &by_beneficiary)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["women-fund"]);
    }

    #[test]
    fn query_is_case_insensitive() {
        let schemes = sample();
        let filter = SchemeFilter::from_selections(Some("FARMER".to_string()), None, None, None);
        assert_eq!(filter_schemes(&schemes, &filter).len(), 1);
    }

    #[test]
    fn ministry_filter_is_exact_equality() {
        let schemes = sample();
        let filter = SchemeFilter::from_selections(
            None,
            Some("Ministry of Agriculture".to_string()),
            None,
            None,
        );
        let matches = filter_schemes(&schemes, &filter);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "farmer-aid");

        let partial =
            SchemeFilter::from_selections(None, Some("Ministry of Agri".to_string()), None, None);
        assert!(filter_schemes(&schemes, &partial).is_empty());
    }

    #[test]
    fn categorical_filters_compose_with_and() {
        let schemes = sample();
        let filter = SchemeFilter::from_selections(
            None,
            Some("Ministry of Agriculture".to_string()),
            Some("Students".to_string()),
            None,
        );
        assert!(filter_schemes(&schemes, &filter).is_empty());
    }

    #[test]
    fn all_sentinels_mean_unconstrained() {
        let filter = SchemeFilter::from_selections(
            Some("  ".to_string()),
            Some("All Ministries".to_string()),
            Some("all".to_string()),
            Some("All Categories".to_string()),
        );
        assert_eq!(filter, SchemeFilter::default());
    }

    #[test]
    fn output_order_is_a_suborder_of_input() {
        let schemes = sample();
        let filter = SchemeFilter::from_selections(Some("ministry".to_string()), None, None, None);
        let ids: Vec<&str> = filter_schemes(&schemes, &filter)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["farmer-aid", "student-grant", "women-fund"]);
    }
}
