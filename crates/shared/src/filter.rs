use crate::error::FieldError;
use crate::models::{Resource, ResourceStatus, ResourceType};

/// A filter select: either the `"all"` wildcard or one concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T> Choice<T> {
    /// Parse a select value: `"all"` or whatever `T` parses from.
    pub fn parse(value: &str) -> Result<Self, FieldError>
    where
        T: std::str::FromStr<Err = FieldError>,
    {
        if value == "all" {
            Ok(Choice::All)
        } else {
            value.parse().map(Choice::Only)
        }
    }
}

impl Choice<ResourceType> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::All => "all",
            Choice::Only(t) => t.as_str(),
        }
    }
}

impl Choice<ResourceStatus> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::All => "all",
            Choice::Only(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub query: String,
    pub resource_type: Choice<ResourceType>,
    pub status: Choice<ResourceStatus>,
}

impl FilterState {
    /// True when no predicate can exclude anything.
    pub fn is_pass_through(&self) -> bool {
        self.query.is_empty() && self.resource_type == Choice::All && self.status == Choice::All
    }

    /// `matches` with the query already lowercased, so a whole collection
    /// lowercases it once.
    fn matches_lowered(&self, needle: &str, resource: &Resource) -> bool {
        let text_matches = needle.is_empty()
            || resource.title.to_lowercase().contains(needle)
            || resource.location_name.to_lowercase().contains(needle)
            || resource
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle));
        text_matches
            && self.resource_type.matches(&resource.resource_type)
            && self.status.matches(&resource.status)
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        self.matches_lowered(&self.query.to_lowercase(), resource)
    }
}

/// The visible subset of `resources` under `state`, in input order.
pub fn filter(resources: &[Resource], state: &FilterState) -> Vec<Resource> {
    let needle = state.query.to_lowercase();
    resources
        .iter()
        .filter(|r| state.matches_lowered(&needle, r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resource;

    fn sample() -> Vec<Resource> {
        let mut gym = resource("gym", "10", "20");
        gym.title = "Central Gym Shelter".into();
        gym.location_name = "Northside".into();
        gym.description = Some("Cots and blankets".into());

        let mut pantry = resource("pantry", "11", "21");
        pantry.title = "Food Pantry".into();
        pantry.resource_type = ResourceType::Food;
        pantry.status = ResourceStatus::Limited;
        pantry.location_name = "Riverside Church".into();

        let mut clinic = resource("clinic", "12", "22");
        clinic.title = "Pop-up Clinic".into();
        clinic.resource_type = ResourceType::Medical;
        clinic.status = ResourceStatus::Unavailable;
        clinic.location_name = "Fairgrounds".into();
        clinic.description = Some("Walk-in first aid near the north gate".into());

        vec![gym, pantry, clinic]
    }

    fn ids(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_pass_through_state_preserves_everything() {
        let all = sample();
        let state = FilterState::default();
        assert!(state.is_pass_through());
        assert_eq!(filter(&all, &state), all);
    }

    #[test]
    fn test_query_is_case_insensitive_over_three_fields() {
        let all = sample();
        let state = FilterState {
            query: "NORTH".into(),
            ..FilterState::default()
        };
        // title/location of gym, description of clinic
        assert_eq!(ids(&filter(&all, &state)), vec!["gym", "clinic"]);
    }

    #[test]
    fn test_missing_description_never_matches() {
        let all = sample();
        let state = FilterState {
            query: "blankets".into(),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter(&all, &state)), vec!["gym"]);
    }

    #[test]
    fn test_type_and_status_filters_combine() {
        let all = sample();
        let state = FilterState {
            resource_type: Choice::Only(ResourceType::Food),
            status: Choice::Only(ResourceStatus::Limited),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter(&all, &state)), vec!["pantry"]);

        let state = FilterState {
            resource_type: Choice::Only(ResourceType::Food),
            status: Choice::Only(ResourceStatus::Available),
            ..FilterState::default()
        };
        assert!(filter(&all, &state).is_empty());
    }

    #[test]
    fn test_output_is_ordered_subset_satisfying_every_predicate() {
        let all = sample();
        let states = [
            FilterState {
                query: "e".into(),
                ..FilterState::default()
            },
            FilterState {
                query: "i".into(),
                status: Choice::Only(ResourceStatus::Unavailable),
                ..FilterState::default()
            },
            FilterState {
                resource_type: Choice::Only(ResourceType::Shelter),
                ..FilterState::default()
            },
        ];
        for state in &states {
            let out = filter(&all, state);
            let mut cursor = 0;
            for r in &out {
                assert!(state.matches(r));
                let pos = all[cursor..].iter().position(|a| a == r).unwrap();
                cursor += pos + 1;
            }
        }
    }

    #[test]
    fn test_filter_keeps_exactly_what_matches_accepts() {
        let all = sample();
        let state = FilterState {
            query: "CLINIC".into(),
            ..FilterState::default()
        };
        let expected: Vec<Resource> = all.iter().filter(|r| state.matches(r)).cloned().collect();
        assert_eq!(filter(&all, &state), expected);
        assert_eq!(ids(&expected), vec!["clinic"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let all = sample();
        let state = FilterState {
            query: "c".into(),
            resource_type: Choice::Only(ResourceType::Medical),
            ..FilterState::default()
        };
        let once = filter(&all, &state);
        assert_eq!(filter(&once, &state), once);
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::<ResourceType>::parse("all").unwrap(), Choice::All);
        assert_eq!(
            Choice::<ResourceStatus>::parse("limited").unwrap(),
            Choice::Only(ResourceStatus::Limited)
        );
        assert!(Choice::<ResourceType>::parse("ALL").is_err());
        assert_eq!(Choice::Only(ResourceType::Food).as_str(), "food");
    }
}
