use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Shelter,
    Food,
    Medical,
    Logistics,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Shelter,
        ResourceType::Food,
        ResourceType::Medical,
        ResourceType::Logistics,
    ];

    /// Lowercase wire name, as stored and as used in filter selects.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Shelter => "shelter",
            ResourceType::Food => "food",
            ResourceType::Medical => "medical",
            ResourceType::Logistics => "logistics",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Shelter => write!(f, "Shelter"),
            ResourceType::Food => write!(f, "Food"),
            ResourceType::Medical => write!(f, "Medical"),
            ResourceType::Logistics => write!(f, "Logistics"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FieldError::UnknownVariant {
                field: "resourceType",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Available,
    Limited,
    Unavailable,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 3] = [
        ResourceStatus::Available,
        ResourceStatus::Limited,
        ResourceStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Available => "available",
            ResourceStatus::Limited => "limited",
            ResourceStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Available => write!(f, "Available"),
            ResourceStatus::Limited => write!(f, "Limited"),
            ResourceStatus::Unavailable => write!(f, "Unavailable"),
        }
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FieldError::UnknownVariant {
                field: "status",
                value: s.to_string(),
            })
    }
}

/// Access level of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Public,
    Volunteer,
    Admin,
}

impl Role {
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Volunteer | Role::Admin)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Role::Public),
            "volunteer" => Ok(Role::Volunteer),
            "admin" => Ok(Role::Admin),
            other => Err(FieldError::UnknownVariant {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// One stored coordinate. Rows written through the API always carry numbers,
/// but imported rows may hold text, so both shapes decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordValue {
    Number(f64),
    Text(String),
}

impl CoordValue {
    /// The coordinate as a finite number, if it is one. Text is read up to
    /// the end of its leading number, so `"40.7128 N"` gives `40.7128`.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            CoordValue::Number(n) => *n,
            CoordValue::Text(s) => leading_float(s)?,
        };
        value.is_finite().then_some(value)
    }
}

/// Longest prefix of `text` (after leading whitespace) that reads as a
/// decimal float: optional sign, digits with an optional fraction, then an
/// optional exponent.
fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

impl From<f64> for CoordValue {
    fn from(n: f64) -> Self {
        CoordValue::Number(n)
    }
}

impl From<&str> for CoordValue {
    fn from(s: &str) -> Self {
        CoordValue::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    pub location_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<CoordValue>,
    #[serde(default)]
    pub longitude: Option<CoordValue>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub current_occupancy: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Resource {
    /// Build a stored record from a validated payload.
    pub fn from_fields(
        id: String,
        fields: ResourceFields,
        created_by: Option<String>,
        now: &str,
    ) -> Self {
        let mut resource = Resource {
            id,
            title: String::new(),
            resource_type: fields.resource_type,
            status: fields.status,
            location_name: String::new(),
            description: None,
            latitude: None,
            longitude: None,
            address: None,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            capacity: None,
            current_occupancy: None,
            notes: None,
            created_by,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        };
        resource.apply(fields, now);
        resource
    }

    /// Overwrite every editable field from `fields`; identity and creation
    /// metadata are untouched.
    pub fn apply(&mut self, fields: ResourceFields, now: &str) {
        self.title = fields.title;
        self.resource_type = fields.resource_type;
        self.status = fields.status;
        self.location_name = fields.location_name;
        self.latitude = Some(CoordValue::Number(fields.latitude));
        self.longitude = Some(CoordValue::Number(fields.longitude));
        self.address = fields.address;
        self.contact_name = fields.contact_name;
        self.contact_phone = fields.contact_phone;
        self.contact_email = fields.contact_email;
        self.capacity = fields.capacity;
        self.current_occupancy = Some(fields.current_occupancy.unwrap_or(0));
        self.description = fields.description;
        self.notes = fields.notes;
        self.updated_at = now.to_string();
    }

    /// Parsed map position. `None` when either coordinate is absent or not a
    /// finite number.
    pub fn position(&self) -> Option<LatLng> {
        let lat = self.latitude.as_ref()?.parse()?;
        let lng = self.longitude.as_ref()?.parse()?;
        Some(LatLng { lat, lng })
    }

    /// Occupancy as a whole percentage of capacity, 0 without a capacity.
    pub fn occupancy_percentage(&self) -> u32 {
        match self.capacity {
            Some(cap) if cap > 0 => {
                let occupied = self.current_occupancy.unwrap_or(0).max(0) as f64;
                (occupied / cap as f64 * 100.0).round() as u32
            }
            _ => 0,
        }
    }
}

/// Create/update payload accepted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFields {
    pub title: String,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub current_occupancy: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ResourceFields {
    /// Check the field contract and normalize optional text.
    pub fn validate(mut self) -> Result<Self, FieldError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(FieldError::Missing("title"));
        }
        self.location_name = self.location_name.trim().to_string();
        if self.location_name.is_empty() {
            return Err(FieldError::Missing("locationName"));
        }
        if !self.latitude.is_finite() {
            return Err(FieldError::NotFinite("latitude"));
        }
        if !self.longitude.is_finite() {
            return Err(FieldError::NotFinite("longitude"));
        }
        if self.capacity.is_some_and(|c| c < 0) {
            return Err(FieldError::Negative("capacity"));
        }
        if self.current_occupancy.is_some_and(|c| c < 0) {
            return Err(FieldError::Negative("currentOccupancy"));
        }
        self.current_occupancy = Some(self.current_occupancy.unwrap_or(0));
        self.address = blank_to_none(self.address);
        self.contact_name = blank_to_none(self.contact_name);
        self.contact_phone = blank_to_none(self.contact_phone);
        self.contact_email = blank_to_none(self.contact_email);
        self.description = blank_to_none(self.description);
        self.notes = blank_to_none(self.notes);
        Ok(self)
    }
}

/// Text state of the resource form, one string per input.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDraft {
    pub title: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    pub location_name: String,
    pub latitude: String,
    pub longitude: String,
    pub address: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub capacity: String,
    pub current_occupancy: String,
    pub notes: String,
}

impl Default for ResourceDraft {
    fn default() -> Self {
        ResourceDraft {
            title: String::new(),
            description: String::new(),
            resource_type: ResourceType::Shelter,
            status: ResourceStatus::Available,
            location_name: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            address: String::new(),
            contact_name: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
            capacity: String::new(),
            current_occupancy: String::new(),
            notes: String::new(),
        }
    }
}

fn coord_text(value: &Option<CoordValue>) -> String {
    match value {
        Some(CoordValue::Number(n)) => n.to_string(),
        Some(CoordValue::Text(s)) => s.clone(),
        None => String::new(),
    }
}

fn parse_coordinate(field: &'static str, text: &str) -> Result<f64, FieldError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Missing(field));
    }
    CoordValue::Text(trimmed.to_string())
        .parse()
        .ok_or_else(|| FieldError::InvalidNumber {
            field,
            value: trimmed.to_string(),
        })
}

fn parse_count(field: &'static str, text: &str) -> Result<Option<i64>, FieldError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| FieldError::InvalidNumber {
            field,
            value: trimmed.to_string(),
        })
}

impl ResourceDraft {
    pub fn from_resource(resource: &Resource) -> Self {
        ResourceDraft {
            title: resource.title.clone(),
            description: resource.description.clone().unwrap_or_default(),
            resource_type: resource.resource_type,
            status: resource.status,
            location_name: resource.location_name.clone(),
            latitude: coord_text(&resource.latitude),
            longitude: coord_text(&resource.longitude),
            address: resource.address.clone().unwrap_or_default(),
            contact_name: resource.contact_name.clone().unwrap_or_default(),
            contact_phone: resource.contact_phone.clone().unwrap_or_default(),
            contact_email: resource.contact_email.clone().unwrap_or_default(),
            capacity: resource.capacity.map(|c| c.to_string()).unwrap_or_default(),
            current_occupancy: resource
                .current_occupancy
                .map(|c| c.to_string())
                .unwrap_or_default(),
            notes: resource.notes.clone().unwrap_or_default(),
        }
    }

    /// Parse the numeric inputs and validate the result.
    pub fn into_fields(self) -> Result<ResourceFields, FieldError> {
        let latitude = parse_coordinate("latitude", &self.latitude)?;
        let longitude = parse_coordinate("longitude", &self.longitude)?;
        let capacity = parse_count("capacity", &self.capacity)?;
        let current_occupancy = parse_count("currentOccupancy", &self.current_occupancy)?;

        ResourceFields {
            title: self.title,
            resource_type: self.resource_type,
            status: self.status,
            location_name: self.location_name,
            latitude,
            longitude,
            address: Some(self.address),
            contact_name: Some(self.contact_name),
            contact_phone: Some(self.contact_phone),
            contact_email: Some(self.contact_email),
            capacity,
            current_occupancy,
            description: Some(self.description),
            notes: Some(self.notes),
        }
        .validate()
    }
}

/// Fresh opaque resource id.
#[cfg(feature = "uuid-support")]
pub fn new_resource_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> ResourceFields {
        ResourceFields {
            title: title.to_string(),
            resource_type: ResourceType::Shelter,
            status: ResourceStatus::Available,
            location_name: "Town Hall".to_string(),
            latitude: 44.97,
            longitude: -93.26,
            address: None,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            capacity: None,
            current_occupancy: None,
            description: None,
            notes: None,
        }
    }

    #[test]
    fn test_enums_use_lowercase_wire_names() {
        let json = serde_json::to_string(&ResourceType::Logistics).unwrap();
        assert_eq!(json, "\"logistics\"");
        let status: ResourceStatus = serde_json::from_str("\"limited\"").unwrap();
        assert_eq!(status, ResourceStatus::Limited);
        assert_eq!("medical".parse::<ResourceType>().unwrap(), ResourceType::Medical);
        assert!("hospital".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(!Role::Public.can_edit());
        assert!(Role::Volunteer.can_edit());
        assert!(!Role::Volunteer.can_delete());
        assert!(Role::Admin.can_edit());
        assert!(Role::Admin.can_delete());
        assert_eq!(Role::default(), Role::Public);
    }

    #[test]
    fn test_coord_value_parses_numbers_and_text() {
        assert_eq!(CoordValue::Number(10.5).parse(), Some(10.5));
        assert_eq!(CoordValue::from(" -93.2 ").parse(), Some(-93.2));
        assert_eq!(CoordValue::from("bad").parse(), None);
        assert_eq!(CoordValue::from("").parse(), None);
        assert_eq!(CoordValue::from("NaN").parse(), None);
        assert_eq!(CoordValue::Number(f64::INFINITY).parse(), None);
    }

    #[test]
    fn test_coord_text_reads_leading_number() {
        assert_eq!(CoordValue::from("40.7128 N").parse(), Some(40.7128));
        assert_eq!(CoordValue::from("-74.0060 W").parse(), Some(-74.006));
        assert_eq!(CoordValue::from("44.97°").parse(), Some(44.97));
        assert_eq!(CoordValue::from(".5").parse(), Some(0.5));
        assert_eq!(CoordValue::from("5.").parse(), Some(5.0));
        assert_eq!(CoordValue::from("1e2x").parse(), Some(100.0));
        assert_eq!(CoordValue::from("3e").parse(), Some(3.0));
        assert_eq!(CoordValue::from("abc").parse(), None);
        assert_eq!(CoordValue::from("-").parse(), None);
        assert_eq!(CoordValue::from(".").parse(), None);
        assert_eq!(CoordValue::from("N 40.7").parse(), None);
        assert_eq!(CoordValue::from("1e999").parse(), None);
    }

    #[test]
    fn test_position_from_suffixed_text() {
        let r = crate::testing::resource("a", "40.7128 N", "-74.0060 W");
        assert_eq!(r.position(), Some(LatLng::new(40.7128, -74.006)));
    }

    #[test]
    fn test_resource_decodes_mixed_coordinates() {
        let json = r#"{"id":"a","title":"Gym","resourceType":"shelter","status":"available","locationName":"School","latitude":"10","longitude":20.0}"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        let pos = r.position().unwrap();
        assert_eq!(pos.lat, 10.0);
        assert_eq!(pos.lng, 20.0);
        assert!(r.description.is_none());
    }

    #[test]
    fn test_resource_without_coordinates_has_no_position() {
        let json = r#"{"id":"a","title":"Gym","resourceType":"food","status":"limited","locationName":"School","latitude":null}"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert!(r.position().is_none());
    }

    #[test]
    fn test_resource_rejects_unknown_type() {
        let json = r#"{"id":"a","title":"Gym","resourceType":"spaceship","status":"available","locationName":"School"}"#;
        assert!(serde_json::from_str::<Resource>(json).is_err());
    }

    #[test]
    fn test_occupancy_percentage() {
        let mut r = Resource::from_fields("a".into(), fields("Gym"), None, "t0");
        assert_eq!(r.occupancy_percentage(), 0);
        r.capacity = Some(3);
        r.current_occupancy = Some(2);
        assert_eq!(r.occupancy_percentage(), 67);
        r.capacity = Some(0);
        assert_eq!(r.occupancy_percentage(), 0);
    }

    #[test]
    fn test_from_fields_defaults_occupancy_and_timestamps() {
        let r = Resource::from_fields("a".into(), fields("Gym"), Some("u1".into()), "t0");
        assert_eq!(r.current_occupancy, Some(0));
        assert_eq!(r.created_at, "t0");
        assert_eq!(r.updated_at, "t0");
        assert_eq!(r.created_by.as_deref(), Some("u1"));
        assert_eq!(r.latitude, Some(CoordValue::Number(44.97)));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut r = Resource::from_fields("a".into(), fields("Gym"), None, "t0");
        r.apply(fields("Arena"), "t1");
        assert_eq!(r.id, "a");
        assert_eq!(r.title, "Arena");
        assert_eq!(r.created_at, "t0");
        assert_eq!(r.updated_at, "t1");
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let err = fields("   ").validate().unwrap_err();
        assert_eq!(err, FieldError::Missing("title"));
    }

    #[test]
    fn test_validate_rejects_non_finite_coordinates() {
        let mut f = fields("Gym");
        f.longitude = f64::NAN;
        assert_eq!(f.validate().unwrap_err(), FieldError::NotFinite("longitude"));
    }

    #[test]
    fn test_validate_normalizes_blank_optionals() {
        let mut f = fields("Gym");
        f.notes = Some("  ".into());
        f.contact_phone = Some(" 555-0100 ".into());
        let f = f.validate().unwrap();
        assert!(f.notes.is_none());
        assert_eq!(f.contact_phone.as_deref(), Some("555-0100"));
        assert_eq!(f.current_occupancy, Some(0));
    }

    #[test]
    fn test_draft_round_trips_through_fields() {
        let r = Resource::from_fields("a".into(), fields("Gym"), None, "t0");
        let draft = ResourceDraft::from_resource(&r);
        assert_eq!(draft.latitude, "44.97");
        let f = draft.into_fields().unwrap();
        assert_eq!(f.title, "Gym");
        assert_eq!(f.latitude, 44.97);
        assert_eq!(f.current_occupancy, Some(0));
    }

    #[test]
    fn test_draft_reports_bad_numbers() {
        let draft = ResourceDraft {
            title: "Gym".into(),
            location_name: "School".into(),
            latitude: "north".into(),
            longitude: "1".into(),
            ..ResourceDraft::default()
        };
        assert_eq!(
            draft.into_fields().unwrap_err(),
            FieldError::InvalidNumber {
                field: "latitude",
                value: "north".into()
            }
        );
    }

    #[test]
    fn test_draft_requires_coordinates() {
        let draft = ResourceDraft {
            title: "Gym".into(),
            location_name: "School".into(),
            latitude: "1".into(),
            ..ResourceDraft::default()
        };
        assert_eq!(draft.into_fields().unwrap_err(), FieldError::Missing("longitude"));
    }

    #[test]
    fn test_draft_rejects_fractional_capacity() {
        let draft = ResourceDraft {
            title: "Gym".into(),
            location_name: "School".into(),
            latitude: "1".into(),
            longitude: "2".into(),
            capacity: "12.5".into(),
            ..ResourceDraft::default()
        };
        assert!(matches!(
            draft.into_fields(),
            Err(FieldError::InvalidNumber { field: "capacity", .. })
        ));
    }
}
