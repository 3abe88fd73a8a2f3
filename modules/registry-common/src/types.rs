use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Location hierarchy ---

/// Administrative level of a location. The hierarchy runs
/// facility -> subcounty -> county -> national.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Facility,
    Subcounty,
    County,
    National,
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationKind::Facility => write!(f, "facility"),
            LocationKind::Subcounty => write!(f, "subcounty"),
            LocationKind::County => write!(f, "county"),
            LocationKind::National => write!(f, "national"),
        }
    }
}

impl LocationKind {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "facility" => Some(Self::Facility),
            "subcounty" | "sub-county" => Some(Self::Subcounty),
            "county" => Some(Self::County),
            "national" => Some(Self::National),
            _ => None,
        }
    }
}

/// One node in the administrative location tree. `parent_id` is a weak
/// reference into the same tree; a national node has none. Children are
/// derived by the tree index, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub parent_id: Option<Uuid>,
}

// --- Roles ---

/// A named capability tag held by a user. Role names arrive from the
/// identity layer as free text and are matched case-insensitively;
/// anything unrecognized resolves to least privilege.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    CountyUser,
    SubcountyUser,
    FacilityIncharge,
    Other(String),
}

impl Role {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Self::Admin,
            "county user" => Self::CountyUser,
            "subcounty user" => Self::SubcountyUser,
            "facility-incharge user" => Self::FacilityIncharge,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::CountyUser => write!(f, "county user"),
            Role::SubcountyUser => write!(f, "subcounty user"),
            Role::FacilityIncharge => write!(f, "facility-incharge user"),
            Role::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Parse a set of role names from the identity layer.
pub fn parse_roles<S: AsRef<str>>(names: &[S]) -> Vec<Role> {
    names.iter().map(|n| Role::from_str_loose(n.as_ref())).collect()
}

/// A registry user. Owned by the identity subsystem; the core only reads
/// the home location and role names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub home_location_id: Option<Uuid>,
    pub roles: Vec<String>,
}

impl User {
    pub fn parsed_roles(&self) -> Vec<Role> {
        parse_roles(&self.roles)
    }
}

// --- Notification records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
            Sex::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceOfDelivery {
    Facility,
    Home,
    Unknown,
}

impl PlaceOfDelivery {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "facility" => Self::Facility,
            "home" => Self::Home,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PlaceOfDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceOfDelivery::Facility => write!(f, "facility"),
            PlaceOfDelivery::Home => write!(f, "home"),
            PlaceOfDelivery::Unknown => write!(f, "unknown"),
        }
    }
}

/// One baby on a notification. `outcome` is free text; the stillbirth
/// predicate is a case-insensitive substring match on it, so variants like
/// "Fresh Stillbirth" qualify without normalization at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baby {
    pub id: Uuid,
    pub sex: Sex,
    pub outcome: Option<String>,
    /// Birth weight in grams, when recorded.
    pub birth_weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mother {
    pub id: Uuid,
    pub place_of_delivery: PlaceOfDelivery,
}

/// One reporting event at one location on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub date_of_notification: NaiveDate,
    pub location_id: Uuid,
    pub mother: Mother,
    pub babies: Vec<Baby>,
}

// --- Ingestion input ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBaby {
    pub sex: Sex,
    pub outcome: Option<String>,
    pub birth_weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMother {
    pub place_of_delivery: PlaceOfDelivery,
}

/// Ingestion payload for one notification with its babies and mother.
/// The create is atomic: it either fully succeeds or fully fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub date_of_notification: NaiveDate,
    pub location_id: Uuid,
    pub mother: NewMother,
    pub babies: Vec<NewBaby>,
}
