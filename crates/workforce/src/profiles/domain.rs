use serde::{Deserialize, Serialize};

use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant identity and contact details plus photo references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub version: Version,
    pub display_name: String,
    pub given_name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub telephone: String,
    #[serde(default)]
    pub photo_ids: Vec<PhotoId>,
}

impl Profile {
    /// Look up a contact field by the name templates use in their requirements.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "displayName" => &self.display_name,
            "givenName" | "firstName" => &self.given_name,
            "surname" => &self.surname,
            "email" => &self.email,
            "address" => &self.address,
            "telephone" => &self.telephone,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn has_photo(&self) -> bool {
        !self.photo_ids.is_empty()
    }

    pub fn primary_photo(&self) -> Option<&PhotoId> {
        self.photo_ids.first()
    }
}
