//! User profile types.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    /// Postal code. The backend stores it as a number.
    pub pincode: u32,
}

/// Shipping and billing addresses for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    pub shipping: Address,
    pub billing: Address,
}

impl AddressBook {
    /// Use the same address for shipping and billing.
    #[must_use]
    pub fn same(address: Address) -> Self {
        Self {
            shipping: address.clone(),
            billing: address,
        }
    }
}

/// Profile snapshot returned by `GET /user/{userId}/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(rename = "fname")]
    pub first_name: String,
    #[serde(rename = "lname")]
    pub last_name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    /// URL of the uploaded avatar.
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub address: Option<AddressBook>,
}

impl UserProfile {
    /// First and last name joined for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
