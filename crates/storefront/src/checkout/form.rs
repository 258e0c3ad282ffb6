//! Shipping form state and validation.

use core::fmt;
use std::str::FromStr;

use annya_core::Email;
use serde::Deserialize;

use crate::api::ShippingAddress;
use crate::error::ValidationError;

const DEFAULT_STATE: &str = "Telangana";
const DEFAULT_COUNTRY: &str = "India";

/// A field of the shipping form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Email,
    Phone,
    FirstName,
    LastName,
    Address,
    City,
    PostalCode,
    State,
    Country,
}

impl FormField {
    /// Every field, in display order.
    pub const ALL: [Self; 9] = [
        Self::Email,
        Self::Phone,
        Self::FirstName,
        Self::LastName,
        Self::Address,
        Self::City,
        Self::PostalCode,
        Self::State,
        Self::Country,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Address => "Address",
            Self::City => "City",
            Self::PostalCode => "PIN code",
            Self::State => "State",
            Self::Country => "Country",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FormField {
    type Err = String;

    /// Accepts the form's camelCase names as well as snake_case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "firstName" | "first_name" => Ok(Self::FirstName),
            "lastName" | "last_name" => Ok(Self::LastName),
            "address" => Ok(Self::Address),
            "city" => Ok(Self::City),
            "postalCode" | "postal_code" | "pincode" => Ok(Self::PostalCode),
            "state" => Ok(Self::State),
            "country" => Ok(Self::Country),
            other => Err(format!("unknown form field '{other}'")),
        }
    }
}

/// Logged-in customer profile stored under the `user` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

/// Shipping and contact details being edited at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingForm {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

impl Default for ShippingForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            phone: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            state: DEFAULT_STATE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ShippingForm {
    /// Current value of a field.
    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Email => &self.email,
            FormField::Phone => &self.phone,
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Address => &self.address,
            FormField::City => &self.city,
            FormField::PostalCode => &self.postal_code,
            FormField::State => &self.state,
            FormField::Country => &self.country,
        }
    }

    /// Replace a field's value.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Email => &mut self.email,
            FormField::Phone => &mut self.phone,
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Address => &mut self.address,
            FormField::City => &mut self.city,
            FormField::PostalCode => &mut self.postal_code,
            FormField::State => &mut self.state,
            FormField::Country => &mut self.country,
        };
        *slot = value.into();
    }

    /// Overwrite the form with a saved profile.
    ///
    /// The name is split on its first space. Missing values clear the field,
    /// except state and country which fall back to their defaults.
    pub fn prefill(&mut self, profile: &CustomerProfile) {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let (first, last) = profile
            .name
            .as_deref()
            .map(str::trim)
            .map_or(("", ""), |name| name.split_once(' ').unwrap_or((name, "")));

        self.email = text(&profile.email);
        self.first_name = first.to_string();
        self.last_name = last.trim_start().to_string();
        self.phone = text(&profile.phone);
        self.address = text(&profile.address);
        self.city = text(&profile.city);
        self.postal_code = text(&profile.pincode);
        self.state = non_empty(profile.state.as_deref()).unwrap_or(DEFAULT_STATE).to_string();
        self.country = non_empty(profile.country.as_deref())
            .unwrap_or(DEFAULT_COUNTRY)
            .to_string();
    }

    /// `"first last"` trimmed, or `None` when both are blank.
    #[must_use]
    pub fn customer_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        non_empty(Some(name.trim())).map(str::to_string)
    }

    /// Phone number, or `None` when blank.
    #[must_use]
    pub fn phone(&self) -> Option<String> {
        non_empty(Some(self.phone.trim())).map(str::to_string)
    }

    /// Check every field is filled and the email is well-formed.
    ///
    /// # Errors
    ///
    /// Returns the first missing field in display order, or
    /// [`ValidationError::InvalidEmail`].
    pub fn validate(&self) -> Result<(Email, ShippingAddress), ValidationError> {
        if let Some(field) = FormField::ALL
            .into_iter()
            .find(|f| self.get(*f).trim().is_empty())
        {
            return Err(ValidationError::MissingField(field));
        }

        let email = Email::parse(&self.email)?;
        let address = ShippingAddress {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };
        Ok((email, address))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
