//! Registration, login and profile endpoints.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use storefront_sync_core::{AddressBook, Credentials, Email, UserId, UserProfile};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

/// An image attached to a registration or profile update.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        };

        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    fn into_part(self) -> Result<Part, ApiError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

/// Fields for `POST /register`.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub password: SecretString,
    pub address: AddressBook,
    pub profile_image: Option<ImageUpload>,
}

impl RegistrationForm {
    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("fname", self.first_name)
            .text("lname", self.last_name)
            .text("email", self.email.as_str().to_string())
            .text("phone", self.phone)
            .text("password", self.password.expose_secret().to_string())
            .text("address", serde_json::to_string(&self.address)?);

        if let Some(image) = self.profile_image {
            form = form.part("profileImage", image.into_part()?);
        }
        Ok(form)
    }
}

/// Fields for `PUT /user/{userId}/profile`. Only supplied fields are sent.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub password: Option<SecretString>,
    pub address: Option<AddressBook>,
    pub profile_image: Option<ImageUpload>,
}

impl ProfileUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.password.is_none()
            && self.address.is_none()
            && self.profile_image.is_none()
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        if let Some(first_name) = self.first_name {
            form = form.text("fname", first_name);
        }
        if let Some(last_name) = self.last_name {
            form = form.text("lname", last_name);
        }
        if let Some(email) = self.email {
            form = form.text("email", email.as_str().to_string());
        }
        if let Some(phone) = self.phone {
            form = form.text("phone", phone);
        }
        if let Some(password) = self.password {
            form = form.text("password", password.expose_secret().to_string());
        }
        if let Some(address) = self.address {
            form = form.text("address", serde_json::to_string(&address)?);
        }
        if let Some(image) = self.profile_image {
            form = form.part("profileImage", image.into_part()?);
        }
        Ok(form)
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Create an account. Does not log in.
    ///
    /// The created profile is returned when the server sends one this client
    /// understands; the account exists either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: RegistrationForm) -> Result<Option<UserProfile>, ApiError> {
        let request = ApiRequest::new(Method::POST, ["register"]).multipart(form.into_form()?);
        self.execute_lenient(request).await
    }

    /// Exchange email and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Credentials, ApiError> {
        let request = ApiRequest::new(Method::POST, ["login"]).json(&LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        })?;
        self.execute(request).await
    }

    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
        self.execute(ApiRequest::new(
            Method::GET,
            ["user", user_id.as_str(), "profile"],
        ))
        .await
    }

    /// Update a user's profile with the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::new(Method::PUT, ["user", user_id.as_str(), "profile"])
            .multipart(update.into_form()?);
        self.execute(request).await
    }
}
