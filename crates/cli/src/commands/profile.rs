//! Profile view.

use std::path::PathBuf;

use storefront_sync::Storefront;
use storefront_sync::api::{ImageUpload, ProfileUpdate};
use storefront_sync_core::{Email, UserProfile};
use tracing::info;

use super::CliError;

/// Fields to change.
pub struct Changes {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub image: Option<PathBuf>,
}

/// Fetch and print the profile.
pub async fn show(storefront: &Storefront) -> Result<(), CliError> {
    if storefront.current_user_id().is_none() {
        return Err(storefront_sync::StoreError::NotAuthenticated.into());
    }
    storefront.session().fetch_profile().await?;

    match storefront.session().snapshot().user {
        Some(user) => print_profile(&user),
        None => info!("No profile loaded"),
    }
    Ok(())
}

/// Update the given fields and print the result.
pub async fn update(storefront: &Storefront, changes: Changes) -> Result<(), CliError> {
    let update = ProfileUpdate {
        first_name: changes.first_name,
        last_name: changes.last_name,
        email: changes.email,
        phone: changes.phone,
        profile_image: changes
            .image
            .as_deref()
            .map(ImageUpload::from_path)
            .transpose()?,
        ..ProfileUpdate::default()
    };
    if update.is_empty() {
        return Err(CliError::InvalidInput("nothing to update".to_string()));
    }

    let user = storefront.session().update_profile(update).await?;
    print_profile(&user);
    Ok(())
}

fn print_profile(user: &UserProfile) {
    info!("{} <{}>", user.full_name(), user.email);
    if let Some(phone) = &user.phone {
        info!("  phone: {phone}");
    }
    if let Some(address) = &user.address {
        let shipping = &address.shipping;
        info!(
            "  ships to: {}, {} {}",
            shipping.street, shipping.city, shipping.pincode
        );
    }
}
