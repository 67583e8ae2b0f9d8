//! Login, registration and logout.

use storefront_sync::Storefront;
use storefront_sync::api::{ImageUpload, RegistrationForm};
use storefront_sync_core::{Address, AddressBook, Email};
use tracing::info;

use super::{CliError, password};
use crate::RegisterArgs;

/// Log in and print who is logged in.
pub async fn login(
    storefront: &Storefront,
    email: &Email,
    given_password: Option<String>,
) -> Result<(), CliError> {
    let password = password(given_password)?;
    storefront.session().login(email, &password).await?;

    let state = storefront.session().snapshot();
    match &state.user {
        Some(user) => info!(user_id = ?state.user_id(), "Welcome back, {}", user.full_name()),
        None => info!(user_id = ?state.user_id(), "Logged in (profile unavailable)"),
    }
    Ok(())
}

/// Create an account. The user logs in separately afterwards.
pub async fn register(storefront: &Storefront, args: RegisterArgs) -> Result<(), CliError> {
    let password = password(args.password)?;
    let profile_image = args
        .image
        .as_deref()
        .map(ImageUpload::from_path)
        .transpose()?;

    let form = RegistrationForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        password,
        address: AddressBook::same(Address {
            street: args.street,
            city: args.city,
            pincode: args.pincode,
        }),
        profile_image,
    };

    match storefront.session().register(form).await? {
        Some(profile) => info!(
            user_id = %profile.id,
            email = %profile.email,
            "Registered; log in to continue"
        ),
        None => info!("Registered; log in to continue"),
    }
    Ok(())
}

/// Log out.
pub fn logout(storefront: &Storefront) {
    end_session(storefront);
    info!("Logged out");
}

/// Tear the session down, cart and orders included, before returning.
///
/// Used after a 401 too: the background resets may not run before the
/// process exits.
pub fn end_session(storefront: &Storefront) {
    storefront.session().logout();
}
