//! Core types for the storefront client.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! payloads returned by the storefront API.

pub mod cart;
pub mod credential;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;
pub mod status;

pub use cart::{Cart, LineItem, ProductRef};
pub use credential::{Credentials, CredentialsError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::Order;
pub use price::{Price, format_amount};
pub use product::{PriceSort, Product, ProductFilter, Size};
pub use profile::{Address, AddressBook, UserProfile};
pub use status::*;
