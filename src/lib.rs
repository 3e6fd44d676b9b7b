//! Resilient Keycloak admin API transport with lazy login, single-flight reauthentication, bounded
//! retries, JWT client assertions, and classified errors.
//!
//! The crate centres on [`client::KeycloakClient`], the only component that ever touches a socket
//! or a credential. Typed admin helpers (see [`admin`]) and any other collaborator talk to it
//! through the one-method [`doer::RequestDoer`] capability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admin;
pub mod api_error;
pub mod auth;
pub mod client;
pub mod config;
pub mod doer;
pub mod error;
pub mod obs;
pub mod retry;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;

pub use api_error::{ApiError, is_client_error, is_conflict, is_not_found, is_server_error};
pub use client::KeycloakClient;
pub use config::ClientConfig;
pub use doer::RequestDoer;
pub use error::{Error, Result};
#[cfg(test)] use {color_eyre as _, httpmock as _};
