use crate::{AppState, Error};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use log::*;

pub(crate) const BUTTON_SECRET_HEADER: &str = "x-button-secret";

/// Proof that the request carried the configured shared secret.
///
/// The header bytes must equal the secret exactly; a missing header or any
/// mismatch is rejected with `Error::Unauthorized`.
pub(crate) struct ButtonSecret;

#[async_trait]
impl FromRequestParts<AppState> for ButtonSecret {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(BUTTON_SECRET_HEADER)
            .map(|value| value.as_bytes());

        match provided {
            Some(secret) if secret == state.config.button_secret().as_bytes() => Ok(ButtonSecret),
            Some(_) => {
                warn!("Rejected event with invalid {BUTTON_SECRET_HEADER} header");
                Err(Error::Unauthorized)
            }
            None => {
                warn!("Rejected event without {BUTTON_SECRET_HEADER} header");
                Err(Error::Unauthorized)
            }
        }
    }
}
