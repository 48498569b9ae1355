use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::handlers::Repository,
    errors::{Error, Result},
    types::UserId,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Reads the forwarded user id. `None` when the header is absent.
fn user_id_from_header(parts: &Parts, header_name: &str) -> Option<Result<UserId>> {
    let value = parts.headers.get(header_name)?;
    let parsed = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<UserId>().ok())
        .ok_or_else(|| Error::Unauthenticated {
            message: Some(format!("Malformed {header_name} header")),
        });
    Some(parsed)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header_name = state.config.auth.user_header.as_str();
        let user_id = match user_id_from_header(parts, header_name) {
            Some(id) => id?,
            None => {
                trace!("No identity header on request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        let mut store = state.db.begin().await?;
        let user = store.users().get_by_id(user_id).await?;

        match user {
            Some(user) if user.is_active => {
                debug!("Resolved user {} from {}", user.id, header_name);
                Ok(CurrentUser::from(user))
            }
            Some(_) => Err(Error::Unauthenticated {
                message: Some("Account is deactivated".to_string()),
            }),
            None => Err(Error::Unauthenticated {
                message: Some("Unknown user".to_string()),
            }),
        }
    }
}
