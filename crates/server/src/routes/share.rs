//! Share-link redemption.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::{AccessService, Redemption};
use crate::state::AppState;

/// Redeem a share link.
///
/// Anonymous visitors are sent to the login page and brought back here
/// afterwards; everyone else lands on the list.
pub async fn redeem(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(token): Path<String>,
) -> Result<Redirect> {
    let redemption = AccessService::new(state.store())
        .redeem_share_token(&token, user.as_ref().map(|u| u.id))
        .await?;

    if let Redemption::Joined(list_id) = &redemption {
        let list_id = list_id.to_string();
        add_breadcrumb(
            "sharing",
            "Joined shared list",
            Some(&[("list_id", list_id.as_str())]),
        );
    }

    Ok(Redirect::to(&redemption.redirect_path()))
}
