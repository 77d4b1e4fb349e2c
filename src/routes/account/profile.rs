use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::errors::Result;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::profile::{Profile, ProfileUpdate};
use crate::services::validation;
use crate::state::AppState;

/// A customer who has never saved their profile gets an empty one.
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let profile = state
        .profiles
        .get_profile(user.user_id)
        .await?
        .unwrap_or_else(|| empty_profile(&user));
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let update = input.into_inner();
    validation::validate_profile_update(&update).into_result()?;

    let mut profile = state
        .profiles
        .get_profile(user.user_id)
        .await?
        .unwrap_or_else(|| empty_profile(&user));

    let trimmed = |value: String| value.trim().to_string();
    if let Some(name) = update.full_name {
        profile.full_name = Some(trimmed(name));
    }
    if let Some(phone) = update.phone {
        profile.phone = Some(trimmed(phone));
    }
    if let Some(nationality) = update.nationality {
        profile.nationality = Some(trimmed(nationality));
    }
    if let Some(avatar) = update.avatar_url {
        profile.avatar_url = Some(trimmed(avatar)).filter(|url| !url.is_empty());
    }
    profile.updated_at = Some(Utc::now());

    let saved = state.profiles.upsert_profile(&profile).await?;
    log::info!("Profile {} updated", saved.id);
    Ok(HttpResponse::Ok().json(saved))
}

fn empty_profile(user: &AuthenticatedUser) -> Profile {
    Profile {
        id: user.user_id,
        full_name: None,
        phone: None,
        nationality: None,
        avatar_url: None,
        updated_at: None,
    }
}
