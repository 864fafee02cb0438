use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Makes sure the configured default admin exists and can log in with the
/// configured password. Runs on every startup.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let user = repositories::users::find_by_username(state.db(), username).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let password_ok =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);

        if password_ok && user.is_admin && user.is_active {
            tracing::info!("Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_ok {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };

        sqlx::query(
            "UPDATE users
             SET hashed_password = $1, is_admin = TRUE, is_active = TRUE, updated_at = $2
             WHERE id = $3",
        )
        .bind(hashed_password)
        .bind(now)
        .bind(user.id)
        .execute(state.db())
        .await?;

        tracing::info!("Updated default admin {username}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            username,
            hashed_password,
            full_name: "Administrator",
            is_admin: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default admin {username}");
    Ok(())
}
