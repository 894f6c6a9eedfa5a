//! First-start initialisation of the portal's collections.

use chrono::Utc;

use crate::{
    config::Config,
    models::user::{Profile, User, UserRole, ADMIN_USERNAME},
    repositories::Repositories,
    utils::{generate_registration_id, hash_password, now_in_timezone, verify_password},
};

/// Makes sure the `ADMIN` account exists and signs in with the configured default admin
/// password, and that the timetable carries all six day buckets.
pub async fn bootstrap(repos: &Repositories, config: &Config) -> anyhow::Result<()> {
    ensure_admin(repos, config).await?;

    let guard = repos.timetable.lock().await;
    let timetable = guard.load().await?;
    guard.save(&timetable).await?;
    Ok(())
}

async fn ensure_admin(repos: &Repositories, config: &Config) -> anyhow::Result<()> {
    let guard = repos.users.lock().await;
    let mut users = guard.load().await?;
    let now = Utc::now();

    match users.get_mut(ADMIN_USERNAME) {
        None => {
            let mut admin = User::new(
                ADMIN_USERNAME.to_string(),
                ADMIN_USERNAME.to_string(),
                hash_password(&config.default_admin_password)?,
                UserRole::Admin,
                generate_registration_id(&now_in_timezone(&config.time_zone)),
                now,
            );
            admin.profile_completed = true;
            admin.profile = Profile {
                first_name: Some("System".into()),
                last_name: Some("Administrator".into()),
                dob: Some("1990-01-01".into()),
                gender: Some("Other".into()),
                marital_status: Some("Single".into()),
                father_name: Some("N/A".into()),
                mother_name: Some("N/A".into()),
                email: Some("admin@eduportal.com".into()),
            };
            users.insert(admin);
            guard.save(&users).await?;
            tracing::info!("Created default ADMIN account");
        }
        Some(admin) => {
            let matches_default = verify_password(&config.default_admin_password, &admin.password_hash)
                .unwrap_or(false);
            if !matches_default || admin.role != UserRole::Admin || admin.account_locked {
                admin.password_hash = hash_password(&config.default_admin_password)?;
                admin.password_changed = Some(false);
                admin.role = UserRole::Admin;
                admin.clear_lockout();
                admin.updated_at = now;
                guard.save(&users).await?;
                tracing::warn!("ADMIN account reset to the configured default password");
            }
        }
    }
    Ok(())
}
