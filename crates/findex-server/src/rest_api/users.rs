use crate::auth::{self, AuthKeys, Claims, Identity};
use crate::error::{self, ApiError};
use crate::sql;
use actix_web::{delete, get, post, web, HttpResponse};
use deadpool_postgres::{Client, Pool};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
struct UserRow {
    id: i32,
    email: String,
    hashed_password: Option<String>,
}

/// Look a user up by email. `None` when no account matches.
async fn user_by_email(conn: &Client, email: &str) -> Result<Option<UserRow>, ApiError> {
    let row = conn
        .query_opt(sql::SELECT_USER_BY_EMAIL, &[&email])
        .await
        .map_err(ApiError::from_store)?;
    Ok(row.map(|row| UserRow {
        id: row.get("id"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
    }))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user_id: i32,
}

// register / login / logout
// ----------------------------------------------------------------------------

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

/// Create a password-based account and mint its first token. The insert and
/// the token mint share one unit of work, so no token leaves the handler for
/// a user row that was rolled back.
#[post("/users/register")]
pub async fn register(
    pool: web::Data<Pool>,
    keys: web::Data<AuthKeys>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let hashed = auth::hash_password(&body.password).map_err(|err| {
        error!("failed to hash password, error({err})");
        ApiError::Internal
    })?;

    let mut conn = pool.get().await?;
    let tx = conn.transaction().await.map_err(ApiError::from_store)?;
    let row = tx
        .query_one(
            sql::INSERT_USER,
            &[&body.username, &body.email, &Some(hashed.as_str()), &None::<&str>],
        )
        .await
        .map_err(|err| {
            if error::is_unique_violation(&err) {
                ApiError::DuplicateEmail
            } else {
                ApiError::from_store(err)
            }
        })?;
    let user_id: i32 = row.get(0);

    let token = keys
        .issue(&Claims::new(user_id, &body.email, Some("credentials")))
        .map_err(|err| {
            error!("failed to sign token, error({err})");
            ApiError::Internal
        })?;
    tx.commit().await.map_err(ApiError::from_store)?;

    info!("registered user {user_id}");
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Unknown email, passwordless account, and wrong password all fail with the
/// same error, so callers cannot probe which emails are registered.
#[post("/users/login")]
pub async fn login(
    pool: web::Data<Pool>,
    keys: web::Data<AuthKeys>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = pool.get().await?;
    let user = user_by_email(&conn, &body.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    let hash = user
        .hashed_password
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;
    if !auth::verify_password(&body.password, hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys
        .issue(&Claims::new(user.id, &user.email, Some("credentials")))
        .map_err(|err| {
            error!("failed to sign token, error({err})");
            ApiError::Internal
        })?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        user_id: user.id,
    }))
}

/// Tokens are stateless and never revoked server-side; logout only proves the
/// caller held a valid one.
#[post("/users/logout")]
pub async fn logout(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "successfully logged out",
    })
}

// oauth
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OAuthRequest {
    email: Option<String>,
    name: String,
    provider: String,
}

/// Twitter hands out no email; derive a stable placeholder address from the
/// handle instead. Every other provider must supply one.
fn oauth_email(provider: &str, email: Option<&str>, name: &str) -> Result<String, ApiError> {
    match (email, provider) {
        (Some(email), _) => Ok(email.to_owned()),
        (None, "twitter") => Ok(format!("{name}@twitter.user")),
        (None, _) => Err(ApiError::Validation(format!(
            "provider '{provider}' requires an email"
        ))),
    }
}

fn oauth_username(provider: &str, name: &str, email: &str) -> String {
    if provider == "twitter" {
        name.to_owned()
    } else {
        let local = email.split('@').next().unwrap_or_default();
        format!("{name}_{local}")
    }
}

/// Find or create an account for a third-party login and mint a token either
/// way.
#[post("/users/oauth")]
pub async fn oauth(
    pool: web::Data<Pool>,
    keys: web::Data<AuthKeys>,
    body: web::Json<OAuthRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = oauth_email(&body.provider, body.email.as_deref(), &body.name)?;

    let mut conn = pool.get().await?;
    if let Some(user) = user_by_email(&conn, &email).await? {
        let token = keys
            .issue(&Claims::new(user.id, &user.email, Some(&body.provider)))
            .map_err(|err| {
                error!("failed to sign token, error({err})");
                ApiError::Internal
            })?;
        return Ok(HttpResponse::Ok().json(SessionResponse {
            token,
            user_id: user.id,
        }));
    }

    // first login through this provider; provision a passwordless account
    let username = oauth_username(&body.provider, &body.name, &email);
    let tx = conn.transaction().await.map_err(ApiError::from_store)?;
    let row = tx
        .query_one(
            sql::INSERT_USER,
            &[&username, &email, &None::<&str>, &Some(body.provider.as_str())],
        )
        .await
        .map_err(|err| {
            if error::is_unique_violation(&err) {
                ApiError::DuplicateEmail
            } else {
                ApiError::from_store(err)
            }
        })?;
    let user_id: i32 = row.get(0);
    let token = keys
        .issue(&Claims::new(user_id, &email, Some(&body.provider)))
        .map_err(|err| {
            error!("failed to sign token, error({err})");
            ApiError::Internal
        })?;
    tx.commit().await.map_err(ApiError::from_store)?;

    info!("provisioned {} account for user {user_id}", body.provider);
    Ok(HttpResponse::Ok().json(SessionResponse { token, user_id }))
}

// profile
// ----------------------------------------------------------------------------

#[derive(Serialize)]
struct ProfileResponse {
    id: String,
    email: String,
    provider: Option<String>,
    username: String,
}

/// Profile straight from the verified claims; no store read, so it reflects
/// the account as it looked when the token was minted.
#[get("/users/me")]
pub async fn me(identity: Identity) -> HttpResponse {
    let claims = identity.0;
    let username = claims.username().to_owned();
    HttpResponse::Ok().json(ProfileResponse {
        id: claims.sub,
        email: claims.email,
        provider: claims.provider,
        username,
    })
}

// tracked companies
// ----------------------------------------------------------------------------

#[derive(Deserialize)]
struct TrackRequest {
    ciks: Vec<i32>,
}

#[derive(Serialize)]
struct TrackResponse {
    message: &'static str,
    added: Vec<i32>,
    skipped: Vec<i32>,
}

/// Track a batch of companies. Each pair is its own unit of work: an
/// already-tracked cik lands in `skipped` and the loop keeps going, so a
/// batch never rolls back wholesale.
#[post("/users/companies")]
pub async fn track_companies(
    pool: web::Data<Pool>,
    identity: Identity,
    body: web::Json<TrackRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = pool.get().await?;
    let user = user_by_email(&conn, &identity.0.email)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for cik in &body.ciks {
        match conn.execute(sql::INSERT_USER_COMPANY, &[&user.id, cik]).await {
            Ok(_) => added.push(*cik),
            Err(err) if error::is_unique_violation(&err) => skipped.push(*cik),
            Err(err) => {
                error!("failed to track cik {cik}, error({err})");
                return Err(ApiError::Store);
            }
        }
    }

    Ok(HttpResponse::Ok().json(TrackResponse {
        message: "companies processed",
        added,
        skipped,
    }))
}

#[derive(Deserialize)]
struct UntrackRequest {
    cik: i32,
}

/// Stop tracking one company. Deleting a pair that was never tracked is not
/// an error.
#[delete("/users/companies")]
pub async fn untrack_company(
    pool: web::Data<Pool>,
    identity: Identity,
    body: web::Json<UntrackRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = pool.get().await?;
    let user = user_by_email(&conn, &identity.0.email)
        .await?
        .ok_or(ApiError::NotFound)?;
    conn.execute(sql::DELETE_USER_COMPANY, &[&user.id, &body.cik])
        .await
        .map_err(ApiError::from_store)?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "company removed from tracking successfully",
    }))
}

/// Delete the account: owned tracking rows first, then the user row, in one
/// unit of work.
#[delete("/users/delete")]
pub async fn delete_account(
    pool: web::Data<Pool>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let mut conn = pool.get().await?;
    let user = user_by_email(&conn, &identity.0.email)
        .await?
        .ok_or(ApiError::NotFound)?;

    let tx = conn.transaction().await.map_err(ApiError::from_store)?;
    tx.execute(sql::DELETE_USER_COMPANIES, &[&user.id])
        .await
        .map_err(ApiError::from_store)?;
    tx.execute(sql::DELETE_USER, &[&user.id])
        .await
        .map_err(ApiError::from_store)?;
    tx.commit().await.map_err(ApiError::from_store)?;

    info!("deleted user {}", user.id);
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "user deleted successfully",
    }))
}

#[derive(Serialize)]
struct CompanyData {
    cik: i32,
    year: i32,
    month: i32,
    accounts_payable: Option<f64>,
    assets: Option<f64>,
    liabilities: Option<f64>,
    cash: Option<f64>,
    accounts_receivable: Option<f64>,
    inventory: Option<f64>,
    long_term_debt: Option<f64>,
}

/// Latest financial snapshot per tracked company. Tracking nothing (or only
/// companies without filings) yields an empty list, not an error.
#[get("/users/companies/data")]
pub async fn tracked_company_data(
    pool: web::Data<Pool>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let conn = pool.get().await?;
    let user = user_by_email(&conn, &identity.0.email)
        .await?
        .ok_or(ApiError::NotFound)?;

    let rows = conn
        .query(sql::SELECT_TRACKED_LATEST, &[&user.id])
        .await
        .map_err(ApiError::from_store)?;
    let data: Vec<CompanyData> = rows
        .iter()
        .map(|row| CompanyData {
            cik: row.get("cik"),
            year: row.get("year"),
            month: row.get("month"),
            accounts_payable: row.get("accounts_payable"),
            assets: row.get("assets"),
            liabilities: row.get("liabilities"),
            cash: row.get("cash"),
            accounts_receivable: row.get("accounts_receivable"),
            inventory: row.get("inventory"),
            long_term_debt: row.get("long_term_debt"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

#[derive(Serialize)]
struct TrackedCompany {
    cik: String,
    ticker: String,
    companyname: String,
    year: i32,
    month: i32,
    cash_and_equivalents: Option<f64>,
    long_term_debt: Option<f64>,
}

/// Tracked companies with metadata and their latest snapshot. Unlike the
/// other routes this one authenticates on the numeric subject claim alone.
#[get("/users/companies")]
pub async fn tracked_companies(
    pool: web::Data<Pool>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let user_id = identity.0.user_id().map_err(ApiError::Auth)?;

    let conn = pool.get().await?;
    let rows = conn
        .query(sql::SELECT_TRACKED_COMPANIES, &[&user_id])
        .await
        .map_err(ApiError::from_store)?;
    let data: Vec<TrackedCompany> = rows
        .iter()
        .map(|row| TrackedCompany {
            cik: row.get::<_, i32>("cik").to_string(),
            ticker: row.get("ticker"),
            companyname: row.get("companyname"),
            year: row.get("year"),
            month: row.get("month"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            long_term_debt: row.get("long_term_debt"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_without_email_gets_a_placeholder() {
        let email = oauth_email("twitter", None, "jack").unwrap();
        assert_eq!(email, "jack@twitter.user");
    }

    #[test]
    fn other_providers_require_an_email() {
        assert!(matches!(
            oauth_email("google", None, "alice"),
            Err(ApiError::Validation(_))
        ));
        let email = oauth_email("google", Some("alice@example.com"), "alice").unwrap();
        assert_eq!(email, "alice@example.com");
    }

    #[test]
    fn oauth_usernames_follow_the_provider() {
        assert_eq!(oauth_username("twitter", "jack", "jack@twitter.user"), "jack");
        assert_eq!(
            oauth_username("google", "Alice Smith", "alice@example.com"),
            "Alice Smith_alice"
        );
    }
}
