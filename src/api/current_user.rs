//! Current user service
//!
//! Get the current user from the request based on the Authorization header.
//! Tokens are self-contained: a verified access token maps straight to a
//! user identity without touching storage.

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;

/// Access token lifetime, in seconds (15 minutes)
const ACCESS_TOKEN_EXPIRY: i64 = 15 * 60;

/// Refresh token lifetime, in seconds (14 days)
const REFRESH_TOKEN_EXPIRY: i64 = 14 * 24 * 60 * 60;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// What a token is good for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenUse {
    /// Short-lived, authorizes API calls
    Access,

    /// Long-lived, only good for minting a new pair
    Refresh,
}

/// The JWT claims that identify a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// The email address of the user
    email: String,

    /// What this token is good for
    token_use: TokenUse,

    /// Expiry, as a Unix timestamp
    exp: i64,
}

/// Token pair served to the user
#[derive(Debug, Serialize)]
pub struct TokenPair {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    token_type: String,

    /// In how many seconds does the access token expire
    expires_in: i64,

    /// The access token to provide in the Authorization header
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    access_token: String,

    /// The refresh token to mint a new pair with
    #[allow(clippy::struct_field_names)] // `refresh_token` is the name of the field
    refresh_token: String,
}

/// The verified identity behind a request
///
/// The anchor for every ownership check; holds exactly what the token
/// proves.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// The user ID
    pub user_id: Uuid,

    /// The email address of the user
    pub email: String,
}

/// Generate a fresh access/refresh token pair for a user identity
pub fn generate_token_pair(
    jwt_keys: &JwtKeys,
    user_id: Uuid,
    email: &str,
) -> Result<TokenPair, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let now = chrono::Utc::now().timestamp();

    let access_claims = Claims {
        sub: user_id,
        email: email.to_string(),
        token_use: TokenUse::Access,
        exp: now + ACCESS_TOKEN_EXPIRY,
    };

    let refresh_claims = Claims {
        sub: user_id,
        email: email.to_string(),
        token_use: TokenUse::Refresh,
        exp: now + REFRESH_TOKEN_EXPIRY,
    };

    let access_token = encode(&Header::default(), &access_claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    let refresh_token = encode(&Header::default(), &refresh_claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(TokenPair {
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_EXPIRY,
        access_token,
        refresh_token,
    })
}

/// Verify a refresh token and return the identity it proves
///
/// Access tokens are rejected here: a short-lived token must not be able to
/// extend its own life.
pub fn verify_refresh_token(jwt_keys: &JwtKeys, token: &str) -> Result<CurrentUser, Error> {
    let claims = decode_claims(jwt_keys, token)
        .map_err(|err| Error::unauthorized(format!("Invalid refresh token: {err}")))?;

    if claims.token_use != TokenUse::Refresh {
        return Err(Error::unauthorized("Not a refresh token"));
    }

    Ok(CurrentUser {
        user_id: claims.sub,
        email: claims.email,
    })
}

/// Decode and validate any token
fn decode_claims(jwt_keys: &JwtKeys, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    use jsonwebtoken::Validation;
    use jsonwebtoken::decode;

    let validation = Validation::default();

    decode::<Claims>(token, &jwt_keys.decoding, &validation).map(|data| data.claims)
}

impl<B> FromRequestParts<B> for CurrentUser
where
    B: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::unauthorized("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let claims = decode_claims(&jwt_keys, bearer.token())
            .map_err(|err| Error::unauthorized(format!("Invalid token: {err}")))?;

        if claims.token_use != TokenUse::Access {
            return Err(Error::unauthorized("Not an access token"));
        }

        Ok(CurrentUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
