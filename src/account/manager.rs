/// Account lifecycle orchestration
///
/// Drives the account state machine (registration, verification, sessions,
/// password reset, role assignment) against the credential store. Uses
/// runtime queries through the store only; no SQL here.
use crate::{
    account::{
        otp, password, roles, AssignRolesRequest, InitiatePasswordResetRequest, LoginOutcome,
        LoginRequest, RegisterRequest, ResetPasswordRequest, Role, TokenIssuer,
        VerifyEmailRequest,
    },
    db::user::{NewUser, PublicUser, UserStore},
    error::{ApiError, ApiResult},
    mailer::Mailer,
};
use std::sync::Arc;

/// Account lifecycle manager
pub struct AccountManager {
    users: UserStore,
    tokens: Arc<TokenIssuer>,
    mailer: Arc<Mailer>,
}

impl AccountManager {
    pub fn new(users: UserStore, tokens: Arc<TokenIssuer>, mailer: Arc<Mailer>) -> Self {
        Self {
            users,
            tokens,
            mailer,
        }
    }

    /// Register a new account. The account starts unverified with a pending
    /// email verification code; the code is delivered best-effort.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<PublicUser> {
        let username = required(req.username)?.to_lowercase();
        let email = required(req.email)?.to_lowercase();
        let plaintext = required(req.password)?;
        let first_name = required(req.first_name)?;
        let last_name = required(req.last_name)?;

        if !email.contains('@') {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }

        if self.users.username_or_email_exists(&username, &email).await? {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let code = otp::generate();
        let password_hash = password::hash(&plaintext)?;

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                first_name,
                last_name,
                email_otp: code.code.clone(),
                email_otp_expires_at: code.expires_at,
            })
            .await?;

        self.deliver_code(
            &user.email,
            &code.code,
            "Email Verification OTP",
            "Your inkpost email verification code is",
        )
        .await;

        tracing::info!("Registered account {} ({})", user.username, user.id);

        Ok(user.to_public())
    }

    /// Verify an account's email with the pending code. A matching code is
    /// consumed whether or not anything later fails; re-verification of an
    /// already-verified account is a conflict, never a silent success.
    pub async fn verify_email(&self, req: VerifyEmailRequest) -> ApiResult<()> {
        let email = required(req.email)?.to_lowercase();
        let code = required(req.otp)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if user.is_verified {
            return Err(ApiError::Conflict("User already verified".to_string()));
        }

        if !otp::matches(user.email_otp.as_deref(), user.email_otp_expires_at, &code) {
            return Err(ApiError::Validation(
                "Invalid OTP or OTP expired".to_string(),
            ));
        }

        self.users.mark_verified(&user.id).await?;

        tracing::info!("Email verified for account {}", user.id);

        Ok(())
    }

    /// Authenticate and open a session. Issues an access/refresh token pair
    /// and persists the refresh token, displacing any previous session.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginOutcome> {
        let plaintext = required(req.password)?;
        let identifier = req
            .username
            .or(req.email)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Validation("All fields are required".to_string()))?;

        let user = self
            .users
            .find_by_identifier(&identifier)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !password::verify(&plaintext, &user.password_hash)? {
            return Err(ApiError::Authentication("Invalid credentials".to_string()));
        }

        if !user.is_verified {
            return Err(ApiError::Authentication("User not verified".to_string()));
        }

        let access_token = self
            .tokens
            .issue_access_token(&user.id, &user.email, &user.roles)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(&user.id, &user.email, &user.roles)?;

        self.users
            .set_refresh_token(&user.id, Some(&refresh_token))
            .await?;

        tracing::info!("Account {} logged in", user.id);

        Ok(LoginOutcome {
            user: user.to_public(),
            access_token,
            refresh_token,
        })
    }

    /// Close a session. Idempotent: an absent or unknown token is not an
    /// error, the caller is logged out either way.
    pub async fn logout(&self, refresh_token: Option<String>) -> ApiResult<()> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if self.users.clear_refresh_token(&token).await? {
            tracing::info!("Session cleared on logout");
        }

        Ok(())
    }

    /// Exchange a live refresh token for a new short-lived access token.
    /// The refresh token itself is left in place. A token that fails
    /// verification is 401; a well-formed token that is not the account's
    /// current one (rotated, logged out, stolen) is 403.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> ApiResult<String> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .filter(|u| u.refresh_token.as_deref() == Some(refresh_token))
            .ok_or_else(|| ApiError::Authorization("Invalid refresh token".to_string()))?;

        self.tokens.reissue_access_token(&user.id, &user.email)
    }

    /// Start a password reset: store a fresh reset code and send it to the
    /// account's email, best-effort.
    pub async fn initiate_password_reset(
        &self,
        req: InitiatePasswordResetRequest,
    ) -> ApiResult<()> {
        let email = required(req.email)?.to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let code = otp::generate();
        self.users
            .set_reset_otp(&user.id, &code.code, code.expires_at)
            .await?;

        self.deliver_code(
            &user.email,
            &code.code,
            "Forgot Password OTP",
            "Your inkpost password reset code is",
        )
        .await;

        tracing::info!("Password reset initiated for account {}", user.id);

        Ok(())
    }

    /// Complete a password reset: the code is consumed and the password
    /// replaced. Does not log the account in.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> ApiResult<()> {
        let email = required(req.email)?.to_lowercase();
        let code = required(req.otp)?;
        let plaintext = required(req.password)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !otp::matches(user.reset_otp.as_deref(), user.reset_otp_expires_at, &code) {
            return Err(ApiError::Validation(
                "Invalid OTP or OTP expired".to_string(),
            ));
        }

        let password_hash = password::hash(&plaintext)?;
        self.users.reset_password(&user.id, &password_hash).await?;

        tracing::info!("Password reset completed for account {}", user.id);

        Ok(())
    }

    /// Replace a user's role set wholesale
    pub async fn assign_roles(
        &self,
        user_id: &str,
        req: AssignRolesRequest,
    ) -> ApiResult<Vec<Role>> {
        let new_roles = roles::parse_set(&req.roles.unwrap_or_default())?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        self.users.set_roles(&user.id, &new_roles).await?;

        tracing::info!(
            "Roles for account {} set to [{}]",
            user.id,
            roles::format_list(&new_roles)
        );

        Ok(new_roles)
    }

    /// Verify an access token and resolve it to a live account.
    /// The returned projection excludes all secret fields.
    pub async fn validate_access_token(&self, token: &str) -> ApiResult<PublicUser> {
        let claims = self.tokens.verify_access_token(token)?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Authentication("Invalid access token".to_string()))?;

        Ok(user.to_public())
    }

    /// Verify an access token, require one of the given roles from its
    /// claims (no store round-trip for the check), then resolve the account.
    pub async fn validate_role_token(
        &self,
        token: &str,
        required_roles: &[Role],
    ) -> ApiResult<PublicUser> {
        let claims = self.tokens.verify_access_token(token)?;

        let held = claims.roles.unwrap_or_default();
        if !required_roles.iter().any(|role| held.contains(role)) {
            return Err(ApiError::Authorization(
                "Insufficient permissions".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Authentication("Invalid access token".to_string()))?;

        Ok(user.to_public())
    }

    async fn deliver_code(&self, to: &str, code: &str, subject: &str, intro: &str) {
        // Delivery is best-effort: a failed send never fails the operation
        if let Err(e) = self.mailer.send_code(to, code, subject, intro).await {
            tracing::warn!("Failed to send \"{}\" to {}: {}", subject, to, e);
        }
    }
}

fn required(field: Option<String>) -> ApiResult<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("All fields are required".to_string()))
}
