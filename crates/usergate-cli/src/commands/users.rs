use anyhow::{Context, Result, anyhow, bail};
use usergate_auth::{AuthenticateOptions, Authenticator};
use usergate_auth_postgres::{Pagination, UserStorage};

use crate::cli::{GetUserArgs, ListUsersArgs, OutputFormat};
use crate::output::{print_users, print_value};

pub async fn list(users: &UserStorage<'_>, args: &ListUsersArgs, format: OutputFormat) -> Result<()> {
    let page = Pagination::new(args.per_page, args.page);
    let records = users.list_page(page).await?;
    print_users(&records, format)
}

pub async fn get(
    users: &UserStorage<'_>,
    authenticator: &dyn Authenticator,
    args: &GetUserArgs,
    format: OutputFormat,
) -> Result<()> {
    let id = resolve_user_id(&args.id, args.token.as_deref(), authenticator).await?;
    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow!("user {id} not found"))?;
    print_value(&user, format)
}

/// Resolves `"me"` through the bearer token, anything else as a numeric id.
pub async fn resolve_user_id(
    id: &str,
    token: Option<&str>,
    authenticator: &dyn Authenticator,
) -> Result<i64> {
    if id != "me" {
        return id
            .parse()
            .with_context(|| format!("invalid user id: {id}"));
    }

    let token = token.context("--token is required for \"me\"")?;
    let context = authenticator
        .authenticate(token, &AuthenticateOptions::default())
        .await
        .map_err(|e| anyhow!("{}: {e}", e.oauth_error_code()))?;

    if context.client_credential {
        bail!("token was issued to a client, not a user");
    }
    context
        .user_id
        .context("token is not associated with a user")
}

#[cfg(test)]
mod tests {
    use super::*;
    use usergate_auth::oauth::StaticAuthenticator;
    use usergate_auth::types::AuthContext;

    #[tokio::test]
    async fn test_numeric_id() {
        let auth = StaticAuthenticator::default();
        assert_eq!(resolve_user_id("42", None, &auth).await.unwrap(), 42);
        assert!(resolve_user_id("abc", None, &auth).await.is_err());
    }

    #[tokio::test]
    async fn test_me_resolves_through_token() {
        let auth = StaticAuthenticator::new(7);
        assert_eq!(resolve_user_id("me", Some("tok"), &auth).await.unwrap(), 7);
        assert!(resolve_user_id("me", None, &auth).await.is_err());
    }

    #[tokio::test]
    async fn test_me_rejects_client_token() {
        let auth = StaticAuthenticator::with_context(AuthContext {
            client_id: Some("b921b25ebe3ee70c6b2".to_string()),
            client_credential: true,
            ..AuthContext::default()
        });
        assert!(resolve_user_id("me", Some("tok"), &auth).await.is_err());
    }
}
