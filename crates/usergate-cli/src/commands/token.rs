use anyhow::{Result, bail};
use usergate_auth::{AuthenticateOptions, Authenticator, GrantEngine, TokenRequest};

use crate::cli::{AuthenticateArgs, GrantArg, IssueTokenArgs, OutputFormat, RevokeArgs};
use crate::output::{print_success, print_value};

/// Maps command-line arguments onto a token request.
pub fn build_request(args: &IssueTokenArgs) -> Result<TokenRequest> {
    if args.client_secret.as_deref().is_none_or(str::is_empty) {
        bail!("--client-secret is required");
    }

    let grant_type = match args.grant {
        GrantArg::Password => {
            if args.username.is_none() || args.password.is_none() {
                bail!("--username and --password are required for the password grant");
            }
            "password"
        }
        GrantArg::ClientCredentials => "client_credentials",
        GrantArg::RefreshToken => {
            if args.refresh_token.is_none() {
                bail!("--refresh-token is required for the refresh_token grant");
            }
            "refresh_token"
        }
    };

    Ok(TokenRequest {
        grant_type: grant_type.to_string(),
        client_id: Some(args.client_id.clone()),
        client_secret: args.client_secret.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        refresh_token: args.refresh_token.clone(),
        scope: args.scope.clone(),
    })
}

pub async fn issue(engine: &GrantEngine, args: &IssueTokenArgs, format: OutputFormat) -> Result<()> {
    let request = build_request(args)?;
    let response = engine
        .issue_token(&request)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {e}", e.oauth_error_code()))?;
    print_value(&response, format)
}

pub async fn authenticate(
    authenticator: &dyn Authenticator,
    args: &AuthenticateArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut options = AuthenticateOptions::default();
    if let Some(scope) = &args.scope {
        options = options.with_scope(scope.clone());
    }
    if args.continue_on_failure {
        options = options.continue_on_failure();
    }

    let context = authenticator
        .authenticate(&args.token, &options)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {e}", e.oauth_error_code()))?;
    print_value(&context, format)
}

pub async fn revoke(engine: &GrantEngine, args: &RevokeArgs) -> Result<()> {
    if engine.revoke_token(&args.refresh_token).await? {
        print_success("Token revoked");
        Ok(())
    } else {
        bail!("no token carries that refresh token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(grant: GrantArg) -> IssueTokenArgs {
        IssueTokenArgs {
            grant,
            client_id: "b921b25ebe3ee70c6b1".to_string(),
            client_secret: Some("web-secret".to_string()),
            username: None,
            password: None,
            refresh_token: None,
            scope: None,
        }
    }

    #[test]
    fn test_password_request() {
        let mut args = make_args(GrantArg::Password);
        assert!(build_request(&args).is_err());

        args.username = Some("alice".to_string());
        args.password = Some("wonderland".to_string());
        args.scope = Some("read".to_string());
        let request = build_request(&args).unwrap();
        assert_eq!(request.grant_type, "password");
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert_eq!(request.scope.as_deref(), Some("read"));
        assert_eq!(request.client_secret.as_deref(), Some("web-secret"));
    }

    #[test]
    fn test_every_grant_needs_secret() {
        let mut args = make_args(GrantArg::ClientCredentials);
        assert_eq!(build_request(&args).unwrap().grant_type, "client_credentials");

        args.client_secret = None;
        assert!(build_request(&args).is_err());
        args.client_secret = Some(String::new());
        assert!(build_request(&args).is_err());

        let mut args = make_args(GrantArg::Password);
        args.username = Some("alice".to_string());
        args.password = Some("wonderland".to_string());
        args.client_secret = None;
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn test_refresh_needs_token() {
        let mut args = make_args(GrantArg::RefreshToken);
        assert!(build_request(&args).is_err());

        args.refresh_token = Some("rt".to_string());
        let request = build_request(&args).unwrap();
        assert_eq!(request.grant_type, "refresh_token");
        assert_eq!(request.refresh_token.as_deref(), Some("rt"));
    }
}
