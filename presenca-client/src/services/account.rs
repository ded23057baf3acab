//! Account operations: login, logout, registration, profile, promotion and
//! the personal QR code

use crate::client::backend::BackendClient;
use crate::client::token::{SessionToken, TokenStore};
use crate::error::{ClientError, ClientResult};
use crate::utils::data_url::save_data_url;
use once_cell::sync::Lazy;
use presenca_common::api::types::DEFAULT_USER_KIND;
use presenca_common::api::{RegisterRequest, UserProfile};
use presenca_common::cpf::{check_format, validate};
use presenca_common::Cpf;
use regex::Regex;
use std::path::Path;
use tracing::info;

const EMAIL_PATTERN: &str = r"\S+@\S+\.\S+";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub nome: Option<String>,
    pub is_admin: bool,
}

/// Self-registration form, as typed by the user
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub nome: String,
    pub cpf: String,
    pub area: String,
    pub congregacao: String,
    pub email: String,
}

impl Registration {
    /// Check every field and build the request body
    pub fn validate(&self) -> ClientResult<RegisterRequest> {
        let nome = self.nome.trim();
        let cpf = self.cpf.trim();
        let area = self.area.trim();
        let congregacao = self.congregacao.trim();
        let email = self.email.trim();

        if [nome, cpf, area, congregacao, email]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(invalid("Por favor, preencha todos os campos."));
        }

        let cpf: Cpf = validate(cpf).map_err(|_| invalid("CPF inválido."))?;

        let area: i64 = area
            .parse()
            .map_err(|_| invalid("Área deve ser um número."))?;

        if !EMAIL_REGEX.is_match(email) {
            return Err(invalid("Email inválido."));
        }

        Ok(RegisterRequest {
            nome: nome.to_string(),
            cpf: cpf.as_str().to_string(),
            area,
            congregacao: congregacao.to_string(),
            email: email.to_string(),
            tipo_usuario: DEFAULT_USER_KIND.to_string(),
        })
    }
}

fn invalid(message: &str) -> ClientError {
    ClientError::InvalidInput(message.to_string())
}

/// Structural CPF check used by login and promotion
fn require_cpf_format(input: &str) -> ClientResult<&str> {
    check_format(input.trim()).map_err(|_| invalid("CPF inválido. Deve conter 11 dígitos."))
}

/// Account operations against the backend
#[derive(Debug, Clone)]
pub struct AccountService {
    backend: BackendClient,
    tokens: TokenStore,
}

impl AccountService {
    pub fn new(backend: BackendClient, tokens: TokenStore) -> Self {
        Self { backend, tokens }
    }

    /// Stored session token, or `Unauthenticated`
    pub fn token(&self) -> ClientResult<SessionToken> {
        self.tokens.load()?.ok_or(ClientError::Unauthenticated)
    }

    /// Log in and store the returned token
    pub async fn login(&self, cpf: &str) -> ClientResult<LoginOutcome> {
        let cpf = require_cpf_format(cpf)?;
        let response = self.backend.login(cpf).await?;

        let token = response
            .token
            .as_deref()
            .and_then(SessionToken::new)
            .ok_or_else(|| ClientError::Decode("login response carries no token".to_string()))?;
        self.tokens.save(&token)?;

        let outcome = LoginOutcome {
            nome: response.user.as_ref().and_then(|u| u.nome.clone()),
            is_admin: response.is_admin(),
        };
        info!(is_admin = outcome.is_admin, "Logged in");
        Ok(outcome)
    }

    /// Forget the stored token. Returns false if there was none.
    pub fn logout(&self) -> ClientResult<bool> {
        Ok(self.tokens.clear()?)
    }

    pub async fn register(&self, form: &Registration) -> ClientResult<()> {
        let request = form.validate()?;
        self.backend.register(&request).await?;
        info!("Registration accepted");
        Ok(())
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        let token = self.token()?;
        self.backend.profile(&token).await
    }

    pub async fn user(&self, id: &str) -> ClientResult<UserProfile> {
        let id = id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(invalid("Identificador de usuário inválido."));
        }
        let token = self.token()?;
        self.backend.user(id, &token).await
    }

    /// Grant admin rights; returns the backend's message
    pub async fn promote(&self, cpf: &str) -> ClientResult<String> {
        let cpf = require_cpf_format(cpf)?;
        let token = self.token()?;
        let response = self.backend.promote(cpf, &token).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Usuário promovido.".to_string()))
    }

    /// Render the logged-in user's QR code to a PNG file
    pub async fn generate_qr_code(&self, out: &Path) -> ClientResult<UserProfile> {
        let token = self.token()?;
        let profile = self.backend.profile(&token).await?;
        let response = self.backend.generate_qr_code(&profile.cpf, &token).await?;

        let data_url = response
            .qr_code_url
            .ok_or_else(|| ClientError::Decode("QR code response carries no image".to_string()))?;
        let bytes = save_data_url(&data_url, out)?;
        info!(path = %out.display(), bytes, "QR code saved");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Registration {
        Registration {
            nome: "Ana Souza".to_string(),
            cpf: "529.982.247-25".to_string(),
            area: "3".to_string(),
            congregacao: "Central".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let mut form = form();
        form.cpf = " 52998224725 ".to_string();
        let request = form.validate().unwrap();
        assert_eq!(request.cpf, "52998224725");
        assert_eq!(request.area, 3);
        assert_eq!(request.tipo_usuario, "usuario");
    }

    #[test]
    fn test_registration_rejections() {
        let mut missing = form();
        missing.congregacao = "  ".to_string();
        assert!(matches!(missing.validate(), Err(ClientError::InvalidInput(_))));

        // Punctuated CPFs are not accepted, only 11 digits
        assert!(form().validate().is_err());

        let mut bad_area = form();
        bad_area.cpf = "52998224725".to_string();
        bad_area.area = "três".to_string();
        assert!(bad_area.validate().is_err());

        let mut bad_email = form();
        bad_email.cpf = "52998224725".to_string();
        bad_email.email = "ana@example".to_string();
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_email_check_is_reusable() {
        for (email, accepted) in [
            ("ana@example.com", true),
            ("a.b@igreja.org.br", true),
            ("ana@example", false),
            ("ana@example.com", true),
        ] {
            let mut registration = form();
            registration.cpf = "52998224725".to_string();
            registration.email = email.to_string();

            match registration.validate() {
                Ok(request) => {
                    assert!(accepted, "{} should be rejected", email);
                    assert_eq!(request.email, email);
                }
                Err(ClientError::InvalidInput(message)) => {
                    assert!(!accepted, "{} should be accepted", email);
                    assert_eq!(message, "Email inválido.");
                }
                Err(other) => panic!("unexpected error for {}: {:?}", email, other),
            }
        }
    }

    #[test]
    fn test_cpf_format_check() {
        assert!(require_cpf_format("12345678900").is_ok());
        assert!(require_cpf_format("1234567890").is_err());
    }
}
