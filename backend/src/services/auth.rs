//! Authentication service for shop registration, cashier accounts and login

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::models::CashierStatus;
use shared::validation::{validate_password, validate_phone};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new shop with its owner account
#[derive(Debug, Deserialize)]
pub struct RegisterShopInput {
    pub shop_name: String,
    pub owner_name: String,
    pub phone: String,
    pub password: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub default_currency: Option<String>,
}

/// Input for registering a cashier (starts pending approval)
#[derive(Debug, Deserialize)]
pub struct RegisterCashierInput {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub email: Option<String>,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub shop_id: Uuid,
    pub cashier_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Cashier ID
    pub shop_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Cashier info from database
#[derive(Debug, FromRow)]
pub struct CashierRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new shop with its owner account
    pub async fn register_shop(&self, input: RegisterShopInput) -> AppResult<RegisterResponse> {
        validate_phone(&input.phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM cashiers WHERE phone = $1",
        )
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("phone".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let shop_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO shops (name, address, phone, default_currency)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.shop_name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.default_currency.as_deref().unwrap_or("USD"))
        .fetch_one(&mut *tx)
        .await?;

        // The registering owner is active immediately
        let cashier_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO cashiers (shop_id, name, email, phone, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, 'owner', 'active')
            RETURNING id
            "#,
        )
        .bind(shop_id)
        .bind(&input.owner_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let tokens = self.generate_token(cashier_id, shop_id, "owner")?;

        tracing::info!(shop_id = %shop_id, "Registered new shop");

        Ok(RegisterResponse {
            shop_id,
            cashier_id,
            access_token: tokens.access_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// Register a cashier for an existing shop; account starts pending
    pub async fn register_cashier(
        &self,
        shop_id: Uuid,
        input: RegisterCashierInput,
    ) -> AppResult<Uuid> {
        validate_phone(&input.phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM cashiers WHERE phone = $1",
        )
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("phone".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let cashier_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO cashiers (shop_id, name, email, phone, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, 'cashier', 'pending')
            RETURNING id
            "#,
        )
        .bind(shop_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(cashier_id)
    }

    /// Owner approval: pending → active, or pending → rejected
    pub async fn set_cashier_status(
        &self,
        shop_id: Uuid,
        cashier_id: Uuid,
        status: CashierStatus,
    ) -> AppResult<()> {
        if !matches!(
            status,
            CashierStatus::Active | CashierStatus::Inactive | CashierStatus::Rejected
        ) {
            return Err(AppError::Validation {
                field: "status".to_string(),
                message: "Cashiers cannot be moved back to pending".to_string(),
            });
        }

        let result = sqlx::query(
            "UPDATE cashiers SET status = $3 WHERE id = $1 AND shop_id = $2 AND role != 'owner'",
        )
        .bind(cashier_id)
        .bind(shop_id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cashier".to_string()));
        }

        Ok(())
    }

    /// Authenticate a cashier with phone and password
    pub async fn login(&self, phone: &str, password: &str) -> AppResult<AuthTokens> {
        let cashier = sqlx::query_as::<_, CashierRow>(
            r#"
            SELECT id, shop_id, name, email, phone, password_hash, role, status
            FROM cashiers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let status = CashierStatus::parse(&cashier.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown cashier status: {}", cashier.status)))?;
        if !status.can_login() {
            return Err(AppError::Unauthorized(
                "Account is not active".to_string(),
            ));
        }

        let valid = verify(password, &cashier.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.generate_token(cashier.id, cashier.shop_id, &cashier.role)
    }

    /// List cashiers for a shop
    pub async fn list_cashiers(&self, shop_id: Uuid) -> AppResult<Vec<CashierInfo>> {
        let cashiers = sqlx::query_as::<_, CashierInfo>(
            r#"
            SELECT id, shop_id, name, email, phone, role, status
            FROM cashiers
            WHERE shop_id = $1
            ORDER BY name
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(cashiers)
    }

    fn generate_token(&self, cashier_id: Uuid, shop_id: Uuid, role: &str) -> AppResult<AuthTokens> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: cashier_id.to_string(),
            shop_id: shop_id.to_string(),
            role: role.to_string(),
            exp: now + self.access_token_expiry,
            iat: now,
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}

/// Cashier listing row, without the password hash
#[derive(Debug, Serialize, FromRow)]
pub struct CashierInfo {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub role: String,
    pub status: String,
}
