//! Carrier configuration repository.

use async_trait::async_trait;
use correio_labels_core::dimensions::RequestedDims;
use correio_labels_core::{
    Address, CarrierConfig, CarrierEnvironment, PackageType, SenderIdentity, TenantId,
};
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::RepositoryError;
use super::repository::CarrierConfigStore;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CarrierConfigRow {
    tenant_id: TenantId,
    account_id: String,
    access_code: String,
    contract_number: String,
    postage_card: String,
    environment: String,
    sender_name: String,
    sender_tax_id: String,
    sender_phone: Option<String>,
    sender_email: Option<String>,
    sender_street: String,
    sender_number: String,
    sender_complement: Option<String>,
    sender_neighborhood: String,
    sender_city: String,
    sender_state: String,
    sender_postal_code: String,
    default_service_code: String,
    default_package_type: String,
    default_weight: Option<f64>,
    default_height: Option<f64>,
    default_width: Option<f64>,
    default_length: Option<f64>,
    active: bool,
}

impl TryFrom<CarrierConfigRow> for CarrierConfig {
    type Error = RepositoryError;

    fn try_from(row: CarrierConfigRow) -> Result<Self, Self::Error> {
        let environment: CarrierEnvironment = row.environment.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid carrier environment: {e}"))
        })?;
        let default_package_type: PackageType = row.default_package_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid package type: {e}"))
        })?;

        Ok(Self {
            tenant_id: row.tenant_id,
            account_id: row.account_id,
            access_code: row.access_code,
            contract_number: row.contract_number,
            postage_card: row.postage_card,
            environment,
            sender: SenderIdentity {
                name: row.sender_name,
                tax_id: row.sender_tax_id,
                phone: row.sender_phone,
                email: row.sender_email,
                address: Address {
                    street: row.sender_street,
                    number: row.sender_number,
                    complement: row.sender_complement,
                    neighborhood: row.sender_neighborhood,
                    city: row.sender_city,
                    state: row.sender_state,
                    postal_code: row.sender_postal_code,
                },
            },
            default_service_code: row.default_service_code,
            default_package_type,
            default_dims: RequestedDims {
                weight: row.default_weight,
                height: row.default_height,
                width: row.default_width,
                length: row.default_length,
            },
            active: row.active,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Postgres-backed [`CarrierConfigStore`].
#[derive(Debug, Clone)]
pub struct CarrierConfigRepository {
    pool: PgPool,
}

impl CarrierConfigRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarrierConfigStore for CarrierConfigRepository {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn find(&self, tenant_id: TenantId) -> Result<Option<CarrierConfig>, RepositoryError> {
        let row = sqlx::query_as::<_, CarrierConfigRow>(
            r"
            SELECT tenant_id, account_id, access_code, contract_number, postage_card,
                   environment,
                   sender_name, sender_tax_id, sender_phone, sender_email,
                   sender_street, sender_number, sender_complement, sender_neighborhood,
                   sender_city, sender_state, sender_postal_code,
                   default_service_code, default_package_type,
                   default_weight, default_height, default_width, default_length,
                   active
            FROM carrier_configs
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, config), fields(tenant_id = %config.tenant_id))]
    async fn upsert(&self, config: &CarrierConfig) -> Result<(), RepositoryError> {
        let sender = &config.sender;
        let address = &sender.address;
        let dims = &config.default_dims;

        sqlx::query(
            r"
            INSERT INTO carrier_configs (
                tenant_id, account_id, access_code, contract_number, postage_card,
                environment,
                sender_name, sender_tax_id, sender_phone, sender_email,
                sender_street, sender_number, sender_complement, sender_neighborhood,
                sender_city, sender_state, sender_postal_code,
                default_service_code, default_package_type,
                default_weight, default_height, default_width, default_length,
                active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            ON CONFLICT (tenant_id) DO UPDATE SET
                account_id = EXCLUDED.account_id,
                access_code = EXCLUDED.access_code,
                contract_number = EXCLUDED.contract_number,
                postage_card = EXCLUDED.postage_card,
                environment = EXCLUDED.environment,
                sender_name = EXCLUDED.sender_name,
                sender_tax_id = EXCLUDED.sender_tax_id,
                sender_phone = EXCLUDED.sender_phone,
                sender_email = EXCLUDED.sender_email,
                sender_street = EXCLUDED.sender_street,
                sender_number = EXCLUDED.sender_number,
                sender_complement = EXCLUDED.sender_complement,
                sender_neighborhood = EXCLUDED.sender_neighborhood,
                sender_city = EXCLUDED.sender_city,
                sender_state = EXCLUDED.sender_state,
                sender_postal_code = EXCLUDED.sender_postal_code,
                default_service_code = EXCLUDED.default_service_code,
                default_package_type = EXCLUDED.default_package_type,
                default_weight = EXCLUDED.default_weight,
                default_height = EXCLUDED.default_height,
                default_width = EXCLUDED.default_width,
                default_length = EXCLUDED.default_length,
                active = EXCLUDED.active,
                updated_at = NOW()
            ",
        )
        .bind(config.tenant_id)
        .bind(&config.account_id)
        .bind(&config.access_code)
        .bind(&config.contract_number)
        .bind(&config.postage_card)
        .bind(config.environment.as_str())
        .bind(&sender.name)
        .bind(&sender.tax_id)
        .bind(sender.phone.as_deref())
        .bind(sender.email.as_deref())
        .bind(&address.street)
        .bind(&address.number)
        .bind(address.complement.as_deref())
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&config.default_service_code)
        .bind(config.default_package_type.as_str())
        .bind(dims.weight)
        .bind(dims.height)
        .bind(dims.width)
        .bind(dims.length)
        .bind(config.active)
        .execute(&self.pool)
        .await?;

        debug!("Carrier config saved");
        Ok(())
    }
}
