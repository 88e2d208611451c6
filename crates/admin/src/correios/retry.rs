//! Submission ladder for the pre-posting endpoint.
//!
//! The canonical document goes first. Only a 400 whose body carries one of
//! [`STRUCTURAL_SIGNATURES`] moves on to the fallback variants, which are
//! tried strictly in [`SubmitVariant::FALLBACKS`] order until one is
//! accepted. Any other error, on any attempt, ends the ladder. When every
//! variant is refused for structure, the last error is returned.

use std::future::Future;

use correio_labels_core::payload::CarrierPayload;
use correio_labels_core::payload::variants::SubmitVariant;
use serde_json::Value;
use tracing::{info, warn};

use super::{CarrierFault, CorreiosError};

/// Lower-cased fragments of the rejections caused by document shape.
///
/// Taken from production 400 bodies; the carrier documents none of them.
pub const STRUCTURAL_SIGNATURES: &[&str] = &[
    "formato do objeto",
    "peso do objeto",
    "peso não informado",
    "ppn-295",
];

/// Whether a fault is a 400 matching a known structural signature.
#[must_use]
pub fn is_structural_rejection(fault: &CarrierFault) -> bool {
    if fault.status != 400 {
        return false;
    }
    let body = fault.raw_body.to_lowercase();
    STRUCTURAL_SIGNATURES
        .iter()
        .any(|signature| body.contains(signature))
}

/// Run the ladder with `send` performing one HTTP attempt.
///
/// `send` receives the variant and its rendered body and must report a
/// carrier refusal as [`CorreiosError::Rejected`].
///
/// # Errors
///
/// Returns the first non-structural error, or the error of the last
/// fallback when every variant was refused for structure.
pub async fn submit_with_fallbacks<T, F, Fut>(
    payload: &CarrierPayload,
    mut send: F,
) -> Result<(T, SubmitVariant), CorreiosError>
where
    F: FnMut(SubmitVariant, Value) -> Fut,
    Fut: Future<Output = Result<T, CorreiosError>>,
{
    let canonical = SubmitVariant::Canonical.render(payload)?;
    let mut last_error = match send(SubmitVariant::Canonical, canonical).await {
        Ok(accepted) => return Ok((accepted, SubmitVariant::Canonical)),
        Err(err) if err.is_structural() => err,
        Err(err) => return Err(err),
    };

    for variant in SubmitVariant::FALLBACKS {
        warn!(
            %variant,
            error = %last_error,
            "Pre-posting refused for structure, trying fallback"
        );

        let body = variant.render(payload)?;
        match send(variant, body).await {
            Ok(accepted) => {
                info!(%variant, "Pre-posting accepted with fallback");
                return Ok((accepted, variant));
            }
            Err(err) if err.is_structural() => last_error = err,
            Err(err) => return Err(err),
        }
    }

    Err(last_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use correio_labels_core::dimensions::RequestedDims;
    use correio_labels_core::payload::assemble;
    use correio_labels_core::types::{
        Address, CarrierConfig, CarrierEnvironment, LabelRequest, PackageType, Recipient,
        SenderIdentity, TenantId,
    };

    fn payload() -> CarrierPayload {
        let tenant_id = TenantId::generate();
        let address = Address {
            street: "Rua A".to_string(),
            number: "1".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "Recife".to_string(),
            state: "PE".to_string(),
            postal_code: "50000-000".to_string(),
        };
        let config = CarrierConfig {
            tenant_id,
            account_id: "conta".to_string(),
            access_code: String::new(),
            contract_number: "1".to_string(),
            postage_card: "2".to_string(),
            environment: CarrierEnvironment::Staging,
            sender: SenderIdentity {
                name: "Loja".to_string(),
                tax_id: "12345678000199".to_string(),
                phone: None,
                email: None,
                address: address.clone(),
            },
            default_service_code: "03298".to_string(),
            default_package_type: PackageType::Box,
            default_dims: RequestedDims::default(),
            active: true,
        };
        let request = LabelRequest {
            tenant_id,
            sale_id: None,
            recipient: Recipient {
                name: "Cliente".to_string(),
                address,
                ..Recipient::default()
            },
            package: None,
            service_code: None,
            invoice_number: None,
            invoice_key: None,
        };
        assemble(&config, &request).payload
    }

    fn rejected(status: u16, body: &str) -> CorreiosError {
        CorreiosError::Rejected {
            fault: CarrierFault::from_body("/prepostagem/v1/prepostagens", status, body.to_string()),
            attempted_payload: None,
        }
    }

    const STRUCTURAL: &str = r#"{"msgs":["PPN-295: Peso do objeto não informado"]}"#;

    #[test]
    fn test_signatures_are_case_insensitive() {
        let fault = CarrierFault::from_body("/p", 400, "Formato do Objeto inválido".to_string());
        assert!(is_structural_rejection(&fault));
    }

    #[test]
    fn test_signature_on_other_status_is_not_structural() {
        let fault = CarrierFault::from_body("/p", 500, STRUCTURAL.to_string());
        assert!(!is_structural_rejection(&fault));
    }

    #[tokio::test]
    async fn test_canonical_success_skips_fallbacks() {
        let mut calls = Vec::new();
        let (value, variant) = submit_with_fallbacks(&payload(), |variant, _body| {
            calls.push(variant);
            async { Ok::<_, CorreiosError>(7) }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(variant, SubmitVariant::Canonical);
        assert_eq!(calls, vec![SubmitVariant::Canonical]);
    }

    #[tokio::test]
    async fn test_structural_rejection_walks_ladder_until_success() {
        let mut calls = Vec::new();
        let (_, variant) = submit_with_fallbacks(&payload(), |variant, _body| {
            calls.push(variant);
            let result = if variant == SubmitVariant::SingularObject {
                Ok(())
            } else {
                Err(rejected(400, STRUCTURAL))
            };
            async move { result }
        })
        .await
        .unwrap();

        assert_eq!(variant, SubmitVariant::SingularObject);
        assert_eq!(
            calls,
            vec![
                SubmitVariant::Canonical,
                SubmitVariant::Restringified,
                SubmitVariant::SingularObject
            ]
        );
    }

    #[tokio::test]
    async fn test_all_variants_fail_returns_last_error() {
        let mut calls = Vec::new();
        let err = submit_with_fallbacks(&payload(), |variant, _body| {
            calls.push(variant);
            let body = format!("{STRUCTURAL} attempt {}", calls.len());
            async move { Err::<(), _>(rejected(400, &body)) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.len(), 4);
        assert_eq!(calls.last(), Some(&SubmitVariant::Flattened));
        assert!(err.fault().unwrap().raw_body.ends_with("attempt 4"));
    }

    #[tokio::test]
    async fn test_fatal_error_on_fallback_ends_the_ladder() {
        let mut calls = Vec::new();
        let err = submit_with_fallbacks(&payload(), |variant, _body| {
            calls.push(variant);
            let result = match variant {
                SubmitVariant::Canonical => Err(rejected(400, STRUCTURAL)),
                SubmitVariant::Restringified => Err(rejected(401, r#"{"msgs":["Token expirado"]}"#)),
                _ => Ok(()),
            };
            async move { result }
        })
        .await
        .unwrap_err();

        assert_eq!(
            calls,
            vec![SubmitVariant::Canonical, SubmitVariant::Restringified]
        );
        assert_eq!(err.fault().unwrap().status, 401);
    }

    #[tokio::test]
    async fn test_unknown_400_is_not_retried() {
        let mut calls = Vec::new();
        let err = submit_with_fallbacks(&payload(), |variant, _body| {
            calls.push(variant);
            async { Err::<(), _>(rejected(400, r#"{"msgs":["CEP de destino inválido"]}"#)) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls, vec![SubmitVariant::Canonical]);
        assert_eq!(err.fault().unwrap().message, "CEP de destino inválido");
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        for status in [401, 403, 500, 503] {
            let mut calls = 0;
            let result = submit_with_fallbacks(&payload(), |_variant, _body| {
                calls += 1;
                async move { Err::<(), _>(rejected(status, STRUCTURAL)) }
            })
            .await;

            assert!(result.is_err());
            assert_eq!(calls, 1, "status {status} must not retry");
        }
    }

    #[tokio::test]
    async fn test_each_attempt_gets_its_own_body() {
        let mut bodies = Vec::new();
        let _ = submit_with_fallbacks(&payload(), |_variant, body| {
            bodies.push(body);
            async { Err::<(), _>(rejected(400, STRUCTURAL)) }
        })
        .await;

        assert_eq!(bodies.len(), 4);
        assert!(bodies[0].get("objetosPostais").is_some());
        assert!(bodies[2].get("objetoPostal").is_some());
        assert!(bodies[3].get("tipoObjeto").is_some());
    }
}
