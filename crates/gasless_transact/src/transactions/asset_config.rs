//! Asset configuration transactions create Algorand Standard Assets (ASAs).
//!
//! On the wire the asset parameters are nested under `apar`; in Rust they are flattened onto
//! [`AssetConfigTransactionFields`] and moved in and out of the nested form by the custom
//! serializer and deserializer below.

use crate::constants::{
    MAX_ASSET_DECIMALS, MAX_ASSET_NAME_LENGTH, MAX_ASSET_URL_LENGTH, MAX_UNIT_NAME_LENGTH,
};
use crate::traits::Validate;
use crate::transactions::common::{TransactionHeader, TransactionValidationError};
use crate::utils::{
    is_empty_bytes32_opt, is_empty_string_opt, is_false_opt, is_zero, is_zero_addr_opt,
    is_zero_opt,
};
use crate::{Address, Byte32, Transaction};
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{Bytes, serde_as, skip_serializing_none};

// Only used for serialise/deserialise
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
struct AssetParams {
    #[serde(rename = "t")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub total: Option<u64>,

    #[serde(rename = "dc")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub decimals: Option<u32>,

    #[serde(rename = "df")]
    #[serde(skip_serializing_if = "is_false_opt")]
    #[serde(default)]
    pub default_frozen: Option<bool>,

    #[serde(rename = "an")]
    #[serde(skip_serializing_if = "is_empty_string_opt")]
    #[serde(default)]
    pub asset_name: Option<String>,

    #[serde(rename = "un")]
    #[serde(skip_serializing_if = "is_empty_string_opt")]
    #[serde(default)]
    pub unit_name: Option<String>,

    #[serde(rename = "au")]
    #[serde(skip_serializing_if = "is_empty_string_opt")]
    #[serde(default)]
    pub url: Option<String>,

    #[serde(rename = "am")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    pub metadata_hash: Option<Byte32>,

    #[serde(rename = "m")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub manager: Option<Address>,

    #[serde(rename = "r")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub reserve: Option<Address>,

    #[serde(rename = "f")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub freeze: Option<Address>,

    #[serde(rename = "c")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub clawback: Option<Address>,
}

/// Represents an asset configuration transaction. With `asset_id` set to 0 it creates a new asset.
#[derive(Debug, PartialEq, Clone, Builder)]
#[builder(
    name = "AssetConfigTransactionBuilder",
    setter(strip_option),
    build_fn(name = "build_fields")
)]
pub struct AssetConfigTransactionFields {
    /// Common transaction header fields.
    pub header: TransactionHeader,

    /// ID of the asset to operate on, 0 for asset creation.
    #[builder(default)]
    pub asset_id: u64,

    /// The total amount of the smallest divisible unit to create. Required on creation.
    #[builder(default)]
    pub total: Option<u64>,

    /// The number of decimal places of the asset, up to 19.
    #[builder(default)]
    pub decimals: Option<u32>,

    /// Whether holdings of the asset are frozen by default.
    #[builder(default)]
    pub default_frozen: Option<bool>,

    /// Name of the asset, at most 32 bytes.
    #[builder(default)]
    pub asset_name: Option<String>,

    /// Name of a unit of the asset (ticker), at most 8 bytes.
    #[builder(default)]
    pub unit_name: Option<String>,

    /// URL with more information about the asset, at most 96 bytes.
    #[builder(default)]
    pub url: Option<String>,

    /// 32-byte hash of application specific metadata.
    #[builder(default)]
    pub metadata_hash: Option<Byte32>,

    /// Account allowed to reconfigure or destroy the asset.
    #[builder(default)]
    pub manager: Option<Address>,

    /// Account holding the uncirculated supply. Informational only.
    #[builder(default)]
    pub reserve: Option<Address>,

    /// Account allowed to freeze holdings.
    #[builder(default)]
    pub freeze: Option<Address>,

    /// Account allowed to claw holdings back.
    #[builder(default)]
    pub clawback: Option<Address>,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct AssetConfigTransactionFieldsSerde {
    #[serde(flatten)]
    header: TransactionHeader,

    #[serde(rename = "caid")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    asset_id: u64,

    #[serde(rename = "apar")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    asset_params: Option<AssetParams>,
}

pub fn asset_config_serializer<S>(
    fields: &AssetConfigTransactionFields,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let fields = fields.clone();

    let asset_params = AssetParams {
        total: fields.total,
        decimals: fields.decimals,
        default_frozen: fields.default_frozen,
        asset_name: fields.asset_name,
        unit_name: fields.unit_name,
        url: fields.url,
        metadata_hash: fields.metadata_hash,
        manager: fields.manager,
        reserve: fields.reserve,
        freeze: fields.freeze,
        clawback: fields.clawback,
    };

    let serde_struct = AssetConfigTransactionFieldsSerde {
        header: fields.header,
        asset_id: fields.asset_id,
        asset_params: (asset_params != AssetParams::default()).then_some(asset_params),
    };

    serde_struct.serialize(serializer)
}

pub fn asset_config_deserializer<'de, D>(
    deserializer: D,
) -> Result<AssetConfigTransactionFields, D::Error>
where
    D: Deserializer<'de>,
{
    let deserialised = AssetConfigTransactionFieldsSerde::deserialize(deserializer)?;
    let params = deserialised.asset_params.unwrap_or_default();

    Ok(AssetConfigTransactionFields {
        header: deserialised.header,
        asset_id: deserialised.asset_id,
        total: params.total,
        decimals: params.decimals,
        default_frozen: params.default_frozen,
        asset_name: params.asset_name,
        unit_name: params.unit_name,
        url: params.url,
        metadata_hash: params.metadata_hash,
        manager: params.manager,
        reserve: params.reserve,
        freeze: params.freeze,
        clawback: params.clawback,
    })
}

impl AssetConfigTransactionFields {
    pub fn validate_for_creation(&self) -> Result<(), Vec<TransactionValidationError>> {
        let mut errors = Vec::new();

        if self.total.is_none() {
            errors.push(TransactionValidationError::RequiredField {
                field: "Total".to_string(),
            });
        }

        if let Some(decimals) = self.decimals {
            if decimals > MAX_ASSET_DECIMALS {
                errors.push(TransactionValidationError::FieldTooLong {
                    field: "Decimals".to_string(),
                    actual: decimals as usize,
                    max: MAX_ASSET_DECIMALS as usize,
                    unit: "decimal places".to_string(),
                });
            }
        }

        for (field, value, max) in [
            ("Unit name", &self.unit_name, MAX_UNIT_NAME_LENGTH),
            ("Asset name", &self.asset_name, MAX_ASSET_NAME_LENGTH),
            ("URL", &self.url, MAX_ASSET_URL_LENGTH),
        ] {
            if let Some(value) = value {
                if value.len() > max {
                    errors.push(TransactionValidationError::FieldTooLong {
                        field: field.to_string(),
                        actual: value.len(),
                        max,
                        unit: "bytes".to_string(),
                    });
                }
            }
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

impl AssetConfigTransactionBuilder {
    pub fn build(&self) -> Result<Transaction, AssetConfigTransactionBuilderError> {
        let d = self.build_fields()?;
        d.validate().map_err(|errors| {
            AssetConfigTransactionBuilderError::ValidationError(format!(
                "Asset config validation failed: {}",
                errors.join("\n")
            ))
        })?;
        Ok(Transaction::AssetConfig(d))
    }
}

impl Validate for AssetConfigTransactionFields {
    fn validate(&self) -> Result<(), Vec<String>> {
        match self.asset_id {
            0 => self
                .validate_for_creation()
                .map_err(|errors| errors.iter().map(ToString::to_string).collect()),
            _ => Ok(()),
        }
    }
}
