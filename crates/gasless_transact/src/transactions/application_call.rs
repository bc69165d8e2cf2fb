//! Application call transactions invoke an existing Algorand smart contract.
//!
//! Only calls against deployed applications are modelled; programs, state schemas and box
//! references are not part of a sponsored call.

use crate::address::Address;
use crate::constants::{
    MAX_ACCOUNT_REFERENCES, MAX_APP_ARGS, MAX_APP_REFERENCES, MAX_ARGS_SIZE,
    MAX_ASSET_REFERENCES, MAX_OVERALL_REFERENCES,
};
use crate::traits::Validate;
use crate::transactions::common::TransactionValidationError;
use crate::utils::{is_empty_vec_opt, is_zero};
use crate::{Transaction, TransactionHeader};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// On-completion actions for application transactions.
#[derive(Serialize_repr, Deserialize_repr, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[repr(u8)]
pub enum OnApplicationComplete {
    /// Simply call the approval program.
    #[default]
    NoOp = 0,

    /// Allocate local state for the application in the sender's account.
    OptIn = 1,

    /// Deallocate local state for the application from the sender's account.
    CloseOut = 2,

    /// Like `CloseOut`, but may never fail.
    ClearState = 3,

    UpdateApplication = 4,

    DeleteApplication = 5,
}

/// Represents an application call transaction against a deployed application.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Builder)]
#[builder(
    name = "ApplicationCallTransactionBuilder",
    setter(strip_option),
    build_fn(name = "build_fields")
)]
pub struct ApplicationCallTransactionFields {
    /// Common transaction header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,

    /// ID of the application being called.
    #[serde(rename = "apid")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub app_id: u64,

    /// Defines what additional actions occur with the transaction.
    #[serde(rename = "apan")]
    #[serde(skip_serializing_if = "is_default_on_complete")]
    #[serde(default)]
    #[builder(default)]
    pub on_complete: OnApplicationComplete,

    /// Transaction specific arguments available to the approval program.
    #[serde(rename = "apaa")]
    #[serde_as(as = "Option<Vec<Bytes>>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub args: Option<Vec<Vec<u8>>>,

    /// Accounts in addition to the sender that the program may access.
    #[serde(rename = "apat")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub account_references: Option<Vec<Address>>,

    /// Applications in addition to `app_id` that the program may call.
    #[serde(rename = "apfa")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub app_references: Option<Vec<u64>>,

    /// Assets whose parameters the program may read.
    #[serde(rename = "apas")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub asset_references: Option<Vec<u64>>,
}

impl ApplicationCallTransactionBuilder {
    pub fn build(&self) -> Result<Transaction, ApplicationCallTransactionBuilderError> {
        let fields = self.build_fields()?;
        fields.validate().map_err(|errors| {
            ApplicationCallTransactionBuilderError::ValidationError(format!(
                "Application call validation failed: {}",
                errors.join("\n")
            ))
        })?;
        Ok(Transaction::ApplicationCall(fields))
    }
}

fn is_default_on_complete(on_complete: &OnApplicationComplete) -> bool {
    matches!(on_complete, OnApplicationComplete::NoOp)
}

impl ApplicationCallTransactionFields {
    pub fn validation_errors(&self) -> Vec<TransactionValidationError> {
        let mut errors = Vec::new();

        if self.app_id == 0 {
            errors.push(TransactionValidationError::RequiredField {
                field: "App ID".to_string(),
            });
        }

        let args = self.args.as_deref().unwrap_or_default();
        if args.len() > MAX_APP_ARGS {
            errors.push(TransactionValidationError::TooManyEntries {
                field: "Args".to_string(),
                actual: args.len(),
                max: MAX_APP_ARGS,
            });
        }
        let args_size: usize = args.iter().map(Vec::len).sum();
        if args_size > MAX_ARGS_SIZE {
            errors.push(TransactionValidationError::FieldTooLong {
                field: "Args".to_string(),
                actual: args_size,
                max: MAX_ARGS_SIZE,
                unit: "bytes".to_string(),
            });
        }

        let accounts = self.account_references.as_ref().map_or(0, Vec::len);
        let apps = self.app_references.as_ref().map_or(0, Vec::len);
        let assets = self.asset_references.as_ref().map_or(0, Vec::len);

        for (field, actual, max) in [
            ("Account references", accounts, MAX_ACCOUNT_REFERENCES),
            ("App references", apps, MAX_APP_REFERENCES),
            ("Asset references", assets, MAX_ASSET_REFERENCES),
            ("Total references", accounts + apps + assets, MAX_OVERALL_REFERENCES),
        ] {
            if actual > max {
                errors.push(TransactionValidationError::TooManyEntries {
                    field: field.to_string(),
                    actual,
                    max,
                });
            }
        }

        errors
    }
}

impl Validate for ApplicationCallTransactionFields {
    fn validate(&self) -> Result<(), Vec<String>> {
        let errors = self.validation_errors();
        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors.iter().map(ToString::to_string).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlgorandMsgpack;
    use crate::test_utils::{AccountMother, TransactionHeaderMother};
    use pretty_assertions::assert_eq;

    fn call() -> ApplicationCallTransactionBuilder {
        ApplicationCallTransactionBuilder::default()
            .header(TransactionHeaderMother::simple_testnet().build().unwrap())
            .app_id(12345)
            .to_owned()
    }

    #[test]
    fn test_app_call_round_trip() {
        let txn = call()
            .on_complete(OnApplicationComplete::OptIn)
            .args(vec![b"vote".to_vec(), 7u64.to_be_bytes().to_vec()])
            .account_references(vec![AccountMother::neil().address()])
            .build()
            .unwrap();

        let decoded = Transaction::decode(&txn.encode_raw().unwrap()).unwrap();
        assert_eq!(decoded, txn);
    }

    #[test]
    fn test_app_call_requires_app_id() {
        let result = call().app_id(0).build();
        let message = result.unwrap_err().to_string();
        assert!(message.contains("App ID is required"), "{message}");
    }

    #[test]
    fn test_app_call_argument_limits() {
        let fields = call()
            .args(vec![vec![0u8; 200]; 17])
            .account_references(vec![AccountMother::neil().address(); 5])
            .build_fields()
            .unwrap();

        let errors = fields.validate().unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
        let text = errors.join("\n");
        assert!(text.contains("Args cannot contain more than 16 entries"));
        assert!(text.contains("Args cannot exceed 2048 bytes, got 3400"));
        assert!(text.contains("Account references cannot contain more than 4 entries"));
    }
}
