use crate::{
    ALGORAND_PUBLIC_KEY_BYTE_LENGTH, Address, AlgorandMsgpack, Byte32, KeyPairAccount,
    PaymentTransactionBuilder, SignedTransaction, Transaction, TransactionHeaderBuilder,
};
use base64::{Engine, prelude::BASE64_STANDARD};
use ed25519_dalek::{Signer, SigningKey};

pub const TESTNET_GENESIS_ID: &str = "testnet-v1.0";
pub const TESTNET_GENESIS_HASH: &str = "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";

pub fn testnet_genesis_hash() -> Byte32 {
    BASE64_STANDARD
        .decode(TESTNET_GENESIS_HASH)
        .unwrap()
        .try_into()
        .unwrap()
}

pub struct TransactionHeaderMother {}
impl TransactionHeaderMother {
    pub fn testnet() -> TransactionHeaderBuilder {
        TransactionHeaderBuilder::default()
            .genesis_id(String::from(TESTNET_GENESIS_ID))
            .genesis_hash(testnet_genesis_hash())
            .fee(1000)
            .to_owned()
    }

    pub fn simple_testnet() -> TransactionHeaderBuilder {
        Self::testnet()
            .sender(AccountMother::account().address())
            .first_valid(50659540)
            .last_valid(50660540)
            .to_owned()
    }

    pub fn example() -> TransactionHeaderBuilder {
        TransactionHeaderBuilder::default()
            .genesis_id(String::from("example"))
            .genesis_hash(
                BASE64_STANDARD
                    .decode("3r2+nRwL99aTROTiOtPEeUQarv2fATkmNliHqfGxNJA=")
                    .unwrap()
                    .try_into()
                    .unwrap(),
            )
            .first_valid(1)
            .last_valid(999)
            .fee(1000)
            .sender(AccountMother::example().address())
            .to_owned()
    }
}

pub struct TransactionMother {}
impl TransactionMother {
    pub fn simple_payment() -> PaymentTransactionBuilder {
        PaymentTransactionBuilder::default()
            .header(TransactionHeaderMother::simple_testnet().build().unwrap())
            .amount(101000)
            .receiver(
                "VXH5UP6JLU2CGIYPUFZ4Z5OTLJCLMA5EXD3YHTMVNDE5P7ILZ324FSYSPQ"
                    .parse()
                    .unwrap(),
            )
            .to_owned()
    }

    pub fn payment_with_note() -> PaymentTransactionBuilder {
        Self::simple_payment()
            .header(
                TransactionHeaderMother::simple_testnet()
                    .note(
                        BASE64_STANDARD
                            .decode("MGFhNTBkMjctYjhmNy00ZDc3LWExZmItNTUxZmQ1NWRmMmJj")
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .to_owned()
    }

    /// A zero-amount self-payment from `sponsor` carrying `fee`.
    pub fn fee_carrier(sponsor: &Address, fee: u64) -> PaymentTransactionBuilder {
        PaymentTransactionBuilder::default()
            .header(
                TransactionHeaderMother::simple_testnet()
                    .sender(sponsor.clone())
                    .fee(fee)
                    .build()
                    .unwrap(),
            )
            .receiver(sponsor.clone())
            .amount(0)
            .to_owned()
    }
}

pub struct AccountMother {}
impl AccountMother {
    pub fn zero_address_account() -> KeyPairAccount {
        KeyPairAccount::from_pubkey(&[0; ALGORAND_PUBLIC_KEY_BYTE_LENGTH])
    }

    pub fn account() -> KeyPairAccount {
        "RIMARGKZU46OZ77OLPDHHPUJ7YBSHRTCYMQUC64KZCCMESQAFQMYU6SL2Q"
            .parse()
            .unwrap()
    }

    pub fn neil() -> KeyPairAccount {
        "JB3K6HTAXODO4THESLNYTSG6GQUFNEVIQG7A6ZYVDACR6WA3ZF52TKU5NA"
            .parse()
            .unwrap()
    }

    pub fn example() -> KeyPairAccount {
        "ALGOC4J2BCZ33TCKSSAMV5GAXQBMV3HDCHDBSPRBZRNSR7BM2FFDZRFGXA"
            .parse()
            .unwrap()
    }

    /// The account whose secret is [`SIGNING_PRIVATE_KEY`].
    pub fn signer() -> KeyPairAccount {
        let signing_key = SigningKey::from_bytes(&SIGNING_PRIVATE_KEY);
        KeyPairAccount::from_pubkey(&signing_key.verifying_key().to_bytes())
    }
}

pub const SIGNING_PRIVATE_KEY: Byte32 = [
    2, 205, 103, 33, 67, 14, 82, 196, 115, 196, 206, 254, 50, 110, 63, 182, 149, 229, 184, 216, 93,
    11, 13, 99, 69, 213, 218, 165, 134, 118, 47, 44,
];

/// Signs `transaction` with [`SIGNING_PRIVATE_KEY`].
pub fn sign_with_test_key(transaction: &Transaction) -> SignedTransaction {
    let signing_key = SigningKey::from_bytes(&SIGNING_PRIVATE_KEY);
    let signature = signing_key.sign(&transaction.encode().unwrap());
    SignedTransaction {
        transaction: transaction.clone(),
        signature: Some(signature.to_bytes()),
        auth_address: None,
    }
}

pub struct TransactionGroupMother {}
impl TransactionGroupMother {
    /// A real TestNet group of two payments.
    pub fn testnet_payment_group() -> Vec<Transaction> {
        let header_builder = TransactionHeaderMother::testnet()
            .sender(AccountMother::neil().address())
            .first_valid(51532821)
            .last_valid(51533021)
            .to_owned();

        let pay_1 = PaymentTransactionBuilder::default()
            .header(
                header_builder
                    .clone()
                    .note(BASE64_STANDARD.decode("VGVzdCAx").unwrap())
                    .build()
                    .unwrap(),
            )
            .receiver(AccountMother::neil().address())
            .amount(1000000)
            .build()
            .unwrap();

        let pay_2 = PaymentTransactionBuilder::default()
            .header(
                header_builder
                    .clone()
                    .note(BASE64_STANDARD.decode("VGVzdCAy").unwrap())
                    .build()
                    .unwrap(),
            )
            .receiver(AccountMother::neil().address())
            .amount(200000)
            .build()
            .unwrap();

        vec![pay_1, pay_2]
    }

    pub fn group_of(number_of_transactions: usize) -> Vec<Transaction> {
        let header_builder = TransactionHeaderMother::testnet()
            .sender(AccountMother::neil().address())
            .first_valid(51532821)
            .last_valid(51533021)
            .to_owned();

        (0..number_of_transactions)
            .map(|i| {
                PaymentTransactionBuilder::default()
                    .header(
                        header_builder
                            .clone()
                            .note(format!("tx:{}", i).as_bytes().to_vec())
                            .build()
                            .unwrap(),
                    )
                    .receiver(AccountMother::neil().address())
                    .amount(200000)
                    .build()
                    .unwrap()
            })
            .collect()
    }
}
