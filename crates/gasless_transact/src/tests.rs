use crate::test_utils::{
    AccountMother, SIGNING_PRIVATE_KEY, TransactionGroupMother, TransactionMother,
    sign_with_test_key,
};
use crate::{
    AlgorandMsgpack, SignedTransaction, Transaction, TransactionId, Transactions,
    compute_group, decode_signed_group, mnemonic,
};
use base64::{Engine, prelude::BASE64_STANDARD};
use pretty_assertions::assert_eq;

#[test]
fn test_signed_transaction_encoding() {
    let txn = TransactionMother::simple_payment().build().unwrap();
    let signed = sign_with_test_key(&txn);

    let encoded = signed.encode().unwrap();
    assert_eq!(encoded.len(), 247);

    let decoded = SignedTransaction::decode(&encoded).unwrap();
    assert_eq!(decoded, signed);
    assert_eq!(decoded.id().unwrap(), txn.id().unwrap());
}

#[test]
fn test_signed_transaction_with_auth_address() {
    let txn = TransactionMother::simple_payment().build().unwrap();
    let mut signed = sign_with_test_key(&txn);
    signed.auth_address = Some(AccountMother::neil().address());

    let decoded = SignedTransaction::decode(&signed.encode().unwrap()).unwrap();
    assert_eq!(decoded.signer(), &AccountMother::neil().address());
    assert_eq!(decoded, signed);
}

#[test]
fn test_signed_transaction_rejects_trailing_bytes() {
    let txn = TransactionMother::simple_payment().build().unwrap();
    let mut encoded = sign_with_test_key(&txn).encode().unwrap();
    encoded.push(0x01);

    let err = SignedTransaction::decode(&encoded).unwrap_err();
    assert!(err.to_string().contains("trailing bytes"), "{err}");
}

#[test]
fn test_unsigned_transaction_is_not_a_signed_transaction() {
    let txn = TransactionMother::simple_payment().build().unwrap();
    let err = SignedTransaction::decode(&txn.encode_raw().unwrap()).unwrap_err();
    assert!(err.to_string().contains("unsupported signed transaction field"), "{err}");
}

#[test]
fn test_known_group_id() {
    let txs = TransactionGroupMother::testnet_payment_group();
    let grouped = txs.as_slice().assign_group().unwrap();

    let expected = BASE64_STANDARD
        .decode("uJA6BWzZ5g7Ve0FersqCLWsrEstt6p0+F3bNGEKH3I4=")
        .unwrap();
    for tx in &grouped {
        assert_eq!(tx.header().group.unwrap().to_vec(), expected);
    }
    assert_eq!(
        grouped[0].id().unwrap(),
        "6SIXGV2TELA2M5RHZ72CVKLBSJ2OPUAKYFTUUE27O23RN6TFMGHQ"
    );
    assert_eq!(
        grouped[1].id().unwrap(),
        "7OY3VQXJCDSKPMGEFJMNJL2L3XIOMRM2U7DM2L54CC7QM5YBFQEA"
    );
}

#[test]
fn test_group_id_depends_on_order() {
    let txs = TransactionGroupMother::testnet_payment_group();
    let reversed: Vec<Transaction> = txs.iter().rev().cloned().collect();

    let forward = compute_group(&txs).unwrap();
    assert_eq!(forward, compute_group(&txs).unwrap());
    assert_ne!(forward, compute_group(&reversed).unwrap());
    assert_eq!(
        BASE64_STANDARD.encode(compute_group(&reversed).unwrap()),
        "6/9VnVq6SH9FVjnVPa9XgGZVVfh+oKXtv4lsNubfy+M="
    );
}

#[test]
fn test_group_rejects_grouped_empty_and_oversized_input() {
    let grouped = TransactionGroupMother::testnet_payment_group()
        .as_slice()
        .assign_group()
        .unwrap();

    let messages: Vec<String> = [
        compute_group(&grouped),
        compute_group(&[]),
        compute_group(&TransactionGroupMother::group_of(17)),
    ]
    .into_iter()
    .map(|result| result.unwrap_err().to_string())
    .collect();

    assert_eq!(
        messages,
        vec![
            "Transactions must not already be grouped".to_string(),
            "Transaction group size cannot be 0".to_string(),
            "Transaction group size exceeds the max limit of 16".to_string(),
        ]
    );
}

#[test]
fn test_decode_signed_group_preserves_order() {
    let grouped = TransactionGroupMother::testnet_payment_group()
        .as_slice()
        .assign_group()
        .unwrap();
    let signed: Vec<SignedTransaction> = grouped.iter().map(sign_with_test_key).collect();

    let mut wire = Vec::new();
    for stxn in &signed {
        wire.extend(stxn.encode().unwrap());
    }

    assert_eq!(decode_signed_group(&wire).unwrap(), signed);
    assert!(decode_signed_group(&[]).is_err());
}

#[test]
fn test_signer_account_matches_mnemonic_seed() {
    let seed = mnemonic::to_key(&mnemonic::from_key(&SIGNING_PRIVATE_KEY)).unwrap();
    assert_eq!(seed, SIGNING_PRIVATE_KEY);
    assert_eq!(
        AccountMother::signer().to_string(),
        "K7HJ6ETH4FRSLMJNHPHLWVZFILG42CHZFMMYH7RLCEORC66NHTJCC66HKE"
    );
}
