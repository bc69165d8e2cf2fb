pub const HASH_BYTES_LENGTH: usize = 32;
pub const ALGORAND_CHECKSUM_BYTE_LENGTH: usize = 4;
pub const ALGORAND_ADDRESS_LENGTH: usize = 58;
pub const ALGORAND_PUBLIC_KEY_BYTE_LENGTH: usize = 32;
pub const ALGORAND_SIGNATURE_BYTE_LENGTH: usize = 64;
pub type Byte32 = [u8; 32];
pub const MAX_TX_GROUP_SIZE: usize = 16;

pub const TRANSACTION_DOMAIN_SEPARATOR: &[u8] = b"TX";
pub const GROUP_DOMAIN_SEPARATOR: &[u8] = b"TG";

// Mnemonic layout
pub const MNEMONIC_WORD_COUNT: usize = 25;
pub const MNEMONIC_BITS_PER_WORD: usize = 11;

// Application reference limits
pub const MAX_APP_ARGS: usize = 16;
pub const MAX_ARGS_SIZE: usize = 2048; // Maximum size in bytes of all args combined
pub const MAX_OVERALL_REFERENCES: usize = 8;
pub const MAX_ACCOUNT_REFERENCES: usize = 4;
pub const MAX_APP_REFERENCES: usize = 8;
pub const MAX_ASSET_REFERENCES: usize = 8;

// Asset parameter limits
pub const MAX_ASSET_DECIMALS: u32 = 19;
pub const MAX_UNIT_NAME_LENGTH: usize = 8;
pub const MAX_ASSET_NAME_LENGTH: usize = 32;
pub const MAX_ASSET_URL_LENGTH: usize = 96;
