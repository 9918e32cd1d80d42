//! Known-answer derivation tests.
//!
//! Covers:
//! 1. BIP-32 test vector 1 (raw seed)
//! 2. BIP-39 mnemonics at the Ethereum account path m/44'/60'/0'/0/{0,1}
//! 3. Determinism of master generation

use bip39::{Language, Mnemonic};
use hdsafe_core::{master_from_seed, ChildNumber, HdNode, Signer};

const ABANDON: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const COOK: &str = "cook voyage document eight skate token alien guide drink uncle term abuse";

fn seed_from_words(words: &str) -> [u8; 64] {
    Mnemonic::parse_in(Language::English, words)
        .unwrap()
        .to_seed("")
}

fn secret_hex(node: &HdNode) -> String {
    hex::encode(node.signing_key().key_material().expose_secret().unwrap())
}

fn derive(seed: &[u8], path: &str) -> HdNode {
    master_from_seed(seed).unwrap().derive_path(path).unwrap()
}

fn hardened(index: u32) -> u32 {
    u32::from(ChildNumber::from_hardened_idx(index).unwrap())
}

// ============================================================================
// 1. BIP-32 test vector 1
// ============================================================================

#[test]
fn test_bip32_vector1_master() {
    let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
    let master = master_from_seed(&seed).unwrap();

    assert_eq!(
        secret_hex(&master),
        "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
    );
    assert_eq!(
        hex::encode(master.chain_code().unwrap()),
        "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
    );
    assert_eq!(
        hex::encode(master.public_key(true).unwrap()),
        "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
    );
    assert_eq!(master.path(), Some("m"));
    assert_eq!(master.depth(), 0);
}

#[test]
fn test_bip32_vector1_full_chain() {
    let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
    let leaf = derive(&seed, "m/0'/1/2'/2/1000000000");

    assert_eq!(
        secret_hex(&leaf),
        "471b76e389e528d6de6d816857e012c5455051cad6660850e58372a6c3e6e7c8"
    );
    assert_eq!(
        hex::encode(leaf.chain_code().unwrap()),
        "c783e67b921d2beb8f6b389cc646d7263b4145701dadd2161548a8b078e65e9e"
    );
    assert_eq!(leaf.parent_fingerprint().to_string(), "d880d7d8");
    assert_eq!(leaf.index(), 1_000_000_000);
    assert_eq!(leaf.depth(), 5);
}

// ============================================================================
// 2. Mnemonic fixtures at m/44'/60'/0'/0/x
// ============================================================================

#[test]
fn test_abandon_about_account_zero() {
    let _ = env_logger::builder().is_test(true).try_init();
    let seed = seed_from_words(ABANDON);
    assert_eq!(
        hex::encode(seed),
        "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
         9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
    );

    let node = derive(&seed, "m/44'/60'/0'/0/0");
    assert_eq!(
        secret_hex(&node),
        "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    );
    assert_eq!(
        hex::encode(node.public_key(true).unwrap()),
        "0237b0bb7a8288d38ed49a524b5dc98cff3eb5ca824c9f9dc0dfdb3d9cd600f299"
    );
    assert_eq!(
        hex::encode(node.public_key(false).unwrap()),
        "0437b0bb7a8288d38ed49a524b5dc98cff3eb5ca824c9f9dc0dfdb3d9cd600f299\
         a6179912b7451c09896c4098eca7ce6b2e58330672795e847c4d6af44e024230"
    );
    assert_eq!(
        hex::encode(node.chain_code().unwrap()),
        "736094f4f24b67e838a4b3d23d31d229ca03e00c9bb99ce95da6d86e8b3847b5"
    );
    assert_eq!(node.parent_fingerprint().to_string(), "e4389614");
    assert_eq!(node.path(), Some("m/44'/60'/0'/0/0"));
    assert_eq!(node.depth(), 5);
    assert_eq!(node.index(), 0);
}

#[test]
fn test_abandon_about_account_one() {
    let seed = seed_from_words(ABANDON);
    let node = derive(&seed, "m/44'/60'/0'/0/1");
    assert_eq!(
        secret_hex(&node),
        "9a983cb3d832fbde5ab49d692b7a8bf5b5d232479c99333d0fc8e1d21f1b55b6"
    );
    assert_eq!(
        hex::encode(node.public_key(true).unwrap()),
        "039fd0991d0222b4e1339c1a1a5b5f6d9f6a96672a3247b638ee6156d9ea877a2f"
    );
}

#[test]
fn test_cook_voyage_accounts() {
    let seed = seed_from_words(COOK);

    let account0 = derive(&seed, "m/44'/60'/0'/0/0");
    assert_eq!(account0.index(), 0);
    assert_eq!(account0.path(), Some("m/44'/60'/0'/0/0"));
    assert_eq!(
        secret_hex(&account0),
        "260905feebf1ec684f36f1599128b85f3a26c2b817f2065a2fc278398449c41f"
    );
    assert_eq!(
        hex::encode(account0.public_key(true).unwrap()),
        "036c082582225926b9356d95b91a4acffa3511b7cc2a14ef5338c090ea2cc3d0aa"
    );

    let account1 = derive(&seed, "m/44'/60'/0'/0/1");
    assert_eq!(account1.index(), 1);
    assert_eq!(
        secret_hex(&account1),
        "ba3d34b786d909f83be1422b75ea18005843ff979862619987fb0bab59580158"
    );
    assert_eq!(
        hex::encode(account1.public_key(true).unwrap()),
        "02f8d04c3de44e53e5b0ef2f822a29087e6af80114560956518767c64fec6b0f69"
    );
}

#[test]
fn test_stepwise_matches_path_derivation() {
    let seed = seed_from_words(COOK);
    let master = master_from_seed(&seed).unwrap();

    let purpose = master.derive_child(hardened(44)).unwrap();
    let coin = purpose.derive_child(hardened(60)).unwrap();
    let account = coin.derive_child(hardened(0)).unwrap();
    let change = account.derive_child(0).unwrap();
    let leaf = change.derive_child(0).unwrap();

    assert_eq!(
        secret_hex(&leaf),
        "260905feebf1ec684f36f1599128b85f3a26c2b817f2065a2fc278398449c41f"
    );
    assert_eq!(leaf.parent_fingerprint(), change.fingerprint().unwrap());
    assert_eq!(change.parent_fingerprint(), account.fingerprint().unwrap());
    assert_eq!(purpose.parent_fingerprint(), master.fingerprint().unwrap());
    assert_eq!(
        [purpose.depth(), coin.depth(), account.depth(), change.depth(), leaf.depth()],
        [1, 2, 3, 4, 5]
    );
}

// ============================================================================
// 3. Determinism
// ============================================================================

#[test]
fn test_master_is_deterministic_for_all_lengths() {
    for len in 16..=64usize {
        let seed: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(37)).collect();
        let a = master_from_seed(&seed).unwrap();
        let b = master_from_seed(&seed).unwrap();
        assert_eq!(secret_hex(&a), secret_hex(&b));
        assert_eq!(a.chain_code().unwrap(), b.chain_code().unwrap());
    }
}

#[test]
fn test_account_signature_is_deterministic() {
    let seed = seed_from_words(ABANDON);
    let node = derive(&seed, "m/44'/60'/0'/0/0");
    let digest = [0xabu8; 32];
    let first = node.signing_key().sign(&digest).unwrap();
    let second = node.signing_key().sign(&digest).unwrap();
    assert_eq!(first.to_bytes(), second.to_bytes());
}
