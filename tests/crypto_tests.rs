//! Integration tests for the SecureData crypto module.

use securedata::crypto::hash::{digest, HASH_LEN};
use securedata::crypto::{derive_key, generate_salt, AesCtr, IntegrityChain, KdfParams, LayerCipher, SecretKey};

fn fast() -> KdfParams {
    KdfParams {
        time_cost: 1,
        memory_kib: 8_192,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn same_password_and_salt_give_same_key() {
    let salt = generate_salt();
    let a = derive_key(b"p1", &salt, &fast()).expect("derive a");
    let b = derive_key(b"p1", &salt, &fast()).expect("derive b");
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn cost_parameters_change_the_key() {
    let salt = [9u8; 16];
    let cheap = derive_key(b"p1", &salt, &fast()).unwrap();
    let slower = derive_key(
        b"p1",
        &salt,
        &KdfParams {
            time_cost: 2,
            ..fast()
        },
    )
    .unwrap();
    assert_ne!(cheap.as_bytes(), slower.as_bytes());
}

#[test]
fn params_survive_header_encoding() {
    let params = KdfParams {
        time_cost: 3,
        memory_kib: 131_072,
        parallelism: 4,
    };
    let mut raw = [0u8; KdfParams::ENCODED_LEN];
    params.encode(&mut raw);
    assert_eq!(KdfParams::decode(&raw).unwrap(), params);
    assert!(KdfParams::decode(&raw[..8]).is_err());
}

// ---------------------------------------------------------------------------
// Master stream
// ---------------------------------------------------------------------------

#[test]
fn record_at_any_offset_decrypts_on_its_own() {
    let key = SecretKey::new([0xABu8; 32]);
    let iv = [0x01u8; 16];
    let master = AesCtr::new(key.as_bytes(), &iv).unwrap();

    // Encrypt a "file" of three 48-byte records in one pass...
    let plain: Vec<u8> = (0..144u8).collect();
    let mut file = plain.clone();
    master.transform_at(&mut file, 0).unwrap();

    // ...then decrypt only the middle record by its block counter.
    let mut middle = file[48..96].to_vec();
    master.transform_at(&mut middle, 3).unwrap();
    assert_eq!(middle, &plain[48..96]);
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[test]
fn stacked_layers_commute() {
    let folder = LayerCipher::new(&SecretKey::new([1u8; 32]), &[2u8; 16]).unwrap();
    let outer = LayerCipher::new(&SecretKey::new([3u8; 32]), &[4u8; 16]).unwrap();
    let original = [0x42u8; 64];

    let mut a = original;
    folder.wide(7).transform_at(&mut a, 0).unwrap();
    outer.wide(7).transform_at(&mut a, 0).unwrap();

    let mut b = original;
    outer.wide(7).transform_at(&mut b, 0).unwrap();
    folder.wide(7).transform_at(&mut b, 0).unwrap();
    assert_eq!(a, b);

    // Stripping in either order restores the plaintext.
    folder.wide(7).transform_at(&mut a, 0).unwrap();
    outer.wide(7).transform_at(&mut a, 0).unwrap();
    assert_eq!(a, original);
}

#[test]
fn different_keys_give_different_layers() {
    let salt = [5u8; 16];
    let right = LayerCipher::new(&SecretKey::new([1u8; 32]), &salt).unwrap();
    let wrong = LayerCipher::new(&SecretKey::new([2u8; 32]), &salt).unwrap();
    let mut a = [0u8; 32];
    let mut b = [0u8; 32];
    right.transform_at(&mut a, 0).unwrap();
    wrong.transform_at(&mut b, 0).unwrap();
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

#[test]
fn chain_over_pieces_equals_chain_over_whole() {
    let key = SecretKey::new([8u8; 32]).derive_integrity_key().unwrap();
    let mut pieces = IntegrityChain::new(&key).unwrap();
    pieces.update(b"header");
    pieces.update(b"record-1");
    pieces.update(b"record-2");

    let mut whole = IntegrityChain::new(&key).unwrap();
    whole.update(b"headerrecord-1record-2");

    let tag = whole.snapshot();
    assert!(pieces.matches(&tag));
    assert!(!pieces.matches(&[0u8; HASH_LEN]));
}

#[test]
fn integrity_key_differs_from_master() {
    let master = SecretKey::new([8u8; 32]);
    let integrity = master.derive_integrity_key().unwrap();
    assert_ne!(master.as_bytes(), integrity.as_bytes());
}

#[test]
fn record_digest_is_sha256() {
    // SHA-256("abc")
    let expected = [
        0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22,
        0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00,
        0x15, 0xad,
    ];
    assert_eq!(digest(b"abc"), expected);
}
