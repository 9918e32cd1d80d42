#![no_main]

use libfuzzer_sys::fuzz_target;
use hdsafe_core::{master_from_seed, ChildNumber, Signer};

fuzz_target!(|data: &[u8]| {
    // Any byte string is either rejected by length or yields a usable master
    let Ok(mut master) = master_from_seed(data) else {
        return;
    };
    let _ = master.derive_child(u32::from(ChildNumber::from_hardened_idx(0).unwrap()));
    let _ = master.derive_child(0);
    let _ = master.signing_key().sign(&[0u8; 32]);

    master.dispose();
    assert!(master.signing_key().key_material().is_wiped());
    assert!(master.signing_key().public_key(true).is_err());
});
