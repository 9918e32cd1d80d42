#![no_main]

use libfuzzer_sys::fuzz_target;
use hdsafe_core::{is_absolute, parse_path, ChildNumber};

fuzz_target!(|data: &[u8]| {
    // Parsing must return Ok or Err, and anything accepted must come back
    // unchanged when its steps are printed and parsed again.
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = parse_path(s) else {
        return;
    };
    let steps: &[ChildNumber] = path.as_ref();
    if steps.is_empty() {
        assert!(is_absolute(s));
        return;
    }
    let printed: Vec<String> = steps.iter().map(|c| c.to_string()).collect();
    let reparsed = parse_path(&printed.join("/")).unwrap();
    assert_eq!(path, reparsed);
});
