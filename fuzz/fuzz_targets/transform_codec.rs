#![no_main]

use libfuzzer_sys::fuzz_target;
use profmorph::transforms::{parse_transforms, stringify_transforms};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let transforms = parse_transforms(s);
        let again = parse_transforms(&stringify_transforms(&transforms));
        assert_eq!(transforms, again);
    }
});
