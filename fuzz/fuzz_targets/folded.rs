#![no_main]

use libfuzzer_sys::fuzz_target;
use profmorph::profile::folded::{self, Options};

fuzz_target!(|data: &[u8]| {
    if let Ok(profile) = folded::profile_from_reader(&Options::default(), data) {
        for thread in &profile.threads {
            folded::write_thread(thread, std::io::sink()).ok();
        }
    }
});
