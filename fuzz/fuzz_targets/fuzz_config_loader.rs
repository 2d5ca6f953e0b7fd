#![no_main]

use era5cfg::config::{ConfigLoader, LoaderOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        // Environment expansion would make runs depend on the host.
        let loader = ConfigLoader::new(LoaderOptions {
            expand_env: false,
            ..LoaderOptions::default()
        });

        // Only panics matter; every input must yield Ok or a ConfigError.
        if let Ok(loaded) = loader.load_from_str(yaml_str) {
            let _ = era5cfg::config::summary::render(&loaded.config);
        }
    }
});
