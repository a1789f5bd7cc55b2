#![no_main]
use libfuzzer_sys::fuzz_target;
use pe_loadconfig::container::Container;
use pe_loadconfig::pe::load_config::LoadConfigData;

fuzz_target!(|data: &[u8]| {
    for container in [Container::Little, Container::Big] {
        if let Ok(parsed) = LoadConfigData::parse_size_field(data, container) {
            let _ = parsed.config.to_string();
        }
    }
});
