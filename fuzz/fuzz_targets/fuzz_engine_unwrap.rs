#![no_main]
use libfuzzer_sys::fuzz_target;
use tlsrec_record::{Buffer, RecordConfig, RecordEngine};

fuzz_target!(|data: &[u8]| {
    let config = RecordConfig::builder().enable_v2_hello(true).build().unwrap();
    let mut engine = RecordEngine::new(config);
    let mut net = Buffer::wrap(data.to_vec());
    let mut apps = [Buffer::allocate(1024), Buffer::allocate(16 * 1024)];
    while net.has_remaining() {
        match engine.unwrap(&mut net, &mut apps, 0, 2) {
            Ok(r) if r.bytes_consumed > 0 => {}
            _ => break,
        }
        while engine.take_inbound_record().is_some() {}
        for app in apps.iter_mut() {
            app.clear();
        }
    }
});
