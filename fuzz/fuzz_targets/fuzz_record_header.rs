#![no_main]
use libfuzzer_sys::fuzz_target;
use tlsrec_record::record::framing::Framing;
use tlsrec_record::record::RecordHeader;
use tlsrec_record::RecordConfig;

fuzz_target!(|data: &[u8]| {
    let _ = RecordHeader::decode(data);
    let config = RecordConfig::builder().enable_v2_hello(true).build().unwrap();
    let mut framing = Framing::new(&config);
    let _ = framing.bytes_in_complete_packet(data);
});
