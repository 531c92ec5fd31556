//! Integration tests for tlsrec.
//! Records written by the blocking stream are read by the buffer engine
//! and the other way round.

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};

    use tlsrec_crypto::Direction;
    use tlsrec_record::handshake::codec::{decode_client_hello, parse_handshake_header};
    use tlsrec_record::{
        Alert, AlertDescription, Buffer, ContentType, Epoch, EpochKeys, HandshakeStatus,
        RecordConfig, RecordEngine, RecordStream, Status,
    };
    use tlsrec_types::{CipherAlgId, MacAlgId, ProtocolVersion, TlsError};

    #[derive(Debug, Default)]
    struct Pipe {
        incoming: Cursor<Vec<u8>>,
        outgoing: Vec<u8>,
    }

    impl Read for Pipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.incoming.read(buf)
        }
    }

    impl Write for Pipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.outgoing.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Suite {
        version: ProtocolVersion,
        cipher: CipherAlgId,
        mac: MacAlgId,
        key: Vec<u8>,
        iv: Vec<u8>,
        mac_key: Vec<u8>,
    }

    impl Suite {
        fn new(version: ProtocolVersion, cipher: CipherAlgId, mac: MacAlgId) -> Self {
            Self {
                version,
                cipher,
                mac,
                key: vec![0x42; cipher.key_len()],
                iv: vec![0x24; cipher.fixed_iv_len()],
                mac_key: vec![0x77; mac.mac_len()],
            }
        }

        fn epoch(&self, direction: Direction) -> Epoch {
            let keys = EpochKeys {
                version: self.version,
                cipher: self.cipher,
                mac: self.mac,
                key: &self.key,
                iv: &self.iv,
                mac_key: &self.mac_key,
            };
            Epoch::from_keys(&keys, direction).unwrap()
        }
    }

    fn suites() -> Vec<Suite> {
        vec![
            Suite::new(ProtocolVersion::SSL30, CipherAlgId::DesEde3Cbc, MacAlgId::Sha1),
            Suite::new(ProtocolVersion::TLS10, CipherAlgId::Aes128Cbc, MacAlgId::Sha1),
            Suite::new(ProtocolVersion::TLS10, CipherAlgId::Rc4_128, MacAlgId::Md5),
            Suite::new(ProtocolVersion::TLS11, CipherAlgId::Aes256Cbc, MacAlgId::Sha1),
            Suite::new(ProtocolVersion::TLS12, CipherAlgId::Aes128Cbc, MacAlgId::Sha256),
            Suite::new(ProtocolVersion::TLS12, CipherAlgId::Aes256Gcm, MacAlgId::Null),
            Suite::new(ProtocolVersion::TLS12, CipherAlgId::ChaCha20Poly1305, MacAlgId::Null),
        ]
    }

    fn finished() -> Vec<u8> {
        let mut msg = vec![20, 0, 0, 12];
        msg.extend_from_slice(&[0x3C; 12]);
        msg
    }

    /// Unwrap every record in `bytes`, returning the application data.
    fn engine_read_all(engine: &mut RecordEngine, bytes: Vec<u8>) -> Vec<u8> {
        let mut net = Buffer::wrap(bytes);
        let mut out = Vec::new();
        while net.has_remaining() {
            let mut apps = [Buffer::allocate(32 * 1024)];
            let r = engine.unwrap(&mut net, &mut apps, 0, 1).unwrap();
            assert_eq!(r.status, Status::Ok, "{r}");
            out.extend_from_slice(&apps[0].storage()[..r.bytes_produced]);
        }
        out
    }

    /// Wrap everything queued plus `data` into one byte string.
    fn engine_write_all(engine: &mut RecordEngine, data: &[u8]) -> Vec<u8> {
        let mut apps = [Buffer::wrap(data.to_vec())];
        let mut out = Vec::new();
        loop {
            let mut net = Buffer::allocate(20 * 1024);
            let r = engine.wrap(&mut apps, 0, 1, &mut net).unwrap();
            net.flip();
            out.extend_from_slice(net.as_slice());
            if r.status != Status::Ok || (!apps[0].has_remaining() && !engine.has_outbound_data()) {
                break;
            }
        }
        out
    }

    /// Stream switches its write epoch; engine follows.
    fn stream_to_engine_switch(stream: &mut RecordStream<Pipe>, engine: &mut RecordEngine, suite: &Suite) {
        stream.set_version(suite.version);
        stream
            .write_change_cipher_spec(suite.epoch(Direction::Encrypt), true)
            .unwrap();
        stream.write_handshake(&finished(), false).unwrap();
        engine.stage_read_epoch(suite.epoch(Direction::Decrypt));
        let bytes = std::mem::take(&mut stream.get_mut().outgoing);
        assert!(engine_read_all(engine, bytes).is_empty());
        assert_eq!(
            engine.take_inbound_record().unwrap().content_type,
            ContentType::ChangeCipherSpec
        );
        assert_eq!(engine.take_inbound_record().unwrap().payload, finished());
    }

    /// Engine switches its write epoch; stream follows.
    fn engine_to_stream_switch(engine: &mut RecordEngine, stream: &mut RecordStream<Pipe>, suite: &Suite) {
        engine.set_version(suite.version);
        engine
            .write_change_cipher_spec(suite.epoch(Direction::Encrypt))
            .unwrap();
        engine.write_handshake(&finished()).unwrap();
        stream.stage_read_epoch(suite.epoch(Direction::Decrypt));
        let bytes = engine_write_all(engine, &[]);
        stream.get_mut().incoming = Cursor::new(bytes);
        assert_eq!(
            stream.next_record().unwrap().unwrap().content_type,
            ContentType::ChangeCipherSpec
        );
        assert_eq!(stream.next_record().unwrap().unwrap().payload, finished());
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 + 7) as u8).collect()
    }

    // -------------------------------------------------------
    // 1. Stream writes, engine reads, every suite
    // -------------------------------------------------------
    #[test]
    fn test_stream_to_engine_all_suites() {
        for suite in suites() {
            let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
            let mut engine = RecordEngine::new(RecordConfig::default());
            stream_to_engine_switch(&mut stream, &mut engine, &suite);
            for len in [1usize, 15, 16, 17, 1000, 16384, 20000] {
                let data = pattern(len);
                stream.write_all(&data).unwrap();
                let bytes = std::mem::take(&mut stream.get_mut().outgoing);
                assert_eq!(
                    engine_read_all(&mut engine, bytes),
                    data,
                    "{:?} {:?} len {len}",
                    suite.version,
                    suite.cipher
                );
            }
        }
    }

    // -------------------------------------------------------
    // 2. Engine writes, stream reads, every suite
    // -------------------------------------------------------
    #[test]
    fn test_engine_to_stream_all_suites() {
        for suite in suites() {
            let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
            let mut engine = RecordEngine::new(RecordConfig::default());
            engine_to_stream_switch(&mut engine, &mut stream, &suite);
            for len in [1usize, 255, 4096, 16384, 40000] {
                let data = pattern(len);
                let bytes = engine_write_all(&mut engine, &data);
                stream.get_mut().incoming = Cursor::new(bytes);
                let mut got = vec![0u8; len];
                stream.read_exact(&mut got).unwrap();
                assert_eq!(got, data, "{:?} {:?} len {len}", suite.version, suite.cipher);
            }
        }
    }

    // -------------------------------------------------------
    // 3. 1/n-1 split records are reassembled by the engine
    // -------------------------------------------------------
    #[test]
    fn test_split_records_reassemble() {
        let suite = Suite::new(ProtocolVersion::TLS10, CipherAlgId::Aes128Cbc, MacAlgId::Sha1);
        let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
        let mut engine = RecordEngine::new(RecordConfig::default());
        stream_to_engine_switch(&mut stream, &mut engine, &suite);
        stream.write_all(b"GET / HTTP/1.0\r\n").unwrap();
        stream.write_all(b"Host: a.test\r\n\r\n").unwrap();
        let bytes = std::mem::take(&mut stream.get_mut().outgoing);
        let mut net = Buffer::wrap(bytes);
        let mut records = 0;
        let mut data = Vec::new();
        while net.has_remaining() {
            let mut apps = [Buffer::allocate(1024)];
            let r = engine.unwrap(&mut net, &mut apps, 0, 1).unwrap();
            records += 1;
            data.extend_from_slice(&apps[0].storage()[..r.bytes_produced]);
        }
        assert_eq!(records, 3);
        assert_eq!(data, b"GET / HTTP/1.0\r\nHost: a.test\r\n\r\n");
    }

    // -------------------------------------------------------
    // 4. SSLv2 ClientHello accepted by the engine when enabled
    // -------------------------------------------------------
    #[test]
    fn test_v2_hello_into_engine() {
        let mut msg = vec![1, 3, 1, 0, 6, 0, 0, 0, 16];
        msg.extend_from_slice(&[0x00, 0x00, 0x35, 0x01, 0x00, 0x80]);
        msg.extend_from_slice(&[0xEE; 16]);
        let mut packet = vec![0x80, msg.len() as u8];
        packet.extend_from_slice(&msg);

        let config = RecordConfig::builder().enable_v2_hello(true).build().unwrap();
        let mut engine = RecordEngine::new(config);
        assert!(engine_read_all(&mut engine, packet.clone()).is_empty());
        let record = engine.take_inbound_record().unwrap();
        assert_eq!(record.content_type, ContentType::Handshake);
        assert_eq!(record.legacy_v2_hello.as_deref(), Some(&msg[..]));
        let (_, body, _) = parse_handshake_header(&record.payload).unwrap();
        let hello = decode_client_hello(body).unwrap();
        assert_eq!(hello.client_version, ProtocolVersion::TLS10);
        assert_eq!(hello.cipher_suites, vec![0x0035]);

        let mut engine = RecordEngine::new(RecordConfig::default());
        let mut net = Buffer::wrap(packet);
        let mut apps = [Buffer::allocate(64)];
        assert!(matches!(
            engine.unwrap(&mut net, &mut apps, 0, 1),
            Err(TlsError::HandshakeFailed(_))
        ));
    }

    // -------------------------------------------------------
    // 5. Orderly close from the engine side
    // -------------------------------------------------------
    #[test]
    fn test_engine_close_reaches_stream() {
        let suite = Suite::new(ProtocolVersion::TLS12, CipherAlgId::Aes128Gcm, MacAlgId::Null);
        let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
        let mut engine = RecordEngine::new(RecordConfig::default());
        engine_to_stream_switch(&mut engine, &mut stream, &suite);
        stream_to_engine_switch(&mut stream, &mut engine, &suite);

        let mut bytes = engine_write_all(&mut engine, b"last words");
        engine.close_outbound();
        bytes.extend(engine_write_all(&mut engine, &[]));
        assert!(engine.is_outbound_done());
        stream.get_mut().incoming = Cursor::new(bytes);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"last words");
        assert!(stream.is_inbound_done());

        // The stream's reply close_notify closes the engine's inbound side.
        let reply = std::mem::take(&mut stream.get_mut().outgoing);
        let mut net = Buffer::wrap(reply);
        let mut apps = [Buffer::allocate(64)];
        let r = engine.unwrap(&mut net, &mut apps, 0, 1).unwrap();
        assert_eq!(r.status, Status::Closed);
        assert!(engine.is_inbound_done());
        assert!(engine.close_inbound().is_ok());
    }

    // -------------------------------------------------------
    // 6. A corrupted record is answered with bad_record_mac
    // -------------------------------------------------------
    #[test]
    fn test_corruption_reported_to_peer() {
        let suite = Suite::new(ProtocolVersion::TLS11, CipherAlgId::Aes128Cbc, MacAlgId::Sha1);
        let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
        let mut engine = RecordEngine::new(RecordConfig::default());
        stream_to_engine_switch(&mut stream, &mut engine, &suite);
        engine_to_stream_switch(&mut engine, &mut stream, &suite);

        stream.write_all(&pattern(100)).unwrap();
        let mut bytes = std::mem::take(&mut stream.get_mut().outgoing);
        bytes[40] ^= 0x01;
        let mut net = Buffer::wrap(bytes);
        let mut apps = [Buffer::allocate(256)];
        assert!(matches!(
            engine.unwrap(&mut net, &mut apps, 0, 1),
            Err(TlsError::BadRecordMac)
        ));
        assert_eq!(engine.handshake_status(), HandshakeStatus::NeedWrap);

        let alert = engine_write_all(&mut engine, &[]);
        stream.get_mut().incoming = Cursor::new(alert);
        match stream.next_record() {
            Err(TlsError::AlertReceived(desc)) => {
                assert_eq!(desc, format!("{:?}", AlertDescription::BadRecordMac))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // -------------------------------------------------------
    // 7. Warning alerts pass through to the handshake layer
    // -------------------------------------------------------
    #[test]
    fn test_warning_alert_from_stream() {
        let mut stream = RecordStream::new(Pipe::default(), RecordConfig::default());
        let mut engine = RecordEngine::new(RecordConfig::default());
        stream
            .send_alert(Alert::new(
                tlsrec_record::AlertLevel::Warning,
                AlertDescription::NoRenegotiation,
            ))
            .unwrap();
        let bytes = std::mem::take(&mut stream.get_mut().outgoing);
        assert!(engine_read_all(&mut engine, bytes).is_empty());
        let record = engine.take_inbound_record().unwrap();
        assert_eq!(record.content_type, ContentType::Alert);
        assert_eq!(
            Alert::decode(&record.payload).unwrap().description,
            AlertDescription::NoRenegotiation
        );
    }
}
