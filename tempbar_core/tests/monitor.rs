//! Drives `Monitor` end to end through a scripted SMC.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
};

use tempbar_core::{
    key,
    smc::{
        conv::{TYPE_FLT, TYPE_SP78},
        frame::{Selector, SmcFrame, RESULT_KEY_NOT_FOUND, RESULT_SUCCESS},
        Transport,
    },
    DataType, DecodeError, IoReturn, Monitor, Sensor, SensorError, SensorKey,
};

/// What the fake SMC answers for one key.
#[derive(Clone)]
enum Entry {
    Value(DataType, u32, Vec<u8>),
    /// Key info succeeds, the read itself returns this result byte.
    ReadFails(u8),
    /// The structured call itself fails on key info.
    Broken(i32),
}

#[derive(Default)]
struct Script {
    keys: HashMap<SensorKey, Entry>,
    log: Vec<(SensorKey, Selector)>,
    open: bool,
}

/// A fake transport; the script is shared so tests can inspect the call log afterwards.
#[derive(Clone)]
struct FakeSmc(Arc<Mutex<Script>>);

impl FakeSmc {
    fn new(entries: &[(&str, Entry)]) -> Self {
        let keys = entries
            .iter()
            .map(|(key, entry)| (SensorKey::parse(key).unwrap(), entry.clone()))
            .collect();

        Self(Arc::new(Mutex::new(Script {
            keys,
            log: Vec::new(),
            open: true,
        })))
    }

    fn log(&self) -> Vec<(SensorKey, Selector)> {
        self.0.lock().unwrap().log.clone()
    }
}

impl Transport for FakeSmc {
    fn call(&mut self, frame: &mut SmcFrame) -> Result<(), IoReturn> {
        let mut script = self.0.lock().unwrap();
        script.log.push((frame.key, frame.selector));

        let entry = script.keys.get(&frame.key).cloned();
        match (entry, frame.selector) {
            (None, _) => frame.result = RESULT_KEY_NOT_FOUND,
            (Some(Entry::Broken(code)), _) => return Err(IoReturn(code)),
            (Some(Entry::Value(data_type, size, _)), Selector::GetKeyInfo) => {
                frame.result = RESULT_SUCCESS;
                frame.key_info.data_type = data_type;
                frame.key_info.data_size = size;
            }
            (Some(Entry::ReadFails(_)), Selector::GetKeyInfo) => {
                frame.result = RESULT_SUCCESS;
                frame.key_info.data_type = TYPE_SP78;
                frame.key_info.data_size = 2;
            }
            (Some(Entry::Value(data_type, size, bytes)), Selector::ReadKey) => {
                assert_eq!(frame.key_info.data_type, data_type);
                assert_eq!(frame.key_info.data_size, size);
                frame.result = RESULT_SUCCESS;
                frame.bytes[..bytes.len()].copy_from_slice(&bytes);
            }
            (Some(Entry::ReadFails(code)), Selector::ReadKey) => frame.result = code,
            (Some(_), Selector::Unknown) => return Err(IoReturn(-1)),
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.0.lock().unwrap().open
    }

    fn close(&mut self) {
        self.0.lock().unwrap().open = false;
    }
}

fn sp78(bytes: [u8; 2]) -> Entry {
    Entry::Value(TYPE_SP78, 2, bytes.to_vec())
}

static TEST_CATALOG: [Sensor; 4] = [
    Sensor::cpu(key!("TC0P"), "CPU Proximity"),
    Sensor::system(key!("ZZZZ"), "Missing"),
    Sensor::gpu(key!("TG0P"), "GPU Proximity"),
    Sensor::battery(key!("TB0T"), "Battery"),
];

#[test]
fn reads_cpu_proximity() {
    let smc = FakeSmc::new(&[("TC0P", sp78([0x2C, 0x00]))]);
    let monitor = Monitor::with_transport(smc.clone());

    assert_eq!(monitor.read_temperature("TC0P"), Ok(44.0));
    assert_eq!(
        smc.log(),
        [
            (key!("TC0P"), Selector::GetKeyInfo),
            (key!("TC0P"), Selector::ReadKey)
        ]
    );
}

#[test]
fn reads_float_sensor() {
    let smc = FakeSmc::new(&[("Tp01", Entry::Value(TYPE_FLT, 4, 36.5_f32.to_be_bytes().to_vec()))]);
    let monitor = Monitor::with_transport(smc);

    assert_eq!(monitor.read_temperature("Tp01"), Ok(36.5));
}

#[test]
fn missing_key_stops_after_key_info() {
    let smc = FakeSmc::new(&[]);
    let monitor = Monitor::with_transport(smc.clone());

    assert_eq!(
        monitor.read_temperature("ZZZZ"),
        Err(SensorError::KeyNotFound(key!("ZZZZ")))
    );
    assert_eq!(smc.log(), [(key!("ZZZZ"), Selector::GetKeyInfo)]);
}

#[test]
fn per_key_errors_are_classified() {
    let smc = FakeSmc::new(&[
        ("TC0P", Entry::ReadFails(0x85)),
        ("TG0P", Entry::Broken(0xE000_02C1_u32 as i32)),
        ("TB0T", Entry::Value(key!("ui16"), 2, vec![0, 40])),
    ]);
    let monitor = Monitor::with_transport(smc);

    assert_eq!(
        monitor.read_temperature("TC0P"),
        Err(SensorError::OperationFailed {
            key: key!("TC0P"),
            code: 0x85
        })
    );
    assert_eq!(
        monitor.read_temperature("TG0P"),
        Err(SensorError::Transport {
            key: key!("TG0P"),
            code: IoReturn::NOT_PRIVILEGED
        })
    );
    assert_eq!(
        monitor.read_temperature("TB0T"),
        Err(SensorError::Decode {
            key: key!("TB0T"),
            source: DecodeError::UnsupportedFormat {
                data_type: key!("ui16"),
                size: 2
            }
        })
    );
}

#[test]
fn invalid_key_never_reaches_the_smc() {
    let smc = FakeSmc::new(&[]);
    let monitor = Monitor::with_transport(smc.clone());

    assert_eq!(
        monitor.read_temperature("TC0"),
        Err(SensorError::InvalidKey("TC0".to_string()))
    );
    assert!(smc.log().is_empty());
}

#[test]
fn repeated_reads_agree() {
    let monitor = Monitor::with_transport(FakeSmc::new(&[("TC0P", sp78([0x31, 0x40]))]));

    let first = monitor.read_temperature("TC0P").unwrap();
    for _ in 0..10 {
        assert_eq!(monitor.read_temperature("TC0P"), Ok(first));
    }
}

#[test]
fn available_sensors_keep_catalog_order() {
    let smc = FakeSmc::new(&[
        ("TB0T", sp78([0x1E, 0x00])),
        ("TC0P", sp78([0x2C, 0x00])),
        ("TG0P", Entry::ReadFails(0x86)),
    ]);
    let monitor = Monitor::with_transport(smc).with_catalog(&TEST_CATALOG);

    let keys: Vec<_> = monitor
        .list_available_sensors()
        .into_iter()
        .map(|s| s.key)
        .collect();
    assert_eq!(keys, [key!("TC0P"), key!("TB0T")]);
}

#[test]
fn shutdown_fails_reads_fast() {
    let smc = FakeSmc::new(&[("TC0P", sp78([0x2C, 0x00]))]);
    let monitor = Monitor::with_transport(smc.clone());

    assert!(monitor.is_connected());
    monitor.shutdown();
    monitor.shutdown();

    assert!(!monitor.is_connected());
    assert_eq!(monitor.read_temperature("TC0P"), Err(SensorError::NotConnected));
    assert!(monitor.list_available_sensors().is_empty());
    assert!(smc.log().is_empty());
}

#[test]
fn concurrent_reads_do_not_interleave_phases() {
    let smc = FakeSmc::new(&[
        ("TC0P", sp78([0x2C, 0x00])),
        ("TG0P", sp78([0x30, 0x00])),
    ]);
    let monitor = Arc::new(Monitor::with_transport(smc.clone()));

    let handles: Vec<_> = ["TC0P", "TG0P"]
        .into_iter()
        .map(|key| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for _ in 0..50 {
                    monitor.read_temperature(key).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let log = smc.log();
    assert_eq!(log.len(), 200);
    for pair in log.chunks(2) {
        assert_eq!(pair[0].0, pair[1].0);
        assert_eq!(pair[0].1, Selector::GetKeyInfo);
        assert_eq!(pair[1].1, Selector::ReadKey);
    }
}
