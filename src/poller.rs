//! Periodically reads the assigned sensors on a background thread.

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tempbar_core::{Monitor, SensorError, SensorKey};

/// The outcome of one slot in one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// No sensor is assigned to the slot.
    Unassigned,
    Value(f64),
    Failed(SensorError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotReading {
    pub slot: usize,
    pub key: Option<SensorKey>,
    pub reading: Reading,
}

/// What to read and how often.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub slots: Vec<Option<SensorKey>>,
    pub interval: Duration,
}

/// Reads every slot once. A failing slot never prevents the others from being read.
pub fn poll(monitor: &Monitor, slots: &[Option<SensorKey>]) -> Vec<SlotReading> {
    slots
        .iter()
        .enumerate()
        .map(|(slot, key)| SlotReading {
            slot,
            key: *key,
            reading: match key {
                None => Reading::Unassigned,
                Some(key) => match monitor.read_key(*key) {
                    Ok(value) => Reading::Value(value),
                    Err(err) => Reading::Failed(err),
                },
            },
        })
        .collect()
}

/// Cloneable handle for editing the plan of a running poller.
#[derive(Clone)]
pub struct PlanHandle(Arc<Mutex<Plan>>);

impl PlanHandle {
    pub fn update(&self, f: impl FnOnce(&mut Plan)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }

    pub fn get(&self) -> Plan {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub struct Poller {
    plan: PlanHandle,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Starts polling immediately; every tick's readings are passed to `sink`. The loop ends
    /// when [`Poller::stop`] is called or `sink` returns `false`.
    pub fn spawn<F>(monitor: Arc<Monitor>, plan: Plan, mut sink: F) -> Self
    where
        F: FnMut(Vec<SlotReading>) -> bool + Send + 'static,
    {
        let plan = PlanHandle(Arc::new(Mutex::new(plan)));
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread_plan = plan.clone();

        let handle = thread::spawn(move || loop {
            let plan = thread_plan.get();
            if !sink(poll(&monitor, &plan.slots)) {
                log::debug!("poller sink closed");
                break;
            }

            match stop_rx.recv_timeout(plan.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            plan,
            stop_tx,
            handle,
        }
    }

    pub fn plan(&self) -> PlanHandle {
        self.plan.clone()
    }

    /// Stops the loop and waits for the current tick to finish.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            log::error!("poller thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempbar_core::{
        key,
        smc::{
            conv::TYPE_SP78,
            frame::{Selector, SmcFrame, RESULT_KEY_NOT_FOUND, RESULT_SUCCESS},
            Transport,
        },
        IoReturn,
    };

    /// Knows `TC0P` at 44 degrees and fails the transport for `TG0P`.
    struct TwoKeys;

    impl Transport for TwoKeys {
        fn call(&mut self, frame: &mut SmcFrame) -> Result<(), IoReturn> {
            if frame.key == key!("TG0P") {
                return Err(IoReturn(-5));
            }
            if frame.key != key!("TC0P") {
                frame.result = RESULT_KEY_NOT_FOUND;
                return Ok(());
            }

            frame.result = RESULT_SUCCESS;
            match frame.selector {
                Selector::GetKeyInfo => {
                    frame.key_info.data_type = TYPE_SP78;
                    frame.key_info.data_size = 2;
                }
                _ => frame.bytes[0] = 0x2C,
            }
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_poll_isolates_failures() {
        let monitor = Monitor::with_transport(TwoKeys);
        let readings = poll(
            &monitor,
            &[Some(key!("TG0P")), None, Some(key!("ZZZZ")), Some(key!("TC0P"))],
        );

        assert_eq!(readings.len(), 4);
        assert_eq!(
            readings[0].reading,
            Reading::Failed(SensorError::Transport {
                key: key!("TG0P"),
                code: IoReturn(-5)
            })
        );
        assert_eq!(readings[1].reading, Reading::Unassigned);
        assert_eq!(
            readings[2].reading,
            Reading::Failed(SensorError::KeyNotFound(key!("ZZZZ")))
        );
        assert_eq!(readings[3].reading, Reading::Value(44.0));
        assert_eq!(readings[3].slot, 3);
    }

    #[test]
    fn test_poller_follows_plan_updates() {
        let monitor = Arc::new(Monitor::with_transport(TwoKeys));
        let (tx, rx) = mpsc::channel();
        let poller = Poller::spawn(
            monitor,
            Plan {
                slots: vec![None],
                interval: Duration::from_millis(5),
            },
            move |readings| tx.send(readings).is_ok(),
        );

        assert_eq!(rx.recv().unwrap()[0].reading, Reading::Unassigned);

        poller
            .plan()
            .update(|plan| plan.slots = vec![Some(key!("TC0P"))]);
        let updated = rx
            .iter()
            .find(|readings| readings[0].reading != Reading::Unassigned)
            .unwrap();
        assert_eq!(updated[0].reading, Reading::Value(44.0));

        poller.stop();
    }
}
