use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{BufferUnavailable, Error, Result};
use crate::pubsub::Subscriber;
use crate::types::RangeSample;

const FEED_IDLE_SLEEP: Duration = Duration::from_millis(1);

struct Slot{
    sample: Option<RangeSample>,
    epoch: u64,
}

//holds the most recently received range sample.
//
//`store` replaces the sample wholesale and `snapshot` returns an owned copy,
//each under its own short lock, so a reader never observes a mix of two
//samples.
pub struct ScanBuffer{
    slot: Mutex<Slot>,
}

impl ScanBuffer{
    pub fn new() -> Self{
        Self{
            slot: Mutex::new(Slot{
                sample: None,
                epoch: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot>{
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    //replace the current sample. Returns the new epoch.
    pub fn store(&self, sample: RangeSample) -> u64{
        let mut slot = self.lock();
        slot.sample = Some(sample);
        slot.epoch += 1;
        slot.epoch
    }

    pub fn snapshot(&self) -> std::result::Result<RangeSample, BufferUnavailable>{
        self.snapshot_with_epoch().map(|(sample, _)| sample)
    }

    //copy of the current sample together with the epoch it was stored at
    pub fn snapshot_with_epoch(&self) -> std::result::Result<(RangeSample, u64), BufferUnavailable>{
        let slot = self.lock();
        match &slot.sample{
            Some(sample) => Ok((sample.clone(), slot.epoch)),
            None => Err(BufferUnavailable),
        }
    }

    //number of samples stored so far (0 = none yet)
    pub fn epoch(&self) -> u64{
        self.lock().epoch
    }
}

impl Default for ScanBuffer{
    fn default() -> Self{
        Self::new()
    }
}

//producer context: copies every sample delivered on the scan topic into
//the scan buffer. Does nothing else.
pub struct ScanFeed{
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScanFeed{
    pub fn spawn(subscriber: Subscriber<RangeSample>, buffer: Arc<ScanBuffer>) -> Result<Self>{
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let topic = subscriber.topic_name().to_string();

        let handle = thread::Builder::new()
            .name("scan-feed".to_string())
            .spawn(move || Self::run_loop(subscriber, buffer, flag))
            .map_err(Error::Io)?;

        log::info!("Subscribed to range samples on {}", topic);
        Ok(Self{
            running,
            handle: Some(handle),
        })
    }

    fn run_loop(subscriber: Subscriber<RangeSample>, buffer: Arc<ScanBuffer>, running: Arc<AtomicBool>){
        while running.load(Ordering::Acquire){
            match subscriber.try_recv(){
                Some(sample) =>{
                    buffer.store(sample);
                }
                None => thread::sleep(FEED_IDLE_SLEEP),
            }
        }
    }

    pub fn is_running(&self) -> bool{
        self.handle.is_some()
    }

    //stop the feed thread and wait for it to exit. Safe to call twice.
    pub fn stop(&mut self){
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take(){
            if handle.join().is_err(){
                log::error!("Scan feed thread panicked");
            }
            log::info!("Unsubscribed from range samples");
        }
    }
}

impl Drop for ScanFeed{
    fn drop(&mut self){
        self.stop();
    }
}
