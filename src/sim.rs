use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::actuator::ActuatorLink;
use crate::error::{Error, Result};
use crate::pubsub::Publisher;
use crate::types::{RangeReading, RangeSample, TiltAngle};

//tilt stand that sweeps back and forth between two limits
#[derive(Debug, Clone)]
pub struct SimulatedStand{
    angle: TiltAngle,
    increment: TiltAngle,
    min: TiltAngle,
    max: TiltAngle,
    step_delay: Duration,
}

impl SimulatedStand{
    pub fn new(start: TiltAngle, increment: TiltAngle, min: TiltAngle, max: TiltAngle) -> Result<Self>{
        if !(min < max) || increment == 0.0 || !increment.is_finite(){
            return Err(Error::Config(format!(
                "simulated stand needs min < max and a non-zero increment (got {}..{} by {})",
                min, max, increment
            )));
        }
        Ok(Self{
            angle: start.clamp(min, max),
            increment,
            min,
            max,
            step_delay: Duration::ZERO,
        })
    }

    //time each step takes to "move"
    pub fn with_step_delay(mut self, delay: Duration) -> Self{
        self.step_delay = delay;
        self
    }

    pub fn angle(&self) -> TiltAngle{
        self.angle
    }
}

impl ActuatorLink for SimulatedStand{
    fn step(&mut self) -> Result<()>{
        let mut next = self.angle + self.increment;
        if next > self.max || next < self.min{
            self.increment = -self.increment;
            next = self.angle + self.increment;
        }
        self.angle = next.clamp(self.min, self.max);

        if !self.step_delay.is_zero(){
            thread::sleep(self.step_delay);
        }
        Ok(())
    }

    fn current_angle(&mut self) -> Result<TiltAngle>{
        Ok(self.angle)
    }
}

fn now_ms() -> u64{
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//publishes a synthetic 240° scan of a circular room at a fixed period
pub struct SyntheticScanSource{
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticScanSource{
    pub const READINGS: usize = 241;
    const FIELD_OF_VIEW: f32 = 240.0 * PI / 180.0;

    pub fn sample(range: f32) -> RangeSample{
        let increment = Self::FIELD_OF_VIEW / (Self::READINGS - 1) as f32;
        let readings = (0..Self::READINGS)
            .map(|i| RangeReading::with_intensity(range, 100.0 + (i % 10) as f32))
            .collect();
        RangeSample::new(-Self::FIELD_OF_VIEW / 2.0, increment, readings).with_timestamp(now_ms())
    }

    pub fn spawn(publisher: Publisher<RangeSample>, period: Duration, range: f32) -> Result<Self>{
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("synthetic-scan".to_string())
            .spawn(move ||{
                while flag.load(Ordering::Acquire){
                    publisher.publish(Self::sample(range));
                    thread::sleep(period);
                }
            })
            .map_err(Error::Io)?;

        Ok(Self{
            running,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self){
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take(){
            if handle.join().is_err(){
                log::error!("Synthetic scan thread panicked");
            }
        }
    }
}

impl Drop for SyntheticScanSource{
    fn drop(&mut self){
        self.stop();
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::pubsub::Topic;

    #[test]
    fn test_stand_sweeps_and_reverses(){
        let mut stand = SimulatedStand::new(0.0, 10.0, 0.0, 20.0).unwrap();
        let mut angles = Vec::new();
        for _ in 0..5{
            stand.step().unwrap();
            angles.push(stand.current_angle().unwrap());
        }
        assert_eq!(angles, vec![10.0, 20.0, 10.0, 0.0, 10.0]);
    }

    #[test]
    fn test_stand_rejects_bad_limits(){
        assert!(SimulatedStand::new(0.0, 1.0, 5.0, 5.0).is_err());
        assert!(SimulatedStand::new(0.0, 0.0, 0.0, 5.0).is_err());
    }

    #[test]
    fn test_synthetic_sample_shape(){
        let sample = SyntheticScanSource::sample(3.0);
        assert_eq!(sample.sample_count(), SyntheticScanSource::READINGS);
        assert!((sample.angle_max() + sample.angle_min).abs() < 1e-4);
        assert!(sample.readings.iter().all(|r| r.range == 3.0));
    }

    #[test]
    fn test_source_publishes_until_stopped(){
        let topic = Arc::new(Topic::<RangeSample>::new("/scan", 64));
        let mut source =
            SyntheticScanSource::spawn(Publisher::new(Arc::clone(&topic)), Duration::from_millis(1), 2.0)
                .unwrap();
        thread::sleep(Duration::from_millis(20));
        source.stop();
        let published = topic.latest_epoch();
        assert!(published > 0);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(topic.latest_epoch(), published);
    }
}
