use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::actuator::ActuatorLink;
use crate::assembler::Assembler;
use crate::error::{Error, Result};
use crate::run_state::RunStateController;
use crate::scan_buffer::ScanBuffer;
use crate::types::{RangeSample, Slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState{
    Idle,
    Stepping,
    AngleQuery,
    Snapshot,
    Complete,
    Failed,
}

//bounds on waiting for a range sample in the snapshot step
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPolicy{
    //snapshot attempts before giving up (at least one is always made)
    pub attempts: u32,
    //pause between attempts
    pub retry_interval: Duration,
    //overall cap on the wait, whichever bound is hit first
    pub timeout: Duration,
    //only accept a sample stored after the angle was obtained
    pub require_fresh_scan: bool,
}

impl Default for SnapshotPolicy{
    fn default() -> Self{
        Self{
            attempts: 50,
            retry_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(1),
            require_fresh_scan: false,
        }
    }
}

//runs one slice cycle per obtain_slice call: step, angle, snapshot, hand-off.
//a step that went through is never rolled back; the next cycle starts
//wherever the stand actually is.
pub struct SliceAcquirer<L: ActuatorLink, A: Assembler>{
    link: L,
    assembler: A,
    scans: Arc<ScanBuffer>,
    run_state: Arc<RunStateController>,
    policy: SnapshotPolicy,
    state: AcquisitionState,
    sequence: u64,
}

impl<L: ActuatorLink, A: Assembler> SliceAcquirer<L, A>{
    pub fn new(
        link: L,
        assembler: A,
        scans: Arc<ScanBuffer>,
        run_state: Arc<RunStateController>,
        policy: SnapshotPolicy,
    ) -> Self{
        Self{
            link,
            assembler,
            scans,
            run_state,
            policy,
            state: AcquisitionState::Idle,
            sequence: 0,
        }
    }

    //state the last cycle ended in (`Idle` before the first cycle)
    pub fn state(&self) -> AcquisitionState{
        self.state
    }

    //number of slices handed to the assembler so far
    pub fn slices_obtained(&self) -> u64{
        self.sequence
    }

    pub fn link_mut(&mut self) -> &mut L{
        &mut self.link
    }

    pub fn assembler(&self) -> &A{
        &self.assembler
    }

    pub fn assembler_mut(&mut self) -> &mut A{
        &mut self.assembler
    }

    pub fn into_parts(self) -> (L, A){
        (self.link, self.assembler)
    }

    //run one acquisition cycle.
    //
    //on success the slice has already been given to the assembler and a
    //copy is returned. On failure nothing reaches the assembler and the
    //error says which step failed: `Link` or `Protocol` from the actuator,
    //`Timeout` when no usable range sample turned up in time.
    pub fn obtain_slice(&mut self) -> Result<Slice>{
        self.transition(AcquisitionState::Idle);

        self.transition(AcquisitionState::Stepping);
        if let Err(e) = self.link.step(){
            return Err(self.fail(e));
        }

        self.transition(AcquisitionState::AngleQuery);
        let tilt_angle = match self.link.current_angle(){
            Ok(angle) => angle,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(AcquisitionState::Snapshot);
        let baseline = self.scans.epoch();
        let scan = match self.wait_for_scan(baseline){
            Ok(scan) => scan,
            Err(e) => return Err(self.fail(e)),
        };

        let slice = Slice{
            sequence: self.sequence + 1,
            tilt_angle,
            scan,
            run_state: self.run_state.current_state(),
        };
        self.sequence = slice.sequence;
        self.assembler.accept(slice.clone());
        self.transition(AcquisitionState::Complete);

        log::debug!(
            "Slice #{} at {:.3} deg with {} readings",
            slice.sequence,
            slice.tilt_angle,
            slice.scan.sample_count()
        );
        Ok(slice)
    }

    fn transition(&mut self, next: AcquisitionState){
        log::trace!("Acquisition {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: Error) -> Error{
        log::debug!("Acquisition failed in {:?}: {}", self.state, error);
        self.transition(AcquisitionState::Failed);
        error
    }

    fn wait_for_scan(&self, baseline: u64) -> Result<RangeSample>{
        let attempts = self.policy.attempts.max(1);
        let started = Instant::now();
        let mut attempt = 0;

        loop{
            attempt += 1;
            match self.scans.snapshot_with_epoch(){
                Ok((sample, epoch)) if !self.policy.require_fresh_scan || epoch > baseline =>{
                    return Ok(sample);
                }
                Ok(_) => log::trace!("Snapshot attempt {}: sample predates angle", attempt),
                Err(unavailable) => log::trace!("Snapshot attempt {}: {}", attempt, unavailable),
            }

            if attempt >= attempts || started.elapsed() >= self.policy.timeout{
                return Err(Error::Timeout(format!(
                    "no {}range sample after {} attempts in {:?}",
                    if self.policy.require_fresh_scan { "fresh " } else { "" },
                    attempt,
                    started.elapsed()
                )));
            }
            thread::sleep(self.policy.retry_interval);
        }
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::actuator::{Scripted, ScriptedActuator};
    use crate::assembler::SliceCollector;
    use crate::run_state::RunState;
    use crate::types::RangeReading;

    fn five_point_sample() -> RangeSample{
        let readings = [1.0, 1.5, 2.0, 2.5, 3.0]
            .into_iter()
            .map(RangeReading::new)
            .collect();
        RangeSample::new(-0.2, 0.1, readings).with_timestamp(42)
    }

    fn quick_policy() -> SnapshotPolicy{
        SnapshotPolicy{
            attempts: 5,
            retry_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            require_fresh_scan: false,
        }
    }

    fn acquirer(
        link: ScriptedActuator,
        scans: Arc<ScanBuffer>,
    ) -> SliceAcquirer<ScriptedActuator, SliceCollector>{
        let run_state = Arc::new(RunStateController::new(RunState::Enabled));
        SliceAcquirer::new(link, SliceCollector::new(), scans, run_state, quick_policy())
    }

    #[test]
    fn test_slice_pairs_angle_with_buffered_sample(){
        let scans = Arc::new(ScanBuffer::new());
        scans.store(five_point_sample());
        let mut acq = acquirer(ScriptedActuator::new().with_angles([12.5]), scans);

        let slice = acq.obtain_slice().unwrap();
        assert_eq!(slice.tilt_angle, 12.5);
        assert_eq!(slice.scan, five_point_sample());
        assert_eq!(slice.scan.sample_count(), 5);
        assert_eq!(slice.sequence, 1);
        assert_eq!(slice.run_state, RunState::Enabled);
        assert_eq!(acq.state(), AcquisitionState::Complete);
        assert_eq!(acq.assembler().slices(), &[slice]);
    }

    #[test]
    fn test_step_failure_skips_angle_and_snapshot(){
        let scans = Arc::new(ScanBuffer::new());
        scans.store(five_point_sample());
        let link = ScriptedActuator::new()
            .push_step(Scripted::LinkFault("port closed".into()))
            .with_angles([1.0]);
        let counters = link.counters();
        let mut acq = acquirer(link, Arc::clone(&scans));

        let err = acq.obtain_slice().unwrap_err();
        assert!(err.is_link());
        assert_eq!(acq.state(), AcquisitionState::Failed);
        assert_eq!(counters.angle_queries(), 0);
        //buffer untouched: same sample, same epoch
        assert_eq!(scans.epoch(), 1);
        assert_eq!(scans.snapshot().unwrap(), five_point_sample());
        assert!(acq.assembler().is_empty());
    }

    #[test]
    fn test_angle_failure_never_reaches_assembler(){
        let scans = Arc::new(ScanBuffer::new());
        scans.store(five_point_sample());
        let link = ScriptedActuator::new()
            .push_angle(Scripted::ProtocolFault("AA??".into()))
            .push_angle(Scripted::LinkFault("timed out".into()));
        let mut acq = acquirer(link, scans);

        assert!(acq.obtain_slice().unwrap_err().is_protocol());
        assert!(acq.obtain_slice().unwrap_err().is_link());
        assert!(acq.assembler().is_empty());
        assert_eq!(acq.slices_obtained(), 0);
    }

    #[test]
    fn test_missing_scan_times_out(){
        let scans = Arc::new(ScanBuffer::new());
        let mut acq = acquirer(ScriptedActuator::new().with_angles([3.0]), scans);

        let started = Instant::now();
        let err = acq.obtain_slice().unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(acq.state(), AcquisitionState::Failed);
        assert!(acq.assembler().is_empty());
    }

    #[test]
    fn test_snapshot_timeout_bound_applies_before_attempts(){
        let scans = Arc::new(ScanBuffer::new());
        let run_state = Arc::new(RunStateController::new(RunState::Enabled));
        let policy = SnapshotPolicy{
            attempts: u32::MAX,
            retry_interval: Duration::from_millis(2),
            timeout: Duration::from_millis(30),
            require_fresh_scan: false,
        };
        let mut acq = SliceAcquirer::new(
            ScriptedActuator::new().with_angles([0.0]),
            SliceCollector::new(),
            scans,
            run_state,
            policy,
        );
        assert!(acq.obtain_slice().unwrap_err().is_timeout());
    }

    #[test]
    fn test_scan_arriving_during_retries_is_used(){
        let scans = Arc::new(ScanBuffer::new());
        let run_state = Arc::new(RunStateController::new(RunState::Enabled));
        let policy = SnapshotPolicy{
            attempts: 1000,
            retry_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            require_fresh_scan: false,
        };
        let mut acq = SliceAcquirer::new(
            ScriptedActuator::new().with_angles([4.0]),
            SliceCollector::new(),
            Arc::clone(&scans),
            run_state,
            policy,
        );

        let producer ={
            let scans = Arc::clone(&scans);
            thread::spawn(move ||{
                thread::sleep(Duration::from_millis(20));
                scans.store(five_point_sample());
            })
        };
        let slice = acq.obtain_slice().unwrap();
        producer.join().unwrap();
        assert_eq!(slice.scan, five_point_sample());
    }

    #[test]
    fn test_fresh_scan_mode_rejects_stale_sample(){
        let scans = Arc::new(ScanBuffer::new());
        scans.store(five_point_sample());
        let run_state = Arc::new(RunStateController::new(RunState::Enabled));
        let policy = SnapshotPolicy{
            require_fresh_scan: true,
            ..quick_policy()
        };
        let mut acq = SliceAcquirer::new(
            ScriptedActuator::new().with_angles([1.0]),
            SliceCollector::new(),
            scans,
            run_state,
            policy,
        );
        let err = acq.obtain_slice().unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("fresh"));
    }

    #[test]
    fn test_sequence_and_run_state_recorded(){
        let scans = Arc::new(ScanBuffer::new());
        scans.store(five_point_sample());
        let run_state = Arc::new(RunStateController::new(RunState::Enabled));
        let mut acq = SliceAcquirer::new(
            ScriptedActuator::new().with_angles([1.0, 2.0]),
            SliceCollector::new(),
            scans,
            Arc::clone(&run_state),
            quick_policy(),
        );

        assert_eq!(acq.obtain_slice().unwrap().sequence, 1);
        run_state.set_state(RunState::Disabled);
        let second = acq.obtain_slice().unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.run_state, RunState::Disabled);
        assert_eq!(acq.slices_obtained(), 2);
    }
}
