use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::acquisition::SliceAcquirer;
use crate::actuator::ActuatorLink;
use crate::assembler::SlicePublisher;
use crate::config::{ActuatorConfig, ScannerConfig};
use crate::error::{Error, Result};
use crate::mcu::McuLink;
use crate::pubsub::{Publisher, Subscriber, Topic, TopicRegistry};
use crate::run_state::{RunState, RunStateController};
use crate::scan_buffer::{ScanBuffer, ScanFeed};
use crate::sim::{SimulatedStand, SyntheticScanSource};
use crate::transport::SerialTransport;
use crate::types::{RangeSample, Slice};

type Acquirer = SliceAcquirer<Box<dyn ActuatorLink>, SlicePublisher>;

//what one call to `TiltingScanner::spin_once` did
#[derive(Debug)]
pub enum CycleOutcome{
    //run state is disabled; no cycle ran
    Disabled,
    Acquired(Slice),
    //the cycle ran and failed; nothing was published
    Failed(Error),
}

pub struct TiltingScanner{
    config: ScannerConfig,
    registry: Arc<TopicRegistry>,
    scans: Arc<ScanBuffer>,
    run_state: Arc<RunStateController>,
    acquirer: Option<Acquirer>,
    feed: Option<ScanFeed>,
    commands: Option<Subscriber<i32>>,
    synthetic: Option<SyntheticScanSource>,
    started: bool,
    consecutive_failures: u32,
}

impl TiltingScanner{
    pub fn new(config: ScannerConfig) -> Self{
        Self::with_registry(config, Arc::new(TopicRegistry::new()))
    }

    //use a registry shared with the scan producer and slice consumers
    pub fn with_registry(config: ScannerConfig, registry: Arc<TopicRegistry>) -> Self{
        Self{
            config,
            registry,
            scans: Arc::new(ScanBuffer::new()),
            run_state: Arc::new(RunStateController::default()),
            acquirer: None,
            feed: None,
            commands: None,
            synthetic: None,
            started: false,
            consecutive_failures: 0,
        }
    }

    //open the configured actuator channel and set up subscriptions
    pub fn init(&mut self) -> Result<()>{
        if self.is_initialized(){
            log::warn!("Scanner already initialized");
            return Ok(());
        }
        self.config.validate()?;

        let link = self.open_actuator().map_err(|e|{
            log::error!("Failed to open actuator channel: {}", e);
            e
        })?;
        self.init_with_link(link)?;

        if let ActuatorConfig::Simulated(sim) = &self.config.actuator{
            if sim.scan_period_ms > 0{
                let source = SyntheticScanSource::spawn(
                    self.scan_publisher(),
                    Duration::from_millis(sim.scan_period_ms),
                    sim.scan_range_m,
                )?;
                self.synthetic = Some(source);
            }
        }
        Ok(())
    }

    //initialize around an already opened actuator link
    pub fn init_with_link(&mut self, link: Box<dyn ActuatorLink>) -> Result<()>{
        if self.is_initialized(){
            log::warn!("Scanner already initialized");
            return Ok(());
        }
        self.config.validate()?;

        let feed = ScanFeed::spawn(Subscriber::new(self.scan_topic()), Arc::clone(&self.scans))?;
        let commands = Subscriber::new(self.command_topic());
        let publisher = SlicePublisher::new(self.slice_topic());

        self.acquirer = Some(SliceAcquirer::new(
            link,
            publisher,
            Arc::clone(&self.scans),
            Arc::clone(&self.run_state),
            self.config.snapshot_policy(),
        ));
        self.feed = Some(feed);
        self.commands = Some(commands);
        log::info!("Scanner initialized");
        Ok(())
    }

    fn open_actuator(&self) -> Result<Box<dyn ActuatorLink>>{
        match &self.config.actuator{
            ActuatorConfig::Serial(serial) =>{
                let transport = SerialTransport::open(
                    &serial.port,
                    serial.baud_rate,
                    Duration::from_millis(serial.read_timeout_ms),
                )?;
                let link = McuLink::connect(transport, serial.link_config())?;
                Ok(Box::new(link))
            }
            ActuatorConfig::Simulated(sim) =>{
                let stand = SimulatedStand::new(sim.start_deg, sim.increment_deg, sim.min_deg, sim.max_deg)?
                    .with_step_delay(Duration::from_millis(sim.step_delay_ms));
                log::info!("Using simulated stand sweeping {}..{} deg", sim.min_deg, sim.max_deg);
                Ok(Box::new(stand))
            }
        }
    }

    //begin accepting commands. Idempotent.
    pub fn start(&mut self) -> Result<()>{
        if !self.is_initialized(){
            return Err(Error::NotInitialized);
        }
        if self.started{
            return Ok(());
        }

        if self.config.run.start_enabled{
            self.run_state.set_state(RunState::Enabled);
        }
        self.started = true;
        self.consecutive_failures = 0;
        log::info!(
            "Scanner started ({:?}); commands on {}",
            self.run_state.current_state(),
            self.config.topics.command
        );
        Ok(())
    }

    //release the actuator channel and unsubscribe. Safe to call at any
    //point, including before `init` or twice in a row.
    pub fn stop(&mut self){
        let was_initialized = self.is_initialized();
        self.started = false;

        if let Some(acquirer) = self.acquirer.take(){
            let slices = acquirer.slices_obtained();
            //dropping the link closes its channel
            drop(acquirer.into_parts());
            log::info!("Actuator channel released after {} slices", slices);
        }
        if let Some(mut source) = self.synthetic.take(){
            source.stop();
        }
        if let Some(mut feed) = self.feed.take(){
            feed.stop();
        }
        self.commands = None;

        if was_initialized{
            log::info!("Scanner stopped");
        }
    }

    //apply pending commands, then run one acquisition cycle if enabled
    pub fn spin_once(&mut self) -> Result<CycleOutcome>{
        if !self.started{
            return Err(if self.is_initialized(){
                Error::NotStarted
            }else{
                Error::NotInitialized
            });
        }

        if let Some(commands) = &self.commands{
            for cmd in commands.drain(){
                self.run_state.apply_command(cmd);
            }
        }

        if !self.run_state.current_state().is_enabled(){
            return Ok(CycleOutcome::Disabled);
        }

        let acquirer = self.acquirer.as_mut().ok_or(Error::NotInitialized)?;
        match acquirer.obtain_slice(){
            Ok(slice) =>{
                self.consecutive_failures = 0;
                Ok(CycleOutcome::Acquired(slice))
            }
            Err(e) =>{
                self.consecutive_failures += 1;
                log::warn!(
                    "Failed to obtain slice ({} in a row): {}",
                    self.consecutive_failures,
                    e
                );
                Ok(CycleOutcome::Failed(e))
            }
        }
    }

    //drive cycles at the configured rate until `running` is cleared or too
    //many cycles fail in a row. The actuator channel is released on every
    //exit path.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()>{
        let result = self.run_loop(running);
        self.stop();
        result
    }

    fn run_loop(&mut self, running: &AtomicBool) -> Result<()>{
        self.start()?;
        let period = self.config.cycle_period()?;
        let max_failures = self.config.run.max_consecutive_failures;

        while running.load(Ordering::Acquire){
            let cycle_start = Instant::now();

            if let CycleOutcome::Failed(e) = self.spin_once()?{
                if max_failures > 0 && self.consecutive_failures >= max_failures{
                    log::error!(
                        "Aborting run after {} consecutive failed cycles",
                        self.consecutive_failures
                    );
                    return Err(e);
                }
            }

            if let Some(remaining) = period.checked_sub(cycle_start.elapsed()){
                thread::sleep(remaining);
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool{
        self.acquirer.is_some()
    }

    pub fn is_started(&self) -> bool{
        self.started
    }

    pub fn config(&self) -> &ScannerConfig{
        &self.config
    }

    pub fn registry(&self) -> Arc<TopicRegistry>{
        Arc::clone(&self.registry)
    }

    pub fn run_state(&self) -> Arc<RunStateController>{
        Arc::clone(&self.run_state)
    }

    pub fn scan_buffer(&self) -> Arc<ScanBuffer>{
        Arc::clone(&self.scans)
    }

    pub fn consecutive_failures(&self) -> u32{
        self.consecutive_failures
    }

    pub fn scan_topic(&self) -> Arc<Topic<RangeSample>>{
        let topics = &self.config.topics;
        self.registry.get_or_create(&topics.scan, topics.capacity)
    }

    pub fn command_topic(&self) -> Arc<Topic<i32>>{
        let topics = &self.config.topics;
        self.registry.get_or_create(&topics.command, topics.capacity)
    }

    pub fn slice_topic(&self) -> Arc<Topic<Slice>>{
        let topics = &self.config.topics;
        self.registry.get_or_create(&topics.slice, topics.capacity)
    }

    pub fn scan_publisher(&self) -> Publisher<RangeSample>{
        Publisher::new(self.scan_topic())
    }

    pub fn command_publisher(&self) -> Publisher<i32>{
        Publisher::new(self.command_topic())
    }

    pub fn slice_subscriber(&self) -> Subscriber<Slice>{
        Subscriber::new(self.slice_topic())
    }
}

impl Drop for TiltingScanner{
    fn drop(&mut self){
        self.stop();
    }
}
