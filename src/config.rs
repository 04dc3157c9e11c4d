use crate::acquisition::SnapshotPolicy;
use crate::error::{Error, Result};
use crate::mcu::McuLinkConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig{
    pub actuator: ActuatorConfig,
    pub acquisition: AcquisitionConfig,
    pub topics: TopicsConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActuatorConfig{
    Serial(SerialConfig),
    Simulated(SimulatedConfig),
}

impl Default for ActuatorConfig{
    fn default() -> Self{
        ActuatorConfig::Serial(SerialConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig{
    pub port: String,
    pub baud_rate: u32,
    //serial read timeout per poll
    pub read_timeout_ms: u64,
    //longest wait for any single MCU response
    pub response_timeout_ms: u64,
    //settle time after opening the port
    pub connect_delay_ms: u64,
    //send the init command and wait for its confirmation on connect
    pub handshake: bool,
}

impl Default for SerialConfig{
    fn default() -> Self{
        Self{
            port: "/dev/ttyACM1".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 10,
            response_timeout_ms: 5000,
            connect_delay_ms: 2000,
            handshake: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatedConfig{
    pub start_deg: f64,
    pub increment_deg: f64,
    pub min_deg: f64,
    pub max_deg: f64,
    pub step_delay_ms: u64,
    //period of the synthetic scan feed; 0 disables it
    pub scan_period_ms: u64,
    //range reported by every synthetic reading, meters
    pub scan_range_m: f32,
}

impl Default for SimulatedConfig{
    fn default() -> Self{
        Self{
            start_deg: 0.0,
            increment_deg: 1.8,
            min_deg: 0.0,
            max_deg: 90.0,
            step_delay_ms: 5,
            scan_period_ms: 25,
            scan_range_m: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AcquisitionConfig{
    pub snapshot_attempts: u32,
    pub snapshot_retry_ms: u64,
    pub snapshot_timeout_ms: u64,
    pub require_fresh_scan: bool,
}

impl Default for AcquisitionConfig{
    fn default() -> Self{
        let policy = SnapshotPolicy::default();
        Self{
            snapshot_attempts: policy.attempts,
            snapshot_retry_ms: policy.retry_interval.as_millis() as u64,
            snapshot_timeout_ms: policy.timeout.as_millis() as u64,
            require_fresh_scan: policy.require_fresh_scan,
        }
    }
}

//topic names for the sensor feed, command and publication channels
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicsConfig{
    pub scan: String,
    pub command: String,
    pub slice: String,
    pub capacity: usize,
}

impl Default for TopicsConfig{
    fn default() -> Self{
        Self{
            scan: "/scan".to_string(),
            command: "/cmd".to_string(),
            slice: "/slice".to_string(),
            capacity: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig{
    pub cycle_hz: f64,
    //abort the run after this many failed cycles in a row (0 = never)
    pub max_consecutive_failures: u32,
    //run state at start-up
    pub start_enabled: bool,
}

impl Default for RunConfig{
    fn default() -> Self{
        Self{
            cycle_hz: 100.0,
            max_consecutive_failures: 5,
            start_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig{
    //default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig{
    fn default() -> Self{
        Self{
            level: "info".to_string(),
        }
    }
}

impl ScannerConfig{
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self>{
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self>{
        let config: ScannerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()>{
        if self.topics.capacity == 0{
            return Err(Error::Config("topics.capacity must be at least 1".into()));
        }
        self.cycle_period()?;
        if self.acquisition.snapshot_attempts == 0{
            return Err(Error::Config(
                "acquisition.snapshot_attempts must be at least 1".into(),
            ));
        }
        if let ActuatorConfig::Simulated(sim) = &self.actuator{
            if !(sim.min_deg < sim.max_deg) || sim.increment_deg == 0.0{
                return Err(Error::Config(
                    "simulated stand needs min_deg < max_deg and a non-zero increment_deg".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy{
        SnapshotPolicy{
            attempts: self.acquisition.snapshot_attempts,
            retry_interval: Duration::from_millis(self.acquisition.snapshot_retry_ms),
            timeout: Duration::from_millis(self.acquisition.snapshot_timeout_ms),
            require_fresh_scan: self.acquisition.require_fresh_scan,
        }
    }

    //fails unless `run.cycle_hz` is positive and its period fits a `Duration`
    pub fn cycle_period(&self) -> Result<Duration>{
        let hz = self.run.cycle_hz;
        if !(hz.is_finite() && hz > 0.0){
            return Err(Error::Config(format!("run.cycle_hz must be positive, got {}", hz)));
        }
        Duration::try_from_secs_f64(1.0 / hz)
            .map_err(|_| Error::Config(format!("run.cycle_hz {} gives an unusable period", hz)))
    }
}

impl SerialConfig{
    pub fn link_config(&self) -> McuLinkConfig{
        McuLinkConfig{
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            handshake: self.handshake,
        }
    }
}
