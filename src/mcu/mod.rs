pub mod protocol;
pub use protocol::*;

use std::thread;
use std::time::{Duration, Instant};

use crate::actuator::ActuatorLink;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::TiltAngle;

const READ_CHUNK: usize = 64;
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct McuLinkConfig{
    //longest wait for any single response (handshake, step completion, angle)
    pub response_timeout: Duration,
    //settle time after opening the port, before the handshake
    pub connect_delay: Duration,
    pub handshake: bool,
}

impl Default for McuLinkConfig{
    fn default() -> Self{
        McuLinkConfig{
            response_timeout: Duration::from_secs(5),
            connect_delay: Duration::from_secs(2),
            handshake: true,
        }
    }
}

//line-protocol link to the tilt stand MCU.
//the transport is owned; dropping the link releases the channel.
pub struct McuLink<T: Transport>{
    transport: T,
    lines: LineReader,
    //angle (or bad angle) reported while stepping, valid for the next query only
    pending_angle: Option<Result<TiltAngle>>,
    config: McuLinkConfig,
}

impl<T: Transport> McuLink<T>{
    pub fn new(transport: T, config: McuLinkConfig) -> Self{
        McuLink{
            transport,
            lines: LineReader::new(),
            pending_angle: None,
            config,
        }
    }

    //flush stale input, let the board reset, then run the init handshake
    pub fn connect(transport: T, config: McuLinkConfig) -> Result<Self>{
        let mut link = Self::new(transport, config);
        link.transport.clear_input().map_err(Error::into_link)?;

        if !link.config.connect_delay.is_zero(){
            log::info!("Waiting {:?} for MCU to settle", link.config.connect_delay);
            thread::sleep(link.config.connect_delay);
        }

        if link.config.handshake{
            link.initialize()?;
        }
        Ok(link)
    }

    pub fn initialize(&mut self) -> Result<()>{
        self.send(McuCommand::Init)?;
        let deadline = self.deadline();
        loop{
            match self.read_response(deadline, "init confirmation")?{
                McuResponse::Started =>{
                    log::info!("MCU confirmed initialization");
                    return Ok(());
                }
                other => log::debug!("MCU during init: {:?}", other),
            }
        }
    }

    fn deadline(&self) -> Instant{
        Instant::now() + self.config.response_timeout
    }

    //late replies to an earlier command must not answer this one
    fn discard_stale(&mut self) -> Result<()>{
        let dropped = self.lines.clear();
        if dropped > 0{
            log::warn!("Discarding {} stale bytes from MCU", dropped);
        }
        self.transport.clear_input().map_err(Error::into_link)
    }

    fn send(&mut self, cmd: McuCommand) -> Result<()>{
        self.discard_stale()?;
        self.transport.write_all(&cmd.to_bytes()).map_err(Error::into_link)?;
        self.transport.flush().map_err(Error::into_link)?;
        log::trace!("MCU <- {:?}", cmd);
        Ok(())
    }

    //next complete line as a response; protocol errors are returned, not skipped
    fn read_response(&mut self, deadline: Instant, waiting_for: &str) -> Result<McuResponse>{
        let mut read_buf = [0u8; READ_CHUNK];

        loop{
            if let Some(line) = self.lines.next_line(){
                log::trace!("MCU -> {:?}", line);
                return McuResponse::parse(&line);
            }

            if Instant::now() >= deadline{
                return Err(Error::link(format!(
                    "timed out after {:?} waiting for {}",
                    self.config.response_timeout, waiting_for
                )));
            }

            match self.transport.read(&mut read_buf).map_err(Error::into_link)?{
                0 => thread::sleep(IDLE_SLEEP),
                n => self.lines.feed(&read_buf[..n]),
            }
        }
    }
}

impl<T: Transport> ActuatorLink for McuLink<T>{
    fn step(&mut self) -> Result<()>{
        self.pending_angle = None;
        self.send(McuCommand::Step)?;

        let deadline = self.deadline();
        loop{
            match self.read_response(deadline, "step completion"){
                Ok(McuResponse::Finished) => return Ok(()),
                Ok(McuResponse::Angle(angle)) => self.pending_angle = Some(Ok(angle)),
                Ok(other) => log::debug!("MCU during step: {:?}", other),
                //the step itself went through; the bad angle surfaces on query
                Err(e) if e.is_protocol() => self.pending_angle = Some(Err(e)),
                Err(e) =>{
                    self.pending_angle = None;
                    return Err(e);
                }
            }
        }
    }

    fn current_angle(&mut self) -> Result<TiltAngle>{
        if let Some(reported) = self.pending_angle.take(){
            return reported;
        }

        self.send(McuCommand::QueryAngle)?;
        let deadline = self.deadline();
        loop{
            match self.read_response(deadline, "angle report")?{
                McuResponse::Angle(angle) => return Ok(angle),
                other => log::debug!("MCU during angle query: {:?}", other),
            }
        }
    }
}
