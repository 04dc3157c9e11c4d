use super::Transport;
use crate::error::Result;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

//serial port to the tilt stand MCU. The port closes when this is dropped.
pub struct SerialTransport{
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport{
    //open `path` at `baud_rate`, 8N1, no flow control
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self>{
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport{
            port,
            path: path.to_string(),
        })
    }
}

impl Transport for SerialTransport{
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>{
        match self.port.read(buffer){
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()>{
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()>{
        self.port.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()>{
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl Drop for SerialTransport{
    fn drop(&mut self){
        log::info!("Closed serial port: {}", self.path);
    }
}
