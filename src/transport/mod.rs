use crate::error::Result;

mod mock;
mod serial;

pub use mock::{MockTransport, OwnedMockTransport};
pub use serial::SerialTransport;

//byte-oriented, blocking transport
pub trait Transport: Send{
    //read available bytes into `buffer`. Returns 0 when nothing arrived
    //within the transport's read timeout.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    //discard anything already received but not yet read
    fn clear_input(&mut self) -> Result<()>{
        Ok(())
    }
}
