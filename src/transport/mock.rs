use super::Transport;
use crate::error::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

//mock transport. Clones share state, so a test keeps one handle while the
//link owns another.
#[derive(Clone, Default)]
pub struct MockTransport{
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner{
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    replies: HashMap<Vec<u8>, VecDeque<Vec<u8>>>,
    disconnected: bool,
    dropped: bool,
}

impl MockTransport{
    pub fn new() -> Self{
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner>{
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn inject_read(&self, data: &[u8]){
        self.lock().read_buffer.extend(data);
    }

    pub fn get_written(&self) -> Vec<u8>{
        self.lock().write_buffer.clone()
    }

    //queue `response` to become readable the next time exactly `command`
    //is written. Replies to the same command are used in order.
    pub fn respond_to(&self, command: &[u8], response: &[u8]){
        self.lock()
            .replies
            .entry(command.to_vec())
            .or_default()
            .push_back(response.to_vec());
    }

    //make every subsequent read and write fail as if the cable were pulled
    pub fn disconnect(&self){
        self.lock().disconnected = true;
    }

    //true once the link-owned handle has been dropped
    pub fn is_released(&self) -> bool{
        self.lock().dropped
    }

    //handle that records its own drop, for handing to the code under test
    pub fn owned_handle(&self) -> OwnedMockTransport{
        OwnedMockTransport(self.clone())
    }

    fn disconnected_error() -> Error{
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock transport disconnected").into()
    }
}

impl Transport for MockTransport{
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>{
        let mut inner = self.lock();
        if inner.disconnected{
            return Err(Self::disconnected_error());
        }
        let available = inner.read_buffer.len().min(buffer.len());
        for (slot, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..available)){
            *slot = byte;
        }
        Ok(available)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()>{
        let mut inner = self.lock();
        if inner.disconnected{
            return Err(Self::disconnected_error());
        }
        inner.write_buffer.extend_from_slice(data);
        let reply = inner.replies.get_mut(data).and_then(|queue| queue.pop_front());
        if let Some(reply) = reply{
            inner.read_buffer.extend(reply);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()>{
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()>{
        self.lock().read_buffer.clear();
        Ok(())
    }
}

//A `MockTransport` handle that flags the shared state when dropped
pub struct OwnedMockTransport(MockTransport);

impl Transport for OwnedMockTransport{
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>{
        self.0.read(buffer)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()>{
        self.0.write_all(data)
    }

    fn flush(&mut self) -> Result<()>{
        self.0.flush()
    }

    fn clear_input(&mut self) -> Result<()>{
        self.0.clear_input()
    }
}

impl Drop for OwnedMockTransport{
    fn drop(&mut self){
        self.0.lock().dropped = true;
    }
}
