use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};

//bounded fifo with push epochs and freshness bias:
//pushing into a full buffer discards the oldest entry, never blocks the writer.
//the lock is held only for the copy in or out.
pub struct RingBuffer<T>{
    entries: Mutex<VecDeque<T>>,
    write_epoch: AtomicU64,  //inc on every push
    dropped: AtomicU64,      //entries discarded on overflow
    capacity: usize,
}

impl<T> RingBuffer<T>{
    pub fn new(capacity: usize) -> Self{
        assert!(capacity > 0, "ring buffer capacity must be greater than 0");

        RingBuffer{
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            write_epoch: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>>{
        //a panicking holder cannot leave a half-written entry behind
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    //push item, return the epoch of the push
    pub fn push(&self, item: T) -> u64{
        let mut entries = self.lock();

        if entries.len() == self.capacity{
            entries.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }

        let epoch = self.write_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        entries.push_back(item);
        epoch
    }

    //pop the oldest item
    pub fn pop(&self) -> Option<T>{
        self.lock().pop_front()
    }

    pub fn latest_epoch(&self) -> u64{
        self.write_epoch.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64{
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize{
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool{
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize{
        self.capacity
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_pop_fifo(){
        let rb: RingBuffer<i32> = RingBuffer::new(5);

        rb.push(10);
        rb.push(20);
        rb.push(30);

        assert_eq!(rb.pop(), Some(10));
        assert_eq!(rb.pop(), Some(20));
        assert_eq!(rb.pop(), Some(30));
        assert_eq!(rb.pop(), None);
    }

    #[test]
    fn test_epoch_increment(){
        let rb: RingBuffer<i32> = RingBuffer::new(5);

        let e1 = rb.push(10);
        let e2 = rb.push(20);

        assert_eq!(e1, 1);
        assert_eq!(e2, 2);
        assert_eq!(rb.latest_epoch(), 2);
        assert_eq!(rb.pop(), Some(10));
    }

    #[test]
    fn test_overflow_discards_old(){
        let rb: RingBuffer<i32> = RingBuffer::new(3);

        rb.push(1);
        rb.push(2);
        rb.push(3);

        assert_eq!(rb.len(), 3);

        rb.push(4);  //overflow -> 1 discarded

        assert_eq!(rb.dropped(), 1);
        assert_eq!(rb.pop(), Some(2));
        assert_eq!(rb.pop(), Some(3));
        assert_eq!(rb.pop(), Some(4));
        assert_eq!(rb.pop(), None);
    }

    #[test]
    fn test_concurrent_push_pop_keeps_order(){
        let rb = Arc::new(RingBuffer::<u32>::new(4096));
        let producer ={
            let rb = Arc::clone(&rb);
            thread::spawn(move ||{
                for i in 0..1000{
                    rb.push(i);
                }
            })
        };

        let mut received = Vec::new();
        while received.len() < 1000{
            if let Some(v) = rb.pop(){
                received.push(v);
            }
        }
        producer.join().unwrap();

        for i in 1..received.len(){
            assert!(received[i] > received[i - 1]);
        }
    }
}
