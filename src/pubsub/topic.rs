use std::sync::Arc;
use crate::ring_buffer::RingBuffer;
use super::message::Message;

//a named, bounded channel. publishing never blocks; a full topic drops its oldest message
pub struct Topic<T: Message>{
    name: String,
    buffer: Arc<RingBuffer<T>>
}

impl<T: Message> Topic<T>{
    pub fn new(name: &str, capacity: usize) -> Self{
        Topic{
            name: name.to_string(),
            buffer: Arc::new(RingBuffer::new(capacity)),
        }
    }

    pub fn name(&self) -> &str{
        &self.name
    }

    pub fn publish(&self, msg: T) -> u64{
        self.buffer.push(msg)
    }

    pub fn try_receive(&self) -> Option<T>{
        self.buffer.pop()
    }

    pub fn latest_epoch(&self) -> u64{
        self.buffer.latest_epoch()
    }

    //messages lost to overflow since creation
    pub fn dropped(&self) -> u64{
        self.buffer.dropped()
    }

    pub fn len(&self) -> usize{
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool{
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize{
        self.buffer.capacity()
    }
}

impl<T: Message> Clone for Topic<T>{
    fn clone(&self) -> Self{
        Topic{
            name: self.name.clone(),
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::types::{RangeReading, RangeSample};

    #[test]
    fn test_typed_topic_publish_subscribe(){
        let topic: Topic<RangeSample> = Topic::new("/scan", 8);
        let msg1 = RangeSample::new(0.0, 0.1, vec![RangeReading::new(1.0)]);
        let msg2 = RangeSample::new(0.0, 0.1, vec![RangeReading::new(2.0)]);
        let e1 = topic.publish(msg1.clone());
        let e2 = topic.publish(msg2.clone());
        assert_eq!(e1, 1);
        assert_eq!(e2, 2);
        assert_eq!(topic.len(), 2);
        assert_eq!(topic.name(), "/scan");
        assert_eq!(topic.try_receive().unwrap(), msg1);
        assert_eq!(topic.try_receive().unwrap(), msg2);
        assert!(topic.try_receive().is_none());
    }

    #[test]
    fn test_full_topic_drops_oldest(){
        let topic: Topic<i32> = Topic::new("/slice", 2);
        topic.publish(1);
        topic.publish(2);
        topic.publish(3);
        assert_eq!(topic.dropped(), 1);
        assert_eq!(topic.try_receive(), Some(2));
    }

    #[test]
    fn test_topic_clone_shares_buffer(){
        let topic1: Topic<i32> = Topic::new("/shared", 8);
        let topic2 = topic1.clone();
        topic1.publish(100);

        assert_eq!(topic2.try_receive(), Some(100));
        assert!(topic1.try_receive().is_none());
    }
}
