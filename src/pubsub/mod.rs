pub mod message;
pub mod topic;
pub mod publisher;
pub mod subscriber;
pub mod registry;

pub use message::Message;
pub use topic::Topic;
pub use publisher::Publisher;
pub use subscriber::Subscriber;
pub use registry::TopicRegistry;

#[cfg(test)]
mod tests{
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_pubsub_threaded(){
        let topic = Arc::new(Topic::<i32>::new("/threaded", 2048));

        let publisher = Publisher::new(Arc::clone(&topic));
        let subscriber = Subscriber::new(Arc::clone(&topic));

        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);

        let num_items = 1000;

        let producer = thread::spawn(move ||{
            for i in 0..num_items{
                publisher.publish(i);
            }
            done_flag.store(true, Ordering::SeqCst);
        });

        let consumer = thread::spawn(move ||{
            let mut received = Vec::new();
            loop{
                match subscriber.try_recv(){
                    Some(val) => received.push(val),
                    None =>{
                        if done.load(Ordering::SeqCst){
                            received.extend(subscriber.drain());
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        assert_eq!(received.len(), num_items as usize);
        for i in 1..received.len(){
            assert!(received[i] > received[i - 1]);
        }
    }
}
