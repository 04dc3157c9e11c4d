use std::sync::Arc;
use super::topic::Topic;
use super::message::Message;

pub struct Subscriber<T: Message>{
    topic: Arc<Topic<T>>,
}

impl<T: Message> Subscriber<T>{
    pub fn new(topic: Arc<Topic<T>>) -> Self{
        Subscriber{ topic }
    }

    pub fn try_recv(&self) -> Option<T>{
        self.topic.try_receive()
    }

    //receive everything currently queued, oldest first
    pub fn drain(&self) -> Vec<T>{
        let mut out = Vec::new();
        while let Some(msg) = self.try_recv(){
            out.push(msg);
        }
        out
    }

    pub fn topic_name(&self) -> &str{
        self.topic.name()
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_subscriber_try_recv(){
        let topic = Arc::new(Topic::<i32>::new("/cmd", 8));
        let subscriber = Subscriber::new(Arc::clone(&topic));

        topic.publish(1);
        topic.publish(0);

        assert_eq!(subscriber.try_recv(), Some(1));
        assert_eq!(subscriber.try_recv(), Some(0));
        assert_eq!(subscriber.try_recv(), None);
    }

    #[test]
    fn test_subscriber_drain(){
        let topic = Arc::new(Topic::<i32>::new("/cmd", 8));
        let subscriber = Subscriber::new(Arc::clone(&topic));
        topic.publish(1);
        topic.publish(5);
        topic.publish(0);

        assert_eq!(subscriber.drain(), vec![1, 5, 0]);
        assert!(topic.is_empty());
    }
}
