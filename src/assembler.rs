use std::sync::Arc;

use crate::pubsub::{Publisher, Topic};
use crate::types::Slice;

pub trait Assembler: Send{
    fn accept(&mut self, slice: Slice);
}

impl<A: Assembler + ?Sized> Assembler for Box<A>{
    fn accept(&mut self, slice: Slice){
        (**self).accept(slice)
    }
}

//hands slices to the publication topic. A full topic drops its oldest
//slice rather than blocking the next cycle.
#[derive(Clone)]
pub struct SlicePublisher{
    publisher: Publisher<Slice>,
    topic: Arc<Topic<Slice>>,
}

impl SlicePublisher{
    pub fn new(topic: Arc<Topic<Slice>>) -> Self{
        Self{
            publisher: Publisher::new(Arc::clone(&topic)),
            topic,
        }
    }

    pub fn topic_name(&self) -> &str{
        self.publisher.topic_name()
    }
}

impl Assembler for SlicePublisher{
    fn accept(&mut self, slice: Slice){
        let sequence = slice.sequence;
        let before = self.topic.dropped();
        self.publisher.publish(slice);
        if self.topic.dropped() > before{
            log::warn!(
                "Slice topic {} full, oldest slice dropped (publishing #{})",
                self.topic_name(),
                sequence
            );
        }
    }
}

//keeps every slice of a sweep in arrival order
#[derive(Debug, Default)]
pub struct SliceCollector{
    slices: Vec<Slice>,
}

impl SliceCollector{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn len(&self) -> usize{
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool{
        self.slices.is_empty()
    }

    pub fn slices(&self) -> &[Slice]{
        &self.slices
    }

    //total range readings across all slices
    pub fn reading_count(&self) -> usize{
        self.slices.iter().map(|s| s.scan.sample_count()).sum()
    }

    //hand over the accumulated sweep and start a new one
    pub fn take(&mut self) -> Vec<Slice>{
        std::mem::take(&mut self.slices)
    }
}

impl Assembler for SliceCollector{
    fn accept(&mut self, slice: Slice){
        self.slices.push(slice);
    }
}
