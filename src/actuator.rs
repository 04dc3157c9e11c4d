use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::TiltAngle;

pub trait ActuatorLink: Send{
    //command one tilt increment and wait for the motion to complete
    fn step(&mut self) -> Result<()>;

    //query the stand's current tilt angle in degrees
    fn current_angle(&mut self) -> Result<TiltAngle>;
}

impl<L: ActuatorLink + ?Sized> ActuatorLink for Box<L>{
    fn step(&mut self) -> Result<()>{
        (**self).step()
    }

    fn current_angle(&mut self) -> Result<TiltAngle>{
        (**self).current_angle()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scripted<T>{
    Ok(T),
    LinkFault(String),
    ProtocolFault(String),
}

impl<T> Scripted<T>{
    fn into_result(self) -> Result<T>{
        match self{
            Scripted::Ok(v) => Ok(v),
            Scripted::LinkFault(msg) => Err(Error::Link(msg)),
            Scripted::ProtocolFault(msg) => Err(Error::Protocol(msg)),
        }
    }
}

//call counters shared with a `ScriptedActuator` after it has been moved
//into an acquirer.
#[derive(Debug, Clone, Default)]
pub struct ScriptCounters{
    steps: Arc<AtomicUsize>,
    angle_queries: Arc<AtomicUsize>,
}

impl ScriptCounters{
    pub fn steps(&self) -> usize{
        self.steps.load(Ordering::SeqCst)
    }

    pub fn angle_queries(&self) -> usize{
        self.angle_queries.load(Ordering::SeqCst)
    }
}

//deterministic actuator substitute that replays scripted outcomes.
//
//steps succeed once their script runs out. Angle queries past the end of
//the script fail with a link error.
#[derive(Debug, Default)]
pub struct ScriptedActuator{
    steps: VecDeque<Scripted<()>>,
    angles: VecDeque<Scripted<TiltAngle>>,
    counters: ScriptCounters,
}

impl ScriptedActuator{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn with_angles(mut self, angles: impl IntoIterator<Item = TiltAngle>) -> Self{
        self.angles.extend(angles.into_iter().map(Scripted::Ok));
        self
    }

    pub fn push_step(mut self, outcome: Scripted<()>) -> Self{
        self.steps.push_back(outcome);
        self
    }

    pub fn push_angle(mut self, outcome: Scripted<TiltAngle>) -> Self{
        self.angles.push_back(outcome);
        self
    }

    pub fn counters(&self) -> ScriptCounters{
        self.counters.clone()
    }
}

impl ActuatorLink for ScriptedActuator{
    fn step(&mut self) -> Result<()>{
        self.counters.steps.fetch_add(1, Ordering::SeqCst);
        self.steps.pop_front().unwrap_or(Scripted::Ok(())).into_result()
    }

    fn current_angle(&mut self) -> Result<TiltAngle>{
        self.counters.angle_queries.fetch_add(1, Ordering::SeqCst);
        match self.angles.pop_front(){
            Some(outcome) => outcome.into_result(),
            None => Err(Error::link("angle script exhausted")),
        }
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_scripted_replay(){
        let mut link = ScriptedActuator::new()
            .push_step(Scripted::LinkFault("unplugged".into()))
            .with_angles([1.5, 3.0]);
        let counters = link.counters();

        assert!(link.step().unwrap_err().is_link());
        assert!(link.step().is_ok());
        assert_eq!(link.current_angle().unwrap(), 1.5);
        assert_eq!(link.current_angle().unwrap(), 3.0);
        assert!(link.current_angle().unwrap_err().is_link());

        assert_eq!(counters.steps(), 2);
        assert_eq!(counters.angle_queries(), 3);
    }

    #[test]
    fn test_boxed_link_forwards(){
        let scripted = ScriptedActuator::new()
            .push_angle(Scripted::ProtocolFault("AAxyz".into()));
        let counters = scripted.counters();
        let mut link: Box<dyn ActuatorLink> = Box::new(scripted);

        link.step().unwrap();
        assert!(link.current_angle().unwrap_err().is_protocol());
        assert_eq!(counters.steps(), 1);
    }
}
