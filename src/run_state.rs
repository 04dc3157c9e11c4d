use std::sync::atomic::{AtomicU8, Ordering};

pub const CMD_DISABLE: i32 = 0;
pub const CMD_ENABLE: i32 = 1;

//whether acquisition cycles execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RunState{
    Enabled = 1,
    #[default]
    Disabled = 0,
}

impl RunState{
    //map an integer command to a run state. Unknown values map to `None`.
    pub fn from_command(cmd: i32) -> Option<Self>{
        match cmd{
            CMD_ENABLE => Some(RunState::Enabled),
            CMD_DISABLE => Some(RunState::Disabled),
            _ => None,
        }
    }

    pub fn is_enabled(self) -> bool{
        self == RunState::Enabled
    }

    fn from_u8(val: u8) -> Self{
        if val == RunState::Enabled as u8{
            RunState::Enabled
        }else{
            RunState::Disabled
        }
    }
}

//holds the run state shared between the command handler and the
//acquisition loop. `set_state` is the only mutator.
#[derive(Debug, Default)]
pub struct RunStateController{
    state: AtomicU8,
}

impl RunStateController{
    pub fn new(initial: RunState) -> Self{
        Self{
            state: AtomicU8::new(initial as u8),
        }
    }

    //store `state`. Returns true if this changed the stored value.
    pub fn set_state(&self, state: RunState) -> bool{
        let previous = RunState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if previous != state{
            log::info!("Run state {:?} -> {:?}", previous, state);
            true
        }else{
            false
        }
    }

    pub fn current_state(&self) -> RunState{
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    //apply an integer command. Unrecognized values are ignored.
    pub fn apply_command(&self, cmd: i32) -> Option<RunState>{
        match RunState::from_command(cmd){
            Some(state) =>{
                self.set_state(state);
                Some(state)
            }
            None =>{
                log::warn!("Ignoring unrecognized command {}", cmd);
                None
            }
        }
    }
}
